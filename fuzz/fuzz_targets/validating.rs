#![no_main]

use fbsdf_decoder::{
    BatchHandler, BsdfHeader, DecodeError, ParseOptions, SeriesExtent, ValidatingReader,
    ValidationOptions,
};
use libfuzzer_sys::fuzz_target;

/// Checks that every batch has the size the header promised.
#[derive(Default)]
struct Sizes {
    header: Option<BsdfHeader>,
}

impl BatchHandler for Sizes {
    fn start(&mut self, header: &BsdfHeader) -> Result<ParseOptions, DecodeError> {
        self.header = Some(*header);
        Ok(ParseOptions::all())
    }

    fn handle_elevational_samples(&mut self, samples: Vec<f32>) -> Result<(), DecodeError> {
        let n = self.header.map_or(0, |h| h.num_elevational_samples);
        assert_eq!(samples.len(), n as usize);
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
        Ok(())
    }

    fn handle_cdf(&mut self, cdf: Vec<f32>) -> Result<(), DecodeError> {
        let n = self.header.map_or(0, |h| h.num_elevational_samples) as usize;
        assert_eq!(cdf.len(), n * n);
        assert!(cdf.iter().all(|v| (0.0..=1.0).contains(v)));
        Ok(())
    }

    fn handle_series(&mut self, series: Vec<SeriesExtent>) -> Result<(), DecodeError> {
        let c = self.header.map_or(0, |h| h.num_coefficients);
        assert!(series.iter().all(|s| s.length == 0 || s.offset < c));
        Ok(())
    }
}

// Fuzz target: ValidatingReader over an arbitrary file.
//
// Input format:
//   - First byte: bit 0 selects the strict policy
//   - Remaining bytes: the file
//
// Catches bugs in:
// - Batch sizing and accumulator reuse
// - Allocation driven by hostile header counts
// - Every range, order and bounds rule
fuzz_target!(|data: &[u8]| {
    let Some((&policy, file)) = data.split_first() else {
        return;
    };
    let options = if policy & 1 == 0 {
        ValidationOptions::lenient()
    } else {
        ValidationOptions::strict()
    };

    let _ = ValidatingReader::new(Sizes::default(), options).read(file);
});
