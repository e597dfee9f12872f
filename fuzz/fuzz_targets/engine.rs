#![no_main]

use fbsdf_decoder::{BsdfHandler, BsdfHeader, BsdfReader, DecodeError, ParseOptions, Section};
use libfuzzer_sys::fuzz_target;

struct Select(ParseOptions);

impl BsdfHandler for Select {
    fn start(&mut self, _header: &BsdfHeader) -> Result<ParseOptions, DecodeError> {
        Ok(self.0)
    }
}

// Fuzz target: BsdfReader over an arbitrary file.
//
// Input format:
//   - First byte: one bit per section, set to parse, clear to skip
//   - Remaining bytes: the file
//
// Catches bugs in:
// - Section size arithmetic on hostile header counts
// - Skip and parse paths disagreeing on section lengths
// - Truncation inside any section
fuzz_target!(|data: &[u8]| {
    let Some((&mask, file)) = data.split_first() else {
        return;
    };

    let options = Section::ALL
        .into_iter()
        .enumerate()
        .fold(ParseOptions::none(), |options, (bit, section)| {
            options.with(section, mask & (1 << bit) != 0)
        });

    let _ = BsdfReader::read(file, &mut Select(options));
});
