#![no_main]

use fbsdf_decoder::{PbrtBsdfReader, read_standard_bsdf};
use libfuzzer_sys::fuzz_target;

// Fuzz target: the PBRT table builder and the standard reader.
//
// Catches bugs in:
// - a0 computation on series that run past the coefficients
// - Channel de-interleaving on inconsistent extents
fuzz_target!(|data: &[u8]| {
    if let Ok(table) = PbrtBsdfReader::read(data) {
        assert_eq!(table.m.len(), table.a0.len());
        assert!(table.m.iter().all(|&m| m <= table.m_max));
    }

    if let Ok(bsdf) = read_standard_bsdf(data) {
        assert!(bsdf.elevational_samples.len() >= 3);
        if bsdf.num_color_channels == 3 {
            assert_eq!(bsdf.y_coefficients.len(), bsdf.r_coefficients.len());
            assert_eq!(bsdf.y_coefficients.len(), bsdf.b_coefficients.len());
        }
    }
});
