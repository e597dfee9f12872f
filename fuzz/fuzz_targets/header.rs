#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: BsdfHeader::read_from with arbitrary bytes.
//
// Catches bugs in:
// - Magic and version checks
// - Reserved flag and reserved word enforcement
// - Float validation of eta and roughness
// - Truncated header handling
fuzz_target!(|data: &[u8]| {
    if let Ok(header) = fbsdf_wire::BsdfHeader::read_from(data) {
        assert!(data.len() >= fbsdf_wire::HEADER_SIZE);
        assert!(header.index_of_refraction >= 1.0);
        assert!(header.roughness_top > 0.0 && header.roughness_bottom > 0.0);
    }
});
