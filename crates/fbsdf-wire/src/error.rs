use crate::section::Section;

/// Errors raised while reading the fixed header or the raw body bytes of a
/// Fourier BSDF file.
///
/// Every variant that points into the byte stream carries the absolute
/// offset (from the first magic byte) where the problem was found.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The very first read failed with an I/O error other than EOF.
    #[error("bad stream passed: {0}")]
    BadStream(#[source] std::io::Error),

    /// Input ended before a complete header field or section was read.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: u64 },

    /// Magic bytes did not spell "SCATFUN".
    #[error("invalid magic: expected \"SCATFUN\", got {found:02X?}")]
    InvalidMagic { found: [u8; 7] },

    /// Only version 1 of the format exists.
    #[error("unsupported version {version}, only version 1 is supported")]
    UnsupportedVersion { version: u8 },

    /// Flag bits 2-31 were set.
    #[error("reserved flags were set: {flags:#010X}")]
    ReservedFlags { flags: u32 },

    /// Index of refraction was non-finite or below 1.0.
    #[error("invalid index of refraction: {value}")]
    InvalidIndexOfRefraction { value: f32 },

    /// A roughness value was non-finite or not strictly positive.
    #[error("invalid roughness: {value}")]
    InvalidRoughness { value: f32 },

    /// One of the two trailing reserved words was non-zero.
    #[error("reserved bytes at offset {offset} were {value:#010X}, expected 0")]
    ReservedNonZero { offset: u64, value: u32 },

    /// A section's size, derived from header counts, overflows 64 bits.
    #[error("input too large to fit in memory: {section} section size overflows")]
    TooLarge { section: Section },

    /// I/O error after the header started decoding.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
