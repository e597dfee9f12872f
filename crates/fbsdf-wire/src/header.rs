use std::io::Read;

use crate::error::WireError;
use crate::scalar::ScalarReader;

/// Magic identifier: ASCII "SCATFUN", no terminator.
/// Compared as raw bytes so byte order never matters.
pub const MAGIC: [u8; 7] = *b"SCATFUN";

/// The only format version that exists.
pub const VERSION: u8 = 1;

/// Total header size in bytes (fixed).
pub const HEADER_SIZE: usize = 64;

/// Offset of the first reserved word.
const RESERVED_OFFSET: u64 = 56;

/// Header flags bitfield.
///
/// Bit layout:
///   bit 0 = is a BSDF
///   bit 1 = coefficients use harmonic extrapolation
///   bits 2-31 = reserved (MUST be 0)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeaderFlags(u32);

impl HeaderFlags {
    /// The file describes a BSDF.
    pub const IS_BSDF: Self = Self(0b01);

    /// The Fourier series use harmonic extrapolation.
    pub const USES_HARMONIC_EXTRAPOLATION: Self = Self(0b10);

    /// No flags set.
    pub const NONE: Self = Self(0);

    const DEFINED_BITS: u32 = Self::IS_BSDF.0 | Self::USES_HARMONIC_EXTRAPOLATION.0;

    /// Create flags from a raw word.
    #[must_use]
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the underlying word.
    #[must_use]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn is_bsdf(self) -> bool {
        self.0 & Self::IS_BSDF.0 != 0
    }

    #[must_use]
    pub fn uses_harmonic_extrapolation(self) -> bool {
        self.0 & Self::USES_HARMONIC_EXTRAPOLATION.0 != 0
    }

    /// True if any bit outside the two defined flags is set.
    #[must_use]
    pub fn has_reserved_bits(self) -> bool {
        self.0 & !Self::DEFINED_BITS != 0
    }
}

impl std::ops::BitOr for HeaderFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Fourier BSDF file header: the first 64 bytes of every file.
///
/// ```text
/// ┌────────┬─────────┬──────────────────────────────────────────┐
/// │ Offset │ Size    │ Description                              │
/// ├────────┼─────────┼──────────────────────────────────────────┤
/// │ 0x00   │ 7 bytes │ Magic: "SCATFUN"                         │
/// │ 0x07   │ 1 byte  │ Version (1)                              │
/// │ 0x08   │ 4 bytes │ Flags                                    │
/// │ 0x0C   │ 4 bytes │ Elevational samples (N)                  │
/// │ 0x10   │ 4 bytes │ Coefficients (C)                         │
/// │ 0x14   │ 4 bytes │ Length of the longest series             │
/// │ 0x18   │ 4 bytes │ Color channels                           │
/// │ 0x1C   │ 4 bytes │ Basis functions (B)                      │
/// │ 0x20   │ 4 bytes │ Metadata bytes (M)                       │
/// │ 0x24   │ 4 bytes │ Parameters (P)                           │
/// │ 0x28   │ 4 bytes │ Parameter values (V)                     │
/// │ 0x2C   │ 4 bytes │ Index of refraction (f32, finite, >= 1)  │
/// │ 0x30   │ 4 bytes │ Roughness, top face (f32, finite, > 0)   │
/// │ 0x34   │ 4 bytes │ Roughness, bottom face (f32, finite, > 0)│
/// │ 0x38   │ 8 bytes │ Reserved (0)                             │
/// └────────┴─────────┴──────────────────────────────────────────┘
/// ```
///
/// All multi-byte fields are little-endian.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BsdfHeader {
    pub version: u8,
    pub flags: HeaderFlags,
    pub num_elevational_samples: u32,
    pub num_coefficients: u32,
    pub length_longest_series: u32,
    pub num_color_channels: u32,
    pub num_basis_functions: u32,
    pub num_metadata_bytes: u32,
    pub num_parameters: u32,
    pub num_parameter_values: u32,
    pub index_of_refraction: f32,
    pub roughness_top: f32,
    pub roughness_bottom: f32,
}

impl BsdfHeader {
    /// Decode and validate a header from the start of a byte stream.
    ///
    /// Consumes exactly [`HEADER_SIZE`] bytes on success.
    ///
    /// # Errors
    ///
    /// See [`decode`](Self::decode).
    pub fn read_from<R: Read>(input: R) -> Result<Self, WireError> {
        Self::decode(&mut ScalarReader::new(input))
    }

    /// Decode and validate a header through an existing scalar reader.
    ///
    /// Each field is checked as soon as it is read, so the first bad field
    /// decides the error:
    ///
    /// - [`WireError::BadStream`] if the stream fails before the first byte.
    /// - [`WireError::UnexpectedEof`] if the input is shorter than the header.
    /// - [`WireError::InvalidMagic`] if the magic is not "SCATFUN".
    /// - [`WireError::UnsupportedVersion`] if the version is not 1.
    /// - [`WireError::ReservedFlags`] if flag bits 2-31 are set.
    /// - [`WireError::InvalidIndexOfRefraction`] if eta is non-finite or < 1.
    /// - [`WireError::InvalidRoughness`] if a roughness is non-finite or <= 0.
    /// - [`WireError::ReservedNonZero`] if a reserved word is non-zero.
    ///
    /// # Errors
    ///
    /// As listed above.
    pub fn decode<R: Read>(reader: &mut ScalarReader<R>) -> Result<Self, WireError> {
        let magic = match reader.read_array::<7>() {
            Ok(magic) => magic,
            Err(WireError::Io(e)) => return Err(WireError::BadStream(e)),
            Err(e) => return Err(e),
        };
        if magic != MAGIC {
            return Err(WireError::InvalidMagic { found: magic });
        }

        let version = reader.read_u8()?;
        if version != VERSION {
            return Err(WireError::UnsupportedVersion { version });
        }

        let flags = HeaderFlags::from_raw(reader.read_u32()?);
        if flags.has_reserved_bits() {
            return Err(WireError::ReservedFlags { flags: flags.raw() });
        }

        let num_elevational_samples = reader.read_u32()?;
        let num_coefficients = reader.read_u32()?;
        let length_longest_series = reader.read_u32()?;
        let num_color_channels = reader.read_u32()?;
        let num_basis_functions = reader.read_u32()?;
        let num_metadata_bytes = reader.read_u32()?;
        let num_parameters = reader.read_u32()?;
        let num_parameter_values = reader.read_u32()?;

        let index_of_refraction = reader.read_f32()?;
        if !index_of_refraction.is_finite() || index_of_refraction < 1.0 {
            return Err(WireError::InvalidIndexOfRefraction {
                value: index_of_refraction,
            });
        }

        let roughness_top = read_roughness(reader)?;
        let roughness_bottom = read_roughness(reader)?;

        for offset in [RESERVED_OFFSET, RESERVED_OFFSET + 4] {
            let value = reader.read_u32()?;
            if value != 0 {
                return Err(WireError::ReservedNonZero { offset, value });
            }
        }

        Ok(Self {
            version,
            flags,
            num_elevational_samples,
            num_coefficients,
            length_longest_series,
            num_color_channels,
            num_basis_functions,
            num_metadata_bytes,
            num_parameters,
            num_parameter_values,
            index_of_refraction,
            roughness_top,
            roughness_bottom,
        })
    }

    /// Coefficients one series length spans across all basis functions and
    /// color channels (`B × channels`), or `None` if it overflows `usize`.
    #[must_use]
    pub fn coefficients_per_length(&self) -> Option<usize> {
        usize::try_from(self.num_basis_functions)
            .ok()?
            .checked_mul(usize::try_from(self.num_color_channels).ok()?)
    }
}

/// Roughness must be finite and strictly positive.
fn read_roughness<R: Read>(reader: &mut ScalarReader<R>) -> Result<f32, WireError> {
    let value = reader.read_f32()?;
    if !value.is_finite() || value <= 0.0 {
        return Err(WireError::InvalidRoughness { value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};

    use super::*;

    /// Build a header byte image field by field.
    fn header_bytes(
        flags: u32,
        counts: [u32; 8],
        eta: f32,
        roughness: [f32; 2],
        reserved: [u32; 2],
    ) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE);
        buf.extend_from_slice(&MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&flags.to_le_bytes());
        for count in counts {
            buf.extend_from_slice(&count.to_le_bytes());
        }
        buf.extend_from_slice(&eta.to_le_bytes());
        buf.extend_from_slice(&roughness[0].to_le_bytes());
        buf.extend_from_slice(&roughness[1].to_le_bytes());
        buf.extend_from_slice(&reserved[0].to_le_bytes());
        buf.extend_from_slice(&reserved[1].to_le_bytes());
        buf
    }

    fn valid() -> Vec<u8> {
        header_bytes(1, [2, 3, 4, 5, 6, 7, 8, 9], 1.5, [0.25, 0.75], [0, 0])
    }

    #[test]
    fn decodes_every_field() {
        let buf = valid();
        assert_eq!(buf.len(), HEADER_SIZE);

        let header = BsdfHeader::read_from(Cursor::new(&buf)).unwrap();
        assert_eq!(header.version, 1);
        assert!(header.flags.is_bsdf());
        assert!(!header.flags.uses_harmonic_extrapolation());
        assert_eq!(header.num_elevational_samples, 2);
        assert_eq!(header.num_coefficients, 3);
        assert_eq!(header.length_longest_series, 4);
        assert_eq!(header.num_color_channels, 5);
        assert_eq!(header.num_basis_functions, 6);
        assert_eq!(header.num_metadata_bytes, 7);
        assert_eq!(header.num_parameters, 8);
        assert_eq!(header.num_parameter_values, 9);
        assert_eq!(header.index_of_refraction.to_bits(), 1.5f32.to_bits());
        assert_eq!(header.roughness_top.to_bits(), 0.25f32.to_bits());
        assert_eq!(header.roughness_bottom.to_bits(), 0.75f32.to_bits());
    }

    #[test]
    fn consumes_exactly_the_header() {
        let mut buf = valid();
        buf.extend_from_slice(&[0xAA; 16]);
        let mut reader = ScalarReader::new(Cursor::new(&buf));
        BsdfHeader::decode(&mut reader).unwrap();
        assert_eq!(reader.position(), HEADER_SIZE as u64);
    }

    #[test]
    fn both_flags_decompose() {
        let buf = header_bytes(3, [0; 8], 1.0, [1.0, 1.0], [0, 0]);
        let header = BsdfHeader::read_from(Cursor::new(&buf)).unwrap();
        assert!(header.flags.is_bsdf());
        assert!(header.flags.uses_harmonic_extrapolation());
    }

    #[test]
    fn reject_bad_magic() {
        let mut buf = valid();
        buf[0..7].copy_from_slice(b"SCATFAN");
        let result = BsdfHeader::read_from(Cursor::new(&buf));
        assert!(matches!(result, Err(WireError::InvalidMagic { found }) if &found == b"SCATFAN"));
    }

    #[test]
    fn reject_unsupported_version() {
        let mut buf = valid();
        buf[7] = 2;
        let result = BsdfHeader::read_from(Cursor::new(&buf));
        assert!(matches!(
            result,
            Err(WireError::UnsupportedVersion { version: 2 })
        ));
    }

    #[test]
    fn reject_reserved_flags() {
        let buf = header_bytes(4, [0; 8], 1.0, [1.0, 1.0], [0, 0]);
        let result = BsdfHeader::read_from(Cursor::new(&buf));
        assert!(matches!(result, Err(WireError::ReservedFlags { flags: 4 })));
    }

    #[test]
    fn reject_bad_index_of_refraction() {
        for eta in [0.5, f32::NAN, f32::INFINITY] {
            let buf = header_bytes(1, [0; 8], eta, [1.0, 1.0], [0, 0]);
            let result = BsdfHeader::read_from(Cursor::new(&buf));
            assert!(
                matches!(result, Err(WireError::InvalidIndexOfRefraction { .. })),
                "eta {eta} should be rejected"
            );
        }
    }

    #[test]
    fn reject_non_positive_roughness() {
        for roughness in [[0.0, 1.0], [1.0, -1.0], [f32::NAN, 1.0], [1.0, f32::INFINITY]] {
            let buf = header_bytes(1, [0; 8], 1.0, roughness, [0, 0]);
            let result = BsdfHeader::read_from(Cursor::new(&buf));
            assert!(
                matches!(result, Err(WireError::InvalidRoughness { .. })),
                "roughness {roughness:?} should be rejected"
            );
        }
    }

    #[test]
    fn reject_nonzero_reserved() {
        let buf = header_bytes(1, [0; 8], 1.0, [1.0, 1.0], [0, 0xDEAD]);
        let result = BsdfHeader::read_from(Cursor::new(&buf));
        assert!(matches!(
            result,
            Err(WireError::ReservedNonZero {
                offset: 60,
                value: 0xDEAD
            })
        ));
    }

    #[test]
    fn every_truncation_is_eof() {
        let buf = valid();
        for len in 0..HEADER_SIZE {
            let result = BsdfHeader::read_from(Cursor::new(&buf[..len]));
            assert!(
                matches!(result, Err(WireError::UnexpectedEof { .. })),
                "truncation at {len} gave {result:?}"
            );
        }
    }

    #[test]
    fn failing_stream_is_bad_stream() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("closed"))
            }
        }

        let result = BsdfHeader::read_from(Broken);
        assert!(matches!(result, Err(WireError::BadStream(_))));
    }

    #[test]
    fn coefficients_per_length_multiplies_bases_and_channels() {
        let header = BsdfHeader::read_from(Cursor::new(&valid())).unwrap();
        assert_eq!(header.coefficients_per_length(), Some(30));
    }
}
