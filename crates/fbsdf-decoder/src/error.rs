use fbsdf_wire::{Section, WireError};

/// Errors that can occur while driving a Fourier BSDF file through a
/// handler.
///
/// The reader validates at three levels: the fixed header, the raw body
/// bytes, and (when a [`ValidatingReader`](crate::ValidatingReader) sits
/// in between) the semantic content of each section. Handlers add a
/// fourth: they may refuse a file the format allows but they cannot use.
///
/// ```text
///   DecodeError
///   ├── InvalidHeader(WireError)  ← magic, version, flags, eta, roughness, reserved
///   ├── NonFinite                 ← NaN or infinity in a float section
///   ├── Invalid(ValidationError)  ← range, order, or bounds check failed
///   ├── Rejected                  ← a handler refused the file
///   └── Wire(WireError)           ← truncated body, size overflow, I/O
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The 64-byte header failed validation.
    #[error("invalid header: {0}")]
    InvalidHeader(WireError),

    /// A float that was materialised for a handler was NaN or infinite.
    #[error("input contained non-finite {section} value at offset {offset}")]
    NonFinite { section: Section, offset: u64 },

    /// A section's content broke a range, ordering, or bounds rule.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// A handler declined the file.
    #[error("{0}")]
    Rejected(String),

    /// Body truncation, section size overflow, or an I/O failure.
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl DecodeError {
    /// Build a [`DecodeError::Rejected`] from any message.
    pub fn rejected(message: impl Into<String>) -> Self {
        DecodeError::Rejected(message.into())
    }

    /// True when the input ended early, whether inside the header or the
    /// body.
    #[must_use]
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(
            self,
            DecodeError::InvalidHeader(WireError::UnexpectedEof { .. })
                | DecodeError::Wire(WireError::UnexpectedEof { .. })
        )
    }
}

/// Semantic checks applied by [`ValidatingReader`](crate::ValidatingReader).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// An elevational sample fell outside `[-1, 1]`.
    #[error("input contained elevational samples that were out of range: {value}")]
    ElevationalSampleOutOfRange { value: f32 },

    /// Elevational samples were not strictly increasing.
    #[error("input contained elevational samples that were improperly ordered: {value} after {previous}")]
    ImproperlyOrdered { previous: f32, value: f32 },

    /// A CDF value fell outside `[0, 1]` and clamping was disabled.
    #[error("input contained CDF values that were out of range: {value}")]
    CdfValueOutOfRange { value: f32 },

    /// The first value of a CDF row was not zero.
    #[error("CDF row {row} of basis function {basis_function} did not start with zero: {value}")]
    CdfRowDoesNotStartWithZero {
        basis_function: usize,
        row: usize,
        value: f32,
    },

    /// A series was longer than the header's longest-series length.
    #[error("input contained a series of length {length}, longer than the declared maximum {max}")]
    SeriesTooLong { length: u32, max: u32 },

    /// A buffer size derived from the header does not fit in memory.
    #[error("input too large to fit in memory")]
    InputTooLarge,

    /// A non-empty series started past the end of the coefficients.
    #[error("input contained a series offset {offset} that was out of bounds of {num_coefficients} coefficients")]
    OffsetOutOfBounds { offset: u32, num_coefficients: u32 },

    /// A series ran past the end of the coefficients.
    #[error("input contained a series at offset {offset} spanning {span} coefficients, out of bounds of {num_coefficients}")]
    SeriesOutOfBounds {
        offset: u32,
        span: usize,
        num_coefficients: u32,
    },

    /// A section callback arrived before `start`.
    #[error("section data arrived before the header was started")]
    NotStarted,
}
