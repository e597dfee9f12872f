use std::fmt;

use crate::error::WireError;
use crate::header::BsdfHeader;

/// The seven body sections, in the only order they may appear on the wire.
///
/// ```text
/// ┌───────────────────────┬─────────────┬─────────────────────┐
/// │ Section               │ Shape       │ Element             │
/// ├───────────────────────┼─────────────┼─────────────────────┤
/// │ ElevationalSamples    │ N           │ f32                 │
/// │ ParameterSampleCounts │ P           │ u32                 │
/// │ ParameterValues       │ V           │ f32                 │
/// │ Cdf                   │ B × N × N   │ f32                 │
/// │ Series                │ N × N       │ (u32 off, u32 len)  │
/// │ Coefficients          │ C           │ f32                 │
/// │ Metadata              │ M           │ u8                  │
/// └───────────────────────┴─────────────┴─────────────────────┘
/// ```
///
/// Element counts and byte lengths are derived from untrusted header
/// fields, so both are computed in `u64` with overflow checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    ElevationalSamples,
    ParameterSampleCounts,
    ParameterValues,
    Cdf,
    Series,
    Coefficients,
    Metadata,
}

impl Section {
    /// All sections in wire order.
    pub const ALL: [Section; 7] = [
        Section::ElevationalSamples,
        Section::ParameterSampleCounts,
        Section::ParameterValues,
        Section::Cdf,
        Section::Series,
        Section::Coefficients,
        Section::Metadata,
    ];

    /// Human-readable name, used in error messages and reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Section::ElevationalSamples => "elevational samples",
            Section::ParameterSampleCounts => "parameter sample counts",
            Section::ParameterValues => "parameter values",
            Section::Cdf => "CDF",
            Section::Series => "series extents",
            Section::Coefficients => "coefficients",
            Section::Metadata => "metadata",
        }
    }

    /// Size of one element on the wire, in bytes.
    #[must_use]
    pub fn element_size(self) -> u64 {
        match self {
            Section::Series => 8,
            Section::Metadata => 1,
            _ => 4,
        }
    }

    /// Number of elements the header says this section holds.
    ///
    /// # Errors
    ///
    /// [`WireError::TooLarge`] if the count overflows `u64` (only
    /// possible for the `B × N × N` CDF grid).
    pub fn element_count(self, header: &BsdfHeader) -> Result<u64, WireError> {
        let n = u64::from(header.num_elevational_samples);
        let count = match self {
            Section::ElevationalSamples => Some(n),
            Section::ParameterSampleCounts => Some(u64::from(header.num_parameters)),
            Section::ParameterValues => Some(u64::from(header.num_parameter_values)),
            Section::Cdf => n
                .checked_mul(n)
                .and_then(|nn| nn.checked_mul(u64::from(header.num_basis_functions))),
            Section::Series => n.checked_mul(n),
            Section::Coefficients => Some(u64::from(header.num_coefficients)),
            Section::Metadata => Some(u64::from(header.num_metadata_bytes)),
        };
        count.ok_or(WireError::TooLarge { section: self })
    }

    /// Number of bytes this section occupies on the wire.
    ///
    /// # Errors
    ///
    /// [`WireError::TooLarge`] on overflow.
    pub fn byte_len(self, header: &BsdfHeader) -> Result<u64, WireError> {
        self.element_count(header)?
            .checked_mul(self.element_size())
            .ok_or(WireError::TooLarge { section: self })
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Total number of body bytes following the header.
///
/// # Errors
///
/// [`WireError::TooLarge`] naming the first section whose size (or the
/// running total) overflows.
pub fn body_len(header: &BsdfHeader) -> Result<u64, WireError> {
    Section::ALL.iter().try_fold(0u64, |total, &section| {
        total
            .checked_add(section.byte_len(header)?)
            .ok_or(WireError::TooLarge { section })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{HeaderFlags, VERSION};

    fn header(n: u32, b: u32) -> BsdfHeader {
        BsdfHeader {
            version: VERSION,
            flags: HeaderFlags::IS_BSDF,
            num_elevational_samples: n,
            num_coefficients: 10,
            length_longest_series: 2,
            num_color_channels: 3,
            num_basis_functions: b,
            num_metadata_bytes: 5,
            num_parameters: 2,
            num_parameter_values: 4,
            index_of_refraction: 1.0,
            roughness_top: 1.0,
            roughness_bottom: 1.0,
        }
    }

    #[test]
    fn byte_lengths_follow_header_counts() {
        let h = header(3, 2);
        assert_eq!(Section::ElevationalSamples.byte_len(&h).unwrap(), 12);
        assert_eq!(Section::ParameterSampleCounts.byte_len(&h).unwrap(), 8);
        assert_eq!(Section::ParameterValues.byte_len(&h).unwrap(), 16);
        assert_eq!(Section::Cdf.byte_len(&h).unwrap(), 2 * 9 * 4);
        assert_eq!(Section::Series.byte_len(&h).unwrap(), 9 * 8);
        assert_eq!(Section::Coefficients.byte_len(&h).unwrap(), 40);
        assert_eq!(Section::Metadata.byte_len(&h).unwrap(), 5);
        assert_eq!(body_len(&h).unwrap(), 12 + 8 + 16 + 72 + 72 + 40 + 5);
    }

    #[test]
    fn cdf_grid_overflow_is_too_large() {
        let h = header(u32::MAX, u32::MAX);
        let err = Section::Cdf.element_count(&h).unwrap_err();
        assert!(matches!(
            err,
            WireError::TooLarge {
                section: Section::Cdf
            }
        ));
        assert!(body_len(&h).is_err());
    }

    #[test]
    fn series_bytes_overflow_even_when_count_fits() {
        let h = header(u32::MAX, 1);
        assert!(Section::Series.element_count(&h).is_ok());
        assert!(matches!(
            Section::Series.byte_len(&h),
            Err(WireError::TooLarge {
                section: Section::Series
            })
        ));

        let h = header(1 << 20, 1);
        assert_eq!(Section::Series.byte_len(&h).unwrap(), 1 << 43);
    }

    #[test]
    fn sections_are_in_wire_order() {
        assert_eq!(Section::ALL.first(), Some(&Section::ElevationalSamples));
        assert_eq!(Section::ALL.last(), Some(&Section::Metadata));
    }
}
