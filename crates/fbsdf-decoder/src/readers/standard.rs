//! One-call reader for the common rendering case: a single basis function
//! with one or three color channels.

use std::io::Read;

use fbsdf_wire::{BsdfHeader, Section};
use log::{debug, trace};

use crate::error::DecodeError;
use crate::reader::ParseOptions;
use crate::validating::{BatchHandler, SeriesExtent, ValidatingReader, ValidationOptions};

/// Fewest elevational samples a renderer can interpolate over.
pub const MIN_ELEVATIONAL_SAMPLES: usize = 3;

/// `(offset, length)` into each of the per-channel coefficient arrays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChannelExtent {
    pub offset: usize,
    pub length: usize,
}

/// Result of [`read_standard_bsdf`].
///
/// With one channel only `y_coefficients` is filled. With three, the
/// luminance/red/blue runs that the file interleaves per cell are split
/// into separate arrays, all indexed by the same `series`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StandardBsdf {
    pub elevational_samples: Vec<f32>,
    /// CDF of the first basis function.
    pub cdf: Vec<f32>,
    pub y_coefficients: Vec<f32>,
    pub r_coefficients: Vec<f32>,
    pub b_coefficients: Vec<f32>,
    pub series: Vec<ChannelExtent>,
    pub num_color_channels: usize,
    pub index_of_refraction: f32,
    pub roughness_top: f32,
    pub roughness_bottom: f32,
}

#[derive(Default)]
struct Collector {
    header: Option<BsdfHeader>,
    elevational_samples: Vec<f32>,
    cdf: Option<Vec<f32>>,
    series: Vec<SeriesExtent>,
    coefficients: Vec<f32>,
}

impl BatchHandler for Collector {
    fn start(&mut self, header: &BsdfHeader) -> Result<ParseOptions, DecodeError> {
        if !header.flags.is_bsdf() {
            return Err(DecodeError::rejected("the input does not indicate that it is a BSDF"));
        }
        if header.flags.uses_harmonic_extrapolation() {
            return Err(DecodeError::rejected(
                "the input uses harmonic extrapolation which is unsupported",
            ));
        }
        if header.num_basis_functions == 0 {
            return Err(DecodeError::rejected("the input does not contain any basis functions"));
        }
        if !matches!(header.num_color_channels, 1 | 3) {
            return Err(DecodeError::rejected(
                "the input must contain either 1 or 3 color channels",
            ));
        }
        if header.num_basis_functions > 1 {
            debug!(
                "standard reader: keeping the first of {} basis functions",
                header.num_basis_functions
            );
        }

        *self = Self {
            header: Some(*header),
            ..Self::default()
        };
        Ok(ParseOptions::all()
            .with(Section::ParameterSampleCounts, false)
            .with(Section::ParameterValues, false)
            .with(Section::Metadata, false))
    }

    fn handle_elevational_samples(&mut self, samples: Vec<f32>) -> Result<(), DecodeError> {
        self.elevational_samples = samples;
        Ok(())
    }

    fn handle_cdf(&mut self, cdf: Vec<f32>) -> Result<(), DecodeError> {
        if self.cdf.is_none() {
            self.cdf = Some(cdf);
        }
        Ok(())
    }

    fn handle_series(&mut self, series: Vec<SeriesExtent>) -> Result<(), DecodeError> {
        self.series = series;
        Ok(())
    }

    fn handle_coefficients(&mut self, coefficients: Vec<f32>) -> Result<(), DecodeError> {
        self.coefficients = coefficients;
        Ok(())
    }
}

/// Read a file with the lenient validation policy and reduce it to the
/// first basis function.
///
/// Rejects files that are not flagged as a BSDF, use harmonic
/// extrapolation, have no basis functions, have a channel count other
/// than 1 or 3, or have fewer than [`MIN_ELEVATIONAL_SAMPLES`] samples.
///
/// # Errors
///
/// Any [`ValidatingReader`] error, or [`DecodeError::Rejected`] for the
/// conditions above.
pub fn read_standard_bsdf<R: Read>(input: R) -> Result<StandardBsdf, DecodeError> {
    let mut reader = ValidatingReader::new(Collector::default(), ValidationOptions::lenient());
    reader.read(input)?;
    let collected = reader.into_inner();

    let header = collected
        .header
        .ok_or_else(|| DecodeError::rejected("the input was never started"))?;
    if collected.elevational_samples.len() < MIN_ELEVATIONAL_SAMPLES {
        return Err(DecodeError::rejected(format!(
            "the input must contain at least {MIN_ELEVATIONAL_SAMPLES} elevational samples"
        )));
    }

    let channels = if header.num_color_channels == 3 { 3 } else { 1 };
    let mut split: [Vec<f32>; 3] = Default::default();
    let mut series = Vec::with_capacity(collected.series.len());

    for extent in &collected.series {
        let length = extent.length as usize;
        series.push(ChannelExtent {
            offset: split[0].len(),
            length,
        });
        if length == 0 {
            continue;
        }

        // The first basis function's runs for each channel, back to back.
        let start = extent.offset as usize;
        let run = collected
            .coefficients
            .get(start..start + length * channels)
            .ok_or_else(|| DecodeError::rejected("series extent out of bounds"))?;
        for (channel, values) in run.chunks_exact(length).enumerate() {
            split[channel].extend_from_slice(values);
        }
    }
    trace!(
        "standard reader: {} cells, {} coefficients per channel",
        series.len(),
        split[0].len()
    );

    let [y_coefficients, r_coefficients, b_coefficients] = split;
    Ok(StandardBsdf {
        elevational_samples: collected.elevational_samples,
        cdf: collected.cdf.unwrap_or_default(),
        y_coefficients,
        r_coefficients,
        b_coefficients,
        series,
        num_color_channels: channels,
        index_of_refraction: header.index_of_refraction,
        roughness_top: header.roughness_top,
        roughness_bottom: header.roughness_bottom,
    })
}
