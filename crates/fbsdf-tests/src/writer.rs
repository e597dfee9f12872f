//! Writes Fourier BSDF files for tests.
//!
//! [`BsdfData`] models the body the way a fitting tool produces it: a grid
//! of `N × N` cells, each holding one coefficient list per
//! `(basis function, channel)`, plus a `B × N × N` CDF grid.
//! [`make_bsdf_file`] lays that out on the wire. [`RawHeader`] writes any
//! header at all, including ones no valid file would carry, for the
//! rejection and hostile-size tests.

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use fbsdf_wire::header::{MAGIC, VERSION};
use fbsdf_wire::{BsdfHeader, HeaderFlags};

// ── Header ────────────────────────────────────────────────────────────────────

/// Every header field as raw bits, with no validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawHeader {
    pub magic: [u8; 7],
    pub version: u8,
    pub flags: u32,
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
    pub reserved: [u32; 2],
}

impl RawHeader {
    /// A valid header with every count zero.
    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            flags: HeaderFlags::IS_BSDF.raw(),
            num_elevational_samples: 0,
            num_coefficients: 0,
            length_longest_series: 0,
            num_color_channels: 0,
            num_basis_functions: 0,
            num_metadata_bytes: 0,
            num_parameters: 0,
            num_parameter_values: 0,
            index_of_refraction: 1.0,
            roughness_top: 1.0,
            roughness_bottom: 1.0,
            reserved: [0, 0],
        }
    }

    pub fn from_header(header: &BsdfHeader) -> Self {
        Self {
            magic: MAGIC,
            version: header.version,
            flags: header.flags.raw(),
            num_elevational_samples: header.num_elevational_samples,
            num_coefficients: header.num_coefficients,
            length_longest_series: header.length_longest_series,
            num_color_channels: header.num_color_channels,
            num_basis_functions: header.num_basis_functions,
            num_metadata_bytes: header.num_metadata_bytes,
            num_parameters: header.num_parameters,
            num_parameter_values: header.num_parameter_values,
            index_of_refraction: header.index_of_refraction,
            roughness_top: header.roughness_top,
            roughness_bottom: header.roughness_bottom,
            reserved: [0, 0],
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(&self.magic)?;
        out.write_u8(self.version)?;
        out.write_u32::<LittleEndian>(self.flags)?;
        for count in [
            self.num_elevational_samples,
            self.num_coefficients,
            self.length_longest_series,
            self.num_color_channels,
            self.num_basis_functions,
            self.num_metadata_bytes,
            self.num_parameters,
            self.num_parameter_values,
        ] {
            out.write_u32::<LittleEndian>(count)?;
        }
        out.write_f32::<LittleEndian>(self.index_of_refraction)?;
        out.write_f32::<LittleEndian>(self.roughness_top)?;
        out.write_f32::<LittleEndian>(self.roughness_bottom)?;
        out.write_u32::<LittleEndian>(self.reserved[0])?;
        out.write_u32::<LittleEndian>(self.reserved[1])
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(fbsdf_wire::HEADER_SIZE);
        self.write_to(&mut out).expect("writing into a Vec cannot fail");
        out
    }
}

impl Default for RawHeader {
    fn default() -> Self {
        Self::new()
    }
}

// ── Body ──────────────────────────────────────────────────────────────────────

/// Coefficient lists and CDF grid for one file.
#[derive(Clone, Debug)]
pub struct BsdfData {
    elevational_samples: Vec<f32>,
    // One entry per cell (y * N + x); each holds B * channels lists.
    series: Vec<Vec<Vec<f32>>>,
    cdf: Vec<f32>,
    num_basis_functions: usize,
    num_channels: usize,
}

/// Output of [`BsdfData::serialize_coefficients`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SerializedCoefficients {
    /// `(offset, length)` per cell, in cell order.
    pub series: Vec<(u32, u32)>,
    pub coefficients: Vec<f32>,
    /// Longest per-list length; written as `length_longest_series`.
    pub max_order: usize,
}

impl BsdfData {
    /// An `N × N` grid with empty coefficient lists and an all-zero CDF.
    pub fn new(
        elevational_samples: Vec<f32>,
        num_basis_functions: usize,
        num_channels: usize,
    ) -> Self {
        let n = elevational_samples.len();
        let lists = num_basis_functions * num_channels;
        Self {
            series: vec![vec![Vec::new(); lists]; n * n],
            cdf: vec![0.0; n * n * num_basis_functions],
            elevational_samples,
            num_basis_functions,
            num_channels,
        }
    }

    /// Append one coefficient to the `(basis_function, channel)` list of
    /// cell `(x, y)`.
    ///
    /// # Panics
    ///
    /// If any index is out of range.
    pub fn add_coefficient(
        &mut self,
        basis_function: usize,
        channel: usize,
        x: usize,
        y: usize,
        value: f32,
    ) {
        let n = self.elevational_samples.len();
        self.series[y * n + x][basis_function * self.num_channels + channel].push(value);
    }

    /// # Panics
    ///
    /// If any index is out of range.
    pub fn set_cdf(&mut self, basis_function: usize, x: usize, y: usize, value: f32) {
        let n = self.elevational_samples.len();
        self.cdf[basis_function * n * n + y * n + x] = value;
    }

    /// Lay the coefficient lists out contiguously, one cell after another,
    /// basis functions outermost and channels innermost within a cell.
    ///
    /// # Panics
    ///
    /// If the lists within one cell differ in length: the format stores a
    /// single length per cell.
    pub fn serialize_coefficients(&self) -> SerializedCoefficients {
        let mut out = SerializedCoefficients::default();
        for cell in &self.series {
            let length = cell.first().map_or(0, Vec::len);
            out.max_order = out.max_order.max(length);
            out.series.push((to_u32(out.coefficients.len()), to_u32(length)));
            for list in cell {
                assert_eq!(
                    list.len(),
                    length,
                    "all lists in a cell must have the same number of coefficients"
                );
                out.coefficients.extend_from_slice(list);
            }
        }
        out
    }

    pub fn elevational_samples(&self) -> &[f32] {
        &self.elevational_samples
    }

    pub fn cdf(&self) -> &[f32] {
        &self.cdf
    }

    pub fn num_basis_functions(&self) -> usize {
        self.num_basis_functions
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }
}

/// Everything in a file that [`BsdfData`] does not describe.
#[derive(Clone, Debug)]
pub struct FileOptions {
    pub flags: HeaderFlags,
    pub parameter_sample_counts: Vec<u32>,
    pub parameter_values: Vec<f32>,
    pub metadata: Vec<u8>,
    pub index_of_refraction: f32,
    pub roughness_top: f32,
    pub roughness_bottom: f32,
}

impl FileOptions {
    pub fn with_optics(
        index_of_refraction: f32,
        roughness_top: f32,
        roughness_bottom: f32,
    ) -> Self {
        Self {
            index_of_refraction,
            roughness_top,
            roughness_bottom,
            ..Self::default()
        }
    }
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            flags: HeaderFlags::IS_BSDF,
            parameter_sample_counts: Vec::new(),
            parameter_values: Vec::new(),
            metadata: Vec::new(),
            index_of_refraction: 1.0,
            roughness_top: 1.0,
            roughness_bottom: 1.0,
        }
    }
}

/// Serialize a complete file.
pub fn make_bsdf_file(data: &BsdfData, options: &FileOptions) -> Vec<u8> {
    let coefficients = data.serialize_coefficients();
    let header = RawHeader {
        flags: options.flags.raw(),
        num_elevational_samples: to_u32(data.elevational_samples.len()),
        num_coefficients: to_u32(coefficients.coefficients.len()),
        length_longest_series: to_u32(coefficients.max_order),
        num_color_channels: to_u32(data.num_channels),
        num_basis_functions: to_u32(data.num_basis_functions),
        num_metadata_bytes: to_u32(options.metadata.len()),
        num_parameters: to_u32(options.parameter_sample_counts.len()),
        num_parameter_values: to_u32(options.parameter_values.len()),
        index_of_refraction: options.index_of_refraction,
        roughness_top: options.roughness_top,
        roughness_bottom: options.roughness_bottom,
        ..RawHeader::new()
    };

    let mut out = Vec::new();
    write_file(&mut out, &header, data, &coefficients, options)
        .expect("writing into a Vec cannot fail");
    out
}

fn write_file<W: Write>(
    out: &mut W,
    header: &RawHeader,
    data: &BsdfData,
    coefficients: &SerializedCoefficients,
    options: &FileOptions,
) -> io::Result<()> {
    header.write_to(out)?;
    write_f32s(out, &data.elevational_samples)?;
    for &count in &options.parameter_sample_counts {
        out.write_u32::<LittleEndian>(count)?;
    }
    write_f32s(out, &options.parameter_values)?;
    write_f32s(out, &data.cdf)?;
    for &(offset, length) in &coefficients.series {
        out.write_u32::<LittleEndian>(offset)?;
        out.write_u32::<LittleEndian>(length)?;
    }
    write_f32s(out, &coefficients.coefficients)?;
    out.write_all(&options.metadata)
}

/// A BSDF-flagged file with every count zero.
pub fn make_empty_bsdf_file(
    index_of_refraction: f32,
    roughness_top: f32,
    roughness_bottom: f32,
) -> Vec<u8> {
    let data = BsdfData::new(Vec::new(), 0, 0);
    make_bsdf_file(
        &data,
        &FileOptions::with_optics(index_of_refraction, roughness_top, roughness_bottom),
    )
}

/// One sample, one basis function, one channel, one coefficient, one
/// parameter and four bytes of metadata.
///
/// ```text
///   samples      [1.0]
///   param counts [1]      param values [1.0]
///   cdf          [0.0]
///   series       [(0, 1)] coefficients [1.0]
///   metadata     "meta"
/// ```
pub fn make_minimal_bsdf_file(
    index_of_refraction: f32,
    roughness_top: f32,
    roughness_bottom: f32,
) -> Vec<u8> {
    single_cell_file(1.0, 0.0, 1.0, index_of_refraction, roughness_top, roughness_bottom)
}

/// Same shape as [`make_minimal_bsdf_file`] with a quiet NaN in every
/// float section.
pub fn make_non_finite_bsdf_file(
    index_of_refraction: f32,
    roughness_top: f32,
    roughness_bottom: f32,
) -> Vec<u8> {
    single_cell_file(
        f32::NAN,
        f32::NAN,
        f32::NAN,
        index_of_refraction,
        roughness_top,
        roughness_bottom,
    )
}

fn single_cell_file(
    sample: f32,
    cdf: f32,
    value: f32,
    index_of_refraction: f32,
    roughness_top: f32,
    roughness_bottom: f32,
) -> Vec<u8> {
    let mut data = BsdfData::new(vec![sample], 1, 1);
    data.add_coefficient(0, 0, 0, 0, value);
    data.set_cdf(0, 0, 0, cdf);
    let options = FileOptions {
        parameter_sample_counts: vec![1],
        parameter_values: vec![value],
        metadata: b"meta".to_vec(),
        ..FileOptions::with_optics(index_of_refraction, roughness_top, roughness_bottom)
    };
    make_bsdf_file(&data, &options)
}

fn write_f32s<W: Write>(out: &mut W, values: &[f32]) -> io::Result<()> {
    values
        .iter()
        .try_for_each(|&value| out.write_f32::<LittleEndian>(value))
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or_else(|_| panic!("{value} does not fit a u32 header field"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_just_a_header() {
        assert_eq!(make_empty_bsdf_file(1.0, 1.0, 1.0).len(), fbsdf_wire::HEADER_SIZE);
    }

    #[test]
    fn minimal_file_layout() {
        let bytes = make_minimal_bsdf_file(1.0, 1.0, 1.0);
        // header + sample + count + value + cdf + (offset, length) + coefficient + "meta"
        assert_eq!(bytes.len(), 64 + 4 + 4 + 4 + 4 + 8 + 4 + 4);
        assert_eq!(&bytes[bytes.len() - 4..], b"meta");

        let header = BsdfHeader::read_from(bytes.as_slice()).unwrap();
        assert_eq!(header.num_elevational_samples, 1);
        assert_eq!(header.num_coefficients, 1);
        assert_eq!(header.length_longest_series, 1);
        assert_eq!(header.num_metadata_bytes, 4);
    }

    #[test]
    fn coefficients_are_laid_out_cell_by_cell() {
        let mut data = BsdfData::new(vec![-1.0, 1.0], 1, 3);
        for channel in 0..3 {
            data.add_coefficient(0, channel, 1, 0, channel as f32);
            data.add_coefficient(0, channel, 1, 0, 10.0 + channel as f32);
        }
        data.add_coefficient(0, 0, 0, 1, 7.0);
        data.add_coefficient(0, 1, 0, 1, 8.0);
        data.add_coefficient(0, 2, 0, 1, 9.0);

        let out = data.serialize_coefficients();
        assert_eq!(out.series, vec![(0, 0), (0, 2), (6, 1), (9, 0)]);
        assert_eq!(
            out.coefficients,
            vec![0.0, 10.0, 1.0, 11.0, 2.0, 12.0, 7.0, 8.0, 9.0]
        );
        assert_eq!(out.max_order, 2);
    }

    #[test]
    fn body_is_written_little_endian() {
        let mut data = BsdfData::new(vec![0.5], 1, 1);
        data.add_coefficient(0, 0, 0, 0, -2.0);
        let options = FileOptions {
            parameter_sample_counts: vec![0x0102_0304],
            ..FileOptions::default()
        };
        let bytes = make_bsdf_file(&data, &options);

        let body = &bytes[fbsdf_wire::HEADER_SIZE..];
        assert_eq!(&body[..4], &0.5f32.to_bits().to_le_bytes());
        assert_eq!(&body[4..8], &[0x04, 0x03, 0x02, 0x01]);
        // CDF, then the single (offset, length) pair, then the coefficient.
        assert_eq!(&body[8..12], &[0; 4]);
        assert_eq!(&body[12..20], &[0, 0, 0, 0, 1, 0, 0, 0]);
        assert_eq!(&body[20..], &(-2.0f32).to_bits().to_le_bytes());
    }

    #[test]
    fn raw_header_round_trips_through_decoder() {
        let raw = RawHeader {
            num_elevational_samples: 3,
            num_color_channels: 3,
            num_basis_functions: 1,
            index_of_refraction: 1.5,
            ..RawHeader::new()
        };
        let header = BsdfHeader::read_from(raw.to_bytes().as_slice()).unwrap();
        assert_eq!(RawHeader::from_header(&header), raw);
    }
}
