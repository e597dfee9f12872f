//! Fourier BSDF tables in the layout a PBRT-style renderer samples from.

use std::io::Read;

use fbsdf_wire::{BsdfHeader, Section};
use log::{debug, trace};

use crate::error::DecodeError;
use crate::reader::{BsdfHandler, BsdfReader, ParseOptions};

/// Measured Fourier BSDF data, flattened for lookup by zenith-angle index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FourierTable {
    /// Relative index of refraction across the surface boundary.
    pub eta: f32,

    /// Largest order `m` of any series; bounds every entry of `m`.
    pub m_max: usize,

    /// 1 for monochromatic data, 3 for luminance/red/blue.
    pub n_channels: usize,

    /// Zenith angle cosines, sorted low to high.
    pub mu: Vec<f32>,

    /// `mu.len() × mu.len()` CDF grid.
    pub cdf: Vec<f32>,

    /// Series order per `(i, o)` cell.
    pub m: Vec<usize>,

    /// Offset into `a` per cell. With three channels the `m` luminance
    /// coefficients come first, then red, then blue. Never past `a.len()`;
    /// empty cells whose file offset lies beyond the pool point at its end.
    pub a_offset: Vec<usize>,

    /// Every coefficient in the file.
    pub a: Vec<f32>,

    /// First coefficient of each cell, or 0 for empty cells.
    pub a0: Vec<f32>,
}

impl FourierTable {
    /// Order and coefficients for incident index `offset_i` and outgoing
    /// index `offset_o`.
    ///
    /// The slice runs to the end of `a`; only the first `m × n_channels`
    /// values belong to the cell.
    ///
    /// # Panics
    ///
    /// If either index is not below `mu.len()`.
    #[must_use]
    pub fn get_ak(&self, offset_i: usize, offset_o: usize) -> (usize, &[f32]) {
        let offset = offset_o * self.mu.len() + offset_i;
        (self.m[offset], &self.a[self.a_offset[offset]..])
    }
}

/// Per-scalar handler that builds a [`FourierTable`].
///
/// Accepts only BSDF-flagged files with a single basis function and one
/// or three channels, i.e. uniform, non-textured materials.
#[derive(Debug, Default)]
pub struct PbrtBsdfReader {
    table: FourierTable,
}

impl PbrtBsdfReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a whole file into a table.
    ///
    /// # Errors
    ///
    /// Any [`BsdfReader::read`] error, or [`DecodeError::Rejected`] for a
    /// file outside the supported subset or with a series that runs past
    /// the coefficients.
    pub fn read<R: Read>(input: R) -> Result<FourierTable, DecodeError> {
        let mut reader = Self::new();
        BsdfReader::read(input, &mut reader)?;
        Ok(reader.into_table())
    }

    #[must_use]
    pub fn into_table(self) -> FourierTable {
        self.table
    }
}

fn to_usize(value: u32) -> Result<usize, DecodeError> {
    usize::try_from(value).map_err(|_| DecodeError::rejected("input too large to fit in memory"))
}

impl BsdfHandler for PbrtBsdfReader {
    fn start(&mut self, header: &BsdfHeader) -> Result<ParseOptions, DecodeError> {
        let supported = header.flags.is_bsdf()
            && !header.flags.uses_harmonic_extrapolation()
            && matches!(header.num_color_channels, 1 | 3)
            && header.num_basis_functions == 1;
        if !supported {
            return Err(DecodeError::rejected(format!(
                "unsupported BSDF file format: flags {:#x}, {} channels, {} basis functions",
                header.flags.raw(),
                header.num_color_channels,
                header.num_basis_functions
            )));
        }

        self.table = FourierTable {
            eta: header.index_of_refraction,
            m_max: to_usize(header.length_longest_series)?,
            n_channels: to_usize(header.num_color_channels)?,
            ..FourierTable::default()
        };
        debug!(
            "pbrt table: {} samples, {} coefficients, m_max {}",
            header.num_elevational_samples, header.num_coefficients, header.length_longest_series
        );

        Ok(ParseOptions::none()
            .with(Section::ElevationalSamples, true)
            .with(Section::Cdf, true)
            .with(Section::Series, true)
            .with(Section::Coefficients, true))
    }

    fn handle_elevational_sample(&mut self, value: f32) -> Result<(), DecodeError> {
        self.table.mu.push(value);
        Ok(())
    }

    fn handle_cdf(&mut self, value: f32) -> Result<(), DecodeError> {
        self.table.cdf.push(value);
        Ok(())
    }

    fn handle_series(&mut self, offset: u32, length: u32) -> Result<(), DecodeError> {
        let length = to_usize(length)?;
        if length > self.table.m_max {
            return Err(DecodeError::rejected(format!(
                "series of order {length} exceeds the declared maximum {}",
                self.table.m_max
            )));
        }
        self.table.a_offset.push(to_usize(offset)?);
        self.table.m.push(length);
        Ok(())
    }

    fn handle_coefficient(&mut self, value: f32) -> Result<(), DecodeError> {
        self.table.a.push(value);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DecodeError> {
        let table = &mut self.table;
        let mut a0 = Vec::with_capacity(table.m.len());
        for (offset, &m) in table.a_offset.iter_mut().zip(&table.m) {
            if m == 0 {
                *offset = (*offset).min(table.a.len());
                a0.push(0.0);
                continue;
            }
            let offset = *offset;
            let end = m
                .checked_mul(table.n_channels)
                .and_then(|span| offset.checked_add(span))
                .filter(|&end| end <= table.a.len());
            if end.is_none() {
                return Err(DecodeError::rejected(format!(
                    "series at offset {offset} of order {m} runs past {} coefficients",
                    table.a.len()
                )));
            }
            a0.push(table.a[offset]);
        }
        table.a0 = a0;
        trace!("pbrt table: computed a0 for {} cells", table.a0.len());
        Ok(())
    }
}
