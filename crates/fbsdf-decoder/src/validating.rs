use std::io::Read;
use std::mem;

use fbsdf_wire::BsdfHeader;

use crate::error::{DecodeError, ValidationError};
use crate::reader::{BsdfHandler, BsdfReader, ParseOptions};

/// Upper bound on the capacity reserved before the first element of a
/// section arrives. Buffers still grow to their full target as data
/// actually shows up.
const MAX_INITIAL_CAPACITY: usize = 1 << 16;

/// Policy switches for [`ValidatingReader`].
///
/// No `Default`: pick [`lenient`](Self::lenient) or
/// [`strict`](Self::strict), or set the fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ValidationOptions {
    /// Reject series longer than the header's `length_longest_series`.
    pub enforce_longest_series_length: bool,
    /// Tolerate one repeated `0.0` among the elevational samples.
    pub allow_duplicate_at_origin: bool,
    /// Clamp CDF values into `[0, 1]` instead of rejecting them.
    pub clamp_cdf: bool,
}

impl ValidationOptions {
    /// Accepts what common fitting tools actually write.
    #[must_use]
    pub const fn lenient() -> Self {
        Self {
            enforce_longest_series_length: false,
            allow_duplicate_at_origin: true,
            clamp_cdf: true,
        }
    }

    #[must_use]
    pub const fn strict() -> Self {
        Self {
            enforce_longest_series_length: true,
            allow_duplicate_at_origin: false,
            clamp_cdf: false,
        }
    }
}

/// One `(offset, length)` entry of the series section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SeriesExtent {
    pub offset: u32,
    pub length: u32,
}

/// Batched consumer behind a [`ValidatingReader`].
///
/// Each callback receives a whole, already validated section (the CDF
/// arrives once per basis function) and takes ownership of it.
pub trait BatchHandler {
    /// # Errors
    ///
    /// Any error aborts the read before a body byte is consumed.
    fn start(&mut self, header: &BsdfHeader) -> Result<ParseOptions, DecodeError>;

    /// # Errors
    ///
    /// Any error aborts the read.
    fn handle_elevational_samples(&mut self, _samples: Vec<f32>) -> Result<(), DecodeError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any error aborts the read.
    fn handle_parameter_sample_counts(&mut self, _counts: Vec<u32>) -> Result<(), DecodeError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any error aborts the read.
    fn handle_parameter_samples(&mut self, _samples: Vec<f32>) -> Result<(), DecodeError> {
        Ok(())
    }

    /// One `N × N` grid per basis function, in basis order.
    ///
    /// # Errors
    ///
    /// Any error aborts the read.
    fn handle_cdf(&mut self, _cdf: Vec<f32>) -> Result<(), DecodeError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any error aborts the read.
    fn handle_series(&mut self, _series: Vec<SeriesExtent>) -> Result<(), DecodeError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any error aborts the read.
    fn handle_coefficients(&mut self, _coefficients: Vec<f32>) -> Result<(), DecodeError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any error aborts the read.
    fn handle_metadata(&mut self, _metadata: Vec<u8>) -> Result<(), DecodeError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any error becomes the result of the read.
    fn finish(&mut self) -> Result<(), DecodeError> {
        Ok(())
    }
}

/// Header-derived sizes, fixed for the duration of one file.
#[derive(Clone, Copy, Debug)]
struct Dimensions {
    samples_1d: usize,
    length_longest_series: u32,
    coefficients_per_length: usize,
    num_coefficients: u32,
}

#[derive(Debug)]
enum Stage {
    Uninitialized,
    Started(Dimensions),
    Done,
}

/// Collects one section into a buffer of known final length.
struct Accumulator<T> {
    buf: Vec<T>,
    target: usize,
}

impl<T> Accumulator<T> {
    fn new(target: usize) -> Self {
        Self {
            buf: Vec::new(),
            target,
        }
    }

    fn len(&self) -> usize {
        self.buf.len()
    }

    fn last(&self) -> Option<&T> {
        self.buf.last()
    }

    /// Append a value; hand back the whole buffer once it reaches its
    /// target, leaving a fresh empty one in its place.
    fn push(&mut self, value: T) -> Option<Vec<T>> {
        if self.buf.capacity() == 0 {
            self.buf.reserve_exact(self.target.min(MAX_INITIAL_CAPACITY));
        }
        self.buf.push(value);
        (self.buf.len() == self.target).then(|| mem::take(&mut self.buf))
    }
}

/// Enforces the semantic rules of the format and regroups the per-scalar
/// stream into whole sections for a [`BatchHandler`].
///
/// ```text
///   BsdfReader ──scalars──► ValidatingReader ──Vec per section──► H
///                           ├── samples:      in [-1, 1], strictly increasing
///                           ├── cdf:          in [0, 1] (or clamped), rows start at 0
///                           ├── series:       within coefficients, optional length cap
///                           └── counts/params/coefficients: collected as-is
/// ```
///
/// Non-finite floats never reach this layer; the engine rejects them.
pub struct ValidatingReader<H> {
    options: ValidationOptions,
    handler: H,
    stage: Stage,
    duplicate_at_origin_seen: bool,
    cdf_batches: usize,
    elevational_samples: Accumulator<f32>,
    parameter_sample_counts: Accumulator<u32>,
    parameter_samples: Accumulator<f32>,
    cdf: Accumulator<f32>,
    series: Accumulator<SeriesExtent>,
    coefficients: Accumulator<f32>,
}

impl<H: BatchHandler> ValidatingReader<H> {
    pub fn new(handler: H, options: ValidationOptions) -> Self {
        Self {
            options,
            handler,
            stage: Stage::Uninitialized,
            duplicate_at_origin_seen: false,
            cdf_batches: 0,
            elevational_samples: Accumulator::new(0),
            parameter_sample_counts: Accumulator::new(0),
            parameter_samples: Accumulator::new(0),
            cdf: Accumulator::new(0),
            series: Accumulator::new(0),
            coefficients: Accumulator::new(0),
        }
    }

    /// Read a whole file from `input` into the wrapped handler.
    ///
    /// # Errors
    ///
    /// See [`BsdfReader::read`]; additionally [`DecodeError::Invalid`]
    /// for any rule this layer enforces.
    pub fn read<R: Read>(&mut self, input: R) -> Result<(), DecodeError> {
        BsdfReader::read(input, self)
    }

    pub fn options(&self) -> ValidationOptions {
        self.options
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_inner(self) -> H {
        self.handler
    }

    fn dimensions(&self) -> Result<Dimensions, DecodeError> {
        match self.stage {
            Stage::Started(dimensions) => Ok(dimensions),
            Stage::Uninitialized | Stage::Done => Err(ValidationError::NotStarted.into()),
        }
    }
}

fn to_usize(value: u32) -> Result<usize, ValidationError> {
    usize::try_from(value).map_err(|_| ValidationError::InputTooLarge)
}

impl<H: BatchHandler> BsdfHandler for ValidatingReader<H> {
    fn start(&mut self, header: &BsdfHeader) -> Result<ParseOptions, DecodeError> {
        let samples_1d = to_usize(header.num_elevational_samples)?;
        let samples_2d = samples_1d
            .checked_mul(samples_1d)
            .ok_or(ValidationError::InputTooLarge)?;
        let coefficients_per_length = header
            .coefficients_per_length()
            .ok_or(ValidationError::InputTooLarge)?;

        self.elevational_samples = Accumulator::new(samples_1d);
        self.parameter_sample_counts = Accumulator::new(to_usize(header.num_parameters)?);
        self.parameter_samples = Accumulator::new(to_usize(header.num_parameter_values)?);
        self.cdf = Accumulator::new(samples_2d);
        self.series = Accumulator::new(samples_2d);
        self.coefficients = Accumulator::new(to_usize(header.num_coefficients)?);
        self.duplicate_at_origin_seen = false;
        self.cdf_batches = 0;
        self.stage = Stage::Started(Dimensions {
            samples_1d,
            length_longest_series: header.length_longest_series,
            coefficients_per_length,
            num_coefficients: header.num_coefficients,
        });

        self.handler.start(header)
    }

    #[allow(clippy::float_cmp)]
    fn handle_elevational_sample(&mut self, value: f32) -> Result<(), DecodeError> {
        self.dimensions()?;
        if !(-1.0..=1.0).contains(&value) {
            return Err(ValidationError::ElevationalSampleOutOfRange { value }.into());
        }

        if let Some(&previous) = self.elevational_samples.last() {
            if value <= previous {
                let tolerated = self.options.allow_duplicate_at_origin
                    && !self.duplicate_at_origin_seen
                    && previous == 0.0
                    && value == 0.0;
                if !tolerated {
                    return Err(ValidationError::ImproperlyOrdered { previous, value }.into());
                }
                self.duplicate_at_origin_seen = true;
            }
        }

        if let Some(samples) = self.elevational_samples.push(value) {
            self.handler.handle_elevational_samples(samples)?;
        }
        Ok(())
    }

    fn handle_sample_count(&mut self, count: u32) -> Result<(), DecodeError> {
        self.dimensions()?;
        if let Some(counts) = self.parameter_sample_counts.push(count) {
            self.handler.handle_parameter_sample_counts(counts)?;
        }
        Ok(())
    }

    fn handle_sample_position(&mut self, value: f32) -> Result<(), DecodeError> {
        self.dimensions()?;
        if let Some(samples) = self.parameter_samples.push(value) {
            self.handler.handle_parameter_samples(samples)?;
        }
        Ok(())
    }

    fn handle_cdf(&mut self, value: f32) -> Result<(), DecodeError> {
        let dimensions = self.dimensions()?;
        let value = if self.options.clamp_cdf {
            value.clamp(0.0, 1.0)
        } else if (0.0..=1.0).contains(&value) {
            value
        } else {
            return Err(ValidationError::CdfValueOutOfRange { value }.into());
        };

        let index = self.cdf.len();
        let row_start = index.checked_rem(dimensions.samples_1d) == Some(0);
        if row_start && value != 0.0 {
            return Err(ValidationError::CdfRowDoesNotStartWithZero {
                basis_function: self.cdf_batches,
                row: index / dimensions.samples_1d,
                value,
            }
            .into());
        }

        if let Some(cdf) = self.cdf.push(value) {
            self.cdf_batches += 1;
            self.handler.handle_cdf(cdf)?;
        }
        Ok(())
    }

    fn handle_series(&mut self, offset: u32, length: u32) -> Result<(), DecodeError> {
        let dimensions = self.dimensions()?;
        if self.options.enforce_longest_series_length && length > dimensions.length_longest_series {
            return Err(ValidationError::SeriesTooLong {
                length,
                max: dimensions.length_longest_series,
            }
            .into());
        }

        let span = to_usize(length)?
            .checked_mul(dimensions.coefficients_per_length)
            .ok_or(ValidationError::InputTooLarge)?;
        let num_coefficients = to_usize(dimensions.num_coefficients)?;
        let start = to_usize(offset)?;

        if length != 0 && start >= num_coefficients {
            return Err(ValidationError::OffsetOutOfBounds {
                offset,
                num_coefficients: dimensions.num_coefficients,
            }
            .into());
        }
        if span != 0 && start.checked_add(span).is_none_or(|end| end > num_coefficients) {
            return Err(ValidationError::SeriesOutOfBounds {
                offset,
                span,
                num_coefficients: dimensions.num_coefficients,
            }
            .into());
        }

        if let Some(series) = self.series.push(SeriesExtent { offset, length }) {
            self.handler.handle_series(series)?;
        }
        Ok(())
    }

    fn handle_coefficient(&mut self, value: f32) -> Result<(), DecodeError> {
        self.dimensions()?;
        if let Some(coefficients) = self.coefficients.push(value) {
            self.handler.handle_coefficients(coefficients)?;
        }
        Ok(())
    }

    fn handle_metadata(&mut self, data: Vec<u8>) -> Result<(), DecodeError> {
        self.dimensions()?;
        self.handler.handle_metadata(data)
    }

    fn finish(&mut self) -> Result<(), DecodeError> {
        self.dimensions()?;
        self.stage = Stage::Done;
        self.handler.finish()
    }
}
