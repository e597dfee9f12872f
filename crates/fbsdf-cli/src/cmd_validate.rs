/// Implementation of `fbsdf validate`.
///
/// Runs the validating reader over every section of the file and reports
/// either a series of success checkmarks (`✓`) or a diagnostic failure
/// line (`✗`). The command exits with code 0 on a valid file and code 1
/// on any error.
///
/// # Success output
///
/// ```text
/// ✓ Header: valid (SCATFUN v1, policy: lenient)
/// ✓ Elevational samples: 5 in [-1, 1], strictly increasing
/// ✓ Parameters: 0 sample counts, 0 values
/// ✓ CDF: 1 basis function, every row starts at zero
/// ✓ Series: 25 extents within 150 coefficients
/// ✓ Metadata: 8 bytes
/// ```
///
/// # Failure output
///
/// ```text
/// ✗ Error: input contained elevational samples that were improperly ordered: 0.25 after 0.75
/// ```
use anyhow::{Result, anyhow};
use fbsdf_decoder::{
    BatchHandler, BsdfHeader, DecodeError, ParseOptions, SeriesExtent, ValidatingReader,
    ValidationOptions,
};
use log::debug;

use crate::ValidateArgs;
use crate::input;

/// Counts what each batch contained; keeps none of the data.
#[derive(Default)]
struct Tally {
    header: Option<BsdfHeader>,
    elevational_samples: usize,
    parameter_sample_counts: usize,
    parameter_values: usize,
    cdf_batches: usize,
    series: usize,
    coefficients: usize,
    metadata_bytes: usize,
}

impl BatchHandler for Tally {
    fn start(&mut self, header: &BsdfHeader) -> Result<ParseOptions, DecodeError> {
        *self = Self {
            header: Some(*header),
            ..Self::default()
        };
        Ok(ParseOptions::all())
    }

    fn handle_elevational_samples(&mut self, samples: Vec<f32>) -> Result<(), DecodeError> {
        self.elevational_samples = samples.len();
        Ok(())
    }

    fn handle_parameter_sample_counts(&mut self, counts: Vec<u32>) -> Result<(), DecodeError> {
        self.parameter_sample_counts = counts.len();
        Ok(())
    }

    fn handle_parameter_samples(&mut self, samples: Vec<f32>) -> Result<(), DecodeError> {
        self.parameter_values = samples.len();
        Ok(())
    }

    fn handle_cdf(&mut self, _cdf: Vec<f32>) -> Result<(), DecodeError> {
        self.cdf_batches += 1;
        Ok(())
    }

    fn handle_series(&mut self, series: Vec<SeriesExtent>) -> Result<(), DecodeError> {
        self.series = series.len();
        Ok(())
    }

    fn handle_coefficients(&mut self, coefficients: Vec<f32>) -> Result<(), DecodeError> {
        self.coefficients = coefficients.len();
        Ok(())
    }

    fn handle_metadata(&mut self, metadata: Vec<u8>) -> Result<(), DecodeError> {
        self.metadata_bytes = metadata.len();
        Ok(())
    }
}

/// Run the `fbsdf validate` command.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or fails any check.
pub fn run(args: &ValidateArgs) -> Result<()> {
    let options = validation_options(args);
    debug!("validating {} with {options:?}", args.file.display());

    let input = input::open(&args.file)?;
    let mut reader = ValidatingReader::new(Tally::default(), options);

    match reader.read(input) {
        Ok(()) => {
            print_success(reader.handler(), options);
            Ok(())
        }
        Err(e) => {
            println!("✗ Error: {e}");
            Err(anyhow!("validation failed"))
        }
    }
}

/// Lenient unless `--strict`, then tightened flag by flag.
fn validation_options(args: &ValidateArgs) -> ValidationOptions {
    let mut options = if args.strict {
        ValidationOptions::strict()
    } else {
        ValidationOptions::lenient()
    };
    if args.enforce_longest_series {
        options.enforce_longest_series_length = true;
    }
    if args.no_duplicate_origin {
        options.allow_duplicate_at_origin = false;
    }
    if args.no_clamp_cdf {
        options.clamp_cdf = false;
    }
    options
}

fn policy_name(options: ValidationOptions) -> &'static str {
    if options == ValidationOptions::strict() {
        "strict"
    } else if options == ValidationOptions::lenient() {
        "lenient"
    } else {
        "custom"
    }
}

fn print_success(tally: &Tally, options: ValidationOptions) {
    let version = tally.header.map_or(0, |h| h.version);
    let num_coefficients = tally.header.map_or(0, |h| h.num_coefficients);

    println!("✓ Header: valid (SCATFUN v{version}, policy: {})", policy_name(options));
    println!(
        "✓ Elevational samples: {} in [-1, 1], strictly increasing",
        tally.elevational_samples
    );
    println!(
        "✓ Parameters: {} sample counts, {} values",
        tally.parameter_sample_counts, tally.parameter_values
    );
    println!(
        "✓ CDF: {} basis function{}, every row starts at zero",
        tally.cdf_batches,
        if tally.cdf_batches == 1 { "" } else { "s" }
    );
    println!(
        "✓ Series: {} extents within {num_coefficients} coefficients",
        tally.series
    );
    println!("✓ Metadata: {} bytes", tally.metadata_bytes);
}
