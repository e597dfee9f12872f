/// Implementation of `fbsdf extract`.
///
/// Reads the file through the standard reader (lenient validation, first
/// basis function only, channels de-interleaved) and prints a summary.
///
/// # Output format
///
/// ```text
/// Elevational samples: 5 (-1 .. 1)
/// Color channels:      3
/// Coefficients:        y=50 r=50 b=50
/// Longest series:      3
/// Index of refraction: 1
/// Roughness:           top=0.1 bottom=0.1
/// ```
use anyhow::{Context, Result};
use fbsdf_decoder::{StandardBsdf, read_standard_bsdf};
use serde::Serialize;

use crate::ExtractArgs;
use crate::input;

#[derive(Debug, PartialEq, Serialize)]
struct ExtractSummary {
    elevational_samples: usize,
    min_sample: Option<f32>,
    max_sample: Option<f32>,
    num_color_channels: usize,
    cdf_values: usize,
    y_coefficients: usize,
    r_coefficients: usize,
    b_coefficients: usize,
    longest_series: usize,
    index_of_refraction: f32,
    roughness_top: f32,
    roughness_bottom: f32,
}

impl ExtractSummary {
    fn new(bsdf: &StandardBsdf) -> Self {
        Self {
            elevational_samples: bsdf.elevational_samples.len(),
            min_sample: bsdf.elevational_samples.first().copied(),
            max_sample: bsdf.elevational_samples.last().copied(),
            num_color_channels: bsdf.num_color_channels,
            cdf_values: bsdf.cdf.len(),
            y_coefficients: bsdf.y_coefficients.len(),
            r_coefficients: bsdf.r_coefficients.len(),
            b_coefficients: bsdf.b_coefficients.len(),
            longest_series: bsdf.series.iter().map(|s| s.length).max().unwrap_or(0),
            index_of_refraction: bsdf.index_of_refraction,
            roughness_top: bsdf.roughness_top,
            roughness_bottom: bsdf.roughness_bottom,
        }
    }
}

/// Run the `fbsdf extract` command.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, fails validation, or
/// falls outside what the standard reader accepts.
pub fn run(args: &ExtractArgs) -> Result<()> {
    let input = input::open(&args.file)?;
    let bsdf = read_standard_bsdf(input)
        .with_context(|| format!("failed to extract {}", args.file.display()))?;
    let summary = ExtractSummary::new(&bsdf);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    match (summary.min_sample, summary.max_sample) {
        (Some(lo), Some(hi)) => {
            println!("Elevational samples: {} ({lo} .. {hi})", summary.elevational_samples);
        }
        _ => println!("Elevational samples: 0"),
    }
    println!("Color channels:      {}", summary.num_color_channels);
    if summary.num_color_channels == 3 {
        println!(
            "Coefficients:        y={} r={} b={}",
            summary.y_coefficients, summary.r_coefficients, summary.b_coefficients
        );
    } else {
        println!("Coefficients:        {}", summary.y_coefficients);
    }
    println!("Longest series:      {}", summary.longest_series);
    println!("Index of refraction: {}", summary.index_of_refraction);
    println!(
        "Roughness:           top={} bottom={}",
        summary.roughness_top, summary.roughness_bottom
    );
    Ok(())
}
