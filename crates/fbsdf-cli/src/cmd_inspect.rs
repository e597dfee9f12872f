/// Implementation of `fbsdf inspect`.
///
/// Decodes the 64-byte header, prints every field, then lists each body
/// section's element count and byte length. The body is walked with every
/// section skipped, so a truncated file still fails here even though no
/// value is decoded.
///
/// # Output format
///
/// ```text
/// Header: SCATFUN v1, flags=0x00000001 (bsdf)
///   elevational samples   5
///   coefficients          150
///   longest series        3
///   color channels        3
///   basis functions       1
///   metadata bytes        8
///   parameters            0
///   parameter values      0
///   index of refraction   1
///   roughness (top)       0.1
///   roughness (bottom)    0.1
/// Sections:
///   elevational samples           5 ×  4 B =        20 B
///   ...
/// ---
/// Body: 598 bytes, complete
/// ```
use std::io::Read;

use anyhow::{Context, Result};
use fbsdf_decoder::{BsdfHandler, BsdfReader, DecodeError, ParseOptions};
use fbsdf_wire::section::body_len;
use fbsdf_wire::{BsdfHeader, Section};
use serde::Serialize;

use crate::InspectArgs;
use crate::input;

#[derive(Serialize)]
struct InspectReport {
    file: String,
    version: u8,
    flags: u32,
    is_bsdf: bool,
    uses_harmonic_extrapolation: bool,
    num_elevational_samples: u32,
    num_coefficients: u32,
    length_longest_series: u32,
    num_color_channels: u32,
    num_basis_functions: u32,
    num_metadata_bytes: u32,
    num_parameters: u32,
    num_parameter_values: u32,
    index_of_refraction: f32,
    roughness_top: f32,
    roughness_bottom: f32,
    sections: Vec<SectionReport>,
    body_bytes: u64,
}

#[derive(Serialize)]
struct SectionReport {
    name: &'static str,
    elements: u64,
    element_size: u64,
    bytes: u64,
}

/// Accepts any header and skips every section.
struct SkipAll;

impl BsdfHandler for SkipAll {
    fn start(&mut self, _header: &BsdfHeader) -> Result<ParseOptions, DecodeError> {
        Ok(ParseOptions::none())
    }
}

/// Run the `fbsdf inspect` command.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, the header is invalid,
/// a section size overflows, or the body is shorter than the header says.
pub fn run(args: &InspectArgs) -> Result<()> {
    let mut reader = input::open(&args.file)?;
    let header = BsdfHeader::read_from(&mut reader)
        .with_context(|| format!("invalid header in {}", args.file.display()))?;
    let report = build_report(&args.file.display().to_string(), &header)?;

    check_body(&mut reader, &header)
        .with_context(|| format!("failed to walk the body of {}", args.file.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn check_body<R: Read>(reader: R, header: &BsdfHeader) -> Result<(), DecodeError> {
    BsdfReader::read_body(reader, header, &mut SkipAll)
}

fn build_report(file: &str, header: &BsdfHeader) -> Result<InspectReport> {
    let sections = Section::ALL
        .iter()
        .map(|&section| -> Result<SectionReport> {
            Ok(SectionReport {
                name: section.name(),
                elements: section.element_count(header)?,
                element_size: section.element_size(),
                bytes: section.byte_len(header)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(InspectReport {
        file: file.to_string(),
        version: header.version,
        flags: header.flags.raw(),
        is_bsdf: header.flags.is_bsdf(),
        uses_harmonic_extrapolation: header.flags.uses_harmonic_extrapolation(),
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
        sections,
        body_bytes: body_len(header)?,
    })
}

fn print_report(report: &InspectReport) {
    let mut flag_names = Vec::new();
    if report.is_bsdf {
        flag_names.push("bsdf");
    }
    if report.uses_harmonic_extrapolation {
        flag_names.push("harmonic extrapolation");
    }

    println!(
        "Header: SCATFUN v{}, flags={:#010X} ({})",
        report.version,
        report.flags,
        if flag_names.is_empty() { "none".to_string() } else { flag_names.join(", ") }
    );
    println!("  elevational samples   {}", report.num_elevational_samples);
    println!("  coefficients          {}", report.num_coefficients);
    println!("  longest series        {}", report.length_longest_series);
    println!("  color channels        {}", report.num_color_channels);
    println!("  basis functions       {}", report.num_basis_functions);
    println!("  metadata bytes        {}", report.num_metadata_bytes);
    println!("  parameters            {}", report.num_parameters);
    println!("  parameter values      {}", report.num_parameter_values);
    println!("  index of refraction   {}", report.index_of_refraction);
    println!("  roughness (top)       {}", report.roughness_top);
    println!("  roughness (bottom)    {}", report.roughness_bottom);

    println!("Sections:");
    for section in &report.sections {
        println!(
            "  {:<24} {:>10} × {:>2} B = {:>12} B",
            section.name, section.elements, section.element_size, section.bytes
        );
    }
    println!("---");
    println!("Body: {} bytes, complete", report.body_bytes);
}

#[cfg(test)]
mod tests {
    use fbsdf_tests::writer::make_minimal_bsdf_file;
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn report_lists_sections_in_wire_order() {
        let bytes = make_minimal_bsdf_file(1.0, 1.0, 1.0);
        let header = BsdfHeader::read_from(bytes.as_slice()).unwrap();
        let report = build_report("minimal.bsdf", &header).unwrap();

        let names: Vec<_> = report.sections.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            [
                "elevational samples",
                "parameter sample counts",
                "parameter values",
                "CDF",
                "series extents",
                "coefficients",
                "metadata"
            ]
        );
        assert_eq!(report.body_bytes, 4 + 4 + 4 + 4 + 8 + 4 + 4);
    }

    #[test]
    fn json_report_for_minimal_file() {
        let bytes = make_minimal_bsdf_file(1.0, 1.0, 1.0);
        let header = BsdfHeader::read_from(bytes.as_slice()).unwrap();
        let report = build_report("minimal.bsdf", &header).unwrap();
        let json = serde_json::to_string_pretty(&report).unwrap();

        assert_snapshot!(json, @r#"
        {
          "file": "minimal.bsdf",
          "version": 1,
          "flags": 1,
          "is_bsdf": true,
          "uses_harmonic_extrapolation": false,
          "num_elevational_samples": 1,
          "num_coefficients": 1,
          "length_longest_series": 1,
          "num_color_channels": 1,
          "num_basis_functions": 1,
          "num_metadata_bytes": 4,
          "num_parameters": 1,
          "num_parameter_values": 1,
          "index_of_refraction": 1.0,
          "roughness_top": 1.0,
          "roughness_bottom": 1.0,
          "sections": [
            {
              "name": "elevational samples",
              "elements": 1,
              "element_size": 4,
              "bytes": 4
            },
            {
              "name": "parameter sample counts",
              "elements": 1,
              "element_size": 4,
              "bytes": 4
            },
            {
              "name": "parameter values",
              "elements": 1,
              "element_size": 4,
              "bytes": 4
            },
            {
              "name": "CDF",
              "elements": 1,
              "element_size": 4,
              "bytes": 4
            },
            {
              "name": "series extents",
              "elements": 1,
              "element_size": 8,
              "bytes": 8
            },
            {
              "name": "coefficients",
              "elements": 1,
              "element_size": 4,
              "bytes": 4
            },
            {
              "name": "metadata",
              "elements": 4,
              "element_size": 1,
              "bytes": 4
            }
          ],
          "body_bytes": 32
        }
        "#);
    }

    #[test]
    fn truncated_body_fails_the_walk() {
        let bytes = make_minimal_bsdf_file(1.0, 1.0, 1.0);
        let mut input = &bytes[..bytes.len() - 2];
        let header = BsdfHeader::read_from(&mut input).unwrap();
        assert!(check_body(input, &header).unwrap_err().is_unexpected_eof());
    }
}
