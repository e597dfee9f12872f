//! Named fixture files with their expected header parameters.
//!
//! Each fixture is generated by a builder over [`crate::writer`], kept
//! zstd-compressed once built, and handed out through a decompressing
//! reader, so tests read fixtures the same way the CLI reads `.zst` files.

use std::io::{self, Read};
use std::sync::OnceLock;

use fbsdf_wire::HeaderFlags;

use crate::writer::{
    BsdfData, FileOptions, make_bsdf_file, make_empty_bsdf_file, make_minimal_bsdf_file,
};

const COMPRESSION_LEVEL: i32 = 3;

/// Header values a fixture is expected to report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixtureParams {
    pub is_bsdf: bool,
    pub uses_harmonic_extrapolation: bool,
    pub num_elevational_samples: u32,
    pub num_basis_functions: u32,
    pub num_coefficients: u32,
    pub num_color_channels: u32,
    pub longest_series_length: u32,
    pub num_parameters: u32,
    pub num_parameter_values: u32,
    pub metadata_size_bytes: u32,
    pub index_of_refraction: f32,
    pub roughness_top: f32,
    pub roughness_bottom: f32,
}

impl FixtureParams {
    pub fn flags(&self) -> HeaderFlags {
        let mut flags = HeaderFlags::NONE;
        if self.is_bsdf {
            flags = flags | HeaderFlags::IS_BSDF;
        }
        if self.uses_harmonic_extrapolation {
            flags = flags | HeaderFlags::USES_HARMONIC_EXTRAPOLATION;
        }
        flags
    }
}

#[derive(Debug)]
pub struct Fixture {
    pub name: &'static str,
    pub params: FixtureParams,
    build: fn() -> Vec<u8>,
    compressed: OnceLock<Vec<u8>>,
}

impl Fixture {
    /// The uncompressed file.
    pub fn bytes(&self) -> Vec<u8> {
        (self.build)()
    }

    /// The zstd-compressed file, built on first use.
    pub fn compressed(&self) -> io::Result<&[u8]> {
        if let Some(bytes) = self.compressed.get() {
            return Ok(bytes);
        }
        let bytes = zstd::encode_all(self.bytes().as_slice(), COMPRESSION_LEVEL)?;
        Ok(self.compressed.get_or_init(|| bytes))
    }

    /// A reader yielding the uncompressed file.
    pub fn open(&'static self) -> io::Result<impl Read + 'static> {
        zstd::Decoder::new(self.compressed()?)
    }
}

/// Every registered fixture.
pub static FIXTURES: [Fixture; 6] = [
    Fixture {
        name: "empty",
        params: FixtureParams {
            is_bsdf: true,
            uses_harmonic_extrapolation: false,
            num_elevational_samples: 0,
            num_basis_functions: 0,
            num_coefficients: 0,
            num_color_channels: 0,
            longest_series_length: 0,
            num_parameters: 0,
            num_parameter_values: 0,
            metadata_size_bytes: 0,
            index_of_refraction: 1.0,
            roughness_top: 1.0,
            roughness_bottom: 1.0,
        },
        build: || make_empty_bsdf_file(1.0, 1.0, 1.0),
        compressed: OnceLock::new(),
    },
    Fixture {
        name: "minimal",
        params: FixtureParams {
            is_bsdf: true,
            uses_harmonic_extrapolation: false,
            num_elevational_samples: 1,
            num_basis_functions: 1,
            num_coefficients: 1,
            num_color_channels: 1,
            longest_series_length: 1,
            num_parameters: 1,
            num_parameter_values: 1,
            metadata_size_bytes: 4,
            index_of_refraction: 1.0,
            roughness_top: 1.0,
            roughness_bottom: 1.0,
        },
        build: || make_minimal_bsdf_file(1.0, 1.0, 1.0),
        compressed: OnceLock::new(),
    },
    Fixture {
        name: "rgb_grid",
        params: FixtureParams {
            is_bsdf: true,
            uses_harmonic_extrapolation: false,
            num_elevational_samples: 5,
            num_basis_functions: 1,
            num_coefficients: 150,
            num_color_channels: 3,
            longest_series_length: 3,
            num_parameters: 0,
            num_parameter_values: 0,
            metadata_size_bytes: 8,
            index_of_refraction: 1.0,
            roughness_top: 0.1,
            roughness_bottom: 0.1,
        },
        build: build_rgb_grid,
        compressed: OnceLock::new(),
    },
    Fixture {
        name: "mono_glass",
        params: FixtureParams {
            is_bsdf: true,
            uses_harmonic_extrapolation: false,
            num_elevational_samples: 6,
            num_basis_functions: 1,
            num_coefficients: 91,
            num_color_channels: 1,
            longest_series_length: 6,
            num_parameters: 0,
            num_parameter_values: 0,
            metadata_size_bytes: 20,
            index_of_refraction: 1.5046,
            roughness_top: 0.2,
            roughness_bottom: 0.2,
        },
        build: build_mono_glass,
        compressed: OnceLock::new(),
    },
    Fixture {
        name: "textured",
        params: FixtureParams {
            is_bsdf: true,
            uses_harmonic_extrapolation: false,
            num_elevational_samples: 3,
            num_basis_functions: 2,
            num_coefficients: 36,
            num_color_channels: 1,
            longest_series_length: 2,
            num_parameters: 2,
            num_parameter_values: 5,
            metadata_size_bytes: 0,
            index_of_refraction: 1.0,
            roughness_top: 0.5,
            roughness_bottom: 0.25,
        },
        build: build_textured,
        compressed: OnceLock::new(),
    },
    Fixture {
        name: "duplicate_origin",
        params: FixtureParams {
            is_bsdf: true,
            uses_harmonic_extrapolation: false,
            num_elevational_samples: 4,
            num_basis_functions: 1,
            num_coefficients: 16,
            num_color_channels: 1,
            longest_series_length: 1,
            num_parameters: 0,
            num_parameter_values: 0,
            metadata_size_bytes: 0,
            index_of_refraction: 1.0,
            roughness_top: 1.0,
            roughness_bottom: 1.0,
        },
        build: build_duplicate_origin,
        compressed: OnceLock::new(),
    },
];

/// Look a fixture up by name.
pub fn fixture(name: &str) -> Option<&'static Fixture> {
    FIXTURES.iter().find(|f| f.name == name)
}

/// Open a fixture by name as a decompressing reader.
///
/// # Errors
///
/// [`io::ErrorKind::NotFound`] for an unknown name, or any zstd error.
pub fn open_fixture(name: &str) -> io::Result<impl Read + 'static> {
    let fixture = fixture(name).ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, format!("no fixture named {name:?}"))
    })?;
    fixture.open()
}

// ── Builders ──────────────────────────────────────────────────────────────────

/// Evenly spaced row `[0, 1/(n-1), ..., 1]`, a valid CDF row for any `n`.
fn cdf_row(data: &mut BsdfData, basis_function: usize, y: usize) {
    let n = data.elevational_samples().len();
    for x in 0..n {
        let value = if n > 1 { x as f32 / (n - 1) as f32 } else { 0.0 };
        data.set_cdf(basis_function, x, y, value);
    }
}

fn fill_cdf(data: &mut BsdfData) {
    let n = data.elevational_samples().len();
    for basis_function in 0..data.num_basis_functions() {
        for y in 0..n {
            cdf_row(data, basis_function, y);
        }
    }
}

fn build_rgb_grid() -> Vec<u8> {
    let mut data = BsdfData::new(vec![-1.0, -0.5, 0.0, 0.5, 1.0], 1, 3);
    for y in 0..5 {
        for x in 0..5 {
            let length = 1 + (x + y) % 3;
            for channel in 0..3 {
                for order in 0..length {
                    let value = (channel + 1) as f32 / (order + 1) as f32;
                    data.add_coefficient(0, channel, x, y, value);
                }
            }
        }
    }
    fill_cdf(&mut data);
    make_bsdf_file(
        &data,
        &FileOptions {
            metadata: b"rgb grid".to_vec(),
            ..FileOptions::with_optics(1.0, 0.1, 0.1)
        },
    )
}

fn build_mono_glass() -> Vec<u8> {
    let mut data = BsdfData::new(vec![-1.0, -0.5, -0.1, 0.1, 0.5, 1.0], 1, 1);
    for y in 0..6 {
        for x in 0..6 {
            for order in 0..=x.min(y) {
                data.add_coefficient(0, 0, x, y, 0.5f32.powi(order as i32));
            }
        }
    }
    fill_cdf(&mut data);
    make_bsdf_file(
        &data,
        &FileOptions {
            metadata: b"alpha=0.2 eta=1.5046".to_vec(),
            ..FileOptions::with_optics(1.5046, 0.2, 0.2)
        },
    )
}

fn build_textured() -> Vec<u8> {
    let mut data = BsdfData::new(vec![-1.0, 0.0, 1.0], 2, 1);
    for y in 0..3 {
        for x in 0..3 {
            for basis_function in 0..2 {
                data.add_coefficient(basis_function, 0, x, y, 1.0);
                data.add_coefficient(basis_function, 0, x, y, 0.25);
            }
        }
    }
    fill_cdf(&mut data);
    make_bsdf_file(
        &data,
        &FileOptions {
            parameter_sample_counts: vec![2, 3],
            parameter_values: vec![0.0, 1.0, 0.0, 0.5, 1.0],
            ..FileOptions::with_optics(1.0, 0.5, 0.25)
        },
    )
}

fn build_duplicate_origin() -> Vec<u8> {
    let mut data = BsdfData::new(vec![-1.0, 0.0, 0.0, 1.0], 1, 1);
    for y in 0..4 {
        for x in 0..4 {
            data.add_coefficient(0, 0, x, y, 1.0);
        }
    }
    fill_cdf(&mut data);
    make_bsdf_file(&data, &FileOptions::default())
}
