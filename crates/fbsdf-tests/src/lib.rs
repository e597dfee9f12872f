//! Test support for the fbsdf workspace: a writer for well-formed and
//! deliberately broken Fourier BSDF files, and a registry of named
//! fixtures shared by the integration tests, benches and fuzz seeds.

pub mod fixtures;
pub mod writer;

pub use fixtures::{FIXTURES, Fixture, FixtureParams, fixture, open_fixture};
pub use writer::{
    BsdfData, FileOptions, RawHeader, make_bsdf_file, make_empty_bsdf_file,
    make_minimal_bsdf_file, make_non_finite_bsdf_file,
};
