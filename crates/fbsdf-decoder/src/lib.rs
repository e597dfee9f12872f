#![warn(clippy::pedantic)]

pub mod error;
pub mod reader;
pub mod readers;
pub mod validating;

pub use error::{DecodeError, ValidationError};
pub use fbsdf_wire::{BsdfHeader, HeaderFlags, Section};
pub use reader::{BsdfHandler, BsdfReader, ParseOptions};
pub use readers::pbrt::{FourierTable, PbrtBsdfReader};
pub use readers::standard::{ChannelExtent, StandardBsdf, read_standard_bsdf};
pub use validating::{BatchHandler, SeriesExtent, ValidatingReader, ValidationOptions};
