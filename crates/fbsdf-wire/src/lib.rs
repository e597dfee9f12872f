#![warn(clippy::pedantic)]

pub mod error;
pub mod header;
pub mod scalar;
pub mod section;

pub use error::WireError;
pub use header::{BsdfHeader, HeaderFlags, HEADER_SIZE};
pub use scalar::ScalarReader;
pub use section::Section;
