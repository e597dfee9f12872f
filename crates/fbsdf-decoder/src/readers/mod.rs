//! Ready-made handlers that turn a file into an in-memory table.

pub mod pbrt;
pub mod standard;
