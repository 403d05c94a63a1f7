//! Pipeline configuration module

pub mod markers;
pub mod pipeline;

pub use markers::*;
pub use pipeline::*;
