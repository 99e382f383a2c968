//! Fixed-point sample types and the raw-to-fixed converter.

pub mod convert;
pub mod fixed;

pub use convert::SampleConverter;
pub use fixed::Q16;
