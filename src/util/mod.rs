//! Utility types shared by the decoder and the exporter.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam and tick conversion

mod error;
mod math;

pub use error::*;
pub use math::*;
