//! si_raster - owned RGBA pixel buffers for the annotation canvas.
//!
//! A `RasterBuffer` is a single owned buffer indexed by pixel offset. The
//! dashboard keeps its canvas layers (background, user annotation and the
//! compositing scratch buffer) as three of these and moves pixels between
//! them with `composite_over`, `resize` and the base64 PNG codec.

pub mod buffer;
pub mod codec;
pub mod color;
pub mod config;
pub mod error;
pub mod mask;

pub use buffer::RasterBuffer;
pub use codec::{strip_data_url, to_data_url};
pub use color::Rgba;
pub use config::Resample;
pub use error::{RasterError, Result};
pub use mask::BinaryMask;
