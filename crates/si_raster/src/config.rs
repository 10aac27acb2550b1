//! Resampling options used when a layer is drawn at a different size.

use image::imageops::FilterType;

/// Filter used when a raster is resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resample {
    /// Nearest neighbour. Keeps hard mask edges.
    Nearest,
    /// Bilinear interpolation (what a 2D canvas does by default).
    #[default]
    Bilinear,
}

impl Resample {
    pub(crate) fn filter_type(self) -> FilterType {
        match self {
            Resample::Nearest => FilterType::Nearest,
            Resample::Bilinear => FilterType::Triangle,
        }
    }
}
