//! Binary region masks and the "spotlight" rendering used for ranked
//! predictions.

use crate::buffer::RasterBuffer;
use crate::color::Rgba;

/// A row-major grid of 0/1 cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl BinaryMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    /// Build from nested rows as the backend sends them. Ragged rows are
    /// padded with zeros; any non-zero value counts as set.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Self {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.as_ref().len()).max().unwrap_or(0) as u32;
        let mut mask = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, &v) in row.as_ref().iter().enumerate() {
                mask.cells[y * width as usize + x] = v != 0;
            }
        }
        mask
    }

    /// Threshold a raster's alpha channel.
    pub fn from_alpha(raster: &RasterBuffer, threshold: u8) -> Self {
        let (width, height) = raster.dimensions();
        let cells = raster
            .as_raw()
            .chunks_exact(4)
            .map(|px| px[3] > threshold)
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width && y < self.height {
            self.cells[(y * self.width + x) as usize] = value;
        }
    }

    /// Number of set cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Nearest-neighbour lookup when the mask is stretched over a
    /// `target_width` x `target_height` surface.
    pub fn sample(&self, x: u32, y: u32, target_width: u32, target_height: u32) -> bool {
        if self.width == 0 || self.height == 0 || target_width == 0 || target_height == 0 {
            return false;
        }
        let mx = (x as u64 * self.width as u64 / target_width as u64) as u32;
        let my = (y as u64 * self.height as u64 / target_height as u64) as u32;
        self.get(mx, my)
    }

    /// Keep masked pixels of `background` fully opaque and dim the rest to
    /// `dim_alpha`.
    pub fn spotlight(&self, background: &RasterBuffer, dim_alpha: f32) -> RasterBuffer {
        let (width, height) = background.dimensions();
        let dim = (dim_alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        let mut out = background.clone();
        for y in 0..height {
            for x in 0..width {
                let Some(px) = background.pixel(x, y) else {
                    continue;
                };
                let alpha = if self.sample(x, y, width, height) { 255 } else { dim };
                out.put_pixel(x, y, Rgba { a: alpha, ..px });
            }
        }
        out
    }
}
