//! Owned RGBA8 raster buffer.

use std::borrow::Cow;
use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage};

use crate::codec::{strip_data_url, to_data_url};
use crate::color::{blend_over, Rgba};
use crate::config::Resample;
use crate::error::{RasterError, Result};

/// A width x height RGBA8 buffer with straight alpha, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    image: RgbaImage,
}

impl RasterBuffer {
    /// Create a fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Wrap existing RGBA8 bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        let actual = data.len();
        RgbaImage::from_raw(width, height, data)
            .map(|image| Self { image })
            .ok_or(RasterError::BufferSize {
                width,
                height,
                expected,
                actual,
            })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Raw RGBA8 bytes.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.image.into_raw()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.image
            .get_pixel_checked(x, y)
            .map(|p| Rgba::from_array(p.0))
    }

    /// Overwrite one pixel. Out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if let Some(p) = self.image.get_pixel_mut_checked(x, y) {
            p.0 = color.to_array();
        }
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        self.image.pixels_mut().for_each(|p| p.0 = [0; 4]);
    }

    /// True when every pixel has zero alpha.
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p.0[3] == 0)
    }

    /// Number of pixels with non-zero alpha.
    pub fn coverage(&self) -> usize {
        self.image.pixels().filter(|p| p.0[3] > 0).count()
    }

    /// Stamp a filled circle, blending `color` (alpha scaled by `opacity`)
    /// over the existing pixels. Pixels whose centre lies inside the circle
    /// are painted.
    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgba, opacity: f32) {
        if !(cx.is_finite() && cy.is_finite() && radius.is_finite()) || radius <= 0.0 {
            return;
        }
        let (width, height) = self.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        let src = color.with_opacity(opacity).to_array();
        let x0 = (cx - radius).floor().max(0.0) as u32;
        let y0 = (cy - radius).floor().max(0.0) as u32;
        let x1 = ((cx + radius).ceil().max(0.0) as u32).min(width - 1);
        let y1 = ((cy + radius).ceil().max(0.0) as u32).min(height - 1);
        let r2 = radius * radius;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    let p = self.image.get_pixel_mut(x, y);
                    p.0 = blend_over(p.0, src);
                }
            }
        }
    }

    /// Draw `src` on top of this buffer with an extra global `opacity`.
    ///
    /// A source of a different size is stretched to this buffer's size first,
    /// the same way `drawImage(src, 0, 0, w, h)` does.
    pub fn composite_over(&mut self, src: &RasterBuffer, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }
        let src: Cow<'_, RasterBuffer> = if src.dimensions() == self.dimensions() {
            Cow::Borrowed(src)
        } else {
            match src.resize(self.width(), self.height(), Resample::Bilinear) {
                Ok(resized) => Cow::Owned(resized),
                Err(e) => {
                    log::warn!("Skipping composite of unscalable layer: {}", e);
                    return;
                }
            }
        };

        for (dst, s) in self.image.pixels_mut().zip(src.image.pixels()) {
            let mut px = s.0;
            px[3] = (px[3] as f32 * opacity).round() as u8;
            dst.0 = blend_over(dst.0, px);
        }
    }

    /// Copy of this buffer resampled to `width` x `height`.
    pub fn resize(&self, width: u32, height: u32, filter: Resample) -> Result<RasterBuffer> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidDimensions { width, height });
        }
        if self.width() == 0 || self.height() == 0 {
            return Ok(RasterBuffer::new(width, height));
        }
        if self.dimensions() == (width, height) {
            return Ok(self.clone());
        }
        let image = image::imageops::resize(&self.image, width, height, filter.filter_type());
        Ok(Self { image })
    }

    /// PNG-encode the buffer.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// PNG-encode and base64 the buffer. The result carries no data-URL
    /// header.
    pub fn encode_base64(&self) -> Result<String> {
        Ok(STANDARD.encode(self.encode_png()?))
    }

    /// PNG data URL suitable for an `<img src>`.
    pub fn to_data_url(&self) -> Result<String> {
        Ok(to_data_url(&self.encode_base64()?))
    }

    /// Decode any supported encoded image (PNG or JPEG).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self { image })
    }

    /// Decode a base64 payload, with or without a data-URL header.
    pub fn decode_base64(payload: &str) -> Result<Self> {
        let bytes = STANDARD.decode(strip_data_url(payload))?;
        Self::decode(&bytes)
    }

    /// Decode a base64 payload and stretch it to a canonical size.
    pub fn decode_base64_fitted(payload: &str, width: u32, height: u32) -> Result<Self> {
        let decoded = Self::decode_base64(payload)?;
        log::debug!(
            "Decoded {}x{} image, fitting to {}x{}",
            decoded.width(),
            decoded.height(),
            width,
            height
        );
        decoded.resize(width, height, Resample::Bilinear)
    }
}

impl std::fmt::Debug for RasterBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterBuffer")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("coverage", &self.coverage())
            .finish()
    }
}
