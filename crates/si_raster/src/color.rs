//! Straight-alpha colors and the source-over blend used by every layer.

use crate::error::{RasterError, Result};

/// An 8-bit RGB color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return Err(RasterError::InvalidColor(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| RasterError::InvalidColor(hex.to_string()))
        };
        let a = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, a))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(px: [u8; 4]) -> Self {
        Self::new(px[0], px[1], px[2], px[3])
    }

    /// Same color with its alpha scaled by `alpha` (clamped to 0..=1).
    pub fn with_opacity(self, alpha: f32) -> Self {
        let alpha = alpha.clamp(0.0, 1.0);
        Self {
            a: (self.a as f32 * alpha).round() as u8,
            ..self
        }
    }
}

/// Blend `src` over `dst` (Porter-Duff source-over on straight alpha).
pub fn blend_over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = src[3] as f32 / 255.0;
    if sa <= 0.0 {
        return dst;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }

    let mix = |s: u8, d: u8| {
        let c = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };

    [
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Rgba::from_hex("#f2d602").unwrap(), Rgba::opaque(242, 214, 2));
        assert_eq!(Rgba::from_hex("d95f02").unwrap(), Rgba::opaque(217, 95, 2));
        assert_eq!(
            Rgba::from_hex("#00000080").unwrap(),
            Rgba::new(0, 0, 0, 128)
        );
        assert!(Rgba::from_hex("#xyz").is_err());
        assert!(Rgba::from_hex("#12345").is_err());
    }

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(Rgba::opaque(242, 214, 2).to_hex(), "#f2d602");
    }

    #[test]
    fn test_blend_over_transparent_destination() {
        let out = blend_over([0, 0, 0, 0], [242, 214, 2, 166]);
        assert_eq!(out, [242, 214, 2, 166]);
    }

    #[test]
    fn test_blend_over_opaque_source_replaces() {
        let out = blend_over([10, 20, 30, 255], [200, 100, 50, 255]);
        assert_eq!(out, [200, 100, 50, 255]);
    }

    #[test]
    fn test_blend_over_accumulates_alpha() {
        let once = blend_over([0, 0, 0, 0], [255, 0, 0, 128]);
        let twice = blend_over(once, [255, 0, 0, 128]);
        assert!(twice[3] > once[3]);
        assert_eq!(twice[0], 255);
    }

    #[test]
    fn test_blend_over_zero_alpha_is_noop() {
        let dst = [1, 2, 3, 4];
        assert_eq!(blend_over(dst, [255, 255, 255, 0]), dst);
    }
}
