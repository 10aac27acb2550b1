//! Color scales shared by the histogram, the confusion matrix and the
//! score badges.

use si_raster::Rgba;

/// ColorBrewer "Blues" stops, light to dark.
const BLUES: [Rgba; 9] = [
    Rgba::opaque(0xf7, 0xfb, 0xff),
    Rgba::opaque(0xde, 0xeb, 0xf7),
    Rgba::opaque(0xc6, 0xdb, 0xef),
    Rgba::opaque(0x9e, 0xca, 0xe1),
    Rgba::opaque(0x6b, 0xae, 0xd6),
    Rgba::opaque(0x42, 0x92, 0xc6),
    Rgba::opaque(0x21, 0x71, 0xb5),
    Rgba::opaque(0x08, 0x51, 0x9c),
    Rgba::opaque(0x08, 0x30, 0x6b),
];

/// Lower end of the score domain mapped onto the blue ramp. Starting below
/// zero keeps a score of 0 light blue instead of white.
const SCALE_DOMAIN_MIN: f64 = -0.2;
const SCALE_DOMAIN_MAX: f64 = 1.0;

/// Dark text for light badges.
pub const DARK_TEXT: &str = "#212529";
/// Light text for dark badges.
pub const LIGHT_TEXT: &str = "#e3e3e3";

/// Badge colors for a correct / incorrect prediction.
pub const CORRECT_COLOR: &str = "#afc4a5";
pub const INCORRECT_COLOR: &str = "#b08989";

/// Sample the blue ramp at `t` in 0..=1.
pub fn interpolate_blues(t: f64) -> Rgba {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (BLUES.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(BLUES.len() - 2);
    let frac = scaled - i as f64;
    let (a, b) = (BLUES[i], BLUES[i + 1]);
    let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
    Rgba::opaque(lerp(a.r, b.r), lerp(a.g, b.g), lerp(a.b, b.b))
}

/// Fill color for a score (or bin start, or mean) in 0..=1.
pub fn score_color(score: f64) -> Rgba {
    interpolate_blues((score - SCALE_DOMAIN_MIN) / (SCALE_DOMAIN_MAX - SCALE_DOMAIN_MIN))
}

/// Text color readable on top of `score_color(score)`.
pub fn score_text_color(score: f64) -> &'static str {
    if score < 0.5 { DARK_TEXT } else { LIGHT_TEXT }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blues_endpoints() {
        assert_eq!(interpolate_blues(0.0), BLUES[0]);
        assert_eq!(interpolate_blues(1.0), BLUES[8]);
        assert_eq!(interpolate_blues(2.0), BLUES[8]);
        assert_eq!(interpolate_blues(f64::NAN), BLUES[0]);
    }

    #[test]
    fn test_score_color_starts_light_blue() {
        let zero = score_color(0.0);
        assert_ne!(zero, BLUES[0]);
        assert!(zero.b > zero.r);
        assert_eq!(score_color(1.0), BLUES[8]);
    }

    #[test]
    fn test_score_color_darkens() {
        let low = score_color(0.1);
        let high = score_color(0.9);
        assert!(high.r < low.r);
    }

    #[test]
    fn test_score_text_color() {
        assert_eq!(score_text_color(0.49), DARK_TEXT);
        assert_eq!(score_text_color(0.5), LIGHT_TEXT);
    }
}
