//! Linear RGBA colors and hex parsing for configured bar colors.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// RGBA color with components in `[0, 1]`, as passed to draw calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red component
    pub r: f32,
    /// Green component
    pub g: f32,
    /// Blue component
    pub b: f32,
    /// Alpha component
    pub a: f32,
}

impl Rgba {
    /// Opaque white, used to draw textured tiles untinted.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Creates a color from float components.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color from 8-bit channels.
    #[must_use]
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            1.0,
        )
    }

    /// Same color with its alpha replaced.
    #[must_use]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Uniform grey of the given level, alpha equal to the level.
    ///
    /// Matches the premultiplied tint used for the digit shadow pass.
    #[must_use]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v, v)
    }

    /// Parses `#RRGGBB` or `#AARRGGBB` (leading `#` optional).
    pub fn from_hex(s: &str) -> Result<Self, ConfigError> {
        let hex = s.trim().trim_start_matches('#');
        let invalid = || ConfigError::InvalidColor(s.to_string());

        let value = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
        let (a, rgb) = match hex.len() {
            6 => (255, value),
            8 => ((value >> 24) & 0xFF, value & 0x00FF_FFFF),
            _ => return Err(invalid()),
        };

        let mut color = Self::from_rgb8(
            ((rgb >> 16) & 0xFF) as u8,
            ((rgb >> 8) & 0xFF) as u8,
            (rgb & 0xFF) as u8,
        );
        color.a = a as f32 / 255.0;
        Ok(color)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rgb_hex() {
        let c = Rgba::from_hex("#44FF44").expect("valid color");
        assert!((c.r - 0x44 as f32 / 255.0).abs() < 1e-6);
        assert!((c.g - 1.0).abs() < 1e-6);
        assert!((c.a - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_argb_hex() {
        let c = Rgba::from_hex("80ffffff").expect("valid color");
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
        assert!((c.b - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Rgba::from_hex("#12345").is_err());
        assert!(Rgba::from_hex("#GGGGGG").is_err());
        assert!(Rgba::from_hex("").is_err());
    }
}
