// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

//! Color for scene drawing. Channels are 0..1 floats because every
//! draw path ends up scaling alpha by quality and fade envelopes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const BLACK: Rgba = Rgba::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Rgba = Rgba::rgb(1.0, 1.0, 1.0);

    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a.clamp(0.0, 1.0);
        self
    }

    pub fn scale_alpha(mut self, f: f32) -> Self {
        self.a = (self.a * f).clamp(0.0, 1.0);
        self
    }

    /// h in degrees, s and l in 0..1.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        let h = h.rem_euclid(360.0);
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let hp = h / 60.0;
        let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
        let (r1, g1, b1) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        Rgba::rgb(r1 + m, g1 + m, b1 + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsl_primaries() {
        let red = Rgba::from_hsl(0.0, 1.0, 0.5);
        assert!((red.r - 1.0).abs() < 1e-5 && red.g.abs() < 1e-5);
        let green = Rgba::from_hsl(120.0, 1.0, 0.5);
        assert!((green.g - 1.0).abs() < 1e-5 && green.r.abs() < 1e-5);
    }

    #[test]
    fn test_alpha_clamped() {
        assert_eq!(Rgba::WHITE.with_alpha(2.0).a, 1.0);
        assert_eq!(Rgba::WHITE.scale_alpha(-1.0).a, 0.0);
    }
}
