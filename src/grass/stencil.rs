//! Glyph-shaped placement region for the blade field.
//!
//! The glyph is a central vertical bar plus two mirrored halves, each made of
//! two horizontal arms, a side bar and two rounded lobes. Coordinates are
//! rotated by a fixed angle and mirrored in x before testing.

use crate::core::types::Vec2;

/// Unscaled glyph width.
pub const GLYPH_WIDTH: f32 = 48.0;
/// Unscaled glyph height.
pub const GLYPH_HEIGHT: f32 = 64.0;
/// Glyph rotation in degrees.
pub const GLYPH_ROTATION_DEGREES: f32 = 15.0;

/// Point-in-glyph predicate at a given scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphStencil {
    scale: f32,
    sin: f32,
    cos: f32,
}

impl GlyphStencil {
    pub fn new(scale: f32) -> Self {
        let (sin, cos) = GLYPH_ROTATION_DEGREES.to_radians().sin_cos();
        Self { scale, sin, cos }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Unscaled half extents of the rotated glyph's bounding box.
    pub fn rotated_extents(&self) -> Vec2 {
        let (w, h) = (GLYPH_WIDTH, GLYPH_HEIGHT);
        Vec2::new(
            (w * self.cos).abs() + (h * self.sin).abs(),
            (w * self.sin).abs() + (h * self.cos).abs(),
        )
    }

    /// Scaled half extents of the sampling box.
    pub fn half_extents(&self) -> Vec2 {
        self.rotated_extents() * self.scale
    }

    /// Whether the point lies inside the glyph.
    pub fn is_inside(&self, x: f32, y: f32) -> bool {
        let xr = x * self.cos - y * self.sin;
        let yr = x * self.sin + y * self.cos;
        let (x, y) = (-xr, yr);

        let s = self.scale;
        let (w, h) = (GLYPH_WIDTH, GLYPH_HEIGHT);
        let bar = w / 6.0 * s;

        if x < bar && x > -bar && y < h * s && y > -h * s {
            return true;
        }

        let split = w * 2.0 / 3.0 * s;
        let upper = h * 3.0 / 4.0 * s;
        let lower = h / 4.0 * s;
        let lobe_r2 = (w / 3.0 * s).powi(2);

        for sign in [1.0, -1.0] {
            let xh = x * sign;
            let yh = y * sign;
            if !(xh > bar && yh > 0.0 && xh < w * s && yh < h * s) {
                continue;
            }

            // Arms
            if xh < split && (yh > upper || yh < lower) {
                return true;
            }
            // Side bar
            if xh > split && yh > lower && yh < upper {
                return true;
            }
            // Lobes
            if xh > split && yh > upper && (xh - split).powi(2) + (yh - upper).powi(2) < lobe_r2 {
                return true;
            }
            if xh > split && yh < lower && (xh - split).powi(2) + (yh - lower).powi(2) < lobe_r2 {
                return true;
            }
        }

        false
    }

    /// Fraction of the sampling box the glyph covers, estimated on an
    /// `n` by `n` grid of cell centers.
    pub fn acceptance_ratio(&self, n: u32) -> f32 {
        if n == 0 {
            return 0.0;
        }
        let ext = self.half_extents();
        let mut hits = 0u32;
        for iy in 0..n {
            let v = (iy as f32 + 0.5) / n as f32;
            let y = -ext.y + v * 2.0 * ext.y;
            for ix in 0..n {
                let u = (ix as f32 + 0.5) / n as f32;
                let x = -ext.x + u * 2.0 * ext.x;
                if self.is_inside(x, y) {
                    hits += 1;
                }
            }
        }
        hits as f32 / (n * n) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inverse of the stencil's rotate-and-mirror, to place points in glyph space.
    fn from_glyph(stencil: &GlyphStencil, gx: f32, gy: f32) -> (f32, f32) {
        let xr = -gx;
        let yr = gy;
        // Inverse rotation
        let x = xr * stencil.cos + yr * stencil.sin;
        let y = -xr * stencil.sin + yr * stencil.cos;
        (x, y)
    }

    #[test]
    fn test_center_inside() {
        let s = GlyphStencil::new(0.4);
        assert!(s.is_inside(0.0, 0.0));
    }

    #[test]
    fn test_far_point_outside() {
        let s = GlyphStencil::new(0.4);
        let ext = s.half_extents();
        assert!(!s.is_inside(ext.x * 1.5, 0.0));
        assert!(!s.is_inside(0.0, -ext.y * 1.5));
    }

    #[test]
    fn test_glyph_regions() {
        let s = GlyphStencil::new(1.0);
        let check = |gx: f32, gy: f32| {
            let (x, y) = from_glyph(&s, gx, gy);
            s.is_inside(x, y)
        };

        // Central bar
        assert!(check(0.0, 60.0));
        assert!(check(-7.0, -60.0));
        // Upper and lower arms of the right half
        assert!(check(20.0, 60.0));
        assert!(check(20.0, 4.0));
        // Gap between arms
        assert!(!check(20.0, 32.0));
        // Side bar
        assert!(check(40.0, 32.0));
        // Lobes
        assert!(check(40.0, 50.0));
        assert!(check(40.0, 12.0));
        // Outside the lobe's circle but inside its box corner
        assert!(!check(46.0, 62.0));
        // Mirrored half
        assert!(check(-20.0, -60.0));
        assert!(!check(-20.0, -32.0));
        // Empty quadrants beside the bar
        assert!(!check(20.0, -32.0));
        assert!(!check(-20.0, 32.0));
    }

    #[test]
    fn test_scale_invariance() {
        let small = GlyphStencil::new(0.4);
        let big = GlyphStencil::new(2.0);
        for (x, y) in [(1.0, 2.0), (-5.0, 10.0), (8.0, -3.0), (0.5, -12.0), (12.0, 12.0)] {
            assert_eq!(small.is_inside(x * 0.4, y * 0.4), big.is_inside(x * 2.0, y * 2.0));
        }
    }

    #[test]
    fn test_rotated_extents() {
        let s = GlyphStencil::new(0.4);
        let ext = s.rotated_extents();
        let r = 15.0_f32.to_radians();
        assert!((ext.x - (48.0 * r.cos() + 64.0 * r.sin())).abs() < 1e-4);
        assert!((ext.y - (48.0 * r.sin() + 64.0 * r.cos())).abs() < 1e-4);
        assert!((s.half_extents() - ext * 0.4).length() < 1e-5);
    }

    #[test]
    fn test_acceptance_ratio_reasonable() {
        let ratio = GlyphStencil::new(0.4).acceptance_ratio(128);
        assert!(ratio > 0.2 && ratio < 0.9, "ratio {ratio}");
        assert_eq!(GlyphStencil::new(0.4).acceptance_ratio(0), 0.0);
    }
}
