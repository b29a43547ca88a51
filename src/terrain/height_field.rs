//! Tileable height field texture
//!
//! The grass is displaced vertically by a grayscale noise texture sampled
//! with repeat addressing. The texture is either generated here from fractal
//! Perlin noise evaluated on a 4D torus (so opposite edges match exactly) or
//! loaded from a grayscale image.

use std::f64::consts::TAU;
use std::path::Path;

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rayon::prelude::*;

use crate::core::error::Error;
use crate::grass::config::TerrainConfig;

/// Torus radius in noise space; sets the feature size of one texture repeat.
const TORUS_RADIUS: f64 = 1.5;

/// Largest stored texel; keeps samples strictly below 1.0.
const MAX_TEXEL: f32 = 254.0;

/// Grayscale texture with wrap sampling.
#[derive(Clone, Debug)]
pub struct HeightField {
    width: u32,
    height: u32,
    texels: Vec<u8>,
}

impl HeightField {
    /// Build from the terrain configuration: the configured image if any,
    /// generated noise otherwise.
    pub fn from_config(config: &TerrainConfig) -> Result<Self, Error> {
        match &config.texture_path {
            Some(path) => Self::from_image(path),
            None => Self::generate(config.texture_size, config.seed, config.octaves),
        }
    }

    /// Generate a seamless `size` x `size` fBm texture.
    pub fn generate(size: u32, seed: u32, octaves: usize) -> Result<Self, Error> {
        if size == 0 {
            return Err(Error::Config("height field size must be at least 1".into()));
        }
        let noise = Fbm::<Perlin>::new(seed)
            .set_octaves(octaves.max(1))
            .set_persistence(0.5)
            .set_lacunarity(2.0);

        let n = size as usize;
        let mut values = vec![0.0f64; n * n];
        values.par_chunks_mut(n).enumerate().for_each(|(row, out)| {
            let (sb, cb) = (TAU * row as f64 / n as f64).sin_cos();
            for (col, value) in out.iter_mut().enumerate() {
                let (sa, ca) = (TAU * col as f64 / n as f64).sin_cos();
                *value = noise.get([
                    TORUS_RADIUS * ca,
                    TORUS_RADIUS * sa,
                    TORUS_RADIUS * cb,
                    TORUS_RADIUS * sb,
                ]);
            }
        });

        // Stretch to the full texel range
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = if max > min { max - min } else { 1.0 };
        let texels = values
            .iter()
            .map(|&v| (((v - min) / range) as f32 * MAX_TEXEL).round() as u8)
            .collect();

        Ok(Self { width: size, height: size, texels })
    }

    /// Load a grayscale texture from disk. Color images are converted to luma.
    pub fn from_image(path: &Path) -> Result<Self, Error> {
        let image = image::open(path)?.to_luma8();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::Config(format!("empty height field image {}", path.display())));
        }
        let texels = image
            .into_raw()
            .into_iter()
            .map(|t| t.min(MAX_TEXEL as u8))
            .collect();
        Ok(Self { width, height, texels })
    }

    /// Build from raw texels, row-major.
    pub fn from_texels(width: u32, height: u32, texels: Vec<u8>) -> Result<Self, Error> {
        if width == 0 || height == 0 || texels.len() != (width * height) as usize {
            return Err(Error::Config(format!(
                "height field of {}x{} needs {} texels, got {}",
                width,
                height,
                width as usize * height as usize,
                texels.len()
            )));
        }
        let texels = texels.into_iter().map(|t| t.min(MAX_TEXEL as u8)).collect();
        Ok(Self { width, height, texels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texels(&self) -> &[u8] {
        &self.texels
    }

    fn texel(&self, x: i64, y: i64) -> f32 {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        self.texels[y * self.width as usize + x] as f32 / 255.0
    }

    /// Bilinear sample at texture coordinates with repeat addressing,
    /// matching a linear-filtered GPU sampler. Defined for any finite input.
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);
        let x = u * self.width as f32 - 0.5;
        let y = v * self.height as f32 - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.texel(x0, y0) * (1.0 - fx) + self.texel(x0 + 1, y0) * fx;
        let bottom = self.texel(x0, y0 + 1) * (1.0 - fx) + self.texel(x0 + 1, y0 + 1) * fx;
        top * (1.0 - fy) + bottom * fy
    }

    /// Terrain height at world (x, z): `amplitude * (2 * noise(p / period) - 1)`.
    pub fn height_at(&self, x: f32, z: f32, amplitude: f32, period: f32) -> f32 {
        amplitude * (2.0 * self.sample(x / period, z / period) - 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_fills_range() {
        let field = HeightField::generate(64, 3, 4).unwrap();
        assert_eq!(field.texels().len(), 64 * 64);
        let min = *field.texels().iter().min().unwrap();
        let max = *field.texels().iter().max().unwrap();
        assert_eq!(min, 0);
        assert_eq!(max, MAX_TEXEL as u8);
    }

    #[test]
    fn test_samples_below_one() {
        let field = HeightField::generate(32, 1, 3).unwrap();
        for i in 0..200 {
            let u = i as f32 * 0.013 - 1.3;
            let s = field.sample(u, u * 0.7);
            assert!((0.0..1.0).contains(&s), "sample {s}");
        }
    }

    #[test]
    fn test_sampling_wraps() {
        let field = HeightField::generate(32, 9, 4).unwrap();
        for (u, v) in [(0.1, 0.2), (0.73, 0.05), (0.999, 0.5)] {
            let base = field.sample(u, v);
            assert!((field.sample(u + 1.0, v) - base).abs() < 1e-4);
            assert!((field.sample(u, v - 3.0) - base).abs() < 1e-4);
        }
    }

    #[test]
    fn test_generated_texture_is_seamless() {
        let field = HeightField::generate(128, 5, 5).unwrap();
        let n = 128usize;
        let t = field.texels();
        // Opposite edges are neighbours on the torus, so the seam step is on
        // the order of an interior step
        let max_interior = (0..n)
            .map(|y| (t[y * n + 1] as i32 - t[y * n] as i32).abs())
            .max()
            .unwrap();
        let max_seam = (0..n)
            .map(|y| (t[y * n] as i32 - t[y * n + n - 1] as i32).abs())
            .max()
            .unwrap();
        assert!(max_seam <= max_interior * 2 + 2, "seam {max_seam} interior {max_interior}");
    }

    #[test]
    fn test_bilinear_matches_texel_centers() {
        let field = HeightField::from_texels(2, 2, vec![0, 100, 200, 50]).unwrap();
        // Center of texel (1, 0)
        assert!((field.sample(0.75, 0.25) - 100.0 / 255.0).abs() < 1e-5);
        // Halfway between texel (0, 0) and (1, 0)
        assert!((field.sample(0.5, 0.25) - 50.0 / 255.0).abs() < 1e-5);
        // Wrapping between texel (1, 0) and (0, 0) across the edge
        assert!((field.sample(0.0, 0.25) - 50.0 / 255.0).abs() < 1e-5);
    }

    #[test]
    fn test_height_at_range() {
        let field = HeightField::from_texels(1, 1, vec![0]).unwrap();
        assert_eq!(field.height_at(10.0, -3.0, 8.0, 800.0), -8.0);

        let field = HeightField::generate(16, 2, 2).unwrap();
        for i in 0..50 {
            let h = field.height_at(i as f32 * 37.0, i as f32 * -11.0, 8.0, 800.0);
            assert!((-8.0..8.0).contains(&h));
        }
    }

    #[test]
    fn test_texel_count_checked() {
        assert!(matches!(HeightField::from_texels(4, 4, vec![0; 15]), Err(Error::Config(_))));
        assert!(matches!(HeightField::generate(0, 1, 1), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.png");
        let img = image::GrayImage::from_fn(4, 4, |x, y| image::Luma([(x * 60 + y) as u8]));
        img.save(&path).unwrap();

        let field = HeightField::from_image(&path).unwrap();
        assert_eq!((field.width(), field.height()), (4, 4));
        assert_eq!(field.texels()[1], 60);
    }
}
