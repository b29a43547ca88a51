//! Meadow configuration.
//!
//! Everything is baked in through `Default`; a JSON file can override any
//! subset of fields (`--config <path>`). Missing fields keep their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::Error;

/// Largest generated height texture side; the default 2D texture limit of
/// wgpu devices.
pub const MAX_TEXTURE_SIZE: u32 = 8192;

/// Most blades whose instance buffer fits the default 256 MB buffer limit.
pub const MAX_INSTANCES: u32 = 8_388_608;

/// Blade template dimensions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BladeConfig {
    /// Number of segments along the blade.
    pub joints: u32,
    pub width: f32,
    pub height: f32,
}

impl Default for BladeConfig {
    fn default() -> Self {
        Self {
            joints: 4,
            width: 0.4,
            height: 5.0,
        }
    }
}

/// Instance field layout and placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Number of blades.
    pub instances: u32,
    /// Side length of the repeating ground tile.
    pub tile_width: f32,
    /// Ground plane vertices per tile side; sets the tile delta.
    pub resolution: u32,
    /// Scale applied to the glyph stencil.
    pub stencil_scale: f32,
    pub seed: u64,
    /// Consecutive rejections allowed per blade.
    pub max_attempts: u32,
    /// Smallest stencil acceptance ratio accepted before sampling.
    pub min_acceptance: f32,
    /// Initial tracked position, in tile delta units.
    pub tracked_start: [f32; 2],
    /// Tracked position velocity per unit of shader time.
    pub drift: [f32; 2],
}

impl FieldConfig {
    /// World distance of one tracked position unit.
    pub fn tile_delta(&self) -> f32 {
        self.tile_width / self.resolution as f32
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            instances: 80_000,
            tile_width: 300.0,
            resolution: 64,
            stencil_scale: 0.4,
            seed: 0x6d65_6164,
            max_attempts: 10_000,
            min_acceptance: 0.01,
            tracked_start: [0.01, 0.01],
            drift: [0.0, 0.0],
        }
    }
}

/// Wind animation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindConfig {
    /// Shader time units per wall-clock second.
    pub time_scale: f32,
    /// Blades rooted closer than this to the pointer do not sway.
    pub calm_radius: f32,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            time_scale: 5.0,
            calm_radius: 3.0,
        }
    }
}

/// Height field under the grass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Peak displacement; heights span [-amplitude, amplitude).
    pub amplitude: f32,
    /// World distance covered by one repeat of the noise texture.
    pub period: f32,
    /// Side length of the generated noise texture in texels.
    pub texture_size: u32,
    pub seed: u32,
    pub octaves: usize,
    /// Grayscale image to use instead of generated noise.
    pub texture_path: Option<PathBuf>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            amplitude: 8.0,
            period: 800.0,
            texture_size: 256,
            seed: 7,
            octaves: 5,
            texture_path: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    /// Height above the ground plane; the camera looks straight down.
    pub height: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            height: 160.0,
            near: 1.0,
            far: 20000.0,
        }
    }
}

/// Linear RGBA colors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub blade: [f32; 4],
    pub sky_zenith: [f32; 4],
    pub sky_horizon: [f32; 4],
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            blade: [0.0, 0.0, 0.0, 1.0],
            sky_zenith: [0.15, 0.35, 0.65, 1.0],
            sky_horizon: [0.45, 0.55, 0.7, 1.0],
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeadowConfig {
    pub blade: BladeConfig,
    pub field: FieldConfig,
    pub wind: WindConfig,
    pub terrain: TerrainConfig,
    pub camera: CameraConfig,
    pub colors: ColorConfig,
}

impl MeadowConfig {
    /// Load and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make startup fail later in a less obvious way.
    pub fn validate(&self) -> Result<(), Error> {
        if self.blade.joints == 0 {
            return Err(Error::Config("blade.joints must be at least 1".into()));
        }
        positive("blade.width", self.blade.width)?;
        positive("blade.height", self.blade.height)?;

        if self.field.instances == 0 {
            return Err(Error::Config("field.instances must be at least 1".into()));
        }
        if self.field.instances > MAX_INSTANCES {
            return Err(Error::Config(format!(
                "field.instances {} exceeds the maximum {}",
                self.field.instances, MAX_INSTANCES
            )));
        }
        if self.field.resolution == 0 {
            return Err(Error::Config("field.resolution must be at least 1".into()));
        }
        if self.field.max_attempts == 0 {
            return Err(Error::Config("field.max_attempts must be at least 1".into()));
        }
        positive("field.tile_width", self.field.tile_width)?;
        positive("field.stencil_scale", self.field.stencil_scale)?;
        finite("field.min_acceptance", self.field.min_acceptance)?;
        for v in self.field.tracked_start.iter().chain(&self.field.drift) {
            finite("field tracked position", *v)?;
        }

        finite("wind.time_scale", self.wind.time_scale)?;
        if self.wind.time_scale < 0.0 {
            return Err(Error::Config("wind.time_scale must not be negative".into()));
        }
        finite("wind.calm_radius", self.wind.calm_radius)?;

        finite("terrain.amplitude", self.terrain.amplitude)?;
        positive("terrain.period", self.terrain.period)?;
        if self.terrain.texture_size == 0 {
            return Err(Error::Config("terrain.texture_size must be at least 1".into()));
        }
        if self.terrain.texture_size > MAX_TEXTURE_SIZE {
            return Err(Error::Config(format!(
                "terrain.texture_size {} exceeds the maximum {}",
                self.terrain.texture_size, MAX_TEXTURE_SIZE
            )));
        }

        positive("camera.fov_degrees", self.camera.fov_degrees)?;
        if self.camera.fov_degrees >= 180.0 {
            return Err(Error::Config("camera.fov_degrees must be below 180".into()));
        }
        positive("camera.height", self.camera.height)?;
        positive("camera.near", self.camera.near)?;
        if self.camera.far <= self.camera.near {
            return Err(Error::Config("camera.far must exceed camera.near".into()));
        }
        Ok(())
    }
}

fn finite(name: &str, value: f32) -> Result<(), Error> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::Config(format!("{name} must be finite, got {value}")))
    }
}

fn positive(name: &str, value: f32) -> Result<(), Error> {
    finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(Error::Config(format!("{name} must be positive, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = MeadowConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.field.instances, 80_000);
        assert!((cfg.field.tile_delta() - 300.0 / 64.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = MeadowConfig::from_json(r#"{ "field": { "instances": 1000 }, "wind": { "calm_radius": 5.0 } }"#).unwrap();
        assert_eq!(cfg.field.instances, 1000);
        assert_eq!(cfg.field.tile_width, 300.0);
        assert_eq!(cfg.wind.calm_radius, 5.0);
        assert_eq!(cfg.blade, BladeConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut cfg = MeadowConfig::default();
        cfg.terrain.texture_path = Some(PathBuf::from("noise.png"));
        let text = serde_json::to_string(&cfg).unwrap();
        assert_eq!(MeadowConfig::from_json(&text).unwrap(), cfg);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            MeadowConfig::from_json(r#"{ "blade": { "joints": 0 } }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            MeadowConfig::from_json(r#"{ "field": { "tile_width": -1.0 } }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            MeadowConfig::from_json(r#"{ "camera": { "near": 10.0, "far": 5.0 } }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(MeadowConfig::from_json("{ nope"), Err(Error::Json(_))));
    }

    #[test]
    fn test_oversize_rejected() {
        assert!(matches!(
            MeadowConfig::from_json(r#"{ "terrain": { "texture_size": 10000 } }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            MeadowConfig::from_json(r#"{ "field": { "instances": 9000000 } }"#),
            Err(Error::Config(_))
        ));

        let mut cfg = MeadowConfig::default();
        cfg.terrain.texture_size = MAX_TEXTURE_SIZE;
        cfg.field.instances = MAX_INSTANCES;
        cfg.validate().unwrap();
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "terrain": {{ "amplitude": 2.5 }} }}"#).unwrap();

        let cfg = MeadowConfig::load(file.path()).unwrap();
        assert_eq!(cfg.terrain.amplitude, 2.5);

        let missing = MeadowConfig::load(Path::new("/definitely/not/here.json"));
        assert!(matches!(missing, Err(Error::Io(_))));
    }
}
