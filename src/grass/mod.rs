//! Instanced wind-swayed grass.
//!
//! One bent blade template is drawn once per `BladeInstance`. Instances are
//! scattered inside a glyph stencil at startup; every frame the vertex shader
//! tiles them around the tracked position, lifts them onto the height field
//! and sways them in the wind, except near the pointer.

pub mod blade;
pub mod config;
pub mod deform;
pub mod field;
pub mod params;
pub mod stencil;

pub use blade::{BladeTemplate, BladeVertex};
pub use config::MeadowConfig;
pub use field::{BladeInstance, FieldGenerator, InstanceField};
pub use params::GrassUniforms;
pub use stencil::GlyphStencil;

use crate::core::error::Error;
use crate::core::frame::FrameContext;

/// Blade geometry, instance field and per-frame uniform builder.
pub struct GrassSystem {
    config: MeadowConfig,
    template: BladeTemplate,
    field: InstanceField,
}

impl GrassSystem {
    /// Build the template and scatter the field described by `config`.
    pub fn new(config: MeadowConfig) -> Result<Self, Error> {
        config.validate()?;

        let template = BladeTemplate::build(&config.blade)?;
        let field = FieldGenerator::from_config(&config.field).generate(config.field.instances as usize)?;
        log::info!(
            "Grass: {} blades, {} vertices / {} indices per blade",
            field.len(),
            template.vertices().len(),
            template.indices().len()
        );

        Ok(Self { config, template, field })
    }

    pub fn config(&self) -> &MeadowConfig {
        &self.config
    }

    pub fn template(&self) -> &BladeTemplate {
        &self.template
    }

    pub fn field(&self) -> &InstanceField {
        &self.field
    }

    /// Frame state seeded from the configured tracked start and drift.
    pub fn frame_context(&self) -> FrameContext {
        FrameContext::new(
            self.config.wind.time_scale,
            self.config.field.tracked_start.into(),
            self.config.field.drift.into(),
        )
    }

    /// Build GPU-ready uniforms from config and the current frame state.
    pub fn build_uniforms(&self, frame: &FrameContext) -> GrassUniforms {
        let tracked = frame.tracked();
        let pointer = frame.pointer();
        GrassUniforms {
            time: frame.time(),
            tile_delta: self.config.field.tile_delta(),
            tracked_x: tracked.x,
            tracked_z: tracked.y,
            pointer_x: pointer.x,
            pointer_z: pointer.y,
            tile_width: self.config.field.tile_width,
            calm_radius: self.config.wind.calm_radius,
            height_amplitude: self.config.terrain.amplitude,
            height_period: self.config.terrain.period,
            _pad: [0.0; 2],
            blade_color: self.config.colors.blade,
        }
    }
}
