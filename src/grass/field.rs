//! Instance field generation.
//!
//! Blade roots are rejection-sampled inside the glyph stencil, then given a
//! random yaw (stored as a half-angle sine/cosine pair) and a two-tier height
//! scale. One `BladeInstance` per blade keeps all attributes index-aligned.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::error::Error;
use crate::grass::config::FieldConfig;
use crate::grass::stencil::GlyphStencil;

/// Grid resolution used to estimate stencil coverage before sampling.
const ACCEPTANCE_GRID: u32 = 64;

/// Per-blade instance attributes (32 bytes).
/// Must match `InstanceInput` in grass.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BladeInstance {
    /// Root position, y always 0.
    pub offset: [f32; 3],
    /// Vertical scale of the blade.
    pub scale: f32,
    /// (sin, cos) of half the root yaw.
    pub half_root_angle: [f32; 2],
    /// Position in the field, i / N.
    pub index: f32,
    pub _pad: f32,
}

impl BladeInstance {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
            3 => Float32x3,
            4 => Float32,
            5 => Float32x2,
            6 => Float32,
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BladeInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }

    /// Root yaw in radians, in (-PI, PI].
    pub fn root_angle(&self) -> f32 {
        2.0 * self.half_root_angle[0].atan2(self.half_root_angle[1])
    }
}

/// Height scale range for blade `i`: every third blade is shorter.
pub fn scale_range(i: usize) -> (f32, f32) {
    if i % 3 != 0 { (2.0, 3.25) } else { (2.0, 3.0) }
}

/// The generated field.
#[derive(Clone, Debug)]
pub struct InstanceField {
    instances: Vec<BladeInstance>,
    stencil: GlyphStencil,
}

impl InstanceField {
    pub fn instances(&self) -> &[BladeInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn stencil(&self) -> &GlyphStencil {
        &self.stencil
    }

    /// Flattened root offsets, three floats per blade.
    pub fn offsets(&self) -> Vec<f32> {
        self.instances.iter().flat_map(|i| i.offset).collect()
    }

    pub fn scales(&self) -> Vec<f32> {
        self.instances.iter().map(|i| i.scale).collect()
    }

    /// Flattened half-angle pairs, two floats per blade.
    pub fn half_root_angles(&self) -> Vec<f32> {
        self.instances.iter().flat_map(|i| i.half_root_angle).collect()
    }

    pub fn indices(&self) -> Vec<f32> {
        self.instances.iter().map(|i| i.index).collect()
    }
}

/// Scatters blades inside a stencil.
pub struct FieldGenerator {
    stencil: GlyphStencil,
    rng: StdRng,
    max_attempts: u32,
    min_acceptance: f32,
}

impl FieldGenerator {
    pub fn new(stencil: GlyphStencil, seed: u64) -> Self {
        Self {
            stencil,
            rng: StdRng::seed_from_u64(seed),
            max_attempts: 10_000,
            min_acceptance: 0.01,
        }
    }

    pub fn from_config(config: &FieldConfig) -> Self {
        Self::new(GlyphStencil::new(config.stencil_scale), config.seed)
            .with_max_attempts(config.max_attempts)
            .with_min_acceptance(config.min_acceptance)
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_min_acceptance(mut self, ratio: f32) -> Self {
        self.min_acceptance = ratio;
        self
    }

    /// Generate `count` blades.
    pub fn generate(&mut self, count: usize) -> Result<InstanceField, Error> {
        if count == 0 {
            return Err(Error::Config("field needs at least one instance".into()));
        }
        let scale = self.stencil.scale();
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::Config(format!("invalid stencil scale {scale}")));
        }

        let ratio = self.stencil.acceptance_ratio(ACCEPTANCE_GRID);
        if ratio < self.min_acceptance {
            return Err(Error::Stencil(format!(
                "stencil covers {:.4} of its bounding box, below the minimum {:.4}",
                ratio, self.min_acceptance
            )));
        }
        log::info!("Stencil acceptance ratio {:.3}", ratio);

        let mut instances = Vec::with_capacity(count);
        for i in 0..count {
            let (x, z) = self.sample_root()?;

            let angle = PI - self.rng.gen_range(0.0..1.0f32) * (2.0 * PI);
            let (sin_half, cos_half) = (0.5 * angle).sin_cos();

            let (lo, hi) = scale_range(i);
            let scale = self.rng.gen_range(lo..hi);

            instances.push(BladeInstance {
                offset: [x, 0.0, z],
                scale,
                half_root_angle: [sin_half, cos_half],
                index: i as f32 / count as f32,
                _pad: 0.0,
            });
        }

        Ok(InstanceField {
            instances,
            stencil: self.stencil,
        })
    }

    /// Draw points in the sampling box until one lands inside the stencil.
    fn sample_root(&mut self) -> Result<(f32, f32), Error> {
        let ext = self.stencil.half_extents();
        for _ in 0..self.max_attempts {
            let x = -ext.x + self.rng.gen_range(0.0..1.0f32) * 2.0 * ext.x;
            let z = -ext.y + self.rng.gen_range(0.0..1.0f32) * 2.0 * ext.y;
            if self.stencil.is_inside(x, z) {
                return Ok((x, z));
            }
        }
        Err(Error::Stencil(format!(
            "no point accepted after {} attempts",
            self.max_attempts
        )))
    }
}
