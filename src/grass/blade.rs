//! Blade template: the single strip mesh every grass instance shares.
//!
//! The strip is built upright, base at y = 0, then bent by interpolating from
//! the identity toward a fixed composed rotation by normalized height. The
//! root row stays where it is and the tip takes the full rotation.

use bytemuck::{Pod, Zeroable};

use crate::core::error::Error;
use crate::core::types::{Quat, Vec3};
use crate::grass::config::BladeConfig;

/// Successive rotations composing the bend, applied in order.
pub const BEND_YAW: f32 = 0.05;
pub const BEND_PITCH: f32 = 0.3;
pub const BEND_ROLL: f32 = 0.1;

/// Template vertex. Must match `VertexInput` in grass.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BladeVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl BladeVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x2,
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BladeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Bent blade mesh.
#[derive(Clone, Debug)]
pub struct BladeTemplate {
    vertices: Vec<BladeVertex>,
    indices: Vec<u16>,
    height: f32,
}

/// Rotation the tip of the blade reaches.
pub fn bend_target() -> Quat {
    Quat::from_rotation_y(BEND_YAW) * Quat::from_rotation_x(BEND_PITCH) * Quat::from_rotation_z(BEND_ROLL)
}

/// Rotation applied to a vertex at normalized height `frac`.
pub fn bend_at(frac: f32) -> Quat {
    Quat::IDENTITY.slerp(bend_target(), frac)
}

impl BladeTemplate {
    /// Build and bend the template.
    pub fn build(config: &BladeConfig) -> Result<Self, Error> {
        let mut template = Self::upright(config)?;
        template.bend();
        template.compute_normals();
        Ok(template)
    }

    /// Unbent strip, base at y = 0, flat normals facing +Z.
    pub fn upright(config: &BladeConfig) -> Result<Self, Error> {
        let BladeConfig { joints, width, height } = *config;
        if joints == 0 {
            return Err(Error::Config("blade needs at least one joint".into()));
        }
        if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
            return Err(Error::Config(format!("invalid blade size {width} x {height}")));
        }
        // Two columns per row, u16 indices
        if (joints as usize + 1) * 2 > u16::MAX as usize {
            return Err(Error::Config(format!("too many blade joints: {joints}")));
        }

        let rows = joints as usize + 1;
        let segment = height / joints as f32;
        let half_width = width * 0.5;

        let mut vertices = Vec::with_capacity(rows * 2);
        for row in 0..rows {
            // Rows run from the tip down to the root
            let y = height - row as f32 * segment;
            let v = 1.0 - row as f32 / joints as f32;
            for col in 0..2 {
                let x = if col == 0 { -half_width } else { half_width };
                vertices.push(BladeVertex {
                    position: [x, y, 0.0],
                    normal: [0.0, 0.0, 1.0],
                    uv: [col as f32, v],
                });
            }
        }

        let mut indices = Vec::with_capacity(joints as usize * 6);
        for row in 0..joints as u16 {
            let a = row * 2;
            let b = (row + 1) * 2;
            let c = (row + 1) * 2 + 1;
            let d = row * 2 + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }

        Ok(Self { vertices, indices, height })
    }

    fn bend(&mut self) {
        for vertex in &mut self.vertices {
            let p = Vec3::from(vertex.position);
            let frac = p.y / self.height;
            vertex.position = (bend_at(frac) * p).to_array();
        }
    }

    /// Area-weighted smooth normals from the current positions.
    fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let (ia, ib, ic) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let pa = Vec3::from(self.vertices[ia].position);
            let pb = Vec3::from(self.vertices[ib].position);
            let pc = Vec3::from(self.vertices[ic].position);
            let face = (pc - pb).cross(pa - pb);
            normals[ia] += face;
            normals[ib] += face;
            normals[ic] += face;
        }
        for (vertex, n) in self.vertices.iter_mut().zip(normals) {
            vertex.normal = n.normalize_or_zero().to_array();
        }
    }

    pub fn vertices(&self) -> &[BladeVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Unscaled blade height.
    pub fn height(&self) -> f32 {
        self.height
    }
}
