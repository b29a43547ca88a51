//! GPU-ready grass uniform (64 bytes, 16-byte aligned).

use bytemuck::{Pod, Zeroable};

/// Per-frame grass uniform. Must match `GrassUniforms` in grass.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GrassUniforms {
    /// Wind time accumulator.
    pub time: f32,
    /// World distance per tracked position unit.
    pub tile_delta: f32,
    pub tracked_x: f32,
    pub tracked_z: f32,
    // -- 16 bytes --
    /// Pointer on the ground plane, world units.
    pub pointer_x: f32,
    pub pointer_z: f32,
    pub tile_width: f32,
    pub calm_radius: f32,
    // -- 16 bytes --
    pub height_amplitude: f32,
    pub height_period: f32,
    pub _pad: [f32; 2],
    // -- 16 bytes --
    pub blade_color: [f32; 4],
    // -- 16 bytes --
    // Total: 64 bytes
}
