//! CPU mirror of the grass vertex stage.
//!
//! `shaders/grass.wgsl` runs this per vertex per instance every frame. The
//! functions here perform the same arithmetic in the same order so the
//! deformation can be tested without a GPU; keep the two in sync.

use std::f32::consts::TAU;

use crate::core::types::{Vec2, Vec3, Vec4};
use crate::grass::blade::BladeVertex;
use crate::grass::field::BladeInstance;
use crate::grass::params::GrassUniforms;
use crate::terrain::HeightField;

/// Constant tilt applied to every blade before the wind, as (x, y, z, w).
pub const STATIC_TILT: Vec4 = Vec4::new(0.5, 0.0, 0.0, 0.0);

/// Identity rotation, used inside the pointer calm zone.
pub const NO_WIND: Vec4 = Vec4::W;

/// Rotate `v` by the quaternion `q` stored as (x, y, z, w).
///
/// `q` is not required to be unit length; the result is then not a pure
/// rotation, which `STATIC_TILT` relies on.
pub fn rotate_by_quaternion(v: Vec3, q: Vec4) -> Vec3 {
    let u = q.truncate();
    2.0 * u.cross(v * q.w + u.cross(v)) + v
}

/// Map a coordinate into the tile `[-width / 2, width / 2)`.
pub fn wrap_to_tile(g: f32, width: f32) -> f32 {
    let tile = ((g + 0.5 * width) / width).floor();
    let wrapped = g - tile * width;
    // The division can round across the seam; pull the result back inside
    if wrapped >= 0.5 * width {
        wrapped - width
    } else if wrapped < -0.5 * width {
        wrapped + width
    } else {
        wrapped
    }
}

/// Root offset relative to the tracked position, wrapped into the tile.
pub fn wrapped_position(offset: Vec2, uniforms: &GrassUniforms) -> Vec2 {
    let tracked = Vec2::new(uniforms.tracked_x, uniforms.tracked_z);
    let global = offset - tracked * uniforms.tile_delta;
    Vec2::new(
        wrap_to_tile(global.x, uniforms.tile_width),
        wrap_to_tile(global.y, uniforms.tile_width),
    )
}

/// Ground height under a wrapped position.
pub fn ground_height(wrapped: Vec2, uniforms: &GrassUniforms, heights: &HeightField) -> f32 {
    let tracked = Vec2::new(uniforms.tracked_x, uniforms.tracked_z);
    let p = wrapped + tracked * uniforms.tile_delta;
    heights.height_at(p.x, p.y, uniforms.height_amplitude, uniforms.height_period)
}

/// Wind sway quaternion for a blade rooted at `offset`.
///
/// The phase is the blade's fractional position in the tile scaled to a full
/// turn, so the sway matches across tile edges.
pub fn wind_quaternion(offset: Vec2, tile_width: f32, time: f32) -> Vec4 {
    let fractional = (Vec2::splat(0.5) + offset / tile_width) * TAU;

    let mut half_angle = -(0.5 + 0.5 * (fractional.x + time).sin()) * 0.1;
    half_angle -= (0.5 + 0.5 * (fractional.y + time).cos()) * 0.05;

    let (s, c) = half_angle.sin_cos();
    Vec4::new(s, 0.0, -s, c).normalize()
}

/// Wind rotation after the pointer calm zone is applied.
pub fn wind_rotation(offset: Vec2, uniforms: &GrassUniforms) -> Vec4 {
    let pointer = Vec2::new(uniforms.pointer_x, uniforms.pointer_z);
    if offset.distance(pointer) < uniforms.calm_radius {
        NO_WIND
    } else {
        wind_quaternion(offset, uniforms.tile_width, uniforms.time)
    }
}

/// Yaw quaternion rebuilt from the stored half-angle pair.
pub fn root_yaw(half_root_angle: [f32; 2]) -> Vec4 {
    Vec4::new(0.0, half_root_angle[0], 0.0, half_root_angle[1])
}

/// Deformed vertex in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeformedVertex {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Full vertex stage for one template vertex of one instance.
pub fn deform_vertex(
    vertex: &BladeVertex,
    instance: &BladeInstance,
    uniforms: &GrassUniforms,
    heights: &HeightField,
) -> DeformedVertex {
    let mut position = Vec3::from(vertex.position);
    position.y *= instance.scale;
    let mut normal = Vec3::from(vertex.normal);
    normal.y /= instance.scale;

    // Tilt in the blade's own frame so the squash does not depend on yaw
    position = rotate_by_quaternion(position, STATIC_TILT);
    normal = rotate_by_quaternion(normal, STATIC_TILT);

    let yaw = root_yaw(instance.half_root_angle);
    position = rotate_by_quaternion(position, yaw);
    normal = rotate_by_quaternion(normal, yaw);

    let offset = Vec2::new(instance.offset[0], instance.offset[2]);
    let wrapped = wrapped_position(offset, uniforms);
    let ground = ground_height(wrapped, uniforms, heights);

    let wind = wind_rotation(offset, uniforms);
    position = rotate_by_quaternion(position, wind);
    normal = rotate_by_quaternion(normal, wind);

    DeformedVertex {
        position: position + Vec3::new(wrapped.x, ground, wrapped.y),
        normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Quat;

    fn uniforms() -> GrassUniforms {
        GrassUniforms {
            time: 1.25,
            tile_delta: 300.0 / 64.0,
            tracked_x: 0.01,
            tracked_z: 0.01,
            pointer_x: 0.0,
            pointer_z: 0.0,
            tile_width: 300.0,
            calm_radius: 3.0,
            height_amplitude: 8.0,
            height_period: 800.0,
            _pad: [0.0; 2],
            blade_color: [0.0, 0.0, 0.0, 1.0],
        }
    }

    fn flat_ground() -> HeightField {
        // 127/255 is close to mid grey; the exact height is checked separately
        HeightField::from_texels(1, 1, vec![127]).unwrap()
    }

    fn instance(x: f32, z: f32) -> BladeInstance {
        BladeInstance {
            offset: [x, 0.0, z],
            scale: 2.0,
            half_root_angle: [0.0, 1.0],
            index: 0.0,
            _pad: 0.0,
        }
    }

    #[test]
    fn test_unit_quaternion_matches_glam() {
        let q = Quat::from_rotation_y(0.7) * Quat::from_rotation_x(-0.2);
        let v = Vec3::new(0.3, 1.5, -2.0);
        let ours = rotate_by_quaternion(v, Vec4::from(q));
        assert!((ours - q * v).length() < 1e-5);
    }

    #[test]
    fn test_static_tilt_exact() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(rotate_by_quaternion(v, STATIC_TILT), Vec3::new(1.0, 1.0, 1.5));
        assert_eq!(rotate_by_quaternion(v, NO_WIND), v);
    }

    fn assert_wrap_law(g: f32, width: f32) {
        let once = wrap_to_tile(g, width);
        assert!(once >= -0.5 * width && once < 0.5 * width, "{g} -> {once}");
        let twice = wrap_to_tile(once, width);
        assert_eq!(twice, once, "{g} -> {once} -> {twice}");
    }

    #[test]
    fn test_wrap_bounded_and_idempotent() {
        let width = 300.0;
        for i in 0..2_000 {
            assert_wrap_law(i as f32 * 7.31 - 7_000.0, width);
        }
    }

    #[test]
    fn test_wrap_law_at_seams() {
        let width = 300.0f32;
        for k in -3_000..3_000 {
            let seam = k as f32 * width + 0.5 * width;
            if seam == 0.0 {
                continue;
            }
            // Walk the f32 neighbours on both sides of the seam
            let bits = seam.to_bits();
            for step in 0..=16u32 {
                assert_wrap_law(f32::from_bits(bits + step), width);
                assert_wrap_law(f32::from_bits(bits - step), width);
            }
        }
        assert_wrap_law(-150.00002, width);
        assert_wrap_law(149.99998, width);
    }

    #[test]
    fn test_wrap_shifts_by_whole_tiles() {
        let width = 300.0;
        assert_eq!(wrap_to_tile(10.0, width), 10.0);
        assert_eq!(wrap_to_tile(160.0, width), -140.0);
        assert_eq!(wrap_to_tile(-150.0, width), -150.0);
        assert_eq!(wrap_to_tile(150.0, width), -150.0);
        assert_eq!(wrap_to_tile(-460.0, width), 140.0);
    }

    #[test]
    fn test_wrapped_position_follows_tracking() {
        let mut u = uniforms();
        u.tracked_x = 10.0;
        u.tracked_z = -2.0;
        let w = wrapped_position(Vec2::new(5.0, 5.0), &u);
        let expected_x = wrap_to_tile(5.0 - 10.0 * u.tile_delta, 300.0);
        let expected_z = wrap_to_tile(5.0 + 2.0 * u.tile_delta, 300.0);
        assert!((w.x - expected_x).abs() < 1e-4);
        assert!((w.y - expected_z).abs() < 1e-4);

        // Far travel stays inside the tile
        u.tracked_x = 1.0e5;
        let w = wrapped_position(Vec2::new(5.0, 5.0), &u);
        assert!(w.x.abs() <= 150.5);
    }

    #[test]
    fn test_wind_seamless_across_tile() {
        // Offsets one tile apart sway identically
        for (x, z) in [(-150.0, 20.0), (10.0, -149.0), (75.0, 75.0)] {
            let a = wind_quaternion(Vec2::new(x, z), 300.0, 2.0);
            let b = wind_quaternion(Vec2::new(x + 300.0, z - 300.0), 300.0, 2.0);
            assert!((a - b).length() < 1e-4);
        }
    }

    #[test]
    fn test_wind_is_unit_and_bounded() {
        for i in 0..100 {
            let t = i as f32 * 0.37;
            let q = wind_quaternion(Vec2::new(i as f32, -(i as f32)), 300.0, t);
            assert!((q.length() - 1.0).abs() < 1e-5);
            // Half angle in [-0.15, 0]
            assert!(q.x <= 1e-6 && q.x >= (-0.15f32).sin() - 1e-6);
            assert_eq!(q.y, 0.0);
            assert!((q.z + q.x).abs() < 1e-6);
        }
    }

    #[test]
    fn test_calm_zone_cutoff() {
        let mut u = uniforms();
        u.pointer_x = 10.0;
        u.pointer_z = -4.0;

        let inside = wind_rotation(Vec2::new(12.0, -4.0), &u);
        assert_eq!(inside, NO_WIND);

        // Exactly on the radius the wind still applies
        let edge = Vec2::new(13.0, -4.0);
        assert_eq!(edge.distance(Vec2::new(10.0, -4.0)), 3.0);
        assert_eq!(wind_rotation(edge, &u), wind_quaternion(edge, u.tile_width, u.time));
        assert_ne!(wind_rotation(edge, &u), NO_WIND);
    }

    #[test]
    fn test_root_vertex_lands_on_ground() {
        let u = uniforms();
        let ground = flat_ground();
        let root = BladeVertex {
            position: [0.0, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            uv: [0.5, 0.0],
        };
        let inst = instance(20.0, -30.0);
        let out = deform_vertex(&root, &inst, &u, &ground);

        let wrapped = wrapped_position(Vec2::new(20.0, -30.0), &u);
        let expected_y = 8.0 * (2.0 * 127.0 / 255.0 - 1.0);
        assert!((out.position - Vec3::new(wrapped.x, expected_y, wrapped.y)).length() < 1e-4);
    }

    #[test]
    fn test_calm_blade_only_scaled_and_tilted() {
        let mut u = uniforms();
        u.pointer_x = 20.0;
        u.pointer_z = -30.0;
        let ground = flat_ground();
        let tip = BladeVertex {
            position: [0.0, 5.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            uv: [0.5, 1.0],
        };
        let inst = instance(20.0, -30.0);
        let out = deform_vertex(&tip, &inst, &u, &ground);
        let base = deform_vertex(
            &BladeVertex { position: [0.0; 3], ..tip },
            &inst,
            &u,
            &ground,
        );

        // Scale 2 doubles the tip height, the tilt halves it
        assert!((out.position - base.position - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-4);
        // Normal: tilt halves z
        assert!((out.normal - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-5);
    }

    #[test]
    fn test_root_yaw_turns_blade() {
        let mut u = uniforms();
        u.pointer_x = 20.0;
        u.pointer_z = -30.0;
        let ground = flat_ground();
        let edge = BladeVertex {
            position: [1.0, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            uv: [1.0, 0.0],
        };
        let mut inst = instance(20.0, -30.0);
        // Quarter turn around +Y takes +X to -Z
        let half = std::f32::consts::FRAC_PI_4;
        inst.half_root_angle = [half.sin(), half.cos()];

        let out = deform_vertex(&edge, &inst, &u, &ground);
        let root = deform_vertex(&BladeVertex { position: [0.0; 3], ..edge }, &inst, &u, &ground);
        assert!((out.position - root.position - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_blade_width_independent_of_yaw() {
        let mut u = uniforms();
        u.pointer_x = 20.0;
        u.pointer_z = -30.0;
        let ground = flat_ground();
        let left = BladeVertex {
            position: [-0.2, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            uv: [0.0, 0.0],
        };
        let right = BladeVertex { position: [0.2, 0.0, 0.0], ..left };

        for angle in [0.0f32, 0.7, std::f32::consts::FRAC_PI_2, 2.5, -1.9] {
            let mut inst = instance(20.0, -30.0);
            let half = 0.5 * angle;
            inst.half_root_angle = [half.sin(), half.cos()];
            let a = deform_vertex(&left, &inst, &u, &ground).position;
            let b = deform_vertex(&right, &inst, &u, &ground).position;
            assert!((a.distance(b) - 0.4).abs() < 1e-5, "yaw {angle}: width {}", a.distance(b));
        }
    }
}
