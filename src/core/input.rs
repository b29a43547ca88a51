//! Pointer input mapping
//!
//! The cursor is mapped onto the ground plane by inverting the screen-space
//! scale of a known reference point, not by ray casting. This matches the
//! straight-down overhead view, where the mapping is linear.

use winit::event::WindowEvent;

use crate::core::camera::Camera;
use crate::core::error::Error;
use crate::core::types::{Vec2, Vec3};

/// World point whose projection calibrates the mapping.
pub const REFERENCE_POINT: Vec3 = Vec3::new(1.0, 0.0, 1.0);

/// Converts window cursor positions to world (x, z) on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerMapping {
    x_max: f32,
    y_max: f32,
}

impl PointerMapping {
    /// Calibrate from the camera's current projection.
    pub fn from_camera(camera: &Camera) -> Result<Self, Error> {
        let ndc = camera.project(REFERENCE_POINT);
        if !ndc.x.is_finite() || !ndc.y.is_finite() || ndc.x.abs() < f32::EPSILON || ndc.y.abs() < f32::EPSILON {
            return Err(Error::Config(format!(
                "pointer reference point projects to degenerate NDC ({}, {})",
                ndc.x, ndc.y
            )));
        }
        Ok(Self {
            x_max: 1.0 / ndc.x,
            y_max: 1.0 / ndc.y,
        })
    }

    /// World extent covered by half the window along x and z.
    pub fn extents(&self) -> (f32, f32) {
        (self.x_max, self.y_max)
    }

    /// Map a cursor position in physical pixels to world (x, z).
    pub fn cursor_to_world(&self, cursor: (f32, f32), window: (f32, f32)) -> Vec2 {
        let (width, height) = (window.0.max(1.0), window.1.max(1.0));
        let x = (cursor.0 / width) * 2.0 * self.x_max - self.x_max;
        let z = -((cursor.1 / height) * 2.0 * self.y_max - self.y_max);
        Vec2::new(x, z)
    }

    /// Process a window event, returning the new world pointer if the cursor moved
    pub fn process_event(&self, event: &WindowEvent, window: (f32, f32)) -> Option<Vec2> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                Some(self.cursor_to_world((position.x as f32, position.y as f32), window))
            }
            _ => None,
        }
    }
}
