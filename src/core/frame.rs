//! Per-frame shared state
//!
//! Written from two places: the redraw tick advances time and the tracked
//! position, cursor events overwrite the pointer. Each field has exactly one
//! writer and the grass uniforms read a snapshot once per frame.

use crate::core::types::Vec2;

/// Time, tracked ground position and pointer for the current frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameContext {
    time: f32,
    time_scale: f32,
    tracked: Vec2,
    drift: Vec2,
    pointer: Vec2,
}

impl FrameContext {
    /// `time_scale` converts wall-clock seconds to wind time; `drift` moves the
    /// tracked position per unit of wind time.
    pub fn new(time_scale: f32, tracked: Vec2, drift: Vec2) -> Self {
        Self {
            time: 0.0,
            time_scale,
            tracked,
            drift,
            pointer: Vec2::ZERO,
        }
    }

    /// Advance by one frame of `dt_secs` wall-clock seconds.
    pub fn advance(&mut self, dt_secs: f32) {
        let dt = dt_secs.max(0.0) * self.time_scale;
        self.time += dt;
        self.tracked += self.drift * dt;
    }

    /// Last write wins; only the latest pointer position matters.
    pub fn set_pointer(&mut self, pointer: Vec2) {
        self.pointer = pointer;
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn tracked(&self) -> Vec2 {
        self.tracked
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_scale() {
        let mut frame = FrameContext::new(5.0, Vec2::ZERO, Vec2::ZERO);
        frame.advance(0.2);
        frame.advance(0.2);
        assert!((frame.time() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_time_monotonic() {
        let mut frame = FrameContext::new(5.0, Vec2::ZERO, Vec2::ZERO);
        let mut last = frame.time();
        for dt in [0.016, 0.0, -1.0, 0.033] {
            frame.advance(dt);
            assert!(frame.time() >= last);
            last = frame.time();
        }
    }

    #[test]
    fn test_drift_moves_tracked() {
        let mut frame = FrameContext::new(2.0, Vec2::new(0.01, 0.01), Vec2::new(1.0, -0.5));
        frame.advance(1.0);
        assert!((frame.tracked() - Vec2::new(2.01, -0.99)).length() < 1e-5);
    }

    #[test]
    fn test_pointer_last_write_wins() {
        let mut frame = FrameContext::new(1.0, Vec2::ZERO, Vec2::ZERO);
        frame.set_pointer(Vec2::new(1.0, 2.0));
        frame.set_pointer(Vec2::new(-3.0, 4.0));
        assert_eq!(frame.pointer(), Vec2::new(-3.0, 4.0));
        // Advancing time leaves the pointer alone
        frame.advance(0.5);
        assert_eq!(frame.pointer(), Vec2::new(-3.0, 4.0));
    }
}
