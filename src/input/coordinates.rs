//! Coordinate Mapping
//!
//! Maps positions local to the on-screen touch surface into the touchpad's
//! device space (0..=[`DEVICE_MAX_X`], 0..=[`DEVICE_MAX_Y`]).

use tracing::debug;

use crate::device::{DEVICE_MAX_X, DEVICE_MAX_Y};

/// Size of the touch surface in UI units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
        }
    }
}

/// Surface-to-device coordinate mapper
#[derive(Debug, Clone, Default)]
pub struct CoordinateMapper {
    surface: SurfaceSize,
}

impl CoordinateMapper {
    /// Mapper for a surface of the given size
    pub fn new(width: f64, height: f64) -> Self {
        let mut mapper = Self::default();
        mapper.set_surface_size(width, height);
        mapper
    }

    /// Update the surface size
    ///
    /// Non-positive or non-finite dimensions are ignored and the previous
    /// size is kept.
    pub fn set_surface_size(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() {
            self.surface = SurfaceSize { width, height };
        } else {
            debug!("Ignoring invalid surface size {}x{}", width, height);
        }
    }

    /// Current surface size
    pub fn surface_size(&self) -> SurfaceSize {
        self.surface
    }

    /// Surface position to device position, truncated and clamped
    pub fn to_device(&self, x: f64, y: f64) -> (i32, i32) {
        let dx = (x / self.surface.width * DEVICE_MAX_X as f64) as i32;
        let dy = (y / self.surface.height * DEVICE_MAX_Y as f64) as i32;
        (dx.clamp(0, DEVICE_MAX_X), dy.clamp(0, DEVICE_MAX_Y))
    }
}
