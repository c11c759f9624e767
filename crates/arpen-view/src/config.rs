//! Viewport configuration
//!
//! Camera parameters for the software viewport, serializable so recorded
//! sessions replay against the same camera.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::camera::{Camera, Projection};

/// Viewport and camera configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewportConfig {
    /// Viewport width in pixels
    pub width: f32,
    /// Viewport height in pixels
    pub height: f32,
    /// Projection model
    pub projection: Projection,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
    /// Initial camera position
    pub camera_position: Vec3,
    /// Initial camera orientation
    pub camera_orientation: Quat,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self::handheld()
    }
}

impl ViewportConfig {
    /// Phone held in landscape half a meter from the origin
    pub fn handheld() -> Self {
        Self {
            width: 2436.0,
            height: 1125.0,
            projection: Projection::Perspective {
                fov_y: 60.0_f32.to_radians(),
            },
            near: 0.001,
            far: 1000.0,
            camera_position: Vec3::new(0.0, 0.0, 0.5),
            camera_orientation: Quat::IDENTITY,
        }
    }

    /// Parallel projection, useful where screen and world must map linearly
    pub fn orthographic(half_height: f32, pixels: f32) -> Self {
        Self {
            width: pixels,
            height: pixels,
            projection: Projection::Orthographic { half_height },
            near: 0.01,
            far: 100.0,
            ..Self::handheld()
        }
    }

    /// Build the camera described by this configuration
    pub fn camera(&self) -> Camera {
        Camera {
            position: self.camera_position,
            orientation: self.camera_orientation.normalize(),
            projection: self.projection,
            width: self.width.max(1.0),
            height: self.height.max(1.0),
            near: self.near,
            far: self.far,
        }
    }
}
