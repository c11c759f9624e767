//! Camera for projecting between world and screen space

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Camera projection model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    /// Pinhole camera with a vertical field of view in radians
    Perspective {
        /// Vertical field of view in radians
        fov_y: f32,
    },
    /// Parallel projection showing `half_height` world units above and below center
    Orthographic {
        /// Half of the visible world height
        half_height: f32,
    },
}

/// Camera looking down its local -Z axis with +Y up
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// World position
    pub position: Vec3,
    /// World orientation (device attitude)
    pub orientation: Quat,
    /// Projection model
    pub projection: Projection,
    /// Viewport width in pixels
    pub width: f32,
    /// Viewport height in pixels
    pub height: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
}

impl Camera {
    /// Aspect ratio of the viewport
    pub fn aspect(&self) -> f32 {
        self.width / self.height.max(1.0)
    }

    /// Get view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position).inverse()
    }

    /// Get projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov_y } => {
                Mat4::perspective_rh(fov_y, self.aspect(), self.near, self.far)
            }
            Projection::Orthographic { half_height } => {
                let half_width = half_height * self.aspect();
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Combined view-projection matrix
    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World point to `(pixel x, pixel y, depth)`, depth in [0, 1] between
    /// the near and far planes. Pixel y grows downwards.
    pub fn project(&self, world: Vec3) -> Vec3 {
        let clip = self.view_proj() * world.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        Vec3::new(
            (ndc.x + 1.0) * 0.5 * self.width,
            (1.0 - ndc.y) * 0.5 * self.height,
            ndc.z,
        )
    }

    /// Inverse of [`Camera::project`].
    pub fn unproject(&self, screen: Vec3) -> Vec3 {
        let ndc = Vec4::new(
            2.0 * screen.x / self.width - 1.0,
            1.0 - 2.0 * screen.y / self.height,
            screen.z,
            1.0,
        );
        let world = self.view_proj().inverse() * ndc;
        world.truncate() / world.w
    }

    /// Convert screen coordinates to a world ray `(origin, direction)`.
    pub fn screen_to_ray(&self, screen: Vec2) -> (Vec3, Vec3) {
        let near_world = self.unproject(screen.extend(0.0));
        let far_world = self.unproject(screen.extend(1.0));
        (near_world, (far_world - near_world).normalize())
    }

    /// Camera right axis in world space
    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    /// Camera up axis in world space
    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    /// Viewing direction in world space
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }
}
