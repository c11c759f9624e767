//! The rendering substrate seam

use arpen_core::{NodeId, Scene};
use glam::{Quat, Vec2, Vec3};

/// One ray hit, ordered nearest first in hit-test results
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Node whose geometry was hit
    pub node: NodeId,
    /// World-space hit coordinate
    pub point: Vec3,
    /// Distance from the ray origin
    pub distance: f32,
}

/// Projection and hit-testing provided by whatever renders the scene.
///
/// Screen points are pixels with y growing downwards; the third component
/// of a projected point is its depth in [0, 1].
pub trait Substrate {
    /// World point to `(x, y, depth)` in screen space
    fn project(&self, world: Vec3) -> Vec3;

    /// Screen point with depth back to world space
    fn unproject(&self, screen: Vec3) -> Vec3;

    /// Nodes under a screen point, nearest first
    fn hit_test(&self, scene: &Scene, screen: Vec2) -> Vec<Hit>;

    /// Current camera attitude in world space
    fn camera_orientation(&self) -> Quat;
}
