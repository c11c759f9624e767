//! CPU implementation of the rendering substrate

use arpen_core::{NodeKind, Scene};
use glam::{Quat, Vec2, Vec3};

use crate::camera::Camera;
use crate::config::ViewportConfig;
use crate::picking::{ray_node_intersection, ray_sphere_intersection};
use crate::substrate::{Hit, Substrate};

/// Hit-tests scene nodes by casting rays through a [`Camera`].
///
/// Object and surface nodes are tested against their oriented bounds;
/// corner and edge markers against their bounding sphere, which makes the
/// tiny cubes easier to grab.
#[derive(Debug, Clone)]
pub struct SoftwareViewport {
    /// Camera used for projection and ray casting
    pub camera: Camera,
}

impl SoftwareViewport {
    /// Create a viewport from configuration
    pub fn new(config: &ViewportConfig) -> Self {
        Self {
            camera: config.camera(),
        }
    }

    /// Move the camera, e.g. to follow the tracked device
    pub fn set_pose(&mut self, position: Vec3, orientation: Quat) {
        self.camera.position = position;
        self.camera.orientation = orientation.normalize();
    }

    /// Cast a world ray against every visible node, nearest hit first
    pub fn cast_ray(&self, scene: &Scene, origin: Vec3, dir: Vec3) -> Vec<Hit> {
        let mut hits: Vec<Hit> = scene
            .iter()
            .filter(|node| !node.hidden)
            .filter_map(|node| {
                let (distance, point) = match node.kind {
                    NodeKind::CornerMarker { .. } | NodeKind::EdgeMarker { .. } => {
                        let center = node.world_center();
                        let radius = node.world_bounds().radius();
                        let t = ray_sphere_intersection(origin, dir, center, radius)?;
                        (t, origin + dir * t)
                    }
                    _ => ray_node_intersection(origin, dir, node)?,
                };
                Some(Hit {
                    node: node.id,
                    point,
                    distance,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

impl Substrate for SoftwareViewport {
    fn project(&self, world: Vec3) -> Vec3 {
        self.camera.project(world)
    }

    fn unproject(&self, screen: Vec3) -> Vec3 {
        self.camera.unproject(screen)
    }

    fn hit_test(&self, scene: &Scene, screen: Vec2) -> Vec<Hit> {
        let (origin, dir) = self.camera.screen_to_ray(screen);
        if !dir.is_finite() {
            tracing::debug!("Degenerate ray at {:?}", screen);
            return Vec::new();
        }
        self.cast_ray(scene, origin, dir)
    }

    fn camera_orientation(&self) -> Quat {
        self.camera.orientation
    }
}
