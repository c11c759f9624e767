//! Ray picking
//!
//! Ray tests against the shapes the engine hit-tests: node bounding boxes
//! (tested in the node's local frame so rotated boxes stay tight) and
//! spheres around small markers.

use arpen_core::SceneNode;
use glam::Vec3;

/// Parallel-ray tolerance for the slab test
const EPSILON: f32 = 1e-8;

/// Ray-AABB intersection using the slab method.
///
/// Returns the ray parameter of the entry point, or of the exit point when
/// the origin is inside the box. `None` if the box is missed or lies
/// entirely behind the origin.
pub fn ray_box_intersection(ray_origin: Vec3, ray_dir: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let origin = ray_origin[axis];
        let dir = ray_dir[axis];
        if dir.abs() < EPSILON {
            // Parallel to this slab: must already be inside it
            if origin < min[axis] || origin > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / dir;
        let mut t0 = (min[axis] - origin) * inv;
        let mut t1 = (max[axis] - origin) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }

    if t_max < 0.0 {
        return None;
    }
    Some(if t_min >= 0.0 { t_min } else { t_max })
}

/// Ray-sphere intersection.
///
/// Returns the nearest non-negative ray parameter (`ray_dir` normalized).
pub fn ray_sphere_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    center: Vec3,
    radius: f32,
) -> Option<f32> {
    let oc = ray_origin - center;
    let b = oc.dot(ray_dir);
    let c = oc.dot(oc) - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_d = discriminant.sqrt();
    let t = -b - sqrt_d;
    if t >= 0.0 {
        return Some(t);
    }
    let t = -b + sqrt_d;
    (t >= 0.0).then_some(t)
}

/// Intersect a world ray with a node's oriented local bounds.
///
/// Returns `(distance, world point)`. The ray is carried into the node's
/// local frame; the parameter is unchanged by that affine map, so the world
/// point is read straight off the world ray.
pub fn ray_node_intersection(ray_origin: Vec3, ray_dir: Vec3, node: &SceneNode) -> Option<(f32, Vec3)> {
    let transform = &node.transform;
    if transform.scale.cmpeq(Vec3::ZERO).any() {
        return None;
    }
    let local_origin = transform.inverse_apply(ray_origin);
    let local_dir = transform.inverse_apply(ray_origin + ray_dir) - local_origin;
    let bounds = &node.local_bounds;
    let t = ray_box_intersection(local_origin, local_dir, bounds.min, bounds.max)?;
    let point = ray_origin + ray_dir * t;
    Some((t * ray_dir.length(), point))
}
