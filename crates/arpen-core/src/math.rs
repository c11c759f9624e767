//! Angle and quaternion helpers

use glam::{Quat, Vec3};

use crate::constants::GEOMETRY_EPSILON;

/// Fold an angle in degrees into [0, 180]: anything past a half turn is
/// measured the short way round (`360 - angle`).
pub fn fold_degrees(degrees: f32) -> f32 {
    let a = degrees.abs() % 360.0;
    if a > 180.0 { 360.0 - a } else { a }
}

/// Rotation angle of a quaternion in degrees, folded into [0, 180].
pub fn rotation_degrees(q: Quat) -> f32 {
    let (_, angle) = q.normalize().to_axis_angle();
    fold_degrees(angle.to_degrees())
}

/// Angle in degrees between two orientations, folded into [0, 180].
pub fn relative_angle_degrees(a: Quat, b: Quat) -> f32 {
    rotation_degrees(a * b.inverse())
}

/// Axis and angle (radians) of the rotation taking `from` onto `to` in world space.
///
/// Returns `None` for an identity delta, where the axis is undefined.
pub fn world_delta(from: Quat, to: Quat) -> Option<(Vec3, f32)> {
    let delta = (to * from.inverse()).normalize();
    let (axis, angle) = delta.to_axis_angle();
    if angle.abs() <= GEOMETRY_EPSILON || !axis.is_finite() {
        return None;
    }
    Some((axis, angle))
}

/// Unit quaternion from a raw sensor reading. Finite readings of any
/// nonzero length are normalized; `None` for anything else.
pub fn normalized_sample(q: Quat) -> Option<Quat> {
    (q.is_finite() && q.length_squared() > GEOMETRY_EPSILON).then(|| q.normalize())
}

/// Quaternion with a finite, unit-length check.
pub fn is_unit(q: Quat) -> bool {
    q.is_finite() && (q.length() - 1.0).abs() < 1e-4
}
