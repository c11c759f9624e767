//! Orientation-rebasing rotation
//!
//! While the action button is held, every frame measures the world-space
//! rotation of the orientation source since the previous frame, carries its
//! axis into the object's local frame and applies it about the object's
//! bounding-box center. The baseline then rolls forward to the current
//! sample, so nothing accumulates from the press.
//!
//! The bucketed variant reads the tilt since the press instead and spins
//! the object by a fixed step per frame chosen from [`SpeedBuckets`].

pub mod touch;

use arpen_core::math::{fold_degrees, normalized_sample, relative_angle_degrees, world_delta};
use arpen_core::{NodeId, NodeKind, OrientationSource, Scene, SpeedBuckets, Transform};
use glam::{Quat, Vec3};

use crate::frame::FrameInput;
use crate::input::ButtonEvents;
use crate::metrics::SessionMetrics;
use crate::selection::SelectionController;
use crate::technique::{FrameContext, ManipulationTechnique, TechniqueConfig, TechniqueKind};

/// Apply a world-space rotation to a node, keeping `center_local` fixed.
///
/// The world axis is carried into the object's frame by its orientation
/// only, so the result is exactly `delta * orientation`.
pub fn apply_world_delta(transform: &mut Transform, axis: Vec3, angle: f32, center_local: Vec3) -> bool {
    let local_axis = (transform.orientation.inverse() * axis).normalize_or_zero();
    if local_axis == Vec3::ZERO || !angle.is_finite() {
        return false;
    }
    transform.local_rotate_about(Quat::from_axis_angle(local_axis, angle), center_local);
    true
}

/// Angle between `target` and the scene's reference model, if it has one.
pub fn final_relative_angle(scene: &Scene, target: NodeId) -> Option<f32> {
    let reference = scene.find_kind(NodeKind::Reference)?;
    let a = scene.transform(target)?.orientation;
    let b = scene.transform(reference)?.orientation;
    Some(relative_angle_degrees(a, b))
}

/// Read the configured orientation source; `None` is a sensor gap.
/// Unnormalized readings are normalized rather than dropped.
fn read_source(source: OrientationSource, input: &FrameInput) -> Option<Quat> {
    let q = match source {
        OrientationSource::Device => input.device_orientation,
        OrientationSource::Pointer => input.pointer_orientation,
    }?;
    normalized_sample(q)
}

#[derive(Debug, Clone, Copy)]
struct Tracking {
    target: NodeId,
    /// Source orientation at the press; `None` until the first valid sample
    press: Option<Quat>,
    baseline: Option<Quat>,
}

pub struct Rotator {
    kind: TechniqueKind,
    config: TechniqueConfig,
    controller: SelectionController,
    tracking: Option<Tracking>,
    metrics: SessionMetrics,
}

impl Rotator {
    pub fn new(kind: TechniqueKind, config: TechniqueConfig) -> Self {
        Self {
            kind,
            controller: SelectionController::new(config.selection_cap),
            config,
            tracking: None,
            metrics: SessionMetrics::default(),
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.is_some()
    }

    pub fn controller(&self) -> &SelectionController {
        &self.controller
    }

    fn track(&mut self, ctx: &mut FrameContext<'_>, input: &FrameInput) {
        let name = self.kind.name();
        let Some(tracking) = self.tracking.as_mut() else {
            return;
        };
        let Some(current) = read_source(self.config.orientation_source, input) else {
            tracing::trace!("No orientation sample at {:.3}s, skipping", input.time);
            return;
        };
        let (Some(press), Some(baseline)) = (tracking.press, tracking.baseline) else {
            tracking.press = Some(current);
            tracking.baseline = Some(current);
            return;
        };
        tracking.baseline = Some(current);

        let Some(node) = ctx.scene.get_mut(tracking.target) else {
            ctx.missing.report(name, "target", tracking.target);
            return;
        };
        let center = node.local_bounds.center();
        let frame_delta = world_delta(baseline, current);
        let source_degrees = frame_delta.map_or(0.0, |(_, angle)| fold_degrees(angle.to_degrees()));

        match &self.config.buckets {
            Some(buckets) => {
                let applied = apply_bucketed(&mut node.transform, buckets, press, current, center);
                self.metrics.record_rotation(source_degrees, applied);
            }
            None => {
                let Some((axis, angle)) = frame_delta else {
                    return;
                };
                if self.config.max_frame_delta.is_some_and(|max| source_degrees >= max) {
                    tracing::debug!("Dropping {:.1} degree frame as a tracking glitch", source_degrees);
                    return;
                }
                if apply_world_delta(&mut node.transform, axis, angle, center) {
                    self.metrics.record_rotation(source_degrees, source_degrees);
                }
            }
        }
    }

    fn release(&mut self, ctx: &mut FrameContext<'_>, time: f32) {
        let Some(tracking) = self.tracking.take() else {
            return;
        };
        self.metrics.end(time);
        if let Some(angle) = final_relative_angle(ctx.scene, tracking.target) {
            self.metrics.final_relative_angle = Some(angle);
        }
        if !ctx.commit(tracking.target) {
            ctx.missing.report(self.kind.name(), "target", tracking.target);
        }
        tracing::debug!(
            "Rotation released after {:.1} degrees",
            self.metrics.degrees_object_rotated
        );
    }
}

/// One frame of rate-controlled rotation; returns the degrees applied.
fn apply_bucketed(transform: &mut Transform, buckets: &SpeedBuckets, press: Quat, current: Quat, center: Vec3) -> f32 {
    let Some((mut axis, angle)) = world_delta(press, current) else {
        return 0.0;
    };
    if angle > std::f32::consts::PI {
        axis = -axis;
    }
    let step = buckets.classify(angle.to_degrees());
    if step > 0.0 && apply_world_delta(transform, axis, step.to_radians(), center) {
        step
    } else {
        0.0
    }
}

impl ManipulationTechnique for Rotator {
    fn kind(&self) -> TechniqueKind {
        self.kind
    }

    fn deactivate(&mut self, ctx: &mut FrameContext<'_>) {
        let time = ctx.time;
        self.release(ctx, time);
        self.controller.clear(ctx.scene);
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, input: &FrameInput, events: &ButtonEvents) {
        self.controller.selection.retain_existing(ctx.scene);
        let action = self.config.action_button;

        if self.tracking.is_some() {
            if events.released(action) || !events.is_held(action) {
                self.release(ctx, input.time);
            } else {
                self.track(ctx, input);
            }
            return;
        }

        self.controller
            .update_hover(ctx.scene, ctx.substrate, input.pointer);
        if self
            .controller
            .handle_select_button(ctx.scene, events, self.config.select_button)
        {
            self.metrics.selection_count += 1;
        }

        if events.pressed(action) {
            let Some(target) = self.controller.selection.first() else {
                return;
            };
            let sample = read_source(self.config.orientation_source, input);
            if sample.is_none() {
                tracing::debug!("Rotation pressed without an orientation sample");
            }
            self.metrics.start_unless_running(input.time);
            self.tracking = Some(Tracking {
                target,
                press: sample,
                baseline: sample,
            });
        }
    }

    fn reset(&mut self, ctx: &mut FrameContext<'_>) {
        self.tracking = None;
        self.controller.clear(ctx.scene);
        self.metrics.reset();
    }

    fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use approx::assert_relative_eq;
    use arpen_core::math::is_unit;
    use arpen_core::{Button, EngineConfig, SceneNode};

    fn rotator(kind: TechniqueKind) -> Rotator {
        Rotator::new(kind, TechniqueConfig::preset(kind, &EngineConfig::default()))
    }

    fn device(time: f32, q: Option<Quat>, held: &[Button]) -> FrameInput {
        let mut input = frame(time, Vec3::new(0.3, 0.0, 0.0), held);
        input.device_orientation = q;
        input
    }

    /// Harness with the box selected by a click on it
    fn selected(rotator: &mut Rotator) -> (Harness, NodeId) {
        let (scene, id) = scene_with_box();
        let mut h = Harness::new(scene);
        let center = Vec3::new(0.0, 0.2, 0.0);
        h.step(rotator, frame(0.0, center, &[Button::Primary]));
        h.step(rotator, frame(0.05, center, &[]));
        (h, id)
    }

    fn assert_quat_eq(a: Quat, b: Quat) {
        assert!(a.dot(b).abs() > 1.0 - 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn test_follows_source_rotation() {
        let mut rotator = rotator(TechniqueKind::DeviceRotate);
        let (mut h, id) = selected(&mut rotator);
        let q0 = Quat::from_rotation_x(0.3);
        let q1 = Quat::from_rotation_y(0.4) * q0;

        h.step(&mut rotator, device(0.1, Some(q0), &[Button::Secondary]));
        assert!(rotator.is_tracking());
        h.step(&mut rotator, device(0.2, Some(q1), &[Button::Secondary]));
        assert_quat_eq(h.transform(id).orientation, Quat::from_rotation_y(0.4));
        assert_relative_eq!(rotator.metrics().degrees_object_rotated, 0.4_f32.to_degrees(), epsilon = 1e-2);
    }

    #[test]
    fn test_frame_deltas_compose() {
        let samples = [
            Quat::from_rotation_x(0.1),
            Quat::from_euler(glam::EulerRot::XYZ, 0.2, 0.15, -0.05),
            Quat::from_euler(glam::EulerRot::XYZ, 0.25, 0.3, 0.1),
            Quat::from_euler(glam::EulerRot::XYZ, 0.1, 0.2, 0.3),
        ];
        let mut rotator = rotator(TechniqueKind::DeviceRotate);
        let (mut h, id) = selected(&mut rotator);
        let start = h.transform(id).orientation;
        for (i, q) in samples.iter().enumerate() {
            h.step(&mut rotator, device(0.1 + i as f32 * 0.016, Some(*q), &[Button::Secondary]));
        }
        let stepped = h.transform(id).orientation;

        let mut once = Transform::IDENTITY;
        once.orientation = start;
        let (axis, angle) = world_delta(samples[0], samples[3]).unwrap();
        apply_world_delta(&mut once, axis, angle, Vec3::ZERO);
        assert_quat_eq(stepped, once.orientation);
    }

    #[test]
    fn test_identical_samples_change_nothing() {
        let mut rotator = rotator(TechniqueKind::DeviceRotate);
        let (mut h, id) = selected(&mut rotator);
        let before = h.transform(id);
        let q = Quat::from_rotation_z(0.7);
        for i in 0..5 {
            h.step(&mut rotator, device(0.1 + i as f32 * 0.016, Some(q), &[Button::Secondary]));
        }
        assert_eq!(h.transform(id), before);
    }

    #[test]
    fn test_orientation_stays_unit() {
        let mut rotator = rotator(TechniqueKind::DeviceRotate);
        let (mut h, id) = selected(&mut rotator);
        for i in 0..200 {
            let t = i as f32 * 0.016;
            let q = Quat::from_euler(glam::EulerRot::YXZ, t * 1.3, (t * 2.0).sin() * 0.5, t * 0.4);
            h.step(&mut rotator, device(0.1 + t, Some(q), &[Button::Secondary]));
            assert!(is_unit(h.transform(id).orientation));
        }
    }

    #[test]
    fn test_sensor_gap_keeps_baseline() {
        let mut rotator = rotator(TechniqueKind::DeviceRotate);
        let (mut h, id) = selected(&mut rotator);
        h.step(&mut rotator, device(0.1, Some(Quat::IDENTITY), &[Button::Secondary]));
        h.step(&mut rotator, device(0.2, None, &[Button::Secondary]));
        assert_eq!(h.transform(id).orientation, Quat::IDENTITY);
        h.step(&mut rotator, device(0.3, Some(Quat::from_rotation_y(0.2)), &[Button::Secondary]));
        assert_quat_eq(h.transform(id).orientation, Quat::from_rotation_y(0.2));
    }

    #[test]
    fn test_large_frame_delta_is_dropped() {
        let mut rotator = rotator(TechniqueKind::PenRotate);
        let (mut h, id) = selected(&mut rotator);
        let pen = |time: f32, q: Quat| {
            frame(time, Vec3::new(0.3, 0.0, 0.0), &[Button::Secondary]).with_pointer_orientation(q)
        };
        h.step(&mut rotator, pen(0.1, Quat::IDENTITY));
        h.step(&mut rotator, pen(0.2, Quat::from_rotation_y(25.0_f32.to_radians())));
        assert_eq!(h.transform(id).orientation, Quat::IDENTITY);
        // Baseline rolled past the glitch: only the next 10 degrees apply
        h.step(&mut rotator, pen(0.3, Quat::from_rotation_y(35.0_f32.to_radians())));
        assert_quat_eq(h.transform(id).orientation, Quat::from_rotation_y(10.0_f32.to_radians()));
    }

    #[test]
    fn test_rotation_keeps_center_with_offset_pivot() {
        let mut rotator = rotator(TechniqueKind::DeviceRotate);
        let (mut h, id) = selected(&mut rotator);
        h.scene
            .get_mut(id)
            .unwrap()
            .transform
            .set_pivot_preserving(Vec3::new(-0.05, -0.025, -0.04));
        let center = h.scene.get(id).unwrap().world_center();
        h.step(&mut rotator, device(0.1, Some(Quat::IDENTITY), &[Button::Secondary]));
        h.step(&mut rotator, device(0.2, Some(Quat::from_rotation_z(1.0)), &[Button::Secondary]));
        assert_relative_eq!(h.scene.get(id).unwrap().world_center().distance(center), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_bucketed_rate_control() {
        let mut rotator = rotator(TechniqueKind::DevicePedalRotate);
        let (mut h, id) = selected(&mut rotator);
        let tilt = Quat::from_rotation_y(10.0_f32.to_radians());
        h.step(&mut rotator, device(0.1, Some(Quat::IDENTITY), &[Button::Secondary]));
        for i in 0..4 {
            h.step(&mut rotator, device(0.2 + i as f32 * 0.016, Some(tilt), &[Button::Secondary]));
        }
        // Held at 10 degrees: 0.5 degrees per frame
        assert_quat_eq(h.transform(id).orientation, Quat::from_rotation_y(2.0_f32.to_radians()));
        assert_relative_eq!(rotator.metrics().degrees_object_rotated, 2.0, epsilon = 1e-4);
        assert_relative_eq!(rotator.metrics().degrees_source_rotated, 10.0, epsilon = 1e-2);
    }

    #[test]
    fn test_bucket_deadzone_and_monotonic() {
        let applied = |degrees: f32| {
            let mut t = Transform::IDENTITY;
            let tilt = Quat::from_rotation_x(degrees.to_radians());
            apply_bucketed(&mut t, &SpeedBuckets::default(), Quat::IDENTITY, tilt, Vec3::ZERO)
        };
        assert_eq!(applied(2.0), 0.0);
        let mut previous = 0.0;
        for degrees in [1.0, 2.9, 3.5, 10.0, 19.0, 21.0, 60.0, 85.0, 170.0] {
            let step = applied(degrees);
            assert!(step >= previous, "{degrees} degrees gave {step}");
            previous = step;
        }
        assert_eq!(previous, 3.0);
    }

    #[test]
    fn test_release_records_angle_to_reference() {
        let mut rotator = rotator(TechniqueKind::DeviceRotate);
        let (mut h, id) = selected(&mut rotator);
        h.scene.insert(
            SceneNode::new("reference", NodeKind::Reference).with_transform(Transform {
                orientation: Quat::from_rotation_y(0.5),
                ..Transform::from_position(Vec3::new(0.5, 0.0, 0.0))
            }),
        );
        h.step(&mut rotator, device(0.1, Some(Quat::IDENTITY), &[Button::Secondary]));
        h.step(&mut rotator, device(0.2, Some(Quat::from_rotation_y(0.2)), &[Button::Secondary]));
        h.step(&mut rotator, device(0.3, Some(Quat::from_rotation_y(0.2)), &[]));
        assert!(!rotator.is_tracking());
        let angle = rotator.metrics().final_relative_angle.unwrap();
        assert_relative_eq!(angle, 0.3_f32.to_degrees(), epsilon = 1e-2);
        assert_eq!(rotator.metrics().ended_at, Some(0.3));
    }

    #[test]
    fn test_no_selection_no_tracking() {
        let (scene, _) = scene_with_box();
        let mut h = Harness::new(scene);
        let mut rotator = rotator(TechniqueKind::DeviceRotate);
        h.step(&mut rotator, device(0.1, Some(Quat::IDENTITY), &[Button::Secondary]));
        assert!(!rotator.is_tracking());
    }

    #[test]
    fn test_unnormalized_samples_still_rotate() {
        let mut rotator = rotator(TechniqueKind::DeviceRotate);
        let (mut h, id) = selected(&mut rotator);
        let stretch = |q: Quat, k: f32| Quat::from_xyzw(q.x * k, q.y * k, q.z * k, q.w * k);
        h.step(&mut rotator, device(0.1, Some(stretch(Quat::IDENTITY, 1.01)), &[Button::Secondary]));
        h.step(&mut rotator, device(0.2, Some(stretch(Quat::from_rotation_y(0.3), 0.98)), &[Button::Secondary]));
        assert_quat_eq(h.transform(id).orientation, Quat::from_rotation_y(0.3));
        assert!(is_unit(h.transform(id).orientation));

        // A zero-length reading is a gap, not a rotation
        h.step(&mut rotator, device(0.3, Some(stretch(Quat::IDENTITY, 0.0)), &[Button::Secondary]));
        assert_quat_eq(h.transform(id).orientation, Quat::from_rotation_y(0.3));
    }

    #[test]
    fn test_bucketed_orientation_stays_unit() {
        let mut rotator = rotator(TechniqueKind::DevicePedalRotate);
        let (mut h, id) = selected(&mut rotator);
        h.step(&mut rotator, device(0.1, Some(Quat::IDENTITY), &[Button::Secondary]));
        for i in 0..200 {
            let t = i as f32 * 0.016;
            let q = Quat::from_euler(glam::EulerRot::YXZ, (t * 0.9).sin() * 2.5, t * 0.7, (t * 3.0).cos() * 0.4);
            h.step(&mut rotator, device(0.2 + t, Some(q), &[Button::Secondary]));
            assert!(is_unit(h.transform(id).orientation));
        }
        assert!(rotator.metrics().degrees_object_rotated > 0.0);
    }

    #[test]
    fn test_target_removed_mid_rotation() {
        let mut rotator = rotator(TechniqueKind::DeviceRotate);
        let (mut h, id) = selected(&mut rotator);
        h.step(&mut rotator, device(0.1, Some(Quat::IDENTITY), &[Button::Secondary]));
        assert!(rotator.is_tracking());

        h.scene.remove(id);
        for i in 1..=5 {
            let q = Quat::from_rotation_y(i as f32 * 0.05);
            h.step(&mut rotator, device(0.1 + i as f32 * 0.016, Some(q), &[Button::Secondary]));
        }
        assert!(rotator.is_tracking());
        assert_eq!(h.missing.count("target", id), 5);
        assert_eq!(rotator.metrics().degrees_object_rotated, 0.0);

        h.step(&mut rotator, device(0.3, None, &[]));
        assert!(!rotator.is_tracking());
        assert_eq!(rotator.metrics().ended_at, Some(0.3));
        assert_eq!(rotator.metrics().final_relative_angle, None);
        assert_eq!(h.missing.count("target", id), 6);
    }
}
