//! Diagonal-projection scaler
//!
//! Idle until the action button is pressed over one of the selected
//! object's corner markers. While held, the pointer's screen position is
//! projected onto the screen-space diagonal from the anchor to the pulled
//! corner, the projected point is turned back into a 3-D point, and the
//! scale factor follows from it. Release restores the pivot and commits.

use arpen_core::constants::GEOMETRY_EPSILON;
use arpen_core::{Button, Corner, DiagonalRecovery, ScaleAnchor};
use glam::{Vec2, Vec3};

use super::{MarkerOverlay, ScaleSession};
use crate::frame::FrameInput;
use crate::input::ButtonEvents;
use crate::metrics::SessionMetrics;
use crate::selection::{SelectionController, first_solid_hit};
use crate::technique::{FrameContext, ManipulationTechnique, TechniqueConfig, TechniqueKind};

/// Screen-space guide from the anchor to the projected pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagonalGuide {
    pub anchor: Vec2,
    pub corner: Vec2,
    pub projected: Vec2,
}

pub struct DiagonalScaler {
    kind: TechniqueKind,
    config: TechniqueConfig,
    controller: SelectionController,
    markers: MarkerOverlay,
    /// Active session and the button holding it
    session: Option<(ScaleSession, Button)>,
    guide: Option<DiagonalGuide>,
    metrics: SessionMetrics,
}

impl DiagonalScaler {
    pub fn new(kind: TechniqueKind, config: TechniqueConfig) -> Self {
        Self {
            kind,
            controller: SelectionController::new(config.selection_cap),
            config,
            markers: MarkerOverlay::default(),
            session: None,
            guide: None,
            metrics: SessionMetrics::default(),
        }
    }

    pub fn is_scaling(&self) -> bool {
        self.session.is_some()
    }

    /// The corner being pulled, while scaling.
    pub fn selected_corner(&self) -> Option<Corner> {
        self.session.as_ref().map(|(session, _)| session.corner)
    }

    pub fn guide(&self) -> Option<DiagonalGuide> {
        self.guide
    }

    pub fn controller(&self) -> &SelectionController {
        &self.controller
    }

    fn begin(&mut self, ctx: &mut FrameContext<'_>, corner: Corner, anchor: ScaleAnchor, button: Button, time: f32) {
        let Some(target) = self.controller.selection.first() else {
            return;
        };
        match ScaleSession::begin(ctx.scene, target, corner, anchor) {
            Some(session) => {
                self.metrics.start_unless_running(time);
                self.session = Some((session, button));
            }
            None => ctx.missing.report(self.kind.name(), "target", target),
        }
    }

    fn end(&mut self, ctx: &mut FrameContext<'_>, time: f32) {
        if let Some((session, _)) = self.session.take() {
            let target = session.target;
            if session.finish(ctx.scene) {
                ctx.commit(target);
                self.markers.sync(ctx.scene, ctx.missing, self.kind.name());
            } else {
                ctx.missing.report(self.kind.name(), "target", target);
                self.markers.hide(ctx.scene);
            }
            self.metrics.end(time);
        }
        self.guide = None;
    }

    /// Action press over a corner marker picks that corner and starts scaling.
    fn pick_corner(&mut self, ctx: &mut FrameContext<'_>, pointer: Vec3, time: f32) {
        let screen = ctx.substrate.project(pointer).truncate();
        let hits = ctx.substrate.hit_test(ctx.scene, screen);
        let Some(corner) = self.markers.corner_hit(&hits) else {
            return;
        };
        let button = self.config.action_button;
        self.begin(ctx, corner, ScaleAnchor::OppositeCorner, button, time);
    }

    /// Center press scales about the center, pulling the corner nearest the pointer.
    fn pick_center(&mut self, ctx: &mut FrameContext<'_>, pointer: Vec3, button: Button, time: f32) {
        let Some(node) = self.controller.selection.first().and_then(|id| ctx.scene.get(id)) else {
            return;
        };
        let screen = ctx.substrate.project(pointer).truncate();
        let set = node.corner_set();
        // Corners stacked on screen resolve to the one nearest the camera
        let nearest = Corner::ALL
            .into_iter()
            .map(|c| (c, ctx.substrate.project(set.corner(c))))
            .min_by(|(_, a), (_, b)| {
                let da = a.truncate().distance(screen);
                let db = b.truncate().distance(screen);
                if (da - db).abs() < 0.5 {
                    a.z.total_cmp(&b.z)
                } else {
                    da.total_cmp(&db)
                }
            })
            .map(|(c, _)| c);
        if let Some(corner) = nearest {
            self.begin(ctx, corner, ScaleAnchor::Center, button, time);
        }
    }

    /// One scaling frame; holds the previous scale whenever a step fails.
    fn scale_frame(&mut self, ctx: &mut FrameContext<'_>, pointer: Vec3) {
        let name = self.kind.name();
        let Some((session, _)) = self.session.as_mut() else {
            return;
        };
        let (Some(corner_world), Some(anchor_world)) =
            (session.corner_world(ctx.scene), session.anchor_world(ctx.scene))
        else {
            ctx.missing.report(name, "target", session.target);
            return;
        };

        let corner_screen = ctx.substrate.project(corner_world);
        let anchor_screen = ctx.substrate.project(anchor_world).truncate();
        let diagonal = corner_screen.truncate() - anchor_screen;
        let length_squared = diagonal.length_squared();
        if !(length_squared > GEOMETRY_EPSILON) {
            tracing::debug!("Diagonal collapsed on screen, holding scale");
            return;
        }

        let pointer_screen = ctx.substrate.project(pointer).truncate();
        let t = (pointer_screen - anchor_screen).dot(diagonal) / length_squared;
        let projected = anchor_screen + diagonal * t;
        self.guide = Some(DiagonalGuide {
            anchor: anchor_screen,
            corner: corner_screen.truncate(),
            projected,
        });

        let point = match self.config.recovery {
            DiagonalRecovery::HitTest => {
                let hits = ctx.substrate.hit_test(ctx.scene, projected);
                first_solid_hit(ctx.scene, &hits).map(|h| h.point)
            }
            DiagonalRecovery::CornerDepth => {
                Some(ctx.substrate.unproject(projected.extend(corner_screen.z)))
            }
        };
        let Some(point) = point else {
            tracing::debug!("Diagonal ray missed, holding scale");
            return;
        };

        let factor = session.factor_for_point(
            ctx.scene,
            point,
            self.config.growth_axis,
            self.config.scale_mode,
        );
        if let Some(factor) = factor {
            if session.apply(ctx.scene, factor, self.config.min_scale_factor) {
                self.markers.sync(ctx.scene, ctx.missing, name);
            }
        }
    }
}

impl ManipulationTechnique for DiagonalScaler {
    fn kind(&self) -> TechniqueKind {
        self.kind
    }

    fn deactivate(&mut self, ctx: &mut FrameContext<'_>) {
        let time = ctx.time;
        self.end(ctx, time);
        self.markers.hide(ctx.scene);
        self.controller.clear(ctx.scene);
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, input: &FrameInput, events: &ButtonEvents) {
        self.controller.selection.retain_existing(ctx.scene);
        self.controller
            .update_hover(ctx.scene, ctx.substrate, input.pointer);

        if let Some(button) = self.session.as_ref().map(|(_, b)| *b) {
            if events.released(button) || !events.is_held(button) {
                self.end(ctx, input.time);
            } else {
                self.scale_frame(ctx, input.pointer);
            }
            return;
        }

        if self
            .controller
            .handle_select_button(ctx.scene, events, self.config.select_button)
        {
            self.metrics.selection_count += 1;
        }
        self.markers.follow(
            ctx.scene,
            self.controller.selection.first(),
            self.config.marker_size,
            self.config.edge_markers,
        );
        if self.markers.owner().is_none() {
            return;
        }

        if events.pressed(self.config.action_button) {
            self.pick_corner(ctx, input.pointer, input.time);
        } else if let Some(button) = self.config.center_button.filter(|b| events.pressed(*b)) {
            self.pick_center(ctx, input.pointer, button, input.time);
        }
    }

    fn reset(&mut self, ctx: &mut FrameContext<'_>) {
        let time = ctx.time;
        self.end(ctx, time);
        self.markers.hide(ctx.scene);
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
    use arpen_core::{EngineConfig, NodeId};

    fn scaler(kind: TechniqueKind) -> DiagonalScaler {
        DiagonalScaler::new(kind, TechniqueConfig::preset(kind, &EngineConfig::default()))
    }

    /// Box selected with markers shown, plus a backdrop for the diagonal ray
    fn selected_box(scaler: &mut DiagonalScaler) -> (Harness, NodeId) {
        let (mut scene, id) = scene_with_box();
        add_backdrop(&mut scene);
        let mut h = Harness::new(scene);
        let center = h.scene.get(id).unwrap().world_center();
        h.step(scaler, frame(0.0, center, &[Button::Primary]));
        h.step(scaler, frame(0.1, center, &[]));
        assert!(h.scene.get(id).unwrap().flags.selected);
        (h, id)
    }

    #[test]
    fn test_vertical_extent_doubles() {
        let mut scaler = scaler(TechniqueKind::CornerScale);
        let (mut h, id) = selected_box(&mut scaler);
        let rfu = Vec3::new(0.05, 0.225, 0.04);
        let lbd_before = h.scene.get(id).unwrap().corner_set().corner(Corner::Lbd);

        h.step(&mut scaler, frame(0.2, rfu, &[Button::Secondary]));
        assert!(scaler.is_scaling());
        assert_eq!(scaler.selected_corner(), Some(Corner::Rfu));

        // Pointer out along the screen diagonal, twice the original height
        h.step(&mut scaler, frame(0.3, Vec3::new(0.15, 0.275, 0.04), &[Button::Secondary]));
        let node = h.scene.get(id).unwrap();
        let half = node.world_bounds().half_extents();
        assert_relative_eq!(half.x, 0.1, epsilon = 1e-4);
        assert_relative_eq!(half.y, 0.05, epsilon = 1e-4);
        assert_relative_eq!(half.z, 0.08, epsilon = 1e-4);
        let lbd = node.corner_set().corner(Corner::Lbd);
        assert_relative_eq!(lbd.distance(lbd_before), 0.0, epsilon = 1e-5);

        h.step(&mut scaler, frame(0.4, Vec3::new(0.15, 0.275, 0.04), &[]));
        assert!(!scaler.is_scaling());
        assert_eq!(scaler.selected_corner(), None);
        let node = h.scene.get(id).unwrap();
        assert_eq!(node.transform.pivot, Vec3::ZERO);
        let lbd = node.corner_set().corner(Corner::Lbd);
        assert_relative_eq!(lbd.distance(lbd_before), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_antipode_fixed_over_many_frames() {
        let mut scaler = scaler(TechniqueKind::CornerScale);
        let (mut h, id) = selected_box(&mut scaler);
        let lbd_before = h.scene.get(id).unwrap().corner_set().corner(Corner::Lbd);

        h.step(&mut scaler, frame(0.2, Vec3::new(0.05, 0.225, 0.04), &[Button::Secondary]));
        for i in 0..20 {
            let t = 0.3 + i as f32 * 0.016;
            let wobble = Vec3::new((i as f32 * 0.7).sin() * 0.03, (i as f32 * 0.3).cos() * 0.04, 0.0);
            h.step(&mut scaler, frame(t, Vec3::new(0.08, 0.24, 0.04) + wobble, &[Button::Secondary]));
            let lbd = h.scene.get(id).unwrap().corner_set().corner(Corner::Lbd);
            assert_relative_eq!(lbd.distance(lbd_before), 0.0, epsilon = 1e-5);
            let scale = h.transform(id).scale;
            assert!(scale.min_element() > 0.0);
        }
    }

    #[test]
    fn test_miss_holds_scale() {
        let mut scaler = scaler(TechniqueKind::CornerScale);
        let (scene, id) = scene_with_box();
        let mut h = Harness::new(scene);
        let center = h.scene.get(id).unwrap().world_center();
        h.step(&mut scaler, frame(0.0, center, &[Button::Primary]));
        h.step(&mut scaler, frame(0.1, center, &[]));

        h.step(&mut scaler, frame(0.2, Vec3::new(0.05, 0.225, 0.04), &[Button::Secondary]));
        assert!(scaler.is_scaling());
        // No backdrop: the projected ray past the corner hits nothing
        h.step(&mut scaler, frame(0.3, Vec3::new(0.25, 0.325, 0.04), &[Button::Secondary]));
        assert_eq!(h.transform(id).scale, Vec3::ONE);
    }

    #[test]
    fn test_press_off_corner_does_not_scale() {
        let mut scaler = scaler(TechniqueKind::CornerScale);
        let (mut h, _) = selected_box(&mut scaler);
        h.step(&mut scaler, frame(0.2, Vec3::new(0.3, 0.0, 0.0), &[Button::Secondary]));
        assert!(!scaler.is_scaling());
    }

    #[test]
    fn test_markers_follow_selection() {
        let mut scaler = scaler(TechniqueKind::CornerScale);
        let (mut h, id) = selected_box(&mut scaler);
        let markers = h
            .scene
            .iter()
            .filter(|n| matches!(n.kind, arpen_core::NodeKind::CornerMarker { owner, .. } if owner == id))
            .count();
        assert_eq!(markers, 8);

        // Clicking empty space clears the selection and the markers
        h.step(&mut scaler, frame(1.0, Vec3::new(0.4, -0.2, 0.0), &[Button::Primary]));
        let markers = h
            .scene
            .iter()
            .filter(|n| matches!(n.kind, arpen_core::NodeKind::CornerMarker { .. }))
            .count();
        assert_eq!(markers, 0);
    }

    #[test]
    fn test_ray_scale_center_anchor() {
        let mut scaler = scaler(TechniqueKind::RayScale);
        let (mut h, id) = selected_box(&mut scaler);
        let center = h.scene.get(id).unwrap().world_center();

        h.step(&mut scaler, frame(0.2, Vec3::new(0.06, 0.23, 0.04), &[Button::Tertiary]));
        assert!(scaler.is_scaling());
        assert_eq!(scaler.selected_corner(), Some(Corner::Rfu));
        // Screen point twice as far out as the corner, recovered at the corner's depth
        h.step(&mut scaler, frame(0.3, Vec3::new(0.1, 0.25, 0.0), &[Button::Tertiary]));
        let expected = Vec3::new(0.1, 0.05, 0.04).length() / Vec3::new(0.05, 0.025, 0.04).length();
        let node = h.scene.get(id).unwrap();
        assert_relative_eq!(node.world_center().distance(center), 0.0, epsilon = 1e-5);
        assert_relative_eq!(node.transform.scale.x, expected, epsilon = 1e-3);
        assert_relative_eq!(node.transform.scale.y, expected, epsilon = 1e-3);
    }

    #[test]
    fn test_target_removed_mid_scale() {
        let mut scaler = scaler(TechniqueKind::CornerScale);
        let (mut h, id) = selected_box(&mut scaler);
        h.step(&mut scaler, frame(0.2, Vec3::new(0.05, 0.225, 0.04), &[Button::Secondary]));
        assert!(scaler.is_scaling());

        h.scene.remove(id);
        for i in 0..5 {
            let t = 0.3 + i as f32 * 0.016;
            h.step(&mut scaler, frame(t, Vec3::new(0.1, 0.25, 0.04), &[Button::Secondary]));
        }
        assert!(scaler.is_scaling());
        assert!(h.missing.count("target", id) >= 5);
        assert!(scaler.guide().is_none());

        h.step(&mut scaler, frame(0.5, Vec3::new(0.1, 0.25, 0.04), &[]));
        assert!(!scaler.is_scaling());
        assert_eq!(scaler.selected_corner(), None);
        let markers = h
            .scene
            .iter()
            .filter(|n| matches!(n.kind, arpen_core::NodeKind::CornerMarker { .. }))
            .count();
        assert_eq!(markers, 0);
    }
}
