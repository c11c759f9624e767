//! Free arrangement
//!
//! Hover and select with the select button; holding it starts a drag once
//! it has been held long enough or the pointer has travelled far enough.
//! On drag start the selection may snap under the pointer, then follows the
//! pointer's frame-to-frame motion until release commits it.

use arpen_core::{NodeId, Scene};
use glam::Vec3;

use crate::frame::FrameInput;
use crate::input::ButtonEvents;
use crate::metrics::SessionMetrics;
use crate::selection::SelectionController;
use crate::technique::{FrameContext, ManipulationTechnique, TechniqueConfig, TechniqueKind};

/// Where and when the select button went down
#[derive(Debug, Clone, Copy)]
struct Press {
    time: f32,
    position: Vec3,
}

pub struct Arranger {
    config: TechniqueConfig,
    controller: SelectionController,
    press: Option<Press>,
    dragging: bool,
    last_pointer: Option<Vec3>,
    metrics: SessionMetrics,
}

impl Arranger {
    pub fn new(config: TechniqueConfig) -> Self {
        Self {
            controller: SelectionController::new(config.selection_cap),
            config,
            press: None,
            dragging: false,
            last_pointer: None,
            metrics: SessionMetrics::default(),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn controller(&self) -> &SelectionController {
        &self.controller
    }

    fn drag_threshold_reached(&self, press: Press, input: &FrameInput) -> bool {
        input.time - press.time >= self.config.drag.hold_time
            || input.pointer.distance(press.position) > self.config.drag.distance
    }

    /// Selected nodes and everything under them, each listed once.
    /// Node transforms are world-space, so contents must move with their
    /// container.
    fn moving_nodes(&self, scene: &Scene) -> Vec<NodeId> {
        let mut ids = Vec::new();
        for id in self.controller.selection.iter() {
            for node in scene.subtree(id) {
                if !ids.contains(&node) {
                    ids.push(node);
                }
            }
        }
        ids
    }

    /// Move the selection so the centroid of its bounding boxes sits at the pointer.
    fn snap(&self, scene: &mut Scene, pointer: Vec3) {
        let centers: Vec<Vec3> = self
            .controller
            .selection
            .iter()
            .filter_map(|id| scene.subtree_bounds(id).map(|b| b.center()))
            .collect();
        if centers.is_empty() {
            return;
        }
        let centroid = centers.iter().copied().sum::<Vec3>() / centers.len() as f32;
        self.translate_selection(scene, pointer - centroid);
    }

    fn translate_selection(&self, scene: &mut Scene, offset: Vec3) {
        for id in self.moving_nodes(scene) {
            if let Some(node) = scene.get_mut(id) {
                node.transform.translate(offset);
            }
        }
    }

    fn commit(&self, ctx: &mut FrameContext<'_>) {
        let ids = self.moving_nodes(ctx.scene);
        for id in self.controller.selection.iter() {
            if !ctx.scene.contains(id) {
                ctx.missing.report("arrange", "selected", id);
            }
        }
        for id in &ids {
            ctx.commit(*id);
        }
        tracing::info!(
            "Committed drag of {} objects ({} nodes)",
            self.controller.selection.len(),
            ids.len()
        );
    }
}

impl ManipulationTechnique for Arranger {
    fn kind(&self) -> TechniqueKind {
        TechniqueKind::Arrange
    }

    fn deactivate(&mut self, ctx: &mut FrameContext<'_>) {
        if self.dragging {
            self.commit(ctx);
        }
        self.controller.clear(ctx.scene);
        self.press = None;
        self.dragging = false;
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, input: &FrameInput, events: &ButtonEvents) {
        let button = self.config.select_button;
        self.controller.selection.retain_existing(ctx.scene);
        self.controller
            .update_hover(ctx.scene, ctx.substrate, input.pointer);

        if events.pressed(button) {
            self.press = Some(Press {
                time: input.time,
                position: input.pointer,
            });
            self.dragging = false;
            if self.controller.on_press(ctx.scene) {
                self.metrics.selection_count += 1;
                self.metrics.start_unless_running(input.time);
            }
        }

        if events.is_held(button) {
            if let Some(press) = self.press {
                if self.dragging {
                    if let Some(last) = self.last_pointer {
                        self.translate_selection(ctx.scene, input.pointer - last);
                    }
                } else if self.drag_threshold_reached(press, input) {
                    self.dragging = true;
                    tracing::debug!(
                        "Drag started after {:.2}s, {:.3} travelled",
                        input.time - press.time,
                        input.pointer.distance(press.position)
                    );
                    if self.config.drag.snap {
                        self.snap(ctx.scene, input.pointer);
                    }
                }
            }
        }

        if events.released(button) {
            if self.dragging {
                self.commit(ctx);
                self.metrics.end(input.time);
            } else {
                self.controller.on_release(ctx.scene);
            }
            self.dragging = false;
            self.press = None;
        }

        if events.double_clicked(button) {
            self.controller.on_double_click(ctx.scene);
        }

        self.last_pointer = Some(input.pointer);
    }

    fn reset(&mut self, ctx: &mut FrameContext<'_>) {
        self.controller.clear(ctx.scene);
        self.press = None;
        self.dragging = false;
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
    use arpen_core::{Button, EngineConfig, SceneNode};

    fn arranger() -> Arranger {
        Arranger::new(TechniqueConfig::preset(
            TechniqueKind::Arrange,
            &EngineConfig::default(),
        ))
    }

    #[test]
    fn test_stationary_hold_starts_drag_after_hold_time() {
        let (scene, id) = scene_with_box();
        let mut h = Harness::new(scene);
        let mut arranger = arranger();
        let center = h.scene.get(id).unwrap().world_center();

        h.step(&mut arranger, frame(0.0, center, &[Button::Primary]));
        assert!(arranger.controller().selection.contains(id));
        h.step(&mut arranger, frame(0.5, center, &[Button::Primary]));
        assert!(!arranger.is_dragging());
        h.step(&mut arranger, frame(1.0, center, &[Button::Primary]));
        assert!(arranger.is_dragging());
    }

    #[test]
    fn test_travel_starts_drag_and_snaps_once() {
        let (scene, id) = scene_with_box();
        let mut h = Harness::new(scene);
        let mut arranger = arranger();
        // Grab the box off-center
        let grab = Vec3::new(0.03, 0.21, 0.0);

        h.step(&mut arranger, frame(0.0, grab, &[Button::Primary]));
        let moved = grab + Vec3::new(0.02, 0.0, 0.0);
        h.step(&mut arranger, frame(0.1, moved, &[Button::Primary]));
        assert!(arranger.is_dragging());
        // Snapped: center now under the pointer
        let center = h.scene.get(id).unwrap().world_center();
        assert_relative_eq!(center.distance(moved), 0.0, epsilon = 1e-6);

        // Afterwards the box follows frame deltas, no further snapping
        let next = moved + Vec3::new(0.0, 0.05, 0.01);
        h.step(&mut arranger, frame(0.2, next, &[Button::Primary]));
        let center = h.scene.get(id).unwrap().world_center();
        assert_relative_eq!(center.distance(next), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_drag_without_snap_keeps_offset() {
        let (scene, id) = scene_with_box();
        let mut h = Harness::new(scene);
        let mut config = TechniqueConfig::preset(TechniqueKind::Arrange, &EngineConfig::default());
        config.drag.snap = false;
        let mut arranger = Arranger::new(config);
        let grab = Vec3::new(0.03, 0.21, 0.0);

        h.step(&mut arranger, frame(0.0, grab, &[Button::Primary]));
        h.step(&mut arranger, frame(0.1, grab + Vec3::X * 0.02, &[Button::Primary]));
        h.step(&mut arranger, frame(0.2, grab + Vec3::X * 0.05, &[Button::Primary]));
        let position = h.transform(id).position;
        assert_relative_eq!(position.x, 0.03, epsilon = 1e-6);
    }

    #[test]
    fn test_release_commits_drag() {
        let (scene, id) = scene_with_box();
        let mut h = Harness::new(scene);
        let mut arranger = arranger();
        let center = Vec3::new(0.0, 0.2, 0.0);

        h.step(&mut arranger, frame(0.0, center, &[Button::Primary]));
        h.step(&mut arranger, frame(0.1, center + Vec3::Y * 0.1, &[Button::Primary]));
        h.step(&mut arranger, frame(0.2, center + Vec3::Y * 0.2, &[Button::Primary]));
        h.step(&mut arranger, frame(0.3, center + Vec3::Y * 0.2, &[]));
        assert!(!arranger.is_dragging());
        // Still selected after a drag
        assert!(arranger.controller().selection.contains(id));

        h.bake.shutdown();
        let baked = h.bake.baked(id).unwrap();
        assert_eq!(baked.transform, h.transform(id));
    }

    #[test]
    fn test_click_selected_object_deselects() {
        let (scene, id) = scene_with_box();
        let mut h = Harness::new(scene);
        let mut arranger = arranger();
        let center = Vec3::new(0.0, 0.2, 0.0);

        h.step(&mut arranger, frame(0.0, center, &[Button::Primary]));
        h.step(&mut arranger, frame(0.1, center, &[]));
        assert!(h.scene.get(id).unwrap().flags.selected);
        h.step(&mut arranger, frame(2.0, center, &[Button::Primary]));
        h.step(&mut arranger, frame(2.1, center, &[]));
        assert!(!h.scene.get(id).unwrap().flags.selected);
    }

    #[test]
    fn test_multi_select_drags_together() {
        let (mut scene, a) = scene_with_box();
        let b = scene.insert(SceneNode::object("b", Vec3::new(0.2, 0.2, 0.0), Vec3::splat(0.02)));
        let mut h = Harness::new(scene);
        let mut arranger = arranger();

        h.step(&mut arranger, frame(0.0, Vec3::new(0.0, 0.2, 0.0), &[Button::Primary]));
        h.step(&mut arranger, frame(0.1, Vec3::new(0.0, 0.2, 0.0), &[]));
        h.step(&mut arranger, frame(2.0, Vec3::new(0.2, 0.2, 0.0), &[Button::Primary]));
        assert_eq!(arranger.controller().selection.len(), 2);

        let before_a = h.transform(a).position;
        let before_b = h.transform(b).position;
        h.step(&mut arranger, frame(2.1, Vec3::new(0.3, 0.2, 0.0), &[Button::Primary]));
        h.step(&mut arranger, frame(2.2, Vec3::new(0.3, 0.3, 0.0), &[Button::Primary]));
        let offset_a = h.transform(a).position - before_a;
        let offset_b = h.transform(b).position - before_b;
        assert_relative_eq!(offset_a.distance(offset_b), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_dragging_container_carries_children() {
        let (mut scene, group) = scene_with_box();
        let child = scene
            .insert_child(
                group,
                SceneNode::object("part", Vec3::new(0.0, 0.2, 0.0), Vec3::splat(0.01)),
            )
            .unwrap();
        let mut h = Harness::new(scene);
        let mut arranger = arranger();
        let center = Vec3::new(0.0, 0.2, 0.0);

        h.step(&mut arranger, frame(0.0, center, &[Button::Primary]));
        assert!(arranger.controller().selection.contains(group));
        assert!(!arranger.controller().selection.contains(child));
        h.step(&mut arranger, frame(0.1, center + Vec3::X * 0.1, &[Button::Primary]));
        h.step(&mut arranger, frame(0.2, center + Vec3::X * 0.2, &[Button::Primary]));
        h.step(&mut arranger, frame(0.3, center + Vec3::X * 0.2, &[]));

        let group_center = h.scene.get(group).unwrap().world_center();
        let child_center = h.scene.get(child).unwrap().world_center();
        assert_relative_eq!(group_center.distance(Vec3::new(0.2, 0.2, 0.0)), 0.0, epsilon = 1e-6);
        assert_relative_eq!(child_center.distance(group_center), 0.0, epsilon = 1e-6);

        h.bake.shutdown();
        assert_eq!(h.bake.baked(child).unwrap().transform, h.transform(child));
    }

    #[test]
    fn test_snap_centers_whole_container() {
        let (mut scene, group) = scene_with_box();
        // Part sticks out to the right, so the group's center is off the box
        scene
            .insert_child(
                group,
                SceneNode::object("arm", Vec3::new(0.1, 0.2, 0.0), Vec3::new(0.05, 0.01, 0.01)),
            )
            .unwrap();
        let mut h = Harness::new(scene);
        let mut arranger = arranger();
        let grab = Vec3::new(0.0, 0.2, 0.0);
        let moved = grab + Vec3::Y * 0.05;

        h.step(&mut arranger, frame(0.0, grab, &[Button::Primary]));
        h.step(&mut arranger, frame(0.1, moved, &[Button::Primary]));
        assert!(arranger.is_dragging());
        let bounds = h.scene.subtree_bounds(group).unwrap();
        assert_relative_eq!(bounds.center().distance(moved), 0.0, epsilon = 1e-6);
    }
}
