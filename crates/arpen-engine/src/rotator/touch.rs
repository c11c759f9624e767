//! Touchscreen pan rotation
//!
//! A tap selects; a one-finger pan then turns the selected object about its
//! center. Horizontal motion spins it about the camera's up axis, vertical
//! motion about the camera's right axis, whichever dominates each event.

use arpen_core::NodeId;
use glam::{Vec2, Vec3};

use super::{apply_world_delta, final_relative_angle};
use crate::frame::{FrameInput, GesturePhase, TouchEvent};
use crate::input::ButtonEvents;
use crate::metrics::SessionMetrics;
use crate::selection::SelectionController;
use crate::technique::{FrameContext, ManipulationTechnique, TechniqueConfig, TechniqueKind};

#[derive(Debug, Clone, Copy)]
struct Pan {
    target: NodeId,
    /// Cumulative translation already applied
    last: Vec2,
}

pub struct TouchRotator {
    config: TechniqueConfig,
    controller: SelectionController,
    pan: Option<Pan>,
    metrics: SessionMetrics,
}

impl TouchRotator {
    pub fn new(config: TechniqueConfig) -> Self {
        Self {
            controller: SelectionController::new(config.selection_cap),
            config,
            pan: None,
            metrics: SessionMetrics::default(),
        }
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    fn pan(&mut self, ctx: &mut FrameContext<'_>, phase: GesturePhase, translation: Vec2) {
        if phase == GesturePhase::Began {
            self.pan = self.controller.selection.first().map(|target| Pan {
                target,
                last: Vec2::ZERO,
            });
            if self.pan.is_some() {
                self.metrics.start_unless_running(ctx.time);
            }
        }
        let Some(pan) = self.pan.as_mut() else {
            return;
        };

        let delta = translation - pan.last;
        pan.last = translation;
        // Screen y grows downwards, so a downward drag tips the top away
        let (axis, pixels) = if delta.x.abs() >= delta.y.abs() {
            (Vec3::Y, delta.x)
        } else {
            (Vec3::X, delta.y)
        };
        let degrees = pixels * self.config.degrees_per_pixel;
        if degrees != 0.0 {
            let axis = ctx.substrate.camera_orientation() * axis;
            match ctx.scene.get_mut(pan.target) {
                Some(node) => {
                    let center = node.local_bounds.center();
                    if apply_world_delta(&mut node.transform, axis, degrees.to_radians(), center) {
                        self.metrics.record_rotation(degrees, degrees);
                    }
                }
                None => ctx.missing.report(TechniqueKind::TouchRotate.name(), "target", pan.target),
            }
        }

        if phase.is_finished() {
            let target = pan.target;
            self.pan = None;
            self.metrics.end(ctx.time);
            if let Some(angle) = final_relative_angle(ctx.scene, target) {
                self.metrics.final_relative_angle = Some(angle);
            }
            ctx.commit(target);
        }
    }
}

impl ManipulationTechnique for TouchRotator {
    fn kind(&self) -> TechniqueKind {
        TechniqueKind::TouchRotate
    }

    fn deactivate(&mut self, ctx: &mut FrameContext<'_>) {
        if let Some(pan) = self.pan.take() {
            ctx.commit(pan.target);
        }
        self.controller.clear(ctx.scene);
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, _input: &FrameInput, _events: &ButtonEvents) {
        self.controller.selection.retain_existing(ctx.scene);
    }

    fn touch(&mut self, ctx: &mut FrameContext<'_>, event: &TouchEvent) {
        match *event {
            TouchEvent::Tap { position } => {
                if self.pan.is_none() && self.controller.tap(ctx.scene, ctx.substrate, position) {
                    self.metrics.selection_count += 1;
                }
            }
            TouchEvent::Pan { phase, translation } => self.pan(ctx, phase, translation),
            TouchEvent::Pinch { .. } => {}
        }
    }

    fn reset(&mut self, ctx: &mut FrameContext<'_>) {
        self.pan = None;
        self.controller.clear(ctx.scene);
        self.metrics.reset();
    }

    fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }
}
