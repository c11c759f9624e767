//! Pinch scaling
//!
//! Taps pick the object and optionally a corner; a two-finger pinch then
//! scales about the selected corner's antipode, or about the center when no
//! corner is picked. The pinch's reported ratio is the factor directly.

use std::collections::HashMap;

use arpen_core::{Corner, NodeId, ScaleAnchor};
use glam::{Vec2, Vec3};

use super::{CornerPicker, MarkerOverlay, ScaleSession};
use crate::frame::{FrameInput, GesturePhase, TouchEvent};
use crate::input::ButtonEvents;
use crate::metrics::SessionMetrics;
use crate::selection::SelectionController;
use crate::technique::{FrameContext, ManipulationTechnique, TechniqueConfig, TechniqueKind};

pub struct PinchScaler {
    config: TechniqueConfig,
    controller: SelectionController,
    markers: MarkerOverlay,
    picker: CornerPicker,
    session: Option<ScaleSession>,
    /// Product of all pinches applied to each object
    accumulated: HashMap<NodeId, f32>,
    metrics: SessionMetrics,
}

impl PinchScaler {
    pub fn new(config: TechniqueConfig) -> Self {
        Self {
            controller: SelectionController::new(config.selection_cap),
            config,
            markers: MarkerOverlay::default(),
            picker: CornerPicker::default(),
            session: None,
            accumulated: HashMap::new(),
            metrics: SessionMetrics::default(),
        }
    }

    pub fn selected_corner(&self) -> Option<Corner> {
        self.picker.selected()
    }

    pub fn is_scaling(&self) -> bool {
        self.session.is_some()
    }

    /// Total pinch factor applied to `id` so far
    pub fn accumulated(&self, id: NodeId) -> f32 {
        self.accumulated.get(&id).copied().unwrap_or(1.0)
    }

    fn tap(&mut self, ctx: &mut FrameContext<'_>, position: Vec2) {
        let hits = ctx.substrate.hit_test(ctx.scene, position);
        if let Some(corner) = self.markers.corner_hit(&hits) {
            let picked = self.picker.tap(corner);
            tracing::debug!("Corner {} {}", corner.name(), if picked.is_some() { "picked" } else { "released" });
            return;
        }
        if self.controller.tap(ctx.scene, ctx.substrate, position) {
            self.metrics.selection_count += 1;
        }
        self.picker.clear();
        self.markers.follow(
            ctx.scene,
            self.controller.selection.first(),
            self.config.marker_size,
            self.config.edge_markers,
        );
    }

    fn pinch(&mut self, ctx: &mut FrameContext<'_>, phase: GesturePhase, scale: f32) {
        match phase {
            GesturePhase::Began => {
                self.finish(ctx, true);
                let Some(target) = self.controller.selection.first() else {
                    return;
                };
                let (corner, anchor) = match self.picker.selected() {
                    Some(corner) => (corner, ScaleAnchor::OppositeCorner),
                    None => (Corner::Rfu, ScaleAnchor::Center),
                };
                self.session = ScaleSession::begin(ctx.scene, target, corner, anchor);
                if self.session.is_some() {
                    self.metrics.start_unless_running(ctx.time);
                } else {
                    ctx.missing.report(TechniqueKind::PinchScale.name(), "target", target);
                }
            }
            GesturePhase::Changed => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                if session.apply(ctx.scene, Vec3::splat(scale), self.config.min_scale_factor) {
                    self.markers
                        .sync(ctx.scene, ctx.missing, TechniqueKind::PinchScale.name());
                }
            }
            GesturePhase::Ended => self.finish(ctx, true),
            GesturePhase::Cancelled => self.finish(ctx, false),
        }
    }

    /// End the pinch. A cancelled pinch puts the activation scale back.
    fn finish(&mut self, ctx: &mut FrameContext<'_>, keep: bool) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if !keep {
            session.apply(ctx.scene, Vec3::ONE, self.config.min_scale_factor);
        }
        let target = session.target;
        let factor = session.applied().x;
        if session.finish(ctx.scene) {
            *self.accumulated.entry(target).or_insert(1.0) *= factor;
            ctx.commit(target);
        }
        self.markers
            .sync(ctx.scene, ctx.missing, TechniqueKind::PinchScale.name());
        self.metrics.end(ctx.time);
    }
}

impl ManipulationTechnique for PinchScaler {
    fn kind(&self) -> TechniqueKind {
        TechniqueKind::PinchScale
    }

    fn deactivate(&mut self, ctx: &mut FrameContext<'_>) {
        self.finish(ctx, true);
        self.picker.clear();
        self.markers.hide(ctx.scene);
        self.controller.clear(ctx.scene);
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, _input: &FrameInput, _events: &ButtonEvents) {
        self.controller.selection.retain_existing(ctx.scene);
        if self.controller.selection.is_empty() && self.markers.owner().is_some() {
            self.markers.hide(ctx.scene);
            self.picker.clear();
        }
    }

    fn touch(&mut self, ctx: &mut FrameContext<'_>, event: &TouchEvent) {
        match *event {
            TouchEvent::Tap { position } => {
                if self.session.is_none() {
                    self.tap(ctx, position);
                }
            }
            TouchEvent::Pinch { phase, scale } => self.pinch(ctx, phase, scale),
            TouchEvent::Pan { .. } => {}
        }
    }

    fn reset(&mut self, ctx: &mut FrameContext<'_>) {
        self.deactivate(ctx);
        self.accumulated.clear();
        self.metrics.reset();
    }

    fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }
}
