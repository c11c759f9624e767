//! Reference-length scaling
//!
//! The user draws a length in mid-air with the pointer: pressing the action
//! button marks the start point, holding tracks the end point, and release
//! scales the selected object so its extent along the growth axis matches
//! the drawn length, anchored at the lower-left-back corner.

use arpen_core::{Corner, ScaleAnchor};
use glam::Vec3;

use super::{MarkerOverlay, ScaleSession};
use crate::frame::FrameInput;
use crate::input::ButtonEvents;
use crate::metrics::SessionMetrics;
use crate::selection::SelectionController;
use crate::technique::{FrameContext, ManipulationTechnique, TechniqueConfig, TechniqueKind};

/// The segment being drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceStroke {
    pub start: Vec3,
    pub end: Vec3,
}

impl ReferenceStroke {
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

pub struct ReferenceScaler {
    config: TechniqueConfig,
    controller: SelectionController,
    markers: MarkerOverlay,
    stroke: Option<ReferenceStroke>,
    metrics: SessionMetrics,
}

impl ReferenceScaler {
    pub fn new(config: TechniqueConfig) -> Self {
        Self {
            controller: SelectionController::new(config.selection_cap),
            config,
            markers: MarkerOverlay::default(),
            stroke: None,
            metrics: SessionMetrics::default(),
        }
    }

    pub fn stroke(&self) -> Option<ReferenceStroke> {
        self.stroke
    }

    /// Scale the selection to the finished stroke.
    fn apply_stroke(&mut self, ctx: &mut FrameContext<'_>, stroke: ReferenceStroke) {
        let name = TechniqueKind::ReferenceScale.name();
        let Some(target) = self.controller.selection.first() else {
            return;
        };
        let Some(mut session) =
            ScaleSession::begin(ctx.scene, target, Corner::Rfu, ScaleAnchor::OppositeCorner)
        else {
            ctx.missing.report(name, "target", target);
            return;
        };
        let factor = session.factor_for_length(
            stroke.length(),
            self.config.growth_axis,
            self.config.scale_mode,
        );
        let applied = session.apply(ctx.scene, factor, self.config.min_scale_factor);
        if session.finish(ctx.scene) && applied {
            tracing::debug!("Reference length {:.4} applied", stroke.length());
            ctx.commit(target);
            self.markers.sync(ctx.scene, ctx.missing, name);
        }
    }
}

impl ManipulationTechnique for ReferenceScaler {
    fn kind(&self) -> TechniqueKind {
        TechniqueKind::ReferenceScale
    }

    fn deactivate(&mut self, ctx: &mut FrameContext<'_>) {
        self.stroke = None;
        self.markers.hide(ctx.scene);
        self.controller.clear(ctx.scene);
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, input: &FrameInput, events: &ButtonEvents) {
        self.controller.selection.retain_existing(ctx.scene);
        self.controller
            .update_hover(ctx.scene, ctx.substrate, input.pointer);

        let action = self.config.action_button;
        if let Some(stroke) = self.stroke.as_mut() {
            stroke.end = input.pointer;
            if events.released(action) || !events.is_held(action) {
                let stroke = *stroke;
                self.stroke = None;
                self.apply_stroke(ctx, stroke);
                self.metrics.end(input.time);
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

        if events.pressed(action) && !self.controller.selection.is_empty() {
            self.metrics.start_unless_running(input.time);
            self.stroke = Some(ReferenceStroke {
                start: input.pointer,
                end: input.pointer,
            });
        }
    }

    fn reset(&mut self, ctx: &mut FrameContext<'_>) {
        self.deactivate(ctx);
        self.metrics.reset();
    }

    fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }
}
