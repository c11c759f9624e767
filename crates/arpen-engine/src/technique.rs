//! Manipulation technique interface
//!
//! Every study technique is one state machine behind
//! [`ManipulationTechnique`], parameterized by a [`TechniqueConfig`].
//! Only one technique is active at a time; it owns its selection and
//! session state exclusively.

use std::fmt;

use arpen_core::{
    Button, DiagonalRecovery, DragConfig, EngineConfig, GrowthAxis, NodeId,
    OrientationSource, ScaleMode, Scene, SpeedBuckets,
};
use arpen_view::Substrate;
use serde::{Deserialize, Serialize};

use crate::arranger::Arranger;
use crate::bake::BakeWorker;
use crate::frame::{FrameInput, TouchEvent};
use crate::input::ButtonEvents;
use crate::lookup::MissingNodeLog;
use crate::metrics::SessionMetrics;
use crate::rotator::Rotator;
use crate::rotator::touch::TouchRotator;
use crate::scaler::diagonal::DiagonalScaler;
use crate::scaler::pinch::PinchScaler;
use crate::scaler::reference::ReferenceScaler;

/// Everything a technique may touch during one callback
pub struct FrameContext<'a> {
    pub scene: &'a mut Scene,
    pub substrate: &'a dyn Substrate,
    pub bake: &'a BakeWorker,
    pub missing: &'a mut MissingNodeLog,
    /// Time of the most recent frame, seconds
    pub time: f32,
}

impl FrameContext<'_> {
    /// Hand the node's current transform to the bake worker.
    pub fn commit(&mut self, id: NodeId) -> bool {
        match self.scene.get(id) {
            Some(node) => {
                self.bake.submit(id, node.transform, node.local_bounds);
                true
            }
            None => false,
        }
    }
}

/// One study interaction technique
pub trait ManipulationTechnique {
    fn kind(&self) -> TechniqueKind;

    /// Called when the technique becomes the active one.
    fn activate(&mut self, _ctx: &mut FrameContext<'_>) {}

    /// Called before another technique takes over; must release any
    /// flags, markers and pivots it changed.
    fn deactivate(&mut self, ctx: &mut FrameContext<'_>);

    /// Advance one tracking frame.
    fn update(&mut self, ctx: &mut FrameContext<'_>, input: &FrameInput, events: &ButtonEvents);

    /// Touchscreen gesture, for techniques that use them.
    fn touch(&mut self, _ctx: &mut FrameContext<'_>, _event: &TouchEvent) {}

    /// The harness's undo/reset signal: drop session state and counters.
    fn reset(&mut self, ctx: &mut FrameContext<'_>);

    fn metrics(&self) -> &SessionMetrics;
}

/// The study's techniques
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TechniqueKind {
    /// Free arrangement: multi-select and drag
    Arrange,
    /// Corner-anchored scaling along the vertical extent
    CornerScale,
    /// Corner or center scaling along the diagonal, recovered at corner depth
    RayScale,
    /// Touchscreen pinch scaling
    PinchScale,
    /// Scaling to a length drawn with the pointer
    ReferenceScale,
    /// Rotation following the device attitude
    DeviceRotate,
    /// Rotation following the pointer tip
    PenRotate,
    /// Rate-controlled rotation from pointer tilt
    PenPedalRotate,
    /// Rate-controlled rotation from device tilt
    DevicePedalRotate,
    /// Touchscreen pan rotation
    TouchRotate,
}

impl TechniqueKind {
    pub const ALL: [TechniqueKind; 10] = [
        TechniqueKind::Arrange,
        TechniqueKind::CornerScale,
        TechniqueKind::RayScale,
        TechniqueKind::PinchScale,
        TechniqueKind::ReferenceScale,
        TechniqueKind::DeviceRotate,
        TechniqueKind::PenRotate,
        TechniqueKind::PenPedalRotate,
        TechniqueKind::DevicePedalRotate,
        TechniqueKind::TouchRotate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TechniqueKind::Arrange => "arrange",
            TechniqueKind::CornerScale => "corner-scale",
            TechniqueKind::RayScale => "ray-scale",
            TechniqueKind::PinchScale => "pinch-scale",
            TechniqueKind::ReferenceScale => "reference-scale",
            TechniqueKind::DeviceRotate => "device-rotate",
            TechniqueKind::PenRotate => "pen-rotate",
            TechniqueKind::PenPedalRotate => "pen-pedal-rotate",
            TechniqueKind::DevicePedalRotate => "device-pedal-rotate",
            TechniqueKind::TouchRotate => "touch-rotate",
        }
    }
}

impl fmt::Display for TechniqueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Knobs that distinguish one technique from another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechniqueConfig {
    /// Selects the hovered object
    pub select_button: Button,
    /// Picks a corner / starts scaling / rotates while held
    pub action_button: Button,
    /// Starts center-anchored scaling while held
    pub center_button: Option<Button>,
    /// `None` for unrestricted selection
    pub selection_cap: Option<usize>,
    pub drag: DragConfig,
    pub growth_axis: GrowthAxis,
    pub scale_mode: ScaleMode,
    pub recovery: DiagonalRecovery,
    pub min_scale_factor: f32,
    pub marker_size: f32,
    pub edge_markers: bool,
    pub orientation_source: OrientationSource,
    /// Rate-controlled rotation when present
    pub buckets: Option<SpeedBuckets>,
    /// Drop frame deltas at or above this many degrees
    pub max_frame_delta: Option<f32>,
    pub degrees_per_pixel: f32,
}

impl TechniqueConfig {
    /// Preset for a technique built from the engine-wide thresholds.
    pub fn preset(kind: TechniqueKind, engine: &EngineConfig) -> Self {
        let base = Self {
            select_button: Button::Primary,
            action_button: Button::Secondary,
            center_button: None,
            selection_cap: Some(1),
            drag: engine.drag.clone(),
            growth_axis: GrowthAxis::Y,
            scale_mode: ScaleMode::Uniform,
            recovery: engine.scaling.recovery,
            min_scale_factor: engine.scaling.min_scale_factor,
            marker_size: engine.scaling.marker_size,
            edge_markers: engine.scaling.edge_markers,
            orientation_source: OrientationSource::Device,
            buckets: None,
            max_frame_delta: None,
            degrees_per_pixel: engine.touch.degrees_per_pixel,
        };
        match kind {
            TechniqueKind::Arrange => Self {
                selection_cap: None,
                ..base
            },
            TechniqueKind::CornerScale
            | TechniqueKind::PinchScale
            | TechniqueKind::ReferenceScale
            | TechniqueKind::DeviceRotate
            | TechniqueKind::TouchRotate => base,
            TechniqueKind::RayScale => Self {
                growth_axis: GrowthAxis::Diagonal,
                recovery: DiagonalRecovery::CornerDepth,
                center_button: Some(Button::Tertiary),
                ..base
            },
            TechniqueKind::PenRotate => Self {
                orientation_source: OrientationSource::Pointer,
                max_frame_delta: engine.rotation.max_frame_delta,
                ..base
            },
            TechniqueKind::PenPedalRotate => Self {
                orientation_source: OrientationSource::Pointer,
                buckets: Some(engine.rotation.buckets.clone()),
                ..base
            },
            TechniqueKind::DevicePedalRotate => Self {
                buckets: Some(engine.rotation.buckets.clone()),
                ..base
            },
        }
    }
}

/// Build the technique for `kind`.
pub fn create(kind: TechniqueKind, config: TechniqueConfig) -> Box<dyn ManipulationTechnique> {
    match kind {
        TechniqueKind::Arrange => Box::new(Arranger::new(config)),
        TechniqueKind::CornerScale | TechniqueKind::RayScale => {
            Box::new(DiagonalScaler::new(kind, config))
        }
        TechniqueKind::PinchScale => Box::new(PinchScaler::new(config)),
        TechniqueKind::ReferenceScale => Box::new(ReferenceScaler::new(config)),
        TechniqueKind::DeviceRotate
        | TechniqueKind::PenRotate
        | TechniqueKind::PenPedalRotate
        | TechniqueKind::DevicePedalRotate => Box::new(Rotator::new(kind, config)),
        TechniqueKind::TouchRotate => Box::new(TouchRotator::new(config)),
    }
}
