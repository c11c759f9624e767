//! ARPen spatial manipulation engine
//!
//! Per-frame state machines for the study's interaction techniques:
//! hover and selection, free arrangement, corner-anchored diagonal scaling
//! and orientation-rebasing rotation.
//!
//! # Architecture
//!
//! - [`engine::Engine`] - owns the scene, the substrate and the active technique
//! - [`technique::ManipulationTechnique`] - one trait, parameterized by [`technique::TechniqueConfig`]
//! - [`input::ButtonSampler`] - press / release / double-click edges
//! - [`selection::SelectionController`] - hover, selection set, visit / leave
//! - [`scaler`] - diagonal-projection, pinch and reference-length scaling
//! - [`rotator`] - orientation-rebasing, bucketed and touchscreen rotation
//! - [`bake::BakeWorker`] - background commit of finished manipulations
//! - [`replay`] - offline replay of recorded sessions (`arpen-replay`)

pub mod arranger;
pub mod bake;
pub mod engine;
pub mod frame;
pub mod input;
pub mod lookup;
pub mod metrics;
pub mod replay;
pub mod rotator;
pub mod scaler;
pub mod selection;
pub mod technique;

#[cfg(test)]
pub(crate) mod test_support;

pub use bake::{BakeWorker, BakedGeometry, BakedStore};
pub use engine::Engine;
pub use frame::{FrameInput, GesturePhase, TouchEvent};
pub use input::{ButtonEvent, ButtonEvents, ButtonSampler};
pub use metrics::{SessionMetrics, TaskRecord, TaskTimer};
pub use technique::{FrameContext, ManipulationTechnique, TechniqueConfig, TechniqueKind};
