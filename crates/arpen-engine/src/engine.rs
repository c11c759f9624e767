//! Engine orchestrator
//!
//! Owns the scene, the rendering substrate, the bake worker and the one
//! active technique, and drives them from the per-frame callback.

use arpen_core::{EngineConfig, Scene};
use arpen_view::Substrate;

use crate::bake::{BakeWorker, BakedStore};
use crate::frame::{FrameInput, TouchEvent};
use crate::input::{ButtonEvents, ButtonSampler};
use crate::lookup::MissingNodeLog;
use crate::metrics::{SessionMetrics, TaskRecord, TaskTimer};
use crate::technique::{self, FrameContext, ManipulationTechnique, TechniqueConfig, TechniqueKind};

pub struct Engine<S: Substrate> {
    scene: Scene,
    substrate: S,
    config: EngineConfig,
    sampler: ButtonSampler,
    technique: Option<Box<dyn ManipulationTechnique>>,
    bake: BakeWorker,
    missing: MissingNodeLog,
    timer: TaskTimer,
    /// Time of the latest frame
    time: f32,
}

impl<S: Substrate> Engine<S> {
    pub fn new(scene: Scene, substrate: S, config: EngineConfig) -> Self {
        Self {
            scene,
            substrate,
            sampler: ButtonSampler::new(&config.input),
            config,
            technique: None,
            bake: BakeWorker::new(),
            missing: MissingNodeLog::new(),
            timer: TaskTimer::new(),
            time: 0.0,
        }
    }

    /// Switch to `kind` with its preset configuration.
    pub fn activate(&mut self, kind: TechniqueKind) {
        let config = TechniqueConfig::preset(kind, &self.config);
        self.activate_with(kind, config);
    }

    /// Switch to `kind` with an explicit configuration. The previous
    /// technique is deactivated first, so only one is ever live.
    pub fn activate_with(&mut self, kind: TechniqueKind, config: TechniqueConfig) {
        self.deactivate();
        self.sampler.reset();
        self.technique = Some(technique::create(kind, config));
        self.with_technique(|technique, ctx| technique.activate(ctx));
        tracing::info!("Activated technique {}", kind);
    }

    /// Deactivate the current technique, if any.
    pub fn deactivate(&mut self) {
        self.with_technique(|technique, ctx| technique.deactivate(ctx));
        if let Some(previous) = self.technique.take() {
            tracing::debug!("Deactivated technique {}", previous.kind());
        }
    }

    pub fn active(&self) -> Option<TechniqueKind> {
        self.technique.as_ref().map(|t| t.kind())
    }

    /// Advance one tracking frame.
    pub fn frame(&mut self, input: &FrameInput) -> ButtonEvents {
        if input.time < self.time {
            tracing::warn!("Frame time went backwards: {:.3}s after {:.3}s", input.time, self.time);
        }
        self.time = input.time;
        let events = self.sampler.update(input.buttons, input.time);
        if !events.is_empty() {
            self.timer.start_unless_running(input.time);
        }
        self.with_technique(|technique, ctx| technique.update(ctx, input, &events));
        events
    }

    /// Deliver a touchscreen gesture event.
    pub fn touch(&mut self, event: &TouchEvent) {
        self.timer.start_unless_running(self.time);
        self.with_technique(|technique, ctx| technique.touch(ctx, event));
    }

    /// The harness's undo/reset signal.
    pub fn reset(&mut self) {
        self.with_technique(|technique, ctx| technique.reset(ctx));
        self.sampler.reset();
        self.missing.clear();
        self.timer.reset();
    }

    pub fn metrics(&self) -> Option<&SessionMetrics> {
        self.technique.as_ref().map(|t| t.metrics())
    }

    pub fn timer(&self) -> &TaskTimer {
        &self.timer
    }

    /// Stop counting task time, e.g. while the participant reads instructions.
    pub fn pause_task(&mut self) {
        self.timer.pause(self.time);
        tracing::debug!("Task paused at {:.3}s", self.time);
    }

    pub fn resume_task(&mut self) {
        self.timer.resume(self.time);
    }

    /// Stop the task timer at the latest frame time.
    pub fn finish_task(&mut self) -> Option<TaskRecord> {
        self.timer.finish(self.time)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    pub fn substrate_mut(&mut self) -> &mut S {
        &mut self.substrate
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Snapshots of committed objects, filled by the bake worker
    pub fn baked(&self) -> BakedStore {
        self.bake.store()
    }

    /// Missing-node reports since the last reset
    pub fn missing_nodes(&self) -> u64 {
        self.missing.total()
    }

    /// Deactivate the technique and wait for pending bakes.
    pub fn shutdown(&mut self) {
        self.deactivate();
        self.bake.shutdown();
    }

    fn with_technique(&mut self, f: impl FnOnce(&mut dyn ManipulationTechnique, &mut FrameContext<'_>)) {
        let Some(technique) = self.technique.as_mut() else {
            return;
        };
        let mut ctx = FrameContext {
            scene: &mut self.scene,
            substrate: &self.substrate,
            bake: &self.bake,
            missing: &mut self.missing,
            time: self.time,
        };
        f(technique.as_mut(), &mut ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use approx::assert_relative_eq;
    use arpen_core::{Button, NodeKind};
    use arpen_view::SoftwareViewport;
    use glam::Vec3;

    fn engine() -> (Engine<SoftwareViewport>, arpen_core::NodeId) {
        let (scene, id) = scene_with_box();
        (Engine::new(scene, ortho_viewport(), EngineConfig::default()), id)
    }

    #[test]
    fn test_frames_without_technique_are_ignored() {
        let (mut engine, id) = engine();
        let events = engine.frame(&frame(0.0, Vec3::new(0.0, 0.2, 0.0), &[Button::Primary]));
        assert!(events.pressed(Button::Primary));
        assert!(!engine.scene().get(id).unwrap().flags.selected);
        assert!(engine.metrics().is_none());
    }

    #[test]
    fn test_drag_commits_to_bake_store() {
        let (mut engine, id) = engine();
        engine.activate(TechniqueKind::Arrange);
        let start = Vec3::new(0.0, 0.2, 0.0);
        engine.frame(&frame(0.0, start, &[Button::Primary]));
        engine.frame(&frame(0.1, start + Vec3::X * 0.05, &[Button::Primary]));
        engine.frame(&frame(0.2, start + Vec3::X * 0.1, &[Button::Primary]));
        engine.frame(&frame(0.3, start + Vec3::X * 0.1, &[]));
        let position = engine.scene().transform(id).unwrap().position;
        engine.shutdown();

        let baked = engine.baked().read().get(&id).cloned().unwrap();
        assert_eq!(baked.transform.position, position);
        assert!(position.x > 0.0);
        assert_relative_eq!(engine.finish_task().unwrap().started_at, 0.0);
    }

    #[test]
    fn test_switching_technique_cleans_up() {
        let (mut engine, id) = engine();
        engine.activate(TechniqueKind::CornerScale);
        let center = Vec3::new(0.0, 0.2, 0.0);
        engine.frame(&frame(0.0, center, &[Button::Primary]));
        engine.frame(&frame(0.1, center, &[]));
        let markers = |engine: &Engine<SoftwareViewport>| {
            engine
                .scene()
                .iter()
                .filter(|n| matches!(n.kind, NodeKind::CornerMarker { .. }))
                .count()
        };
        assert_eq!(markers(&engine), 8);

        engine.activate(TechniqueKind::DeviceRotate);
        assert_eq!(engine.active(), Some(TechniqueKind::DeviceRotate));
        assert_eq!(markers(&engine), 0);
        assert!(!engine.scene().get(id).unwrap().flags.selected);
    }

    #[test]
    fn test_reset_clears_metrics() {
        let (mut engine, _) = engine();
        engine.activate(TechniqueKind::Arrange);
        let center = Vec3::new(0.0, 0.2, 0.0);
        engine.frame(&frame(0.0, center, &[Button::Primary]));
        engine.frame(&frame(0.1, center, &[]));
        assert_eq!(engine.metrics().unwrap().selection_count, 1);

        engine.reset();
        assert_eq!(engine.metrics().unwrap().selection_count, 0);
        assert!(!engine.timer().is_running());
    }

    #[test]
    fn test_paused_time_not_counted() {
        let (mut engine, _) = engine();
        engine.activate(TechniqueKind::Arrange);
        let center = Vec3::new(0.0, 0.2, 0.0);
        engine.frame(&frame(1.0, center, &[Button::Primary]));
        engine.frame(&frame(2.0, center, &[]));
        engine.pause_task();
        assert!(!engine.timer().is_running());
        engine.frame(&frame(5.0, center, &[]));
        engine.resume_task();
        engine.frame(&frame(6.0, center, &[]));

        let record = engine.finish_task().unwrap();
        assert_relative_eq!(record.started_at, 1.0);
        assert_relative_eq!(record.finished_at, 6.0);
        assert_relative_eq!(record.active_seconds, 2.0, epsilon = 1e-5);
    }
}
