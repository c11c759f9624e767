//! Offline replay of recorded study sessions
//!
//! A [`ReplayScript`] bundles the scene, camera, thresholds and the recorded
//! per-frame input of one session. Running it through an [`Engine`] yields
//! the final object transforms and the session metrics.

use std::path::Path;

use arpen_core::{BoundingBox, EngineConfig, NodeId, NodeKind, Scene, Transform};
use arpen_view::{SoftwareViewport, ViewportConfig};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::frame::{FrameInput, TouchEvent};
use crate::metrics::{SessionMetrics, TaskRecord};
use crate::technique::TechniqueKind;

/// Replay errors
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Script parse error: {0}")]
    Parse(String),
    #[error("Output error: {0}")]
    Output(String),
}

/// One recorded event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReplayStep {
    /// A tracking frame
    Frame(FrameInput),
    /// A touchscreen gesture at the latest frame time
    Touch(TouchEvent),
    /// The device camera moved
    Camera { position: Vec3, orientation: Quat },
    /// The participant switched technique
    Activate(TechniqueKind),
    /// The harness's undo/reset signal
    Reset,
    /// Task timing paused at the latest frame time
    Pause,
    Resume,
}

/// A recorded session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    pub scene: Scene,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub config: EngineConfig,
    /// Technique active at the first step
    pub technique: TechniqueKind,
    pub frames: Vec<ReplayStep>,
}

impl ReplayScript {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ReplayError::Io(e.to_string()))?;
        let script = Self::from_ron(&content)?;
        tracing::info!(
            "Loaded replay '{}' with {} steps",
            script.scene.name,
            script.frames.len()
        );
        Ok(script)
    }

    pub fn from_ron(content: &str) -> Result<Self, ReplayError> {
        let script: Self = ron::from_str(content).map_err(|e| ReplayError::Parse(e.to_string()))?;
        script
            .config
            .validate()
            .map_err(|e| ReplayError::Parse(e.to_string()))?;
        Ok(script)
    }

    pub fn to_ron(&self) -> Result<String, ReplayError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ReplayError::Output(e.to_string()))
    }
}

/// Final state of one study object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectReport {
    pub id: NodeId,
    pub name: String,
    pub transform: Transform,
    pub world_bounds: BoundingBox,
}

/// Outcome of a replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub technique: Option<TechniqueKind>,
    pub objects: Vec<ObjectReport>,
    pub metrics: Option<SessionMetrics>,
    pub task: Option<TaskRecord>,
    pub missing_nodes: u64,
}

/// One line of JSON output
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReportLine<'a> {
    Object(&'a ObjectReport),
    Session {
        technique: Option<TechniqueKind>,
        metrics: &'a Option<SessionMetrics>,
        task: &'a Option<TaskRecord>,
        missing_nodes: u64,
    },
}

impl ReplayReport {
    /// One JSON object per study object, then one for the session.
    pub fn to_json_lines(&self) -> Result<Vec<String>, ReplayError> {
        let session = ReportLine::Session {
            technique: self.technique,
            metrics: &self.metrics,
            task: &self.task,
            missing_nodes: self.missing_nodes,
        };
        self.objects
            .iter()
            .map(ReportLine::Object)
            .chain(std::iter::once(session))
            .map(|line| serde_json::to_string(&line).map_err(|e| ReplayError::Output(e.to_string())))
            .collect()
    }
}

/// Run every step of `script` and report the final state.
pub fn run(script: ReplayScript) -> ReplayReport {
    let viewport = SoftwareViewport::new(&script.viewport);
    let mut engine = Engine::new(script.scene, viewport, script.config);
    engine.activate(script.technique);

    for step in &script.frames {
        match step {
            ReplayStep::Frame(input) => {
                engine.frame(input);
            }
            ReplayStep::Touch(event) => engine.touch(event),
            ReplayStep::Camera {
                position,
                orientation,
            } => engine.substrate_mut().set_pose(*position, *orientation),
            ReplayStep::Activate(kind) => engine.activate(*kind),
            ReplayStep::Reset => engine.reset(),
            ReplayStep::Pause => engine.pause_task(),
            ReplayStep::Resume => engine.resume_task(),
        }
    }

    let technique = engine.active();
    let metrics = engine.metrics().cloned();
    // Commit whatever is mid-gesture before reading the scene
    engine.shutdown();
    let task = engine.finish_task();
    let objects = engine
        .scene()
        .iter()
        .filter(|n| n.kind == NodeKind::Object)
        .map(|n| ObjectReport {
            id: n.id,
            name: n.name.clone(),
            transform: n.transform,
            world_bounds: n.world_bounds(),
        })
        .collect();
    tracing::info!("Replayed {} steps", script.frames.len());

    ReplayReport {
        technique,
        objects,
        metrics,
        task,
        missing_nodes: engine.missing_nodes(),
    }
}
