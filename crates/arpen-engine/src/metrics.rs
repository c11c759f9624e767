//! Study metrics
//!
//! Per-session numbers handed to the study-logging collaborator, and a task
//! timer driven by frame timestamps so replays reproduce the same values.

use serde::{Deserialize, Serialize};

/// Scalar metrics of one manipulation session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Frame time of the first tracked manipulation
    pub started_at: Option<f32>,
    /// Frame time of the last release
    pub ended_at: Option<f32>,
    /// Sum of frame-to-frame rotation of the orientation source
    pub degrees_source_rotated: f32,
    /// Sum of rotation actually applied to the object
    pub degrees_object_rotated: f32,
    /// Objects added to the selection
    pub selection_count: u32,
    /// Angle between object and reference orientation at the last release
    pub final_relative_angle: Option<f32>,
}

impl SessionMetrics {
    pub fn start_unless_running(&mut self, time: f32) {
        if self.started_at.is_none() {
            self.started_at = Some(time);
        }
    }

    pub fn end(&mut self, time: f32) {
        self.ended_at = Some(time);
    }

    pub fn elapsed(&self) -> Option<f32> {
        Some(self.ended_at? - self.started_at?)
    }

    pub fn record_rotation(&mut self, source_degrees: f32, object_degrees: f32) {
        self.degrees_source_rotated += source_degrees.abs();
        self.degrees_object_rotated += object_degrees.abs();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Completed task timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub started_at: f32,
    pub finished_at: f32,
    /// Running time excluding pauses
    pub active_seconds: f32,
}

/// Pausable task stopwatch
#[derive(Debug, Clone, Default)]
pub struct TaskTimer {
    started_at: Option<f32>,
    paused_at: Option<f32>,
    paused_total: f32,
}

impl TaskTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_unless_running(&mut self, now: f32) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
            tracing::debug!("Task timer started at {:.3}s", now);
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.paused_at.is_none()
    }

    pub fn pause(&mut self, now: f32) {
        if self.is_running() {
            self.paused_at = Some(now);
        }
    }

    pub fn resume(&mut self, now: f32) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += (now - paused_at).max(0.0);
        }
    }

    /// Active seconds so far
    pub fn elapsed(&self, now: f32) -> f32 {
        let Some(started_at) = self.started_at else {
            return 0.0;
        };
        let end = self.paused_at.unwrap_or(now);
        (end - started_at - self.paused_total).max(0.0)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Stop the timer; `None` if it was never started.
    pub fn finish(&mut self, now: f32) -> Option<TaskRecord> {
        let started_at = self.started_at?;
        let record = TaskRecord {
            started_at,
            finished_at: now,
            active_seconds: self.elapsed(now),
        };
        self.reset();
        tracing::info!("Task finished after {:.3}s active", record.active_seconds);
        Some(record)
    }
}
