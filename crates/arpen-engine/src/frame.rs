//! Per-frame input from the tracking collaborator

use arpen_core::ButtonState;
use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Everything sampled once per tracking frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Seconds since the session started
    pub time: f32,
    /// Pointer tip in world space
    pub pointer: Vec3,
    /// Pointer tip orientation, when tracked
    #[serde(default)]
    pub pointer_orientation: Option<Quat>,
    /// Device or head-mounted camera attitude, when tracked
    #[serde(default)]
    pub device_orientation: Option<Quat>,
    #[serde(default)]
    pub buttons: ButtonState,
}

impl FrameInput {
    pub fn new(time: f32, pointer: Vec3) -> Self {
        Self {
            time,
            pointer,
            pointer_orientation: None,
            device_orientation: None,
            buttons: ButtonState::none(),
        }
    }

    pub fn with_buttons(mut self, buttons: ButtonState) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_device_orientation(mut self, orientation: Quat) -> Self {
        self.device_orientation = Some(orientation);
        self
    }

    pub fn with_pointer_orientation(mut self, orientation: Quat) -> Self {
        self.pointer_orientation = Some(orientation);
        self
    }
}

/// Touch gesture lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
    Cancelled,
}

impl GesturePhase {
    pub fn is_finished(self) -> bool {
        matches!(self, GesturePhase::Ended | GesturePhase::Cancelled)
    }
}

/// Touchscreen gesture, in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TouchEvent {
    Tap {
        position: Vec2,
    },
    /// `scale` is relative to the start of the gesture
    Pinch {
        phase: GesturePhase,
        scale: f32,
    },
    /// `translation` is cumulative since the start of the gesture
    Pan {
        phase: GesturePhase,
        translation: Vec2,
    },
}
