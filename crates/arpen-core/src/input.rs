//! Pointer buttons

use serde::{Deserialize, Serialize};

/// One of the pointer's three physical buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    Primary,
    Secondary,
    Tertiary,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::Primary, Button::Secondary, Button::Tertiary];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Button snapshot for one frame. Buttons never reported read as released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonState {
    #[serde(default)]
    pressed: [bool; 3],
}

impl ButtonState {
    pub fn none() -> Self {
        Self::default()
    }

    /// Snapshot with exactly the given buttons held.
    pub fn held(buttons: &[Button]) -> Self {
        let mut state = Self::default();
        for button in buttons {
            state.set(*button, true);
        }
        state
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.pressed[button.index()]
    }

    pub fn set(&mut self, button: Button, pressed: bool) {
        self.pressed[button.index()] = pressed;
    }

    pub fn any(&self) -> bool {
        self.pressed.iter().any(|p| *p)
    }
}
