//! Button edge detection
//!
//! Turns per-frame button snapshots into press, release and double-click
//! events. A double-click fires on a release that follows the previous
//! release of the same button within the configured window.

use arpen_core::{Button, ButtonState, InputConfig};

/// Button edge event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Pressed(Button),
    Released(Button),
    DoubleClicked(Button),
}

/// Events of one frame together with the held snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonEvents {
    events: Vec<ButtonEvent>,
    held: ButtonState,
}

impl ButtonEvents {
    pub fn pressed(&self, button: Button) -> bool {
        self.events.contains(&ButtonEvent::Pressed(button))
    }

    pub fn released(&self, button: Button) -> bool {
        self.events.contains(&ButtonEvent::Released(button))
    }

    pub fn double_clicked(&self, button: Button) -> bool {
        self.events.contains(&ButtonEvent::DoubleClicked(button))
    }

    pub fn is_held(&self, button: Button) -> bool {
        self.held.is_pressed(button)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ButtonEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

type Callback = Box<dyn FnMut(ButtonEvent) + Send>;

/// Compares each snapshot with the previous one
pub struct ButtonSampler {
    previous: ButtonState,
    last_release: [Option<f32>; 3],
    double_click_window: f32,
    callbacks: Vec<Callback>,
}

impl Default for ButtonSampler {
    fn default() -> Self {
        Self::new(&InputConfig::default())
    }
}

impl ButtonSampler {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            previous: ButtonState::none(),
            last_release: [None; 3],
            double_click_window: config.double_click_window,
            callbacks: Vec::new(),
        }
    }

    /// Register a callback invoked for every emitted event.
    pub fn on_event(&mut self, callback: impl FnMut(ButtonEvent) + Send + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Feed the snapshot for the frame at `time` (seconds).
    pub fn update(&mut self, current: ButtonState, time: f32) -> ButtonEvents {
        let mut events = Vec::new();
        let window = self.double_click_window;
        for button in Button::ALL {
            let now = current.is_pressed(button);
            let before = self.previous.is_pressed(button);
            if now && !before {
                events.push(ButtonEvent::Pressed(button));
            } else if !now && before {
                events.push(ButtonEvent::Released(button));
                let slot = &mut self.last_release[button.index()];
                if slot.is_some_and(|last| time - last <= window) {
                    events.push(ButtonEvent::DoubleClicked(button));
                    // A third click starts a fresh pair
                    *slot = None;
                } else {
                    *slot = Some(time);
                }
            }
        }
        self.previous = current;

        for event in &events {
            tracing::trace!("Button event {:?} at {:.3}s", event, time);
            for callback in &mut self.callbacks {
                callback(*event);
            }
        }
        ButtonEvents {
            events,
            held: current,
        }
    }

    /// Forget history, e.g. when the active technique changes.
    pub fn reset(&mut self) {
        self.previous = ButtonState::none();
        self.last_release = [None; 3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    fn held(button: Button) -> ButtonState {
        ButtonState::held(&[button])
    }

    #[test]
    fn test_press_and_release_edges() {
        let mut sampler = ButtonSampler::default();
        let events = sampler.update(held(Button::Primary), 0.0);
        assert!(events.pressed(Button::Primary));
        assert!(events.is_held(Button::Primary));

        let events = sampler.update(held(Button::Primary), 0.1);
        assert!(events.is_empty());

        let events = sampler.update(ButtonState::none(), 0.2);
        assert!(events.released(Button::Primary));
        assert!(!events.double_clicked(Button::Primary));
    }

    #[test]
    fn test_double_click_within_window() {
        let mut sampler = ButtonSampler::default();
        sampler.update(held(Button::Secondary), 0.0);
        sampler.update(ButtonState::none(), 0.1);
        sampler.update(held(Button::Secondary), 0.2);
        let events = sampler.update(ButtonState::none(), 0.4);
        assert!(events.released(Button::Secondary));
        assert!(events.double_clicked(Button::Secondary));
    }

    #[test]
    fn test_slow_second_click_is_not_double() {
        let mut sampler = ButtonSampler::default();
        sampler.update(held(Button::Primary), 0.0);
        sampler.update(ButtonState::none(), 0.1);
        sampler.update(held(Button::Primary), 0.5);
        let events = sampler.update(ButtonState::none(), 0.7);
        assert!(!events.double_clicked(Button::Primary));
    }

    #[test]
    fn test_double_click_is_per_button() {
        let mut sampler = ButtonSampler::default();
        sampler.update(held(Button::Primary), 0.0);
        sampler.update(ButtonState::none(), 0.1);
        sampler.update(held(Button::Tertiary), 0.2);
        let events = sampler.update(ButtonState::none(), 0.3);
        assert!(!events.double_clicked(Button::Tertiary));
        assert!(!events.double_clicked(Button::Primary));
    }

    #[test]
    fn test_callbacks_receive_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut sampler = ButtonSampler::default();
        let sink = seen.clone();
        sampler.on_event(move |event| sink.lock().push(event));

        sampler.update(held(Button::Primary), 0.0);
        sampler.update(ButtonState::none(), 0.1);
        assert_eq!(
            *seen.lock(),
            vec![
                ButtonEvent::Pressed(Button::Primary),
                ButtonEvent::Released(Button::Primary)
            ]
        );
    }
}
