//! Keyboard state and pointer deltas.
//!
//! [`Input`] mirrors which keys are held from winit window events; the game only
//! sees it through [`KeyState`]. [`PointerTracker`] turns absolute pointer samples
//! into look offsets.

use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Anything that can answer "is this key held right now".
pub trait KeyState {
    fn is_down(&self, key: KeyCode) -> bool;
}

/// Tracks which keys are held, fed from window events.
#[derive(Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a window event and update key state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.set_key(key, event.state == ElementState::Pressed);
                }
            }
            // Releases that happen while unfocused never arrive.
            WindowEvent::Focused(false) => self.keys_down.clear(),
            _ => {}
        }
    }

    pub fn set_key(&mut self, key: KeyCode, down: bool) {
        if down {
            self.keys_down.insert(key);
        } else {
            self.keys_down.remove(&key);
        }
    }

    /// Returns true if the key is currently held down.
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }
}

impl KeyState for Input {
    fn is_down(&self, key: KeyCode) -> bool {
        self.key_down(key)
    }
}

/// Turns absolute pointer positions into look offsets.
///
/// The first sample only records the position. Later samples yield
/// `(x - last_x, last_y - y)`, so moving the pointer up gives a positive
/// vertical offset.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerTracker {
    last: Option<Vec2>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, x: f32, y: f32) -> Option<Vec2> {
        let position = Vec2::new(x, y);
        let offset = self
            .last
            .map(|last| Vec2::new(position.x - last.x, last.y - position.y));
        self.last = Some(position);
        offset
    }

    /// Forget the last position; the next sample is treated as the first.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
