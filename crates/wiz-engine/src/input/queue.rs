use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::actions::Command;

/// Input event types the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A key was pressed.
    KeyDown { key_code: u32 },
    /// A key was released.
    KeyUp { key_code: u32 },
}

/// A queue of input events.
/// The host pushes events as they arrive; the runner drains them once per frame.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Held keys plus keys that went down since the last fixed tick.
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    down: HashSet<u32>,
    pressed: HashSet<u32>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown { key_code } => self.press(key_code),
            InputEvent::KeyUp { key_code } => self.release(key_code),
        }
    }

    pub fn press(&mut self, key_code: u32) {
        if self.down.insert(key_code) {
            self.pressed.insert(key_code);
        }
    }

    /// A key tapped and released within one frame still counts as pressed.
    pub fn release(&mut self, key_code: u32) {
        self.down.remove(&key_code);
    }

    pub fn is_down(&self, key_code: u32) -> bool {
        self.down.contains(&key_code)
    }

    pub fn just_pressed(&self, key_code: u32) -> bool {
        self.pressed.contains(&key_code)
    }

    /// Forget edge-triggered presses once a tick has seen them.
    pub fn end_tick(&mut self) {
        self.pressed.clear();
    }

    pub fn clear(&mut self) {
        self.down.clear();
        self.pressed.clear();
    }
}

/// When a key binding fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyTrigger {
    /// Every tick while the key is down, and on the tick it was tapped.
    #[default]
    Held,
    /// Only on the tick the key went down.
    Pressed,
}

/// Maps a key to a command enqueued into the controlled entity's queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: u32,
    pub command: Command,
    #[serde(default)]
    pub trigger: KeyTrigger,
}

impl KeyBinding {
    pub fn is_active(&self, keys: &KeyState) -> bool {
        match self.trigger {
            KeyTrigger::Held => keys.is_down(self.key) || keys.just_pressed(self.key),
            KeyTrigger::Pressed => keys.just_pressed(self.key),
        }
    }
}
