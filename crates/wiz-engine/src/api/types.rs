use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Stable handle to an entity in the scene arena.
///
/// The generation is bumped every time a slot is reused, so a handle to a
/// deleted entity never resolves to whatever was spawned into its slot later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

impl EntityId {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Which side an entity fights for. Damage between equal allegiances is suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Allegiance {
    Hero,
    Enemy,
    #[default]
    Neutral,
}

/// A game event handed to audio/particle collaborators after each frame.
/// Generic container: `kind` identifies the event, `a/b/c` carry payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GameEvent {
    pub kind: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl GameEvent {
    pub const FLOATS: usize = 4;

    /// `a` = target slot index, `b` = damage amount, `c` = remaining health.
    pub const DAMAGE: f32 = 1.0;
    /// `a` = slot index, `b`/`c` = position.
    pub const DEATH: f32 = 2.0;
    /// `a` = trigger slot index, `b` = toucher slot index, `c` = trigger amount.
    pub const TRIGGER: f32 = 3.0;
    /// `a` = split target slot index, `b` = clone count, `c` = division iteration.
    pub const SPLIT: f32 = 4.0;
    /// `a` = blocking slot index, `b` = attacker slot index.
    pub const BLOCKED: f32 = 5.0;

    pub fn new(kind: f32, a: f32, b: f32, c: f32) -> Self {
        Self { kind, a, b, c }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_event_is_four_floats() {
        assert_eq!(std::mem::size_of::<GameEvent>(), GameEvent::FLOATS * 4);
    }

    #[test]
    fn allegiance_parses_from_json_names() {
        let a: Allegiance = serde_json::from_str("\"Hero\"").unwrap();
        assert_eq!(a, Allegiance::Hero);
        assert_eq!(Allegiance::default(), Allegiance::Neutral);
    }
}
