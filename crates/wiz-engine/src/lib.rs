pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod bridge;
pub mod input;
pub mod assets;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root for convenience
pub use api::game::{Game, GameConfig, WorldContext};
pub use api::runner::GameRunner;
pub use api::types::{Allegiance, EntityId, GameEvent};
pub use assets::manifest::{DataError, Definitions, LevelData, ObjectDef};
pub use assets::registry::DefinitionRegistry;
pub use bridge::view::{EntityView, ViewBuffer};
pub use components::entity::{Entity, EntityKind};
pub use components::hitbox::{Hitbox, HitboxMode};
pub use components::tilemap::TileLayer;
pub use crate::core::actions::{ActionQueue, Command, CommandArg, PopCondition, QueuedAction, Value};
pub use crate::core::camera::Camera;
pub use crate::core::collision::CollisionWorld;
pub use crate::core::geometry::TileShape;
pub use crate::core::primitives::Primitive;
pub use crate::core::scene::Scene;
pub use crate::core::time::FixedTimestep;
pub use input::queue::{InputEvent, InputQueue, KeyBinding, KeyState};
