pub mod entity;
pub mod hitbox;
pub mod tilemap;
