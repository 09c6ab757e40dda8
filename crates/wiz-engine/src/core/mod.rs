pub mod actions;
pub mod body;
pub mod camera;
pub mod collision;
pub mod geometry;
pub mod overlap;
pub mod primitives;
pub mod scene;
pub mod time;
