//! Meadow - an instanced, wind-swayed grass field

pub mod core;
pub mod grass;
pub mod terrain;
pub mod render;
