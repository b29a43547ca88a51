//! Ground height under the grass

pub mod height_field;
pub use height_field::HeightField;
