//! GPU textures

pub mod depth;
pub mod height;

pub use depth::{DepthTexture, DEPTH_FORMAT};
pub use height::{check_texture_limits, HeightTexture};
