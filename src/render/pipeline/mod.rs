//! Render pipelines

pub mod grass;
pub mod sky;

pub use grass::{check_buffer_limits, check_draw_data, GrassPipeline};
pub use sky::{SkyPipeline, SkyUniforms};
