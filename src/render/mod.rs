//! Rendering system and GPU interfaces

pub mod context;
pub mod buffer;
pub mod pipeline;
pub mod texture;

use crate::core::camera::Camera;
use crate::core::error::Error;
use crate::grass::{GrassSystem, GrassUniforms};
use crate::terrain::HeightField;

use buffer::CameraBuffer;
use context::GpuContext;
use pipeline::{GrassPipeline, SkyPipeline, SkyUniforms};
use texture::{DepthTexture, HeightTexture};

/// GPU resources for one frame: sky backdrop, then instanced grass.
pub struct MeadowRenderer {
    camera_buffer: CameraBuffer,
    depth: DepthTexture,
    sky: SkyPipeline,
    grass: GrassPipeline,
}

impl MeadowRenderer {
    pub fn new(gpu: &GpuContext, grass: &GrassSystem, heights: &HeightField) -> Result<Self, Error> {
        let (width, height) = gpu.size();
        let camera_buffer = CameraBuffer::new(&gpu.device);
        let height_texture = HeightTexture::new(&gpu.device, &gpu.queue, heights)?;
        let depth = DepthTexture::new(&gpu.device, width, height);

        let sky = SkyPipeline::new(&gpu.device, gpu.format());
        let colors = &grass.config().colors;
        sky.update(
            &gpu.queue,
            &SkyUniforms {
                zenith: colors.sky_zenith,
                horizon: colors.sky_horizon,
            },
        );

        let grass_pipeline = GrassPipeline::new(
            &gpu.device,
            gpu.format(),
            &camera_buffer,
            &height_texture,
            grass.template(),
            grass.field(),
        )?;
        log::info!("Renderer ready: {} instances", grass_pipeline.instance_count());

        Ok(Self {
            camera_buffer,
            depth,
            sky,
            grass: grass_pipeline,
        })
    }

    /// Recreate size-dependent targets. Call after `GpuContext::resize`.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if (width, height) != self.depth.size() && width > 0 && height > 0 {
            self.depth = DepthTexture::new(device, width, height);
        }
    }

    /// Upload this frame's uniforms and draw. A lost or outdated surface is
    /// reconfigured and the frame skipped.
    pub fn render(&self, gpu: &GpuContext, camera: &Camera, uniforms: &GrassUniforms) -> Result<(), Error> {
        let frame = match gpu.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(Error::Gpu(e.to_string())),
        };
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.camera_buffer.update(&gpu.queue, camera);
        self.grass.update(&gpu.queue, uniforms);

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("meadow_frame"),
        });
        self.sky.render(&mut encoder, &view);
        self.grass.render(&mut encoder, &view, self.depth.view(), &self.camera_buffer);

        gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
