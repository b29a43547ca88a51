//! Height field texture upload

use wgpu::{Device, Extent3d, Queue, TextureView};

use crate::core::error::Error;
use crate::terrain::HeightField;

/// Reject height fields the device cannot hold as one 2D texture.
pub fn check_texture_limits(width: u32, height: u32, limits: &wgpu::Limits) -> Result<(), Error> {
    let max = limits.max_texture_dimension_2d;
    if width > max || height > max {
        return Err(Error::Gpu(format!(
            "height field {}x{} exceeds the device texture limit {}",
            width, height, max
        )));
    }
    Ok(())
}

/// Single-channel height texture with a repeat sampler. Sampled from the
/// grass vertex stage, so filtering happens with an explicit LOD.
pub struct HeightTexture {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: TextureView,
    sampler: wgpu::Sampler,
}

impl HeightTexture {
    pub fn new(device: &Device, queue: &Queue, field: &HeightField) -> Result<Self, Error> {
        check_texture_limits(field.width(), field.height(), &device.limits())?;

        let size = Extent3d {
            width: field.width(),
            height: field.height(),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("height_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            field.texels(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(field.width()), // R8 => 1 byte per texel
                rows_per_image: Some(field.height()),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("height_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}
