//! Instanced grass pipeline
//!
//! Draws the blade template once per `BladeInstance`. All deformation
//! (tiling, height, wind, pointer calm zone) runs in grass.wgsl.

use wgpu::util::{BufferInitDescriptor, DeviceExt};

use crate::core::error::Error;
use crate::grass::{BladeInstance, BladeTemplate, BladeVertex, GrassUniforms, InstanceField};
use crate::render::buffer::CameraBuffer;
use crate::render::texture::{HeightTexture, DEPTH_FORMAT};

/// Check that template and field can be drawn as one indexed instanced call.
pub fn check_draw_data(template: &BladeTemplate, field: &InstanceField) -> Result<(), Error> {
    let vertex_count = template.vertices().len();
    let indices = template.indices();
    if vertex_count == 0 || indices.is_empty() {
        return Err(Error::Gpu("blade template has no geometry".into()));
    }
    if indices.len() % 3 != 0 {
        return Err(Error::Gpu(format!(
            "blade index count {} is not a multiple of 3",
            indices.len()
        )));
    }
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(Error::Gpu(format!(
            "blade index {} out of range for {} vertices",
            bad, vertex_count
        )));
    }
    if field.is_empty() || field.len() > u32::MAX as usize {
        return Err(Error::Gpu(format!("cannot draw {} instances", field.len())));
    }
    Ok(())
}

/// Check buffer sizes for the template and field against device limits.
pub fn check_buffer_limits(
    template: &BladeTemplate,
    field: &InstanceField,
    limits: &wgpu::Limits,
) -> Result<(), Error> {
    let sizes = [
        ("instance", (field.len() * std::mem::size_of::<BladeInstance>()) as u64),
        ("vertex", (template.vertices().len() * std::mem::size_of::<BladeVertex>()) as u64),
    ];
    for (name, bytes) in sizes {
        if bytes > limits.max_buffer_size {
            return Err(Error::Gpu(format!(
                "{} buffer of {} bytes exceeds the device limit of {} bytes",
                name, bytes, limits.max_buffer_size
            )));
        }
    }
    Ok(())
}

/// Grass render pipeline with its geometry and uniforms.
pub struct GrassPipeline {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    index_count: u32,
    instance_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GrassPipeline {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        camera: &CameraBuffer,
        height: &HeightTexture,
        template: &BladeTemplate,
        field: &InstanceField,
    ) -> Result<Self, Error> {
        check_draw_data(template, field)?;
        check_buffer_limits(template, field, &device.limits())?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grass_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/grass.wgsl").into()),
        });

        let vertex_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("grass_vertices"),
            contents: bytemuck::cast_slice(template.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Index buffers need a 4-byte aligned size; pad odd u16 counts
        let mut indices = template.indices().to_vec();
        if indices.len() % 2 != 0 {
            indices.push(0);
        }
        let index_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("grass_indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let instance_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("grass_instances"),
            contents: bytemuck::cast_slice(field.instances()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let expected = (field.len() * std::mem::size_of::<BladeInstance>()) as u64;
        if instance_buffer.size() != expected {
            return Err(Error::Gpu(format!(
                "instance buffer is {} bytes, expected {}",
                instance_buffer.size(),
                expected
            )));
        }

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grass_uniforms"),
            size: std::mem::size_of::<GrassUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grass_bind_group_layout"),
            entries: &[
                // Per-frame uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Height field
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grass_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(height.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(height.sampler()),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grass_pipeline_layout"),
            bind_group_layouts: &[camera.bind_group_layout(), &bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grass_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[BladeVertex::layout(), BladeInstance::layout()],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Blades are seen from both sides
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        log::debug!(
            "Grass pipeline: {} KB instance data",
            instance_buffer.size() / 1024
        );

        Ok(Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            instance_buffer,
            index_count: template.indices().len() as u32,
            instance_count: field.len() as u32,
            uniform_buffer,
            bind_group,
        })
    }

    pub fn update(&self, queue: &wgpu::Queue, uniforms: &GrassUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    /// Draw all blades over the existing color target, clearing depth.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        camera: &CameraBuffer,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("grass_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, camera.bind_group(), &[]);
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.index_count, 0, 0..self.instance_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grass::config::BladeConfig;
    use crate::grass::{FieldGenerator, GlyphStencil};

    #[test]
    fn test_default_draw_data_valid() {
        let template = BladeTemplate::build(&BladeConfig::default()).unwrap();
        let field = FieldGenerator::new(GlyphStencil::new(0.4), 1).generate(100).unwrap();
        assert!(check_draw_data(&template, &field).is_ok());
    }

    #[test]
    fn test_buffer_limits() {
        let template = BladeTemplate::build(&BladeConfig::default()).unwrap();
        let field = FieldGenerator::new(GlyphStencil::new(0.4), 2).generate(1_000).unwrap();

        assert!(check_buffer_limits(&template, &field, &wgpu::Limits::default()).is_ok());

        // 1000 blades need 32000 bytes of instance data
        let tight = wgpu::Limits {
            max_buffer_size: 31_999,
            ..wgpu::Limits::default()
        };
        assert!(matches!(check_buffer_limits(&template, &field, &tight), Err(Error::Gpu(_))));
        let exact = wgpu::Limits {
            max_buffer_size: 32_000,
            ..wgpu::Limits::default()
        };
        assert!(check_buffer_limits(&template, &field, &exact).is_ok());
    }

    #[test]
    fn test_instance_and_vertex_locations_disjoint() {
        let vertex = BladeVertex::layout();
        let instance = BladeInstance::layout();
        for a in vertex.attributes {
            assert!(instance.attributes.iter().all(|b| b.shader_location != a.shader_location));
        }
        assert_eq!(vertex.step_mode, wgpu::VertexStepMode::Vertex);
        assert_eq!(instance.step_mode, wgpu::VertexStepMode::Instance);
        assert_eq!(instance.array_stride, 32);
    }
}
