//! Instanced matcap rendering with depth testing.
//!
//! This module provides [`MatcapPass`], which draws every visible entity as
//! part of an instanced batch: one draw call per (mesh, material) pair, with
//! each entity's model matrix, normal matrix and color packed into a shared
//! instance buffer.
//!
//! # Architecture
//!
//! The pass uses two bind groups:
//! - **Group 0**: Camera uniforms (view-projection and view matrices)
//! - **Group 1**: The matcap texture and its sampler
//!
//! Vertex buffer slot 0 carries [`Vertex3d`] data (locations 0-2); slot 1
//! carries [`InstanceRaw`] data (locations 3-11).
//!
//! # Example
//!
//! ```ignore
//! let mut pass = MatcapPass::new(&gpu);
//! let matcap = pass.create_texture_bind_group(&gpu, &texture);
//!
//! pass.ensure_depth_size(&gpu);
//! pass.prepare(&gpu, &camera, &instances);
//! // inside a render pass using pass.depth_view():
//! let batches = [Batch { mesh: &mesh, matcap: &matcap, instances: 0..instances.len() as u32 }];
//! pass.draw(&mut render_pass, &batches);
//! ```
//!
//! # Depth Buffer
//!
//! The pass owns a Depth32Float buffer that follows the surface size. Call
//! [`MatcapPass::ensure_depth_size`] before rendering if the window may have
//! been resized.

use std::ops::Range;

use crate::camera::PerspectiveCamera;
use crate::color::Color;
use crate::gpu::GpuContext;
use crate::mesh::{Mesh, Transform, Vertex3d};
use crate::texture::Texture;

const INITIAL_INSTANCE_CAPACITY: u64 = 1024;

/// Camera uniforms for 3D rendering.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    /// Combined view-projection matrix for transforming world positions to clip space.
    pub view_proj: [[f32; 4]; 4],
    /// View matrix (world to camera space transformation).
    pub view: [[f32; 4]; 4],
}

/// Per-instance data uploaded for every drawn entity.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    /// Model matrix (object to world space transformation).
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of the model matrix.
    pub normal: [[f32; 4]; 4],
    /// Linear RGBA color multiplied with the matcap texel.
    pub color: [f32; 4],
}

impl InstanceRaw {
    const ATTRIBUTES: [wgpu::VertexAttribute; 9] = wgpu::vertex_attr_array![
        3 => Float32x4, 4 => Float32x4, 5 => Float32x4, 6 => Float32x4,
        7 => Float32x4, 8 => Float32x4, 9 => Float32x4, 10 => Float32x4,
        11 => Float32x4
    ];

    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<InstanceRaw>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &Self::ATTRIBUTES,
    };

    pub fn new(transform: &Transform, color: Color) -> Self {
        Self {
            model: transform.matrix().to_cols_array_2d(),
            normal: transform.normal_matrix().to_cols_array_2d(),
            color: color.to_array(),
        }
    }
}

/// One instanced draw: a mesh, its matcap and the instances sharing them.
pub struct Batch<'a> {
    pub mesh: &'a Mesh,
    pub matcap: &'a wgpu::BindGroup,
    /// Range into the instance slice passed to [`MatcapPass::prepare`].
    pub instances: Range<u32>,
}

/// Draws batches of instanced meshes with matcap shading.
///
/// # Pipeline Configuration
///
/// - No face culling
/// - Opaque output (blending replaced)
/// - Depth write and Less-than comparison
pub struct MatcapPass {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u64,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl MatcapPass {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Matcap Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/matcap.wgsl").into()),
        });

        // Camera uniform buffer (group 0)
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniforms"),
            size: std::mem::size_of::<CameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        // Matcap texture (group 1)
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Matcap Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Matcap Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Matcap Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex3d::LAYOUT, InstanceRaw::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let instance_buffer = Self::create_instance_buffer(gpu, INITIAL_INSTANCE_CAPACITY);

        Self {
            pipeline,
            camera_buffer,
            camera_bind_group,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            texture_bind_group_layout,
            depth_view: Self::create_depth_view(gpu),
            depth_size: (gpu.width(), gpu.height()),
        }
    }

    /// Binds a texture and its sampler for use as a matcap (group 1).
    pub fn create_texture_bind_group(&self, gpu: &GpuContext, texture: &Texture) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Matcap Texture Bind Group"),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        })
    }

    fn create_instance_buffer(gpu: &GpuContext, capacity: u64) -> wgpu::Buffer {
        gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: capacity * std::mem::size_of::<InstanceRaw>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Recreates the depth buffer if the surface size changed.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            self.depth_view = Self::create_depth_view(gpu);
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Uploads camera uniforms and every instance for this frame.
    ///
    /// The instance buffer grows to the next power of two when it runs out of room.
    pub fn prepare(&mut self, gpu: &GpuContext, camera: &PerspectiveCamera, instances: &[InstanceRaw]) {
        let view = camera.view_matrix();
        let uniforms = CameraUniforms {
            view_proj: (camera.projection_matrix() * view).to_cols_array_2d(),
            view: view.to_cols_array_2d(),
        };
        gpu.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let needed = instances.len() as u64;
        if needed > self.instance_capacity {
            let capacity = needed.next_power_of_two();
            log::debug!("growing instance buffer to {capacity}");
            self.instance_buffer = Self::create_instance_buffer(gpu, capacity);
            self.instance_capacity = capacity;
        }
        if !instances.is_empty() {
            gpu.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        }
    }

    /// Records one instanced draw per batch.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, batches: &[Batch<'_>]) {
        if batches.is_empty() {
            return;
        }

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

        for batch in batches {
            render_pass.set_bind_group(1, batch.matcap, &[]);
            render_pass.set_vertex_buffer(0, batch.mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(batch.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..batch.mesh.index_count, 0, batch.instances.clone());
        }
    }
}
