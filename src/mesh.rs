//! Vertex format, GPU meshes and entity transforms.
//!
//! - [`Vertex3d`]: the vertex format shared by every mesh (position, normal, uv)
//! - [`Mesh`]: GPU-resident geometry with vertex and index buffers
//! - [`Transform`]: position, Euler rotation and scale of an entity
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |
//!
//! # Transforms
//!
//! Rotation is stored as XYZ Euler angles rather than a quaternion because the
//! animation code tweens a single axis (`rotation.y`) in place:
//!
//! ```
//! use matcap_text::{Transform, Vec3};
//!
//! let mut transform = Transform::new()
//!     .position(Vec3::new(0.0, 2.0, -5.0))
//!     .uniform_scale(0.05);
//! transform.rotation.y += 0.4;
//! ```

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::geometry::RawGeometry;
use crate::gpu::GpuContext;

/// A vertex with position, normal, and texture coordinates.
///
/// `#[repr(C)]` plus [`bytemuck::Pod`] lets vertex slices be uploaded without copying.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    /// Position in model space.
    pub position: [f32; 3],
    /// Unit surface normal.
    pub normal: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// Vertex buffer layout: position (loc 0), normal (loc 1), uv (loc 2), 32 byte stride.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// GPU-resident mesh geometry.
///
/// Created from a [`RawGeometry`] by the renderer the first time a
/// [`MeshId`](crate::MeshId) is seen. Immutable after upload.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl Mesh {
    /// Uploads vertex and index data into new GPU buffers.
    pub fn new(gpu: &GpuContext, vertices: &[Vertex3d], indices: &[u32]) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    /// Uploads a [`RawGeometry`], or returns `None` when it has no triangles.
    ///
    /// Empty geometry happens when a label contains only characters the font
    /// lacks; skipping it keeps zero-sized buffers out of the draw list.
    pub fn from_geometry(gpu: &GpuContext, geometry: &RawGeometry) -> Option<Self> {
        if geometry.indices.is_empty() {
            return None;
        }
        Some(Self::new(gpu, &geometry.vertices, &geometry.indices))
    }
}

/// Position, XYZ Euler rotation (radians) and scale of an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles applied in X, Y, Z order.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    pub fn quaternion(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    /// Model matrix: scale, then rotate, then translate.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quaternion(), self.position)
    }

    /// Inverse-transpose of the model matrix, for transforming normals.
    pub fn normal_matrix(&self) -> Mat4 {
        self.matrix().inverse().transpose()
    }
}
