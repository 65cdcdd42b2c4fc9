//! Turns a [`SceneContext`] into a frame on screen.
//!
//! The scene side only holds CPU data. Each frame the renderer uploads any
//! geometry it has not seen yet and re-uploads textures whose revision moved,
//! then groups entities by (mesh, material) into instanced batches.

use std::collections::BTreeMap;
use std::iter;
use std::ops::Range;

use hecs::World;

use crate::color::Color;
use crate::context::SceneContext;
use crate::ecs::{MaterialId, MeshId, RenderMesh, TextureId};
use crate::error::{Error, Result};
use crate::geometry::MeshStore;
use crate::gpu::GpuContext;
use crate::material::Materials;
use crate::mesh::{Mesh, Transform};
use crate::mesh_pass::{Batch, InstanceRaw, MatcapPass};
use crate::texture::{Texture, TextureStore};

const CLEAR_COLOR: Color = Color::BLACK;

/// What happened to a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    Presented,
    /// The surface timed out; try again next frame.
    Skipped,
    /// The surface was lost or outdated and has been reconfigured.
    Reconfigured,
}

/// Entities sharing one mesh and material, as a range of the instance list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchKey {
    pub mesh: MeshId,
    pub material: MaterialId,
    pub instances: Range<u32>,
}

/// Packs every renderable entity into `out`, grouped so each batch is contiguous.
///
/// Entities whose material is missing are skipped.
pub fn collect_instances(world: &World, materials: &Materials, out: &mut Vec<InstanceRaw>) -> Vec<BatchKey> {
    let mut groups: BTreeMap<(MeshId, MaterialId), Vec<InstanceRaw>> = BTreeMap::new();
    for (_, (transform, render)) in world.query::<(&Transform, &RenderMesh)>().iter() {
        let Some(material) = materials.get(render.material) else {
            continue;
        };
        groups
            .entry((render.mesh, render.material))
            .or_default()
            .push(InstanceRaw::new(transform, material.color));
    }

    out.clear();
    groups
        .into_iter()
        .map(|((mesh, material), instances)| {
            let start = out.len() as u32;
            out.extend(instances);
            BatchKey {
                mesh,
                material,
                instances: start..out.len() as u32,
            }
        })
        .collect()
}

struct GpuTexture {
    revision: u64,
    bind_group: wgpu::BindGroup,
    _texture: Texture,
}

/// Owns GPU copies of scene resources and draws them.
pub struct Renderer {
    pass: MatcapPass,
    meshes: Vec<Option<Mesh>>,
    textures: Vec<Option<GpuTexture>>,
    placeholder: wgpu::BindGroup,
    _placeholder_texture: Texture,
    instances: Vec<InstanceRaw>,
}

impl Renderer {
    pub fn new(gpu: &GpuContext) -> Self {
        let pass = MatcapPass::new(gpu);
        let placeholder_texture = Texture::placeholder(gpu);
        let placeholder = pass.create_texture_bind_group(gpu, &placeholder_texture);
        Self {
            pass,
            meshes: Vec::new(),
            textures: Vec::new(),
            placeholder,
            _placeholder_texture: placeholder_texture,
            instances: Vec::new(),
        }
    }

    /// Uploads new geometry and changed textures.
    pub fn sync(&mut self, gpu: &GpuContext, meshes: &MeshStore, textures: &TextureStore) {
        for (id, geometry) in meshes.iter_from(self.meshes.len()) {
            log::debug!("uploading mesh {} ({} triangles)", id.0, geometry.triangle_count());
            self.meshes.push(Mesh::from_geometry(gpu, geometry));
        }

        self.textures.resize_with(textures.len(), || None);
        for (index, slot) in self.textures.iter_mut().enumerate() {
            let id = TextureId(index);
            let revision = textures.revision(id);
            if slot.as_ref().is_some_and(|t| t.revision == revision) {
                continue;
            }
            let Some(image) = textures.image(id) else {
                continue;
            };
            let label = textures.label(id).unwrap_or("Matcap Texture");
            let texture = Texture::from_image(gpu, image, label);
            let bind_group = self.pass.create_texture_bind_group(gpu, &texture);
            *slot = Some(GpuTexture {
                revision,
                bind_group,
                _texture: texture,
            });
        }
    }

    fn matcap_for(&self, materials: &Materials, material: MaterialId) -> &wgpu::BindGroup {
        materials
            .get(material)
            .and_then(|m| self.textures.get(m.matcap.0))
            .and_then(Option::as_ref)
            .map_or(&self.placeholder, |t| &t.bind_group)
    }

    /// Draws the scene, then lets `overlay` record into the same frame.
    ///
    /// `overlay` may return extra command buffers that must run before the
    /// frame's own (egui's buffer uploads, for example).
    pub fn render<F>(&mut self, gpu: &GpuContext, ctx: &SceneContext, overlay: F) -> Result<FrameStatus>
    where
        F: FnOnce(&GpuContext, &mut wgpu::CommandEncoder, &wgpu::TextureView) -> Vec<wgpu::CommandBuffer>,
    {
        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost, reconfiguring");
                gpu.reconfigure();
                return Ok(FrameStatus::Reconfigured);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("surface timeout, skipping frame");
                return Ok(FrameStatus::Skipped);
            }
            Err(err) => return Err(Error::Frame(err)),
        };

        self.sync(gpu, &ctx.meshes, &ctx.textures);
        self.pass.ensure_depth_size(gpu);
        let keys = collect_instances(ctx.scene.world(), &ctx.materials, &mut self.instances);
        self.pass.prepare(gpu, &ctx.rig.camera, &self.instances);

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let batches: Vec<Batch<'_>> = keys
                .iter()
                .filter_map(|key| {
                    let mesh = self.meshes.get(key.mesh.0)?.as_ref()?;
                    Some(Batch {
                        mesh,
                        matcap: self.matcap_for(&ctx.materials, key.material),
                        instances: key.instances.clone(),
                    })
                })
                .collect();

            let [r, g, b, a] = CLEAR_COLOR.to_array().map(f64::from);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Matcap Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.pass.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.pass.draw(&mut render_pass, &batches);
        }

        let uploads = overlay(gpu, &mut encoder, &view);
        gpu.queue
            .submit(uploads.into_iter().chain(iter::once(encoder.finish())));
        frame.present();
        Ok(FrameStatus::Presented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MatcapMaterial;
    use glam::Vec3;

    #[test]
    fn instances_group_by_mesh_and_material() {
        let mut world = World::new();
        let mut materials = Materials::new();
        let red = materials.add(MatcapMaterial::new(TextureId(0)).with_color(Color::rgb(1.0, 0.0, 0.0)));
        let white = materials.add(MatcapMaterial::new(TextureId(0)));

        let text = RenderMesh::new(MeshId(0), red);
        let tetra = RenderMesh::new(MeshId(1), white);
        world.spawn((Transform::new(), tetra));
        world.spawn((Transform::new(), text));
        world.spawn((Transform::new().position(Vec3::X), tetra));
        world.spawn((Transform::new(), RenderMesh::new(MeshId(1), MaterialId(9))));
        world.spawn((Transform::new(),));

        let mut instances = Vec::new();
        let keys = collect_instances(&world, &materials, &mut instances);

        assert_eq!(instances.len(), 3);
        assert_eq!(
            keys,
            vec![
                BatchKey {
                    mesh: MeshId(0),
                    material: red,
                    instances: 0..1,
                },
                BatchKey {
                    mesh: MeshId(1),
                    material: white,
                    instances: 1..3,
                },
            ]
        );
        assert_eq!(instances[0].color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn empty_world_clears_previous_instances() {
        let world = World::new();
        let materials = Materials::new();
        let mut instances = vec![InstanceRaw::new(&Transform::new(), Color::WHITE)];
        assert!(collect_instances(&world, &materials, &mut instances).is_empty());
        assert!(instances.is_empty());
    }
}
