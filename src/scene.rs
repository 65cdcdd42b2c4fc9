//! The scene collection and the builder that populates it.
//!
//! [`Scene`] wraps a [`hecs::World`] and additionally remembers the order in
//! which entities were added. That order matters: the first
//! [`RESERVED_CHILDREN`] entries are never animated, so the builder always adds
//! the label first and the ornaments after it.

use std::f32::consts::PI;

use glam::Vec3;
use hecs::{DynamicBundle, Entity, World};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::ecs::{Label, MaterialId, Ornament, RenderMesh, TextureId};
use crate::extrude::{ExtrudeParams, text_geometry};
use crate::font::Font;
use crate::geometry::{MeshStore, RawGeometry};
use crate::material::{ColorBinding, MatcapMaterial, Materials};
use crate::mesh::Transform;

/// Leading scene entries excluded from per-frame rotation.
pub const RESERVED_CHILDREN: usize = 2;

/// Ordered collection of visual entities.
#[derive(Default)]
pub struct Scene {
    world: World,
    children: Vec<Entity>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns an entity and appends it to the child list.
    pub fn add(&mut self, components: impl DynamicBundle) -> Entity {
        let entity = self.world.spawn(components);
        self.children.push(entity);
        entity
    }

    /// Entities in insertion order.
    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    /// Entities eligible for per-frame animation: everything after the reserved prefix.
    pub fn animated(&self) -> &[Entity] {
        self.children.get(RESERVED_CHILDREN..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.world.get::<&Transform>(entity).ok().map(|t| *t)
    }

    pub fn transform_mut(&mut self, entity: Entity) -> Option<&mut Transform> {
        self.world.query_one_mut::<&mut Transform>(entity).ok()
    }

    pub fn world(&self) -> &World {
        &self.world
    }
}

/// What the label says, how it is extruded and its initial color.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelParams {
    pub text: String,
    /// Initial sRGB color as `0xRRGGBB`.
    pub color: u32,
    pub geometry: ExtrudeParams,
}

impl Default for LabelParams {
    fn default() -> Self {
        Self {
            text: "MetallicA".to_owned(),
            color: 0xff0000,
            geometry: ExtrudeParams::default(),
        }
    }
}

/// Scatter parameters for the ornament field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterParams {
    pub count: usize,
    /// Tetrahedron circumradius.
    pub radius: f32,
    /// Edge length of the cube positions are drawn from, centered on the origin.
    pub spread: f32,
    /// Upper bound of the uniform scale factor.
    pub max_scale: f32,
    /// Fixed seed for reproducible placement. Drawn from the OS when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ScatterParams {
    fn default() -> Self {
        Self {
            count: 1000,
            radius: 0.25,
            spread: 10.0,
            max_scale: 0.1,
            seed: None,
        }
    }
}

/// Everything the builder created, for the caller to keep handles to.
#[derive(Debug)]
pub struct BuiltScene {
    pub label: Entity,
    pub ornaments: Vec<Entity>,
    pub label_material: MaterialId,
    pub ornament_material: MaterialId,
    pub color: ColorBinding,
}

/// Populates a [`Scene`] with the label and the ornament field.
pub struct SceneBuilder<'a> {
    pub scene: &'a mut Scene,
    pub meshes: &'a mut MeshStore,
    pub materials: &'a mut Materials,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(scene: &'a mut Scene, meshes: &'a mut MeshStore, materials: &'a mut Materials) -> Self {
        Self {
            scene,
            meshes,
            materials,
        }
    }

    /// Adds the extruded label, then `scatter.count` ornaments around it.
    ///
    /// The label gets a material of its own, bound to the returned
    /// [`ColorBinding`]; all ornaments share a second material and one
    /// tetrahedron mesh.
    pub fn build<R: Rng>(
        &mut self,
        font: &Font,
        matcap: TextureId,
        params: &LabelParams,
        scatter: &ScatterParams,
        rng: &mut R,
    ) -> BuiltScene {
        let text = params.text.as_str();
        let label_mesh = self
            .meshes
            .add(text_geometry(font, text, &params.geometry));
        let label_material = self.materials.add(MatcapMaterial::new(matcap));
        let color = ColorBinding::new(label_material, params.color, self.materials);
        let label = self.scene.add((
            Transform::new(),
            RenderMesh::new(label_mesh, label_material),
            Label,
        ));

        let tetra = self.meshes.add(RawGeometry::tetrahedron(scatter.radius));
        let ornament_material = self
            .materials
            .add(MatcapMaterial::new(matcap).with_color(Color::WHITE));

        let ornaments = (0..scatter.count)
            .map(|_| {
                let transform = scatter_transform(scatter, rng);
                self.scene.add((
                    transform,
                    RenderMesh::new(tetra, ornament_material),
                    Ornament,
                ))
            })
            .collect::<Vec<_>>();

        log::info!(
            "scene built: label {text:?} and {} ornaments ({} entities)",
            ornaments.len(),
            self.scene.len()
        );

        BuiltScene {
            label,
            ornaments,
            label_material,
            ornament_material,
            color,
        }
    }
}

/// Random placement: position in the spread cube, X/Y rotation in `[0, π)`,
/// Z rotation zero, uniform scale in `(0, max_scale]`.
fn scatter_transform<R: Rng>(scatter: &ScatterParams, rng: &mut R) -> Transform {
    let mut axis = || (rng.random::<f32>() - 0.5) * scatter.spread;
    let position = Vec3::new(axis(), axis(), axis());
    let rotation = Vec3::new(rng.random::<f32>() * PI, rng.random::<f32>() * PI, 0.0);
    let scale = (1.0 - rng.random::<f32>()) * scatter.max_scale;

    Transform::new()
        .position(position)
        .rotation(rotation)
        .uniform_scale(scale)
}
