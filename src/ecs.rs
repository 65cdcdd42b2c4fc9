//! Components and typed handles for scene entities.
//!
//! Every visible entity in a [`Scene`](crate::Scene) carries a
//! [`Transform`](crate::Transform) and a [`RenderMesh`]. The marker components
//! [`Label`] and [`Ornament`] record which variant an entity is, so queries can
//! tell the extruded text apart from the scattered tetrahedra.
//!
//! # Example
//!
//! ```ignore
//! use matcap_text::*;
//!
//! let entity = scene.add((
//!     Transform::new().position(Vec3::new(0.0, 1.0, 0.0)),
//!     RenderMesh::new(tetra, ornament_material),
//!     Ornament,
//! ));
//! ```

/// Type-safe handle to CPU geometry held by a [`MeshStore`](crate::MeshStore).
///
/// The renderer uploads each geometry once and keeps its GPU buffers at the
/// same index, so the handle stays valid on both sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub(crate) usize);

/// Type-safe handle to a texture slot in a [`TextureStore`](crate::TextureStore).
///
/// A handle exists before its pixels do: the slot is reserved when a load
/// starts and filled when the image arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) usize);

/// Type-safe handle to a [`MatcapMaterial`](crate::MatcapMaterial).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub(crate) usize);

/// Component for rendering a mesh on an entity.
///
/// Many entities may point at the same mesh and material; the renderer
/// batches them into one instanced draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderMesh {
    /// Handle to the mesh geometry.
    pub mesh: MeshId,
    /// Material used to shade it.
    pub material: MaterialId,
}

impl RenderMesh {
    pub fn new(mesh: MeshId, material: MaterialId) -> Self {
        Self { mesh, material }
    }
}

/// Marks the extruded text entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Label;

/// Marks one of the scattered decorative entities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ornament;
