//! CPU-side geometry and the store that hands out [`MeshId`]s.
//!
//! Geometry is built and massaged on the CPU as [`RawGeometry`] (flat-shaded
//! triangles, bounding box queries, recentering) and registered in a
//! [`MeshStore`]. The renderer uploads new entries lazily, which keeps scene
//! construction free of any GPU dependency.

use glam::{Vec2, Vec3};

use crate::ecs::MeshId;
use crate::mesh::Vertex3d;

/// Geometry data before GPU upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawGeometry {
    /// Vertex positions, normals, and UVs.
    pub vertices: Vec<Vertex3d>,
    /// Triangle indices.
    pub indices: Vec<u32>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Appends one triangle with its own three vertices and a flat face normal.
    ///
    /// Winding is counter-clockwise when seen from the side the normal points to.
    pub fn push_triangle(&mut self, corners: [Vec3; 3], uvs: [Vec2; 3]) {
        let normal = (corners[1] - corners[0])
            .cross(corners[2] - corners[0])
            .normalize_or_zero();
        let base = self.vertices.len() as u32;
        for (p, uv) in corners.iter().zip(uvs) {
            self.vertices
                .push(Vertex3d::new((*p).into(), normal.into(), uv.into()));
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    /// Computes the axis-aligned bounding box as `(min, max)`.
    ///
    /// Empty geometry yields `(Vec3::ZERO, Vec3::ZERO)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        if self.vertices.is_empty() {
            return (Vec3::ZERO, Vec3::ZERO);
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }

        (min, max)
    }

    /// Center of the bounding box.
    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        let (min, max) = self.bounds();
        max - min
    }

    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            v.position = (Vec3::from(v.position) + offset).into();
        }
    }

    /// Moves the geometry so its bounding box is centered on the origin.
    ///
    /// Rotation and scale then pivot around the visual middle of the shape.
    pub fn recenter(&mut self) {
        let center = self.center();
        self.translate(-center);
    }

    /// Regular tetrahedron inscribed in a sphere of `radius`, one flat normal per face.
    pub fn tetrahedron(radius: f32) -> Self {
        let corners = [
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
        ]
        .map(|c| c.normalize() * radius);

        #[rustfmt::skip]
        let faces: [[usize; 3]; 4] = [
            [2, 1, 0],
            [0, 3, 2],
            [1, 3, 0],
            [2, 3, 1],
        ];

        let uvs = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.5, 1.0)];
        let mut geometry = Self::default();
        for [a, b, c] in faces {
            geometry.push_triangle([corners[a], corners[b], corners[c]], uvs);
        }
        geometry
    }
}

/// Registry of CPU geometry addressed by [`MeshId`].
#[derive(Debug, Default)]
pub struct MeshStore {
    geometries: Vec<RawGeometry>,
}

impl MeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, geometry: RawGeometry) -> MeshId {
        self.geometries.push(geometry);
        MeshId(self.geometries.len() - 1)
    }

    pub fn get(&self, id: MeshId) -> Option<&RawGeometry> {
        self.geometries.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Iterates geometries starting at index `from`, paired with their handles.
    pub fn iter_from(&self, from: usize) -> impl Iterator<Item = (MeshId, &RawGeometry)> {
        self.geometries
            .iter()
            .enumerate()
            .skip(from)
            .map(|(i, g)| (MeshId(i), g))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tetrahedron_faces_point_outward() {
        let tetra = RawGeometry::tetrahedron(0.25);
        assert_eq!(tetra.triangle_count(), 4);
        for tri in tetra.vertices.chunks(3) {
            let centroid = tri
                .iter()
                .map(|v| Vec3::from(v.position))
                .fold(Vec3::ZERO, |a, b| a + b)
                / 3.0;
            assert!(Vec3::from(tri[0].normal).dot(centroid) > 0.0);
        }
    }

    #[test]
    fn tetrahedron_vertices_sit_on_radius() {
        let tetra = RawGeometry::tetrahedron(0.25);
        for v in &tetra.vertices {
            assert!((Vec3::from(v.position).length() - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn recenter_moves_bounding_box_to_origin() {
        let mut g = RawGeometry::default();
        g.push_triangle(
            [
                Vec3::new(2.0, 1.0, 0.0),
                Vec3::new(4.0, 1.0, 0.0),
                Vec3::new(4.0, 5.0, 1.0),
            ],
            [Vec2::ZERO; 3],
        );
        g.recenter();
        let (min, max) = g.bounds();
        assert!((min + max).length() < 1e-6);
        assert_eq!(g.size(), Vec3::new(2.0, 4.0, 1.0));
    }

    #[test]
    fn store_hands_out_sequential_ids() {
        let mut store = MeshStore::new();
        let a = store.add(RawGeometry::tetrahedron(1.0));
        let b = store.add(RawGeometry::default());
        assert_eq!(a, MeshId(0));
        assert_eq!(b, MeshId(1));
        assert_eq!(store.iter_from(1).count(), 1);
    }
}
