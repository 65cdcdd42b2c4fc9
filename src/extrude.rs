//! Extruded, beveled solids from 2D shapes, and the text geometry built on them.
//!
//! Each [`Shape`] is swept along +Z through a stack of rings. With bevels on,
//! the stack is:
//!
//! ```text
//!  z = -thickness ......... front cap (offset = bevel_offset)
//!  bevel rings  (cos/sin quarter circle, offset grows to bevel_size)
//!  z = 0 ................. full offset
//!  z = depth ............. full offset
//!  bevel rings  (mirrored)
//!  z = depth + thickness . back cap
//! ```
//!
//! Caps are filled from the first and last rings with lyon. All faces are
//! flat shaded and wound so that normals point out of the solid.

use std::f32::consts::{FRAC_PI_2, SQRT_2};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::font::{Font, Shape, signed_area};
use crate::geometry::RawGeometry;
use crate::triangulate::triangulate;

/// Extrusion and bevel parameters for text.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrudeParams {
    /// Glyph height in world units per em.
    pub size: f32,
    /// Extrusion depth along +Z, not counting bevels.
    pub depth: f32,
    /// Line segments per flattened curve.
    pub curve_segments: u32,
    pub bevel_enabled: bool,
    /// How far the bevel extends along Z on each side.
    pub bevel_thickness: f32,
    /// How far the bevel grows the outline.
    pub bevel_size: f32,
    /// Outline offset where the bevel starts.
    pub bevel_offset: f32,
    pub bevel_segments: u32,
}

impl Default for ExtrudeParams {
    fn default() -> Self {
        Self {
            size: 1.0,
            depth: 0.2,
            curve_segments: 12,
            bevel_enabled: true,
            bevel_thickness: 0.03,
            bevel_size: 0.02,
            bevel_offset: 0.0,
            bevel_segments: 3,
        }
    }
}

impl ExtrudeParams {
    /// `(z, outline offset)` for every ring, front to back.
    fn layers(&self) -> Vec<(f32, f32)> {
        if !self.bevel_enabled || self.bevel_segments == 0 {
            return vec![(0.0, 0.0), (self.depth, 0.0)];
        }

        let segments = self.bevel_segments;
        let ring = |b: u32| {
            let t = b as f32 / segments as f32;
            (
                self.bevel_thickness * (t * FRAC_PI_2).cos(),
                self.bevel_size * (t * FRAC_PI_2).sin() + self.bevel_offset,
            )
        };
        let full = self.bevel_size + self.bevel_offset;

        let mut layers = Vec::with_capacity(2 * segments as usize + 2);
        layers.extend((0..segments).map(ring).map(|(z, off)| (-z, off)));
        layers.push((0.0, full));
        layers.push((self.depth, full));
        layers.extend(
            (0..segments)
                .rev()
                .map(ring)
                .map(|(z, off)| (self.depth + z, off)),
        );
        layers
    }
}

/// Builds centered text geometry: lays out `text`, extrudes it, and moves its
/// bounding box center to the origin.
pub fn text_geometry(font: &Font, text: &str, params: &ExtrudeParams) -> RawGeometry {
    let shapes = font.shapes(text, params.size, params.curve_segments);
    let mut geometry = extrude(&shapes, params);
    geometry.recenter();
    log::debug!(
        "text {text:?}: {} shapes, {} triangles",
        shapes.len(),
        geometry.triangle_count()
    );
    geometry
}

/// Extrudes every shape and merges the results.
pub fn extrude(shapes: &[Shape], params: &ExtrudeParams) -> RawGeometry {
    let layers = params.layers();
    let mut geometry = RawGeometry::default();
    for shape in shapes {
        extrude_shape(&mut geometry, shape, &layers);
    }
    geometry
}

fn extrude_shape(geometry: &mut RawGeometry, shape: &Shape, layers: &[(f32, f32)]) {
    if shape.outer.len() < 3 || layers.len() < 2 {
        return;
    }

    let mut contours: Vec<Vec<Vec2>> = Vec::with_capacity(1 + shape.holes.len());
    contours.push(with_winding(&shape.outer, true));
    contours.extend(
        shape
            .holes
            .iter()
            .filter(|h| h.len() >= 3)
            .map(|h| with_winding(h, false)),
    );

    let outline: Vec<Vec2> = contours.iter().flatten().copied().collect();
    let moves: Vec<Vec2> = contours.iter().flat_map(|c| bevel_vectors(c)).collect();
    let ring = |(z, offset): (f32, f32)| -> Vec<Vec3> {
        outline
            .iter()
            .zip(&moves)
            .map(|(p, m)| (*p + *m * offset).extend(z))
            .collect()
    };

    let cap = |layer: (f32, f32)| -> Vec<[Vec3; 3]> {
        let points = ring(layer);
        let mut outlines: Vec<Vec<Vec2>> = Vec::with_capacity(contours.len());
        let mut start = 0;
        for contour in &contours {
            let end = start + contour.len();
            outlines.push(points[start..end].iter().map(|p| p.truncate()).collect());
            start = end;
        }
        match triangulate(&outlines[0], &outlines[1..]) {
            Ok(triangles) => triangles
                .into_iter()
                .map(|tri| tri.map(|p| p.extend(layer.0)))
                .collect(),
            Err(err) => {
                log::warn!("leaving a cap open: {err}");
                Vec::new()
            }
        }
    };
    let cap_uv = |p: Vec3| Vec2::new(p.x, p.y);

    for [a, b, c] in cap(layers[0]) {
        geometry.push_triangle([a, c, b], [a, c, b].map(cap_uv));
    }
    for corners in cap(layers[layers.len() - 1]) {
        geometry.push_triangle(corners, corners.map(cap_uv));
    }

    let rings: Vec<Vec<Vec3>> = layers.iter().copied().map(ring).collect();
    let mut start = 0;
    for contour in &contours {
        let len = contour.len();
        for pair in rings.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            for i in 0..len {
                let j = (i + 1) % len;
                let a = lower[start + i];
                let b = lower[start + j];
                let c = upper[start + j];
                let d = upper[start + i];
                let [ua, ub, uc, ud] = side_uvs(a, b, c, d);
                geometry.push_triangle([a, b, c], [ua, ub, uc]);
                geometry.push_triangle([a, c, d], [ua, uc, ud]);
            }
        }
        start += len;
    }
}

fn with_winding(points: &[Vec2], counter_clockwise: bool) -> Vec<Vec2> {
    let mut points = points.to_vec();
    if (signed_area(&points) > 0.0) != counter_clockwise {
        points.reverse();
    }
    points
}

/// Per-vertex direction that moves the outline one unit away from the solid.
///
/// Outer contours run counter-clockwise and holes clockwise, so the right-hand
/// normal of every edge faces out of the solid. Miters are capped at √2.
fn bevel_vectors(contour: &[Vec2]) -> Vec<Vec2> {
    let n = contour.len();
    (0..n)
        .map(|i| {
            let prev = contour[(i + n - 1) % n];
            let cur = contour[i];
            let next = contour[(i + 1) % n];

            let right = |d: Vec2| {
                let d = d.normalize_or_zero();
                Vec2::new(d.y, -d.x)
            };
            let n1 = right(cur - prev);
            let n2 = right(next - cur);
            let sum = n1 + n2;
            if sum.length_squared() < 1e-12 {
                return n1;
            }
            let dir = sum.normalize();
            let len = (1.0 / dir.dot(n1).max(1e-6)).min(SQRT_2);
            dir * len
        })
        .collect()
}

fn side_uvs(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> [Vec2; 4] {
    if (a.y - b.y).abs() < (a.x - b.x).abs() {
        [a, b, c, d].map(|p| Vec2::new(p.x, 1.0 - p.z))
    } else {
        [a, b, c, d].map(|p| Vec2::new(p.y, 1.0 - p.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::tests::test_font;

    fn unit_square() -> Shape {
        Shape {
            outer: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
            holes: Vec::new(),
        }
    }

    fn flat() -> ExtrudeParams {
        ExtrudeParams {
            bevel_enabled: false,
            ..ExtrudeParams::default()
        }
    }

    fn assert_normals_point_away_from(geometry: &RawGeometry, center: Vec3) {
        for tri in geometry.vertices.chunks(3) {
            let centroid = tri
                .iter()
                .map(|v| Vec3::from(v.position))
                .fold(Vec3::ZERO, |a, b| a + b)
                / 3.0;
            let normal = Vec3::from(tri[0].normal);
            if normal == Vec3::ZERO {
                continue;
            }
            assert!(
                normal.dot(centroid - center) > 0.0,
                "normal {normal} at {centroid} faces inward"
            );
        }
    }

    #[test]
    fn default_layers_follow_quarter_circle_bevel() {
        let layers = ExtrudeParams::default().layers();
        assert_eq!(layers.len(), 8);
        assert_eq!(layers[0], (-0.03, 0.0));
        assert_eq!(layers[3], (0.0, 0.02));
        assert_eq!(layers[4], (0.2, 0.02));
        assert!((layers[7].0 - 0.23).abs() < 1e-6);
        assert!(layers.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn flat_extrusion_of_square_is_a_closed_box() {
        let geometry = extrude(&[unit_square()], &flat());
        assert_eq!(geometry.triangle_count(), 12);
        let (min, max) = geometry.bounds();
        assert_eq!(min, Vec3::ZERO);
        assert!((max - Vec3::new(1.0, 1.0, 0.2)).length() < 1e-6);
        assert_normals_point_away_from(&geometry, Vec3::new(0.5, 0.5, 0.1));
    }

    #[test]
    fn bevel_grows_outline_and_depth() {
        let geometry = extrude(&[unit_square()], &ExtrudeParams::default());
        assert_eq!(geometry.triangle_count(), 4 + 7 * 4 * 2);
        let (min, max) = geometry.bounds();
        assert!((min - Vec3::new(-0.02, -0.02, -0.03)).length() < 1e-5);
        assert!((max - Vec3::new(1.02, 1.02, 0.23)).length() < 1e-5);
        assert_normals_point_away_from(&geometry, Vec3::new(0.5, 0.5, 0.1));
    }

    #[test]
    fn hole_walls_face_into_the_hole() {
        let shapes = test_font().shapes("O", 1.0, 12);
        let geometry = extrude(&shapes, &flat());
        // The wall at x = 0.2 borders the hole on its left, so it faces +X.
        let inner_wall = geometry.vertices.chunks(3).find(|tri| {
            tri.iter().all(|v| (v.position[0] - 0.2).abs() < 1e-6)
        });
        let tri = inner_wall.expect("inner wall triangle");
        assert!(tri[0].normal[0] > 0.99);
    }

    fn cap_area(geometry: &RawGeometry, facing: f32) -> f32 {
        geometry
            .vertices
            .chunks(3)
            .filter(|tri| tri[0].normal[2] * facing > 0.99)
            .map(|tri| {
                let [a, b, c] = [0, 1, 2].map(|i| Vec3::from(tri[i].position));
                (b - a).cross(c - a).length() * 0.5
            })
            .sum()
    }

    #[test]
    fn caps_leave_both_stacked_holes_open() {
        let shapes = test_font().shapes("B", 1.0, 12);
        let geometry = extrude(&shapes, &flat());
        let expected = 0.6 * 0.7 - 2.0 * 0.2 * 0.2;
        assert!((cap_area(&geometry, -1.0) - expected).abs() < 1e-5);
        assert!((cap_area(&geometry, 1.0) - expected).abs() < 1e-5);
        assert_normals_point_away_from_caps(&geometry);
    }

    fn assert_normals_point_away_from_caps(geometry: &RawGeometry) {
        for tri in geometry.vertices.chunks(3) {
            let z = tri[0].position[2];
            if tri.iter().all(|v| v.position[2] == z) {
                let expected = if z <= 0.0 { -1.0 } else { 1.0 };
                assert!(tri[0].normal[2] * expected > 0.99);
            }
        }
    }

    #[test]
    fn text_geometry_with_multi_hole_glyph_keeps_holes() {
        let geometry = text_geometry(&test_font(), "B", &ExtrudeParams::default());
        let front = cap_area(&geometry, -1.0);
        assert!(front > 0.0 && front < 0.6 * 0.7 - 0.07);
    }

    #[test]
    fn text_geometry_is_centered() {
        let geometry = text_geometry(&test_font(), "IO", &ExtrudeParams::default());
        assert!(geometry.triangle_count() > 0);
        assert!(geometry.center().length() < 1e-5);
    }
}
