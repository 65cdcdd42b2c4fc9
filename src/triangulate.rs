//! Cap tessellation for outlines with holes, on top of lyon's fill tessellator.

use std::iter;

use glam::Vec2;
use lyon::math::point;
use lyon::path::{FillRule, Path};
use lyon::tessellation::{BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers};

use crate::error::{Error, Result};

/// Builds a path holding every contour as a closed polygon. Contours with
/// fewer than three points are skipped.
pub(crate) fn polygon_path<'a>(contours: impl IntoIterator<Item = &'a [Vec2]>) -> Path {
    let mut builder = Path::builder();
    for contour in contours.into_iter().filter(|c| c.len() >= 3) {
        builder.begin(point(contour[0].x, contour[0].y));
        for p in &contour[1..] {
            builder.line_to(point(p.x, p.y));
        }
        builder.close();
    }
    builder.build()
}

/// Fills `outer` with `holes` punched out of it.
///
/// Holes are cut with the even-odd rule, so neither outline needs a
/// particular orientation. Triangles come back counter-clockwise; degenerate
/// ones are dropped.
pub fn triangulate(outer: &[Vec2], holes: &[Vec<Vec2>]) -> Result<Vec<[Vec2; 3]>> {
    if outer.len() < 3 {
        return Ok(Vec::new());
    }

    let path = polygon_path(iter::once(outer).chain(holes.iter().map(Vec::as_slice)));
    let options = FillOptions::default().with_fill_rule(FillRule::EvenOdd);
    let mut buffers: VertexBuffers<Vec2, u32> = VertexBuffers::new();
    FillTessellator::new()
        .tessellate_path(
            &path,
            &options,
            &mut BuffersBuilder::new(&mut buffers, |vertex: FillVertex| {
                let p = vertex.position();
                Vec2::new(p.x, p.y)
            }),
        )
        .map_err(Error::Tessellation)?;

    let triangles = buffers
        .indices
        .chunks_exact(3)
        .filter_map(|tri| {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| buffers.vertices[i as usize]);
            let area = (b - a).perp_dot(c - a);
            if area > 0.0 {
                Some([a, b, c])
            } else if area < 0.0 {
                Some([a, c, b])
            } else {
                None
            }
        })
        .collect();
    Ok(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area_of(triangles: &[[Vec2; 3]]) -> f32 {
        triangles
            .iter()
            .map(|[a, b, c]| (*b - *a).perp_dot(*c - *a) * 0.5)
            .sum()
    }

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<Vec2> {
        vec![
            Vec2::new(x0, y0),
            Vec2::new(x1, y0),
            Vec2::new(x1, y1),
            Vec2::new(x0, y1),
        ]
    }

    fn inside(rect: &[Vec2], p: Vec2) -> bool {
        p.x > rect[0].x && p.x < rect[2].x && p.y > rect[0].y && p.y < rect[2].y
    }

    fn assert_holes_uncovered(triangles: &[[Vec2; 3]], holes: &[Vec<Vec2>]) {
        for tri in triangles {
            let centroid = (tri[0] + tri[1] + tri[2]) / 3.0;
            assert!(
                !holes.iter().any(|h| inside(h, centroid)),
                "triangle {tri:?} covers a hole"
            );
        }
    }

    #[test]
    fn square_becomes_two_triangles() {
        let tris = triangulate(&rect(0.0, 0.0, 1.0, 1.0), &[]).unwrap();
        assert_eq!(tris.len(), 2);
        assert!((area_of(&tris) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn clockwise_input_still_yields_counter_clockwise_triangles() {
        let mut outer = rect(0.0, 0.0, 2.0, 2.0);
        outer.reverse();
        let tris = triangulate(&outer, &[]).unwrap();
        assert!(!tris.is_empty());
        assert!(tris.iter().all(|[a, b, c]| (*b - *a).perp_dot(*c - *a) > 0.0));
    }

    #[test]
    fn concave_polygon_covers_its_area() {
        let outer = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        let tris = triangulate(&outer, &[]).unwrap();
        assert!((area_of(&tris) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn hole_is_left_uncovered() {
        let holes = vec![rect(1.0, 1.0, 2.0, 2.0)];
        let tris = triangulate(&rect(0.0, 0.0, 3.0, 3.0), &holes).unwrap();
        assert!((area_of(&tris) - 8.0).abs() < 1e-5);
        assert_holes_uncovered(&tris, &holes);
    }

    #[test]
    fn side_by_side_holes_are_both_cut() {
        let holes = vec![rect(0.5, 0.5, 1.5, 1.5), rect(3.5, 0.5, 4.5, 1.5)];
        let tris = triangulate(&rect(0.0, 0.0, 5.0, 2.0), &holes).unwrap();
        assert!((area_of(&tris) - 8.0).abs() < 1e-5);
        assert_holes_uncovered(&tris, &holes);
    }

    #[test]
    fn stacked_holes_sharing_right_edge_are_both_cut() {
        let holes = vec![rect(1.0, 1.0, 2.0, 2.0), rect(1.0, 3.0, 2.0, 4.0)];
        let tris = triangulate(&rect(0.0, 0.0, 3.0, 5.0), &holes).unwrap();
        assert!((area_of(&tris) - 13.0).abs() < 1e-5);
        assert_holes_uncovered(&tris, &holes);
    }

    #[test]
    fn three_stacked_holes_are_all_cut() {
        let holes = vec![
            rect(1.0, 1.0, 2.0, 2.0),
            rect(1.0, 3.0, 2.0, 4.0),
            rect(1.0, 5.0, 2.0, 6.0),
        ];
        let tris = triangulate(&rect(0.0, 0.0, 3.0, 7.0), &holes).unwrap();
        assert!((area_of(&tris) - 18.0).abs() < 1e-5);
        assert_holes_uncovered(&tris, &holes);
    }

    #[test]
    fn hole_orientation_does_not_matter() {
        let mut hole = rect(1.0, 1.0, 2.0, 2.0);
        hole.reverse();
        let tris = triangulate(&rect(0.0, 0.0, 3.0, 3.0), &[hole]).unwrap();
        assert!((area_of(&tris) - 8.0).abs() < 1e-5);
    }

    #[test]
    fn degenerate_outline_yields_nothing() {
        let tris = triangulate(&[Vec2::ZERO, Vec2::X], &[]).unwrap();
        assert!(tris.is_empty());
    }
}
