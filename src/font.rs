//! Typeface fonts: glyph outlines stored as JSON command strings.
//!
//! The format is the one produced by the `facetype.js` converter: a JSON object
//! with a `glyphs` map from single-character strings to an advance width
//! (`ha`) and an outline string (`o`). Outline commands use font units:
//!
//! | Command | Arguments               | Meaning                                   |
//! |---------|-------------------------|-------------------------------------------|
//! | `m`     | `x y`                   | start a new contour                       |
//! | `l`     | `x y`                   | straight segment                          |
//! | `q`     | `x y cx cy`             | quadratic curve, end point first          |
//! | `b`     | `x y c1x c1y c2x c2y`   | cubic curve, end point first              |
//! | `z`     |                         | close the current contour                 |
//!
//! [`Font::shapes`] lays out a string, flattens every curve into line
//! segments, and groups contours into [`Shape`]s (an outer boundary plus the
//! holes punched into it) ready for extrusion.

use std::collections::HashMap;
use std::path::Path;
use std::str::SplitWhitespace;

use glam::Vec2;
use lyon::algorithms::hit_test::hit_test_path;
use lyon::geom::{CubicBezierSegment, QuadraticBezierSegment};
use lyon::math::{Point, point};
use lyon::path::{FillRule, PathEvent};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::triangulate::polygon_path;

const HIT_TOLERANCE: f32 = 1e-4;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypefaceJson {
    glyphs: HashMap<String, GlyphJson>,
    #[serde(default)]
    family_name: String,
    resolution: f32,
    bounding_box: BoundingBox,
    #[serde(default)]
    underline_thickness: f32,
}

#[derive(Debug, Deserialize)]
struct GlyphJson {
    ha: f32,
    #[serde(default)]
    o: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoundingBox {
    y_min: f32,
    y_max: f32,
}

/// One parsed outline command, in font units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo { ctrl: Vec2, to: Vec2 },
    CubicTo { ctrl1: Vec2, ctrl2: Vec2, to: Vec2 },
    Close,
}

#[derive(Clone, Debug)]
pub struct Glyph {
    /// Horizontal advance in font units.
    pub advance: f32,
    pub commands: Vec<PathCommand>,
}

/// A filled region: one outer boundary (counter-clockwise) and its holes (clockwise).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Shape {
    pub outer: Vec<Vec2>,
    pub holes: Vec<Vec<Vec2>>,
}

/// A parsed typeface.
#[derive(Clone, Debug)]
pub struct Font {
    family: String,
    resolution: f32,
    line_height: f32,
    glyphs: HashMap<char, Glyph>,
}

impl Font {
    /// Parses typeface JSON.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let raw: TypefaceJson = serde_json::from_slice(bytes)?;

        let mut glyphs = HashMap::with_capacity(raw.glyphs.len());
        for (key, glyph) in raw.glyphs {
            let mut chars = key.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                log::debug!("skipping multi-character glyph key {key:?}");
                continue;
            };
            let commands = match &glyph.o {
                Some(outline) => parse_outline(ch, outline)?,
                None => Vec::new(),
            };
            glyphs.insert(
                ch,
                Glyph {
                    advance: glyph.ha,
                    commands,
                },
            );
        }

        let resolution = if raw.resolution > 0.0 {
            raw.resolution
        } else {
            1000.0
        };

        Ok(Self {
            family: raw.family_name,
            resolution,
            line_height: raw.bounding_box.y_max - raw.bounding_box.y_min
                + raw.underline_thickness,
            glyphs,
        })
    }

    /// Reads and parses a typeface JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&bytes)
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    /// Lays out `text` at `size` world units per em and returns flattened shapes.
    ///
    /// Characters missing from the font are drawn as `?` when the font has one.
    pub fn shapes(&self, text: &str, size: f32, curve_segments: u32) -> Vec<Shape> {
        let scale = size / self.resolution;
        let line_height = self.line_height * scale;
        let segments = curve_segments.max(1);

        let mut shapes = Vec::new();
        let mut offset = Vec2::ZERO;

        for ch in text.chars() {
            if ch == '\n' {
                offset.x = 0.0;
                offset.y -= line_height;
                continue;
            }

            let glyph = match self.glyphs.get(&ch) {
                Some(glyph) => glyph,
                None => {
                    log::warn!(
                        "character {ch:?} missing from font {:?}, using '?'",
                        self.family
                    );
                    match self.glyphs.get(&'?') {
                        Some(glyph) => glyph,
                        None => continue,
                    }
                }
            };

            let contours = flatten(&glyph.commands, scale, offset, segments);
            shapes.extend(group_contours(contours));
            offset.x += glyph.advance * scale;
        }

        shapes
    }
}

fn parse_outline(glyph: char, outline: &str) -> Result<Vec<PathCommand>> {
    let mut tokens = outline.split_whitespace();
    let mut commands = Vec::new();

    while let Some(op) = tokens.next() {
        let command = match op {
            "m" => PathCommand::MoveTo(next_point(glyph, &mut tokens)?),
            "l" => PathCommand::LineTo(next_point(glyph, &mut tokens)?),
            "q" => {
                let to = next_point(glyph, &mut tokens)?;
                let ctrl = next_point(glyph, &mut tokens)?;
                PathCommand::QuadTo { ctrl, to }
            }
            "b" => {
                let to = next_point(glyph, &mut tokens)?;
                let ctrl1 = next_point(glyph, &mut tokens)?;
                let ctrl2 = next_point(glyph, &mut tokens)?;
                PathCommand::CubicTo { ctrl1, ctrl2, to }
            }
            "z" => PathCommand::Close,
            other => {
                return Err(Error::Outline {
                    glyph,
                    reason: format!("unknown command {other:?}"),
                });
            }
        };
        commands.push(command);
    }

    Ok(commands)
}

fn next_point(glyph: char, tokens: &mut SplitWhitespace<'_>) -> Result<Vec2> {
    let mut coord = || -> Result<f32> {
        let token = tokens.next().ok_or_else(|| Error::Outline {
            glyph,
            reason: "outline ends in the middle of a command".into(),
        })?;
        token.parse::<f32>().map_err(|_| Error::Outline {
            glyph,
            reason: format!("expected a number, found {token:?}"),
        })
    };
    let x = coord()?;
    let y = coord()?;
    Ok(Vec2::new(x, y))
}

/// Builds the glyph outline as a lyon path in world units. Every contour is
/// closed, whether or not the outline ends it with `z`.
fn outline_path(commands: &[PathCommand], scale: f32, offset: Vec2) -> lyon::path::Path {
    let place = |p: Vec2| {
        let p = p * scale + offset;
        point(p.x, p.y)
    };
    let mut builder = lyon::path::Path::builder();
    let mut open = false;

    for command in commands {
        match *command {
            PathCommand::MoveTo(p) => {
                if open {
                    builder.close();
                }
                builder.begin(place(p));
                open = true;
            }
            PathCommand::LineTo(p) if open => {
                builder.line_to(place(p));
            }
            PathCommand::QuadTo { ctrl, to } if open => {
                builder.quadratic_bezier_to(place(ctrl), place(to));
            }
            PathCommand::CubicTo { ctrl1, ctrl2, to } if open => {
                builder.cubic_bezier_to(place(ctrl1), place(ctrl2), place(to));
            }
            PathCommand::Close if open => {
                builder.close();
                open = false;
            }
            // Drawing before the first move has no start point.
            _ => {}
        }
    }
    if open {
        builder.close();
    }
    builder.build()
}

/// Converts commands into closed polylines in world units, splitting every
/// curve into `segments` equal parameter steps.
fn flatten(commands: &[PathCommand], scale: f32, offset: Vec2, segments: u32) -> Vec<Vec<Vec2>> {
    let steps = move || (1..=segments).map(move |i| i as f32 / segments as f32);
    let vec2 = |p: Point| Vec2::new(p.x, p.y);
    let mut contours = Vec::new();
    let mut current: Vec<Vec2> = Vec::new();

    for event in outline_path(commands, scale, offset).iter() {
        match event {
            PathEvent::Begin { at } => current.push(vec2(at)),
            PathEvent::Line { to, .. } => current.push(vec2(to)),
            PathEvent::Quadratic { from, ctrl, to } => {
                let curve = QuadraticBezierSegment { from, ctrl, to };
                current.extend(steps().map(|t| vec2(curve.sample(t))));
            }
            PathEvent::Cubic {
                from,
                ctrl1,
                ctrl2,
                to,
            } => {
                let curve = CubicBezierSegment {
                    from,
                    ctrl1,
                    ctrl2,
                    to,
                };
                current.extend(steps().map(|t| vec2(curve.sample(t))));
            }
            PathEvent::End { .. } => finish_contour(&mut current, &mut contours),
        }
    }

    contours
}

fn finish_contour(current: &mut Vec<Vec2>, contours: &mut Vec<Vec<Vec2>>) {
    let mut points = std::mem::take(current);
    points.dedup_by(|a, b| a.distance_squared(*b) < 1e-12);
    while points.len() > 1 && points[0].distance_squared(points[points.len() - 1]) < 1e-12 {
        points.pop();
    }
    if points.len() >= 3 && signed_area(&points).abs() > 1e-12 {
        contours.push(points);
    }
}

/// Shoelace area; positive for counter-clockwise polygons.
pub fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

fn contains(polygon: &[Vec2], p: Vec2) -> bool {
    let path = polygon_path([polygon]);
    hit_test_path(&point(p.x, p.y), path.iter(), FillRule::EvenOdd, HIT_TOLERANCE)
}

/// Groups one glyph's contours into shapes by containment depth.
///
/// A contour nested inside an even number of others is an outer boundary; an
/// odd count makes it a hole of the smallest outer boundary around it.
/// Orientation of the input is ignored and normalized on output.
fn group_contours(contours: Vec<Vec<Vec2>>) -> Vec<Shape> {
    let areas: Vec<f32> = contours.iter().map(|c| signed_area(c).abs()).collect();
    let parents: Vec<Vec<usize>> = contours
        .iter()
        .enumerate()
        .map(|(i, c)| {
            (0..contours.len())
                .filter(|&j| j != i && areas[j] > areas[i] && contains(&contours[j], c[0]))
                .collect()
        })
        .collect();

    let mut shapes = Vec::new();
    let mut shape_of = HashMap::new();

    for (i, contour) in contours.iter().enumerate() {
        if parents[i].len() % 2 == 0 {
            shape_of.insert(i, shapes.len());
            shapes.push(Shape {
                outer: oriented(contour.clone(), true),
                holes: Vec::new(),
            });
        }
    }

    for (i, contour) in contours.iter().enumerate() {
        if parents[i].len() % 2 == 1 {
            let owner = parents[i]
                .iter()
                .filter(|&&p| parents[p].len() % 2 == 0)
                .min_by(|&&a, &&b| areas[a].total_cmp(&areas[b]))
                .and_then(|p| shape_of.get(p));
            if let Some(&shape) = owner {
                shapes[shape].holes.push(oriented(contour.clone(), false));
            }
        }
    }

    shapes
}

fn oriented(mut points: Vec<Vec2>, counter_clockwise: bool) -> Vec<Vec2> {
    if (signed_area(&points) > 0.0) != counter_clockwise {
        points.reverse();
    }
    points
}
