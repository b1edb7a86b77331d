//! Brick footprint geometry
//!
//! Every brick shape is a fixed convex polygon template in local
//! coordinates, centered on the brick position. Only convexity is relied
//! on; vertex winding is not.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Brick footprint shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BrickShape {
    #[default]
    Rect,
    Hex,
}

const RECT_TEMPLATE: [Vec2; 4] = [
    Vec2::new(-RECT_BRICK_WIDTH / 2.0, -RECT_BRICK_HEIGHT / 2.0),
    Vec2::new(RECT_BRICK_WIDTH / 2.0, -RECT_BRICK_HEIGHT / 2.0),
    Vec2::new(RECT_BRICK_WIDTH / 2.0, RECT_BRICK_HEIGHT / 2.0),
    Vec2::new(-RECT_BRICK_WIDTH / 2.0, RECT_BRICK_HEIGHT / 2.0),
];

// Flat-topped regular hexagon: sin(60°) * R for the half height
const HEX_HALF_HEIGHT: f32 = HEX_BRICK_RADIUS * 0.866_025_4;
const HEX_TEMPLATE: [Vec2; 6] = [
    Vec2::new(HEX_BRICK_RADIUS, 0.0),
    Vec2::new(HEX_BRICK_RADIUS / 2.0, HEX_HALF_HEIGHT),
    Vec2::new(-HEX_BRICK_RADIUS / 2.0, HEX_HALF_HEIGHT),
    Vec2::new(-HEX_BRICK_RADIUS, 0.0),
    Vec2::new(-HEX_BRICK_RADIUS / 2.0, -HEX_HALF_HEIGHT),
    Vec2::new(HEX_BRICK_RADIUS / 2.0, -HEX_HALF_HEIGHT),
];

impl BrickShape {
    /// Integer tag used by the save format
    pub fn tag(self) -> i32 {
        match self {
            BrickShape::Rect => 0,
            BrickShape::Hex => 1,
        }
    }

    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(BrickShape::Rect),
            1 => Some(BrickShape::Hex),
            _ => None,
        }
    }

    /// Polygon template in local coordinates
    pub fn template(self) -> &'static [Vec2] {
        match self {
            BrickShape::Rect => &RECT_TEMPLATE,
            BrickShape::Hex => &HEX_TEMPLATE,
        }
    }

    /// Half extents of the template's bounding box
    pub fn half_extents(self) -> Vec2 {
        match self {
            BrickShape::Rect => Vec2::new(RECT_BRICK_WIDTH / 2.0, RECT_BRICK_HEIGHT / 2.0),
            BrickShape::Hex => Vec2::new(HEX_BRICK_RADIUS, HEX_HALF_HEIGHT),
        }
    }

    /// Polygon vertices placed at `center`
    pub fn vertices_at(self, center: Vec2) -> Vec<Vec2> {
        self.template().iter().map(|&v| v + center).collect()
    }

    /// Axis-aligned bounding box (min, max) at `center`
    pub fn aabb_at(self, center: Vec2) -> (Vec2, Vec2) {
        let half = self.half_extents();
        (center - half, center + half)
    }
}

/// Unit normals of every polygon edge (orientation unspecified)
pub fn edge_normals(vertices: &[Vec2]) -> impl Iterator<Item = Vec2> + '_ {
    let n = vertices.len();
    (0..n).filter_map(move |i| (vertices[(i + 1) % n] - vertices[i]).perp().try_normalize())
}

/// Projection interval of a polygon onto `axis`
pub fn project(vertices: &[Vec2], axis: Vec2) -> (f32, f32) {
    vertices.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        let p = v.dot(axis);
        (lo.min(p), hi.max(p))
    })
}

/// Vertex nearest to `point`
pub fn nearest_vertex(vertices: &[Vec2], point: Vec2) -> Option<Vec2> {
    vertices
        .iter()
        .copied()
        .min_by(|a, b| a.distance_squared(point).total_cmp(&b.distance_squared(point)))
}

/// Check if a point lies inside (or on) a convex polygon
pub fn contains_point(vertices: &[Vec2], point: Vec2) -> bool {
    edge_normals(vertices).all(|axis| {
        let (lo, hi) = project(vertices, axis);
        let p = point.dot(axis);
        p >= lo && p <= hi
    })
}

/// Check if two convex polygons overlap with positive area (touching edges do not count)
pub fn polygons_overlap(a: &[Vec2], b: &[Vec2]) -> bool {
    edge_normals(a).chain(edge_normals(b)).all(|axis| {
        let (a_lo, a_hi) = project(a, axis);
        let (b_lo, b_hi) = project(b, axis);
        // Small tolerance so bricks laid edge-to-edge are accepted
        a_hi.min(b_hi) - a_lo.max(b_lo) > 1e-3
    })
}
