//! Convex polygon with clockwise vertex ordering.
//!
//! Obstacles and robot footprints are convex polygons. The planner only
//! needs a small capability set: edge iteration, edge angles, centroid,
//! bounding box, point containment, convex hull, and rigid transforms.

use serde::{Deserialize, Serialize};

use super::bounds::Bounds;
use super::math::normalize_angle_positive;
use super::point::Point2D;

/// Containment tolerance in millimeters; points on the boundary count as
/// inside (conservative for collision checking).
const CONTAINMENT_EPS: f32 = 1e-3;

/// A convex polygon with clockwise vertex ordering.
///
/// Convexity is assumed, not enforced; all construction paths in this crate
/// produce convex input. Orientation is normalized to clockwise on
/// construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvexPolygon {
    vertices: Vec<Point2D>,
}

impl ConvexPolygon {
    /// Create a polygon from vertices, normalizing to clockwise ordering.
    pub fn new(mut vertices: Vec<Point2D>) -> Self {
        if signed_area(&vertices) > 0.0 {
            vertices.reverse();
        }
        Self { vertices }
    }

    /// Axis-aligned rectangle from min/max corners.
    pub fn rectangle(min: Point2D, max: Point2D) -> Self {
        Self {
            // Clockwise: bottom-left, top-left, top-right, bottom-right.
            vertices: vec![
                Point2D::new(min.x, min.y),
                Point2D::new(min.x, max.y),
                Point2D::new(max.x, max.y),
                Point2D::new(max.x, min.y),
            ],
        }
    }

    /// Vertices in clockwise order.
    #[inline]
    pub fn vertices(&self) -> &[Point2D] {
        &self.vertices
    }

    /// Number of vertices (== number of edges).
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex `i` (the start of edge `i`).
    #[inline]
    pub fn vertex(&self, i: usize) -> Point2D {
        self.vertices[i]
    }

    /// Edge `i` as a vector from vertex `i` to vertex `i + 1` (wrapping).
    #[inline]
    pub fn edge(&self, i: usize) -> Point2D {
        let n = self.vertices.len();
        self.vertices[(i + 1) % n] - self.vertices[i]
    }

    /// Direction angle of edge `i`, normalized to [0, 2π).
    #[inline]
    pub fn edge_angle(&self, i: usize) -> f32 {
        normalize_angle_positive(self.edge(i).angle())
    }

    /// Centroid (vertex average; adequate for convex polygons).
    pub fn centroid(&self) -> Point2D {
        let n = self.vertices.len().max(1) as f32;
        let mut sum = Point2D::ZERO;
        for v in &self.vertices {
            sum = sum + *v;
        }
        sum * (1.0 / n)
    }

    /// Axis-aligned bounding box over the vertices.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(self.vertices.iter().copied())
    }

    /// Check whether the point lies inside or on the boundary.
    pub fn contains(&self, p: Point2D) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        // Clockwise ordering: every edge must see the point on its right.
        for i in 0..n {
            let edge = self.edge(i);
            let to_point = p - self.vertices[i];
            if edge.cross(&to_point) > CONTAINMENT_EPS {
                return false;
            }
        }
        true
    }

    /// Translate all vertices by an offset.
    pub fn translate(&self, offset: Point2D) -> ConvexPolygon {
        ConvexPolygon {
            vertices: self.vertices.iter().map(|v| *v + offset).collect(),
        }
    }

    /// Rotate all vertices around the origin by `angle` radians.
    ///
    /// Rotation preserves the clockwise ordering.
    pub fn rotate(&self, angle: f32) -> ConvexPolygon {
        ConvexPolygon {
            vertices: self.vertices.iter().map(|v| v.rotate(angle)).collect(),
        }
    }

    /// Rotate the vertex ordering so edge angles descend from edge 0.
    ///
    /// For a clockwise convex polygon the edge directions rotate
    /// monotonically clockwise; after this call, edge 0 carries the largest
    /// angle in [0, 2π). This canonical start is a precondition of the
    /// Minkowski merge walk and of binary searches over edge angles.
    pub fn sort_edges(&mut self) {
        let n = self.vertices.len();
        if n < 2 {
            return;
        }
        let mut start = 0;
        let mut best = self.edge_angle(0);
        for i in 1..n {
            let a = self.edge_angle(i);
            if a > best {
                best = a;
                start = i;
            }
        }
        self.vertices.rotate_left(start);
    }

    /// Convex hull of a point set (Andrew's monotone chain), returned with
    /// clockwise ordering. Collinear points are dropped.
    pub fn convex_hull(points: &[Point2D]) -> ConvexPolygon {
        let mut pts: Vec<Point2D> = points.to_vec();
        pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        pts.dedup_by(|a, b| a.x == b.x && a.y == b.y);

        if pts.len() < 3 {
            return ConvexPolygon { vertices: pts };
        }

        let turn = |o: Point2D, a: Point2D, b: Point2D| (a - o).cross(&(b - o));

        let mut hull: Vec<Point2D> = Vec::with_capacity(pts.len() * 2);
        // Lower hull.
        for &p in &pts {
            while hull.len() >= 2
                && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
            {
                hull.pop();
            }
            hull.push(p);
        }
        // Upper hull.
        let lower_len = hull.len() + 1;
        for &p in pts.iter().rev() {
            while hull.len() >= lower_len
                && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
            {
                hull.pop();
            }
            hull.push(p);
        }
        hull.pop(); // Last point repeats the first.

        // Monotone chain builds counter-clockwise; store clockwise.
        hull.reverse();
        ConvexPolygon { vertices: hull }
    }
}

/// Twice the signed shoelace area; negative for clockwise ordering.
fn signed_area(vertices: &[Point2D]) -> f32 {
    let n = vertices.len();
    let mut area = 0.0;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        area += a.x * b.y - b.x * a.y;
    }
    area
}
