//! Per-heading obstacle lists with cached broad-phase bounds.
//!
//! Obstacles are stored per discretized heading because the robot's
//! effective footprint, and therefore the correct C-space-expanded obstacle
//! shape, depends on its orientation. The lists are the only part of the
//! environment that mutates every planning cycle; after any mutation,
//! [`ObstacleTable::prepare_for_planning`] must run before successor
//! generation.

use log::warn;

use crate::core::{Bounds, ConvexPolygon};

/// Obstacle costs at or above this threshold are impassable rather than
/// merely penalized.
pub const FATAL_COST: f32 = 1000.0;

/// A collision region at one discretized heading.
#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    /// Convex region, clockwise vertices, already C-space expanded when
    /// inserted through the expansion path.
    pub polygon: ConvexPolygon,
    /// Soft-penalty cost; at or above [`FATAL_COST`] the region is a wall.
    pub cost: f32,
}

impl Obstacle {
    pub fn new(polygon: ConvexPolygon, cost: f32) -> Self {
        debug_assert!(cost >= 0.0);
        Self { polygon, cost }
    }

    /// Whether trajectories through this obstacle are dead ends.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.cost >= FATAL_COST
    }
}

/// Per-discretized-heading obstacle lists plus the derived broad-phase
/// bounds cache.
#[derive(Clone, Debug, Default)]
pub struct ObstacleTable {
    per_angle: Vec<Vec<Obstacle>>,
    /// Union bounding box per obstacle index, across all headings. Every
    /// insertion path adds one entry per heading for the same physical
    /// obstacle, so index `i` of each heading's list is one obstacle.
    union_bounds: Vec<Bounds>,
    prepared: bool,
}

impl ObstacleTable {
    /// Create an empty table with one list per discretized heading.
    pub fn new(num_angles: usize) -> Self {
        Self {
            per_angle: vec![Vec::new(); num_angles],
            union_bounds: Vec::new(),
            prepared: true,
        }
    }

    #[inline]
    pub fn num_angles(&self) -> usize {
        self.per_angle.len()
    }

    /// Obstacles at one discretized heading.
    #[inline]
    pub fn at_angle(&self, theta: usize) -> &[Obstacle] {
        &self.per_angle[theta]
    }

    /// Whether any heading has any obstacle.
    pub fn has_obstacles(&self) -> bool {
        self.per_angle.iter().any(|list| !list.is_empty())
    }

    /// Broad-phase bounds cache; empty until [`Self::prepare_for_planning`]
    /// runs after the last mutation.
    #[inline]
    pub fn union_bounds(&self) -> &[Bounds] {
        &self.union_bounds
    }

    /// Whether the derived caches match the current lists.
    #[inline]
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Insert an obstacle at one discretized heading.
    ///
    /// An out-of-range heading falls back to heading 0 with a warning
    /// rather than dropping the obstacle: missing a real obstacle is worse
    /// than checking it at the wrong heading.
    pub fn insert(&mut self, theta: usize, obstacle: Obstacle) {
        let theta = if theta < self.per_angle.len() {
            theta
        } else {
            warn!(
                "obstacle angle {} out of range (num_angles = {}), inserting at angle 0",
                theta,
                self.per_angle.len()
            );
            0
        };
        self.per_angle[theta].push(obstacle);
        self.prepared = false;
    }

    /// Insert the same raw polygon at every heading (no C-space expansion).
    pub fn insert_all_thetas(&mut self, polygon: &ConvexPolygon, cost: f32) {
        for list in &mut self.per_angle {
            list.push(Obstacle::new(polygon.clone(), cost));
        }
        self.prepared = false;
    }

    /// Remove all obstacles.
    pub fn clear(&mut self) {
        for list in &mut self.per_angle {
            list.clear();
        }
        self.union_bounds.clear();
        self.prepared = true;
    }

    /// Rebuild the derived state after obstacle mutation: sort each
    /// polygon's edge ordering (precondition of the Minkowski walk and of
    /// edge-angle binary searches) and recompute the per-obstacle union
    /// bounds used for broad-phase rejection.
    pub fn prepare_for_planning(&mut self) {
        let max_len = self
            .per_angle
            .iter()
            .map(|list| list.len())
            .max()
            .unwrap_or(0);

        self.union_bounds.clear();
        self.union_bounds.resize(max_len, Bounds::empty());

        for list in &mut self.per_angle {
            for (i, obstacle) in list.iter_mut().enumerate() {
                obstacle.polygon.sort_edges();
                self.union_bounds[i] =
                    self.union_bounds[i].union(&obstacle.polygon.bounds());
            }
        }
        self.prepared = true;
    }

    /// Replace the whole table (snapshot import). The caller must prepare
    /// before the next search.
    pub fn replace(&mut self, per_angle: Vec<Vec<Obstacle>>) {
        self.per_angle = per_angle;
        self.union_bounds.clear();
        self.prepared = !self.has_obstacles();
    }

    /// All lists, heading by heading (snapshot export).
    pub fn lists(&self) -> &[Vec<Obstacle>] {
        &self.per_angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Point2D;

    fn square(min: f32, max: f32) -> ConvexPolygon {
        ConvexPolygon::rectangle(Point2D::new(min, min), Point2D::new(max, max))
    }

    #[test]
    fn test_fatal_threshold() {
        assert!(Obstacle::new(square(0.0, 1.0), FATAL_COST).is_fatal());
        assert!(Obstacle::new(square(0.0, 1.0), FATAL_COST + 1.0).is_fatal());
        assert!(!Obstacle::new(square(0.0, 1.0), 10.0).is_fatal());
    }

    #[test]
    fn test_out_of_range_angle_falls_back_to_zero() {
        let mut table = ObstacleTable::new(4);
        table.insert(17, Obstacle::new(square(0.0, 1.0), 5.0));
        assert_eq!(table.at_angle(0).len(), 1);
        for theta in 1..4 {
            assert!(table.at_angle(theta).is_empty());
        }
    }

    #[test]
    fn test_prepare_builds_union_bounds() {
        let mut table = ObstacleTable::new(2);
        table.insert(0, Obstacle::new(square(0.0, 1.0), 5.0));
        table.insert(1, Obstacle::new(square(2.0, 3.0), 5.0));
        assert!(!table.is_prepared());

        table.prepare_for_planning();
        assert!(table.is_prepared());
        assert_eq!(table.union_bounds().len(), 1);
        // Index 0 unions the same obstacle's shapes across both headings.
        let bounds = table.union_bounds()[0];
        assert_eq!(bounds.min, Point2D::new(0.0, 0.0));
        assert_eq!(bounds.max, Point2D::new(3.0, 3.0));
    }

    #[test]
    fn test_insert_all_thetas() {
        let mut table = ObstacleTable::new(8);
        table.insert_all_thetas(&square(0.0, 1.0), 7.0);
        for theta in 0..8 {
            assert_eq!(table.at_angle(theta).len(), 1);
            assert_eq!(table.at_angle(theta)[0].cost, 7.0);
        }
    }

    #[test]
    fn test_clear_resets_prepared() {
        let mut table = ObstacleTable::new(2);
        table.insert_all_thetas(&square(0.0, 1.0), 5.0);
        table.prepare_for_planning();
        table.clear();
        assert!(table.is_prepared());
        assert!(!table.has_obstacles());
        assert!(table.union_bounds().is_empty());
    }
}
