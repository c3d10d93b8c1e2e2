//! Configuration-space expansion via Minkowski difference.
//!
//! Growing an obstacle by the robot footprint lets the rest of the planner
//! treat the robot as a point: a trajectory sample is in collision exactly
//! when it lies inside an expanded obstacle.

use std::f32::consts::PI;

use crate::core::math::{angle_distance, normalize_angle_positive};
use crate::core::ConvexPolygon;

/// Compute the Minkowski difference of an obstacle polygon and the robot
/// footprint polygon.
///
/// Both polygons must be convex with clockwise vertex ordering; the
/// footprint is given in the robot frame with the drive center at the
/// origin, already rotated to the heading the expanded obstacle is for.
///
/// The walk negates the footprint (a π rotation), picks the footprint edge
/// whose direction is angularly closest to the obstacle's first edge
/// direction, and merges both polygons' edge sequences in rotational order
/// from that starting pair, appending one edge vector at a time. The
/// accumulated boundary is taken through a convex-hull pass before being
/// accepted, absorbing floating-point error in the merge.
pub fn expand_cspace(obstacle: &ConvexPolygon, footprint: &ConvexPolygon) -> ConvexPolygon {
    if obstacle.len() < 3 || footprint.len() < 3 {
        return obstacle.clone();
    }

    let mut obs = obstacle.clone();
    obs.sort_edges();
    let mut robot = footprint.rotate(PI);
    robot.sort_edges();

    let n = obs.len();
    let m = robot.len();

    // Footprint edge closest in direction to the obstacle's first edge;
    // its start vertex pairs with the obstacle's first vertex to seed the
    // expanded boundary.
    let target = obs.edge_angle(0);
    let mut start_r = 0;
    let mut best = f32::INFINITY;
    for j in 0..m {
        let d = angle_distance(robot.edge_angle(j), target);
        if d < best {
            best = d;
            start_r = j;
        }
    }

    let mut vertices = Vec::with_capacity(n + m + 1);
    let mut point = obs.vertex(0) + robot.vertex(start_r);
    vertices.push(point);

    point = point + obs.edge(0);
    vertices.push(point);
    let mut reference = target;
    let mut i = 1;
    let mut j = 0;

    // Clockwise polygons carry clockwise-descending edge angles; at each
    // step take whichever polygon's next edge comes first in that order.
    while i < n || j < m {
        let obs_delta = if i < n {
            cw_delta(reference, obs.edge_angle(i))
        } else {
            f32::INFINITY
        };
        let robot_index = (start_r + j) % m;
        let robot_delta = if j < m {
            cw_delta(reference, robot.edge_angle(robot_index))
        } else {
            f32::INFINITY
        };

        if obs_delta <= robot_delta {
            point = point + obs.edge(i);
            reference = obs.edge_angle(i);
            i += 1;
        } else {
            point = point + robot.edge(robot_index);
            reference = robot.edge_angle(robot_index);
            j += 1;
        }
        vertices.push(point);
    }

    ConvexPolygon::convex_hull(&vertices)
}

/// Clockwise angular travel from `from` to `to`, in [0, 2π).
#[inline]
fn cw_delta(from: f32, to: f32) -> f32 {
    normalize_angle_positive(from - to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Bounds, Point2D};

    fn square(center: Point2D, side: f32) -> ConvexPolygon {
        let half = side / 2.0;
        ConvexPolygon::rectangle(
            Point2D::new(center.x - half, center.y - half),
            Point2D::new(center.x + half, center.y + half),
        )
    }

    #[test]
    fn test_squares_expand_to_summed_square() {
        // Closed form: squares of side a and b expand to a square of side
        // a + b around the obstacle center.
        let obstacle = square(Point2D::new(5.0, 0.0), 4.0);
        let footprint = square(Point2D::ZERO, 2.0);

        let expanded = expand_cspace(&obstacle, &footprint);
        let bounds = expanded.bounds();
        let expected = Bounds::new(Point2D::new(2.0, -3.0), Point2D::new(8.0, 3.0));
        assert!(bounds.min.distance(&expected.min) < 1e-4);
        assert!(bounds.max.distance(&expected.max) < 1e-4);

        let centroid = expanded.centroid();
        assert!(centroid.distance(&Point2D::new(5.0, 0.0)) < 1e-4);
    }

    #[test]
    fn test_expanded_contains_original() {
        let obstacle = square(Point2D::new(10.0, 10.0), 6.0);
        let footprint = square(Point2D::ZERO, 3.0);
        let expanded = expand_cspace(&obstacle, &footprint);

        for &v in obstacle.vertices() {
            assert!(expanded.contains(v));
        }
    }

    #[test]
    fn test_point_robot_is_identity_shape() {
        // A tiny footprint changes the obstacle by at most its own radius.
        let obstacle = square(Point2D::new(0.0, 0.0), 10.0);
        let footprint = square(Point2D::ZERO, 1e-3);
        let expanded = expand_cspace(&obstacle, &footprint);

        let bounds = expanded.bounds();
        assert!((bounds.min.x - (-5.0)).abs() < 1e-2);
        assert!((bounds.max.x - 5.0).abs() < 1e-2);
    }

    #[test]
    fn test_offset_footprint_shifts_expansion() {
        // A footprint ahead of the drive center grows the obstacle behind
        // it: the Minkowski difference subtracts the footprint extent.
        let obstacle = square(Point2D::new(20.0, 0.0), 4.0);
        let footprint = ConvexPolygon::rectangle(
            Point2D::new(0.0, -1.0),
            Point2D::new(6.0, 1.0),
        );
        let expanded = expand_cspace(&obstacle, &footprint);

        let bounds = expanded.bounds();
        // Obstacle x extent [18, 22]; footprint x extent [0, 6] reflects
        // to [-6, 0], so the expanded extent is [12, 22].
        assert!((bounds.min.x - 12.0).abs() < 1e-3);
        assert!((bounds.max.x - 22.0).abs() < 1e-3);
        assert!((bounds.min.y - (-3.0)).abs() < 1e-3);
        assert!((bounds.max.y - 3.0).abs() < 1e-3);
    }
}
