//! End-to-end planning scenarios: definition loading, successor
//! generation, plan re-validation, and path reconstruction.

use std::f32::consts::PI;

use marga_plan::core::{ConvexPolygon, Point2D, Pose2D};
use marga_plan::io::{
    AngleDefinition, EnvironmentDump, IntermediatePose, PrimitiveDefinition,
    PrimitiveSetDefinition,
};
use marga_plan::lattice::{PrimitiveGeometry, StateOffset};
use marga_plan::{
    ActionType, LatticeEnvironment, LatticeState, PathSegment, Plan, RobotParams, Successor,
    FATAL_COST, REPLAN_PENALTY_BUFFER,
};

/// One forward "straight 10 mm" action per angle, resolution 10 mm,
/// 4 trajectory samples per primitive.
fn straight_definition(num_angles: usize) -> PrimitiveSetDefinition {
    let resolution = 10.0;
    let length = 10.0;
    let angle_definitions: Vec<f32> = (0..num_angles)
        .map(|i| i as f32 * 2.0 * PI / num_angles as f32)
        .collect();
    let angles = angle_definitions
        .iter()
        .map(|&heading| AngleDefinition {
            prims: vec![PrimitiveDefinition {
                action_index: 0,
                end_pose: StateOffset {
                    x: (length * heading.cos() / resolution).round() as i32,
                    y: (length * heading.sin() / resolution).round() as i32,
                    theta: 0,
                },
                intermediate_poses: (1..=4)
                    .map(|k| {
                        let d = length * k as f32 / 4.0;
                        IntermediatePose {
                            x_mm: d * heading.cos(),
                            y_mm: d * heading.sin(),
                            theta_rads: heading,
                        }
                    })
                    .collect(),
                geometry: PrimitiveGeometry {
                    straight_length_mm: Some(length),
                    ..Default::default()
                },
            }],
        })
        .collect();

    PrimitiveSetDefinition {
        resolution_mm: resolution,
        num_angles,
        actions: vec![ActionType {
            id: 0,
            name: "forward".into(),
            extra_cost_factor: 1.0,
            reverse: false,
        }],
        angle_definitions,
        angles,
    }
}

fn test_environment(num_angles: usize) -> LatticeEnvironment {
    LatticeEnvironment::from_definition(&straight_definition(num_angles), RobotParams::default())
        .unwrap()
}

fn square(center: Point2D, side: f32) -> ConvexPolygon {
    let half = side / 2.0;
    ConvexPolygon::rectangle(
        Point2D::new(center.x - half, center.y - half),
        Point2D::new(center.x + half, center.y + half),
    )
}

#[test]
fn fatal_obstacle_ahead_blocks_only_headings_into_it() {
    // 16 headings, one fatal square 5 mm ahead along heading 0.
    let mut env = test_environment(16);
    env.add_obstacle_all_thetas(&square(Point2D::new(5.0, 0.0), 2.0), FATAL_COST);
    env.prepare_for_planning();

    let origin_facing_obstacle = LatticeState::new(0, 0, 0);
    let blocked: Vec<Successor> = env
        .get_successors(&origin_facing_obstacle, 0.0, false)
        .collect();
    assert!(blocked.is_empty(), "heading 0 must be a dead end");

    let mut open_headings = 0;
    for theta in 1..16u8 {
        let successors: Vec<Successor> = env
            .get_successors(&LatticeState::new(0, 0, theta), 0.0, false)
            .collect();
        open_headings += usize::from(!successors.is_empty());
    }
    assert!(open_headings > 0, "headings away from the obstacle stay open");
}

#[test]
fn plan_invalidated_by_new_obstacle_keeps_one_step_prefix() {
    let mut env = test_environment(16);

    // Three straight actions from the origin, recorded with zero penalty.
    let start = LatticeState::new(0, 0, 0);
    let mut plan = Plan::new(start.id());
    plan.push(0, 0.0);
    plan.push(0, 0.0);
    plan.push(0, 0.0);

    // Initially everything is safe.
    let check = env.plan_is_safe(&plan, 1000.0, 0);
    assert!(check.is_safe);
    assert_eq!(check.valid_prefix.len(), 3);
    assert_eq!(check.last_valid_state, LatticeState::new(3, 0, 0));

    // A fatal obstacle intersecting only the second action's swept area.
    env.clear_obstacles();
    env.add_obstacle_all_thetas(&square(Point2D::new(16.0, 0.0), 2.0), FATAL_COST);
    env.prepare_for_planning();

    let check = env.plan_is_safe(&plan, 1000.0, 0);
    assert!(!check.is_safe);
    assert_eq!(check.valid_prefix.len(), 1, "only the first action survives");
    assert_eq!(check.last_valid_state, LatticeState::new(1, 0, 0));
}

#[test]
fn plan_safety_matches_reapplied_penalties() {
    // plan_is_safe is equivalent to re-applying every remaining action and
    // comparing against the recorded penalty plus the buffer.
    let mut env = test_environment(16);
    env.add_obstacle_all_thetas(&square(Point2D::new(15.0, 0.0), 4.0), 10.0);
    env.prepare_for_planning();

    let start = LatticeState::new(0, 0, 0);

    // Record the penalties the environment reports today: plan stays safe.
    let mut honest = Plan::new(start.id());
    let mut state = start;
    for _ in 0..3 {
        let applied = env.apply_action(&state, 0, true).unwrap();
        honest.push(0, applied.penalty);
        state = applied.state;
    }
    assert!(env.plan_is_safe(&honest, 1000.0, 0).is_safe);

    // The same plan recorded with zero penalties trips the buffer on the
    // step that crosses the soft obstacle.
    let mut stale = Plan::new(start.id());
    for _ in 0..3 {
        stale.push(0, 0.0);
    }
    let applied = env
        .apply_action(&LatticeState::new(1, 0, 0), 0, true)
        .unwrap();
    assert!(applied.penalty > REPLAN_PENALTY_BUFFER);
    assert!(!env.plan_is_safe(&stale, 1000.0, 0).is_safe);
}

#[test]
fn executed_steps_are_skipped_during_revalidation() {
    let mut env = test_environment(16);
    let start = LatticeState::new(0, 0, 0);
    let mut plan = Plan::new(start.id());
    plan.push(0, 0.0);
    plan.push(0, 0.0);
    plan.push(0, 0.0);

    // Obstacle over the second action only.
    env.add_obstacle_all_thetas(&square(Point2D::new(16.0, 0.0), 2.0), FATAL_COST);
    env.prepare_for_planning();

    // With the first two actions already driven, the remainder is clear.
    let check = env.plan_is_safe(&plan, 1000.0, 2);
    assert!(check.is_safe);
    assert_eq!(check.valid_prefix.len(), 1);
    assert_eq!(check.last_valid_state, LatticeState::new(3, 0, 0));
}

#[test]
fn follow_distance_bounds_the_reusable_prefix() {
    let env = test_environment(16);
    let start = LatticeState::new(0, 0, 0);
    let mut plan = Plan::new(start.id());
    plan.push(0, 0.0);
    plan.push(0, 0.0);
    plan.push(0, 0.0);

    // 15 mm allows one 10 mm step, not two; the rest is still validated.
    let check = env.plan_is_safe(&plan, 15.0, 0);
    assert!(check.is_safe);
    assert_eq!(check.valid_prefix.len(), 1);
    assert_eq!(check.last_valid_state, LatticeState::new(1, 0, 0));
}

#[test]
fn plan_reconstructs_into_merged_continuous_path() {
    let env = test_environment(16);
    let start = LatticeState::new(0, 0, 0);
    let mut plan = Plan::new(start.id());
    plan.push(0, 0.0);
    plan.push(0, 0.0);
    plan.push(0, 0.0);

    let path = env.plan_to_path(&plan).unwrap();
    // Three collinear straight primitives merge into one line.
    assert_eq!(path.len(), 1);
    assert!((path.total_length() - 30.0).abs() < 1e-4);
    match &path.segments()[0] {
        PathSegment::Line { start, end } => {
            assert!(start.distance(&Point2D::new(0.0, 0.0)) < 1e-4);
            assert!(end.distance(&Point2D::new(30.0, 0.0)) < 1e-4);
        }
        other => panic!("expected a merged line, got {other:?}"),
    }

    assert!(env.path_is_safe(path.segments()));
}

#[test]
fn reconstructed_path_fails_safety_after_obstacle_appears() {
    let mut env = test_environment(16);
    let start = LatticeState::new(0, 0, 0);
    let mut plan = Plan::new(start.id());
    plan.push(0, 0.0);
    plan.push(0, 0.0);

    let path = env.plan_to_path(&plan).unwrap();
    assert!(env.path_is_safe(path.segments()));

    env.add_obstacle_all_thetas(&square(Point2D::new(10.0, 0.0), 3.0), FATAL_COST);
    env.prepare_for_planning();
    assert!(!env.path_is_safe(path.segments()));
}

#[test]
fn cspace_expansion_grows_obstacles_per_heading() {
    let mut env = test_environment(4);
    let raw = square(Point2D::new(50.0, 0.0), 10.0);
    env.add_obstacle_with_expansion(&raw, FATAL_COST);
    env.prepare_for_planning();

    for theta in 0..4 {
        let obstacles = env.obstacle_table().at_angle(theta);
        assert_eq!(obstacles.len(), 1);
        // The footprint contains the drive center, so every expanded shape
        // contains the raw obstacle.
        for &vertex in raw.vertices() {
            assert!(obstacles[0].polygon.contains(vertex));
        }
    }

    // A state whose cell center sits just outside the raw obstacle but
    // within a robot half-length of it is no longer clear.
    let pose = Pose2D::new(40.0, 0.0, 0.0);
    assert!(env.round_safe(&pose).is_none() || {
        let state = env.round_safe(&pose).unwrap();
        state.x != 4 || state.y != 0
    });
}

#[test]
fn dump_round_trips_through_disk() {
    let env = test_environment(8);
    let dump = env.dump();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("environment.json");
    dump.save(&path).unwrap();

    let loaded = EnvironmentDump::load(&path).unwrap();
    assert_eq!(loaded, dump);

    let imported = LatticeEnvironment::import(&loaded, RobotParams::default()).unwrap();
    assert_eq!(imported.dump(), dump);
}

#[test]
fn obstacle_snapshot_round_trips() {
    let mut env = test_environment(4);
    env.add_obstacle_all_thetas(&square(Point2D::new(30.0, 10.0), 8.0), 12.5);
    env.add_obstacle(1, square(Point2D::new(-20.0, 0.0), 6.0), FATAL_COST);

    let snapshot = env.obstacle_snapshot();
    let json = snapshot.to_json().unwrap();
    let reparsed = marga_plan::io::ObstacleSnapshot::from_json(&json).unwrap();
    assert_eq!(reparsed, snapshot);

    let mut other = test_environment(4);
    other.import_obstacles(&reparsed).unwrap();
    assert_eq!(other.obstacle_snapshot(), snapshot);
}
