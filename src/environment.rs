//! The lattice planning environment.
//!
//! [`LatticeEnvironment`] owns everything a lattice search needs: the
//! discretization (resolution and heading table), the forward and reverse
//! motion-primitive tables indexed by `[heading][action]`, the per-heading
//! obstacle lists, and the robot's kinematic parameters. The primitive
//! tables are built once at load and immutable afterwards; the obstacle
//! lists mutate every planning cycle and must be re-prepared before the
//! next search.

use log::debug;

use crate::config::RobotParams;
use crate::core::math::min_angle_between;
use crate::core::{ConvexPolygon, Point2D, Pose2D};
use crate::cspace::expand_cspace;
use crate::error::{PlannerError, Result};
use crate::io::{
    AngleDump, EnvironmentDump, IntermediatePose, ObstacleAngleSnapshot, ObstacleRecord,
    ObstacleSnapshot, PrimitiveDump, PrimitiveSetDefinition,
};
use crate::lattice::primitive::nearest_angle_index;
use crate::lattice::{
    ActionType, ContinuousPath, LatticeState, MotionPrimitive, PathSegment,
};
use crate::obstacles::{Obstacle, ObstacleTable};
use crate::plan::{Plan, ReplanCheck};
use crate::successors::SuccessorIterator;

/// Fixed extra penalty added per obstacle contact while driving in
/// reverse, on top of the weighted soft cost.
pub const REVERSE_CONTACT_PENALTY: f32 = 0.5;

/// Slack allowed between a plan step's recorded penalty and its recomputed
/// penalty before the remaining plan is declared unsafe.
pub const REPLAN_PENALTY_BUFFER: f32 = 0.1;

/// Total penalty above which a continuous path is rejected outright.
pub const PATH_PENALTY_TOLERANCE: f32 = 1e-3;

/// Result of advancing a state by one primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AppliedAction {
    /// The state after the primitive's end offset.
    pub state: LatticeState,
    /// Accumulated soft penalty; at or above
    /// [`crate::obstacles::FATAL_COST`] the trajectory crossed a wall.
    pub penalty: f32,
}

/// The discretized-configuration-space planning environment.
pub struct LatticeEnvironment {
    resolution_mm: f32,
    num_angles: usize,
    angles: Vec<f32>,
    actions: Vec<ActionType>,
    forward: Vec<Vec<MotionPrimitive>>,
    reverse: Vec<Vec<MotionPrimitive>>,
    obstacles: ObstacleTable,
    params: RobotParams,
}

impl LatticeEnvironment {
    /// Build an environment from a primitive definition, computing costs
    /// from the robot's kinematics and deriving the reverse table.
    pub fn from_definition(def: &PrimitiveSetDefinition, params: RobotParams) -> Result<Self> {
        validate_lattice_shape(
            def.num_angles,
            &def.actions,
            &def.angle_definitions,
            def.angles.len(),
        )?;

        let mut forward = Vec::with_capacity(def.num_angles);
        for (theta, angle_def) in def.angles.iter().enumerate() {
            let mut defs: Vec<_> = angle_def.prims.iter().collect();
            defs.sort_by_key(|p| p.action_index);

            let mut prims = Vec::with_capacity(defs.len());
            for (slot, prim_def) in defs.iter().enumerate() {
                if prim_def.action_index != slot || slot >= def.actions.len() {
                    return Err(definition_error(
                        &format!("angle {theta} does not cover each action exactly once"),
                        prim_def,
                    ));
                }
                let action = &def.actions[prim_def.action_index];
                let poses: Vec<Pose2D> = prim_def
                    .intermediate_poses
                    .iter()
                    .map(|p| Pose2D::new(p.x_mm, p.y_mm, p.theta_rads))
                    .collect();
                prims.push(MotionPrimitive::create(
                    action,
                    theta,
                    prim_def.end_pose,
                    &poses,
                    prim_def.geometry.clone(),
                    &def.angle_definitions,
                    &params,
                )?);
            }
            if prims.len() != def.actions.len() {
                return Err(definition_error(
                    &format!(
                        "angle {theta} has {} primitives for {} actions",
                        prims.len(),
                        def.actions.len()
                    ),
                    angle_def,
                ));
            }
            forward.push(prims);
        }

        let reverse = derive_reverse_table(&forward, def.num_angles, def.resolution_mm);
        debug!(
            "built lattice environment: {} angles, {} actions, resolution {} mm",
            def.num_angles,
            def.actions.len(),
            def.resolution_mm
        );

        Ok(Self {
            resolution_mm: def.resolution_mm,
            num_angles: def.num_angles,
            angles: def.angle_definitions.clone(),
            actions: def.actions.clone(),
            forward,
            reverse,
            obstacles: ObstacleTable::new(def.num_angles),
            params,
        })
    }

    /// Load a definition file and build the environment from it.
    pub fn from_definition_file(path: &std::path::Path, params: RobotParams) -> Result<Self> {
        Self::from_definition(&PrimitiveSetDefinition::load(path)?, params)
    }

    /// Rebuild an environment from a dump, taking each primitive's cost
    /// verbatim instead of recomputing it.
    pub fn import(dump: &EnvironmentDump, params: RobotParams) -> Result<Self> {
        validate_lattice_shape(
            dump.num_angles,
            &dump.actions,
            &dump.angle_definitions,
            dump.angles.len(),
        )?;

        let mut forward = Vec::with_capacity(dump.num_angles);
        for (theta, angle_dump) in dump.angles.iter().enumerate() {
            let mut dumps: Vec<_> = angle_dump.prims.iter().collect();
            dumps.sort_by_key(|p| p.action_index);

            let mut prims = Vec::with_capacity(dumps.len());
            for (slot, prim_dump) in dumps.iter().enumerate() {
                if prim_dump.action_index != slot
                    || slot >= dump.actions.len()
                    || prim_dump.start_theta != theta
                {
                    return Err(definition_error(
                        &format!("inconsistent dumped primitive at angle {theta}"),
                        prim_dump,
                    ));
                }
                let action = &dump.actions[prim_dump.action_index];
                let poses: Vec<Pose2D> = prim_dump
                    .intermediate_poses
                    .iter()
                    .map(|p| Pose2D::new(p.x_mm, p.y_mm, p.theta_rads))
                    .collect();
                prims.push(MotionPrimitive::import(
                    prim_dump.action_index,
                    &action.name,
                    theta,
                    prim_dump.end_state_offset,
                    prim_dump.cost,
                    &poses,
                    prim_dump.geometry.clone(),
                    &dump.angle_definitions,
                )?);
            }
            if prims.len() != dump.actions.len() {
                return Err(definition_error(
                    &format!(
                        "angle {theta} has {} primitives for {} actions",
                        prims.len(),
                        dump.actions.len()
                    ),
                    angle_dump,
                ));
            }
            forward.push(prims);
        }

        let reverse = derive_reverse_table(&forward, dump.num_angles, dump.resolution_mm);
        Ok(Self {
            resolution_mm: dump.resolution_mm,
            num_angles: dump.num_angles,
            angles: dump.angle_definitions.clone(),
            actions: dump.actions.clone(),
            forward,
            reverse,
            obstacles: ObstacleTable::new(dump.num_angles),
            params,
        })
    }

    /// Dump the immutable tables in the round-trippable format.
    pub fn dump(&self) -> EnvironmentDump {
        EnvironmentDump {
            resolution_mm: self.resolution_mm,
            num_angles: self.num_angles,
            actions: self.actions.clone(),
            angle_definitions: self.angles.clone(),
            angles: self
                .forward
                .iter()
                .map(|prims| AngleDump {
                    prims: prims
                        .iter()
                        .map(|p| PrimitiveDump {
                            action_index: p.action_id,
                            cost: p.cost,
                            start_theta: p.start_theta,
                            end_state_offset: p.end_offset,
                            intermediate_poses: p
                                .samples
                                .iter()
                                .map(|s| IntermediatePose {
                                    x_mm: s.position.x,
                                    y_mm: s.position.y,
                                    theta_rads: s.theta,
                                })
                                .collect(),
                            geometry: p.geometry.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    // --- Accessors -------------------------------------------------------

    #[inline]
    pub fn resolution_mm(&self) -> f32 {
        self.resolution_mm
    }

    #[inline]
    pub fn num_angles(&self) -> usize {
        self.num_angles
    }

    /// Heading in radians for each discretized angle index.
    #[inline]
    pub fn angles(&self) -> &[f32] {
        &self.angles
    }

    #[inline]
    pub fn actions(&self) -> &[ActionType] {
        &self.actions
    }

    #[inline]
    pub fn params(&self) -> &RobotParams {
        &self.params
    }

    /// Primitive list for one heading, from the forward or reverse table.
    #[inline]
    pub fn primitives(&self, theta: usize, reverse: bool) -> &[MotionPrimitive] {
        if reverse {
            &self.reverse[theta]
        } else {
            &self.forward[theta]
        }
    }

    #[inline]
    pub fn obstacle_table(&self) -> &ObstacleTable {
        &self.obstacles
    }

    // --- State codec -----------------------------------------------------

    /// Discretize a continuous pose to the nearest lattice cell and
    /// heading, with no collision awareness.
    pub fn discretize(&self, pose: &Pose2D) -> LatticeState {
        LatticeState::new(
            (pose.x / self.resolution_mm).round() as i32,
            (pose.y / self.resolution_mm).round() as i32,
            self.nearest_theta(pose.theta) as u8,
        )
    }

    /// Continuous pose at a lattice state (cell center, table heading).
    pub fn continuize(&self, state: &LatticeState) -> Pose2D {
        Pose2D::new(
            state.x as f32 * self.resolution_mm,
            state.y as f32 * self.resolution_mm,
            self.angles[state.theta as usize],
        )
    }

    /// Index of the discretized heading nearest to `angle`.
    #[inline]
    pub fn nearest_theta(&self, angle: f32) -> usize {
        nearest_angle_index(&self.angles, angle)
    }

    /// Resolve a continuous pose to the nearest collision-free lattice
    /// cell at the nearest heading.
    ///
    /// Scans the 2x2 neighborhood of candidate cells, widening to the
    /// surrounding 4x4 block when all four are blocked, and picks the free
    /// candidate closest to the input position. Returns `None` when the
    /// whole neighborhood is blocked.
    pub fn round_safe(&self, pose: &Pose2D) -> Option<LatticeState> {
        let theta = self.nearest_theta(pose.theta);
        let fx = pose.x / self.resolution_mm;
        let fy = pose.y / self.resolution_mm;

        let near = [
            (fx.floor() as i32, fy.floor() as i32),
            (fx.floor() as i32, fy.ceil() as i32),
            (fx.ceil() as i32, fy.floor() as i32),
            (fx.ceil() as i32, fy.ceil() as i32),
        ];
        if let Some(state) = self.closest_clear_cell(&near, theta, pose) {
            return Some(state);
        }

        let rx = fx.round() as i32;
        let ry = fy.round() as i32;
        let mut wide = Vec::with_capacity(16);
        for dx in -1..=2 {
            for dy in -1..=2 {
                wide.push((rx + dx, ry + dy));
            }
        }
        self.closest_clear_cell(&wide, theta, pose)
    }

    fn closest_clear_cell(
        &self,
        cells: &[(i32, i32)],
        theta: usize,
        pose: &Pose2D,
    ) -> Option<LatticeState> {
        let mut best: Option<(f32, LatticeState)> = None;
        for &(x, y) in cells {
            if !self.cell_is_clear(x, y, theta) {
                continue;
            }
            let state = LatticeState::new(x, y, theta as u8);
            let d = self.continuize(&state).position().distance(&pose.position());
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, state));
            }
        }
        best.map(|(_, state)| state)
    }

    /// Whether the cell center is outside every fatal obstacle at the
    /// given heading.
    fn cell_is_clear(&self, x: i32, y: i32, theta: usize) -> bool {
        let position = Point2D::new(
            x as f32 * self.resolution_mm,
            y as f32 * self.resolution_mm,
        );
        self.obstacles
            .at_angle(theta)
            .iter()
            .all(|o| !(o.is_fatal() && o.polygon.contains(position)))
    }

    // --- Obstacle mutation -----------------------------------------------

    /// Insert an already-expanded obstacle at one discretized heading.
    pub fn add_obstacle(&mut self, theta: usize, polygon: ConvexPolygon, cost: f32) {
        self.obstacles.insert(theta, Obstacle::new(polygon, cost));
    }

    /// C-space-expand a raw obstacle against the robot footprint at every
    /// heading and insert the per-heading expanded shapes.
    pub fn add_obstacle_with_expansion(&mut self, polygon: &ConvexPolygon, cost: f32) {
        for theta in 0..self.num_angles {
            let footprint = self.params.footprint.rotate(self.angles[theta]);
            let expanded = expand_cspace(polygon, &footprint);
            self.obstacles.insert(theta, Obstacle::new(expanded, cost));
        }
    }

    /// Insert the same raw polygon at every heading without expansion.
    pub fn add_obstacle_all_thetas(&mut self, polygon: &ConvexPolygon, cost: f32) {
        self.obstacles.insert_all_thetas(polygon, cost);
    }

    /// Remove all obstacles.
    pub fn clear_obstacles(&mut self) {
        self.obstacles.clear();
    }

    /// Rebuild the derived obstacle state (edge ordering, broad-phase
    /// bounds). Must run after any obstacle mutation, before the next
    /// successor generation.
    pub fn prepare_for_planning(&mut self) {
        self.obstacles.prepare_for_planning();
    }

    /// Export the live obstacle lists.
    pub fn obstacle_snapshot(&self) -> ObstacleSnapshot {
        ObstacleSnapshot {
            angles: self
                .obstacles
                .lists()
                .iter()
                .map(|list| ObstacleAngleSnapshot {
                    obstacles: list
                        .iter()
                        .map(|o| ObstacleRecord {
                            cost: o.cost,
                            poly: o.polygon.vertices().to_vec(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Replace the obstacle lists from a snapshot. The caller must call
    /// [`Self::prepare_for_planning`] before the next search.
    pub fn import_obstacles(&mut self, snapshot: &ObstacleSnapshot) -> Result<()> {
        if snapshot.angles.len() != self.num_angles {
            return Err(PlannerError::Definition {
                context: format!(
                    "obstacle snapshot has {} angle lists, environment has {}",
                    snapshot.angles.len(),
                    self.num_angles
                ),
                fragment: format!("{{\"angles\": {}}}", snapshot.angles.len()),
            });
        }
        let lists = snapshot
            .angles
            .iter()
            .map(|angle| {
                angle
                    .obstacles
                    .iter()
                    .map(|record| {
                        Obstacle::new(ConvexPolygon::new(record.poly.clone()), record.cost)
                    })
                    .collect()
            })
            .collect();
        self.obstacles.replace(lists);
        Ok(())
    }

    // --- Action application ----------------------------------------------

    /// Advance a state by one forward primitive.
    ///
    /// The end-state offset is always applied; when `check_collisions` is
    /// set, the primitive's swept samples are narrow-phase checked (no
    /// broad-phase reject) and the accumulated penalty is returned. The
    /// penalty is cost information, not a veto; callers may treat a
    /// fatal-cost penalty as failure.
    ///
    /// Returns `None` for an action id with no primitive at this heading,
    /// which indicates a caller bug rather than a runtime condition.
    pub fn apply_action(
        &self,
        state: &LatticeState,
        action: usize,
        check_collisions: bool,
    ) -> Option<AppliedAction> {
        let prims = self.forward.get(state.theta as usize)?;
        let prim = prims.get(action)?;
        debug_assert_eq!(prim.action_id, action);

        let penalty = if check_collisions {
            let origin = self.continuize(state).position();
            self.primitive_penalty(prim, origin, self.actions[action].reverse)
        } else {
            0.0
        };
        Some(AppliedAction {
            state: state.offset_by(&prim.end_offset, self.num_angles),
            penalty,
        })
    }

    /// Narrow-phase penalty for a primitive anchored at `origin`.
    ///
    /// Heading-preserving primitives check all samples against the start
    /// heading's obstacle list (with a per-obstacle bounds reject);
    /// heading-changing primitives check each sample against the obstacle
    /// list for that sample's own nearest heading. A fatal contact returns
    /// the obstacle's cost immediately; sub-fatal contacts accumulate
    /// `cost * weight`, plus [`REVERSE_CONTACT_PENALTY`] per contact when
    /// driving in reverse.
    pub(crate) fn primitive_penalty(
        &self,
        prim: &MotionPrimitive,
        origin: Point2D,
        reverse: bool,
    ) -> f32 {
        let mut penalty = 0.0;

        if !prim.changes_heading() {
            let world_bounds = prim.bounds.translate(origin);
            for obstacle in self.obstacles.at_angle(prim.start_theta) {
                if !obstacle.polygon.bounds().intersects(&world_bounds) {
                    continue;
                }
                for sample in &prim.samples {
                    if obstacle.polygon.contains(sample.position + origin) {
                        if obstacle.is_fatal() {
                            return obstacle.cost;
                        }
                        penalty += obstacle.cost * sample.weight;
                        if reverse {
                            penalty += REVERSE_CONTACT_PENALTY;
                        }
                    }
                }
            }
        } else {
            for sample in &prim.samples {
                let position = sample.position + origin;
                debug_assert!((sample.nearest_theta as usize) < self.num_angles);
                for obstacle in self.obstacles.at_angle(sample.nearest_theta as usize) {
                    if !obstacle.polygon.bounds().contains(position) {
                        continue;
                    }
                    if obstacle.polygon.contains(position) {
                        if obstacle.is_fatal() {
                            return obstacle.cost;
                        }
                        penalty += obstacle.cost * sample.weight;
                        if reverse {
                            penalty += REVERSE_CONTACT_PENALTY;
                        }
                    }
                }
            }
        }

        debug_assert!(penalty.is_finite());
        penalty
    }

    /// Penalty accumulated along one continuous path segment, sampled at
    /// the granularity primitives are authored at.
    pub fn apply_path_segment(&self, segment: &PathSegment) -> f32 {
        let mut penalty = 0.0;
        let mut previous: Option<Point2D> = None;

        for pose in segment.sample_poses() {
            let position = pose.position();
            let spacing = previous
                .map(|p| position.distance(&p))
                .unwrap_or(crate::lattice::segment::SAMPLE_STEP_MM)
                .max(crate::lattice::segment::SAMPLE_STEP_MM);
            previous = Some(position);
            let weight = 1.0 / spacing;

            let theta = self.nearest_theta(pose.theta);
            for obstacle in self.obstacles.at_angle(theta) {
                if !obstacle.polygon.bounds().contains(position) {
                    continue;
                }
                if obstacle.polygon.contains(position) {
                    if obstacle.is_fatal() {
                        return obstacle.cost;
                    }
                    penalty += obstacle.cost * weight;
                }
            }
        }

        debug_assert!(penalty.is_finite());
        penalty
    }

    /// Whether a continuous path is free of obstacle contact: the total
    /// accumulated penalty across all segments must stay within
    /// [`PATH_PENALTY_TOLERANCE`].
    pub fn path_is_safe(&self, segments: &[PathSegment]) -> bool {
        let mut total = 0.0;
        for segment in segments {
            total += self.apply_path_segment(segment);
            if total > PATH_PENALTY_TOLERANCE {
                return false;
            }
        }
        true
    }

    // --- Search interface ------------------------------------------------

    /// Lazy successor enumeration from `state` with accumulated cost `g`,
    /// over the forward or reverse primitive table.
    pub fn get_successors(
        &self,
        state: &LatticeState,
        g: f32,
        reverse: bool,
    ) -> SuccessorIterator<'_> {
        SuccessorIterator::new(self, *state, g, reverse)
    }

    // --- Plans and replanning --------------------------------------------

    /// Re-validate a plan already in execution against the current
    /// obstacle set.
    ///
    /// The first `current_index` actions are skipped without collision
    /// checking (the robot has already driven them). Every remaining
    /// action is re-applied with collision checking; if any recomputed
    /// penalty exceeds its recorded penalty by more than
    /// [`REPLAN_PENALTY_BUFFER`], the whole remaining plan is unsafe. The
    /// reusable prefix only grows while the running distance from the
    /// re-check anchor stays within `max_follow_distance_mm`; validation
    /// continues past that bound without extending the prefix.
    pub fn plan_is_safe(
        &self,
        plan: &Plan,
        max_follow_distance_mm: f32,
        current_index: usize,
    ) -> ReplanCheck {
        let mut state = plan.start.unpack();
        let split = current_index.min(plan.steps.len());

        for step in &plan.steps[..split] {
            match self.apply_action(&state, step.action, false) {
                Some(applied) => state = applied.state,
                None => return ReplanCheck::unsafe_at(state),
            }
        }

        let anchor = self.continuize(&state).position();
        let mut check = ReplanCheck {
            is_safe: true,
            valid_prefix: Plan::new(state.id()),
            last_valid_state: state,
        };
        let mut within_follow_bound = true;

        for step in &plan.steps[split..] {
            let Some(applied) = self.apply_action(&state, step.action, true) else {
                check.is_safe = false;
                return check;
            };
            if applied.penalty > step.penalty + REPLAN_PENALTY_BUFFER {
                check.is_safe = false;
                return check;
            }
            state = applied.state;

            if within_follow_bound {
                let travelled = self.continuize(&state).position().distance(&anchor);
                if travelled <= max_follow_distance_mm {
                    check.valid_prefix.push(step.action, step.penalty);
                    check.last_valid_state = state;
                } else {
                    within_follow_bound = false;
                }
            }
        }
        check
    }

    /// Instantiate a plan's primitives as continuous segments, merging
    /// adjacent same-type segments into the target path.
    ///
    /// Returns the state at the end of the plan, or `None` when the plan
    /// references an action with no primitive.
    pub fn append_plan_to_path(
        &self,
        plan: &Plan,
        path: &mut ContinuousPath,
    ) -> Option<LatticeState> {
        let mut state = plan.start.unpack();
        for step in &plan.steps {
            let prim = self.forward.get(state.theta as usize)?.get(step.action)?;
            let origin = self.continuize(&state).position();
            for segment in &prim.segments {
                path.push(segment.translate(origin));
            }
            state = state.offset_by(&prim.end_offset, self.num_angles);
        }
        Some(state)
    }

    /// Convert a whole plan into a continuous drivable path.
    pub fn plan_to_path(&self, plan: &Plan) -> Option<ContinuousPath> {
        let mut path = ContinuousPath::new();
        self.append_plan_to_path(plan, &mut path)?;
        Some(path)
    }

    // --- Distances -------------------------------------------------------

    /// Euclidean distance between two lattice states' cell centers.
    pub fn distance_between(&self, a: &LatticeState, b: &LatticeState) -> f32 {
        self.continuize(a).position().distance(&self.continuize(b).position())
    }

    /// Minimum angular distance between two states' headings, treating a
    /// heading and its opposite as equivalent.
    pub fn heading_distance_between(&self, a: &LatticeState, b: &LatticeState) -> f32 {
        min_angle_between(
            self.angles[a.theta as usize],
            self.angles[b.theta as usize],
        )
    }
}

fn validate_lattice_shape(
    num_angles: usize,
    actions: &[ActionType],
    angle_definitions: &[f32],
    angle_lists: usize,
) -> Result<()> {
    if num_angles == 0 {
        return Err(PlannerError::Definition {
            context: "num_angles must be positive".into(),
            fragment: "{\"num_angles\": 0}".into(),
        });
    }
    if angle_definitions.len() != num_angles || angle_lists != num_angles {
        return Err(PlannerError::Definition {
            context: format!(
                "expected {} angle definitions and lists, found {} and {}",
                num_angles,
                angle_definitions.len(),
                angle_lists
            ),
            fragment: format!("{{\"num_angles\": {num_angles}}}"),
        });
    }
    for (i, action) in actions.iter().enumerate() {
        if action.id != i {
            return Err(definition_error("action ids must be 0..n in order", action));
        }
    }
    Ok(())
}

fn definition_error<T: serde::Serialize>(context: &str, fragment: &T) -> PlannerError {
    PlannerError::Definition {
        context: context.to_owned(),
        fragment: serde_json::to_string(fragment)
            .unwrap_or_else(|_| "<unserializable>".to_owned()),
    }
}

fn derive_reverse_table(
    forward: &[Vec<MotionPrimitive>],
    num_angles: usize,
    resolution_mm: f32,
) -> Vec<Vec<MotionPrimitive>> {
    let mut reverse = vec![Vec::new(); num_angles];
    for prims in forward {
        for prim in prims {
            let reversed = prim.reversed(num_angles, resolution_mm);
            reverse[reversed.start_theta].push(reversed);
        }
    }
    for list in &mut reverse {
        list.sort_by_key(|p| p.action_id);
    }
    reverse
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::TWO_PI;
    use crate::io::{AngleDefinition, PrimitiveDefinition};
    use crate::lattice::{PrimitiveGeometry, StateOffset};
    use crate::obstacles::FATAL_COST;

    /// One forward "straight 10 mm" action per angle, resolution 10 mm.
    fn straight_definition(num_angles: usize) -> PrimitiveSetDefinition {
        let resolution = 10.0;
        let length = 10.0;
        let angle_definitions: Vec<f32> = (0..num_angles)
            .map(|i| i as f32 * TWO_PI / num_angles as f32)
            .collect();
        let angles = angle_definitions
            .iter()
            .map(|&heading| {
                let end_x = (length * heading.cos() / resolution).round() as i32;
                let end_y = (length * heading.sin() / resolution).round() as i32;
                AngleDefinition {
                    prims: vec![PrimitiveDefinition {
                        action_index: 0,
                        end_pose: StateOffset {
                            x: end_x,
                            y: end_y,
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
                }
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
        LatticeEnvironment::from_definition(
            &straight_definition(num_angles),
            RobotParams::default(),
        )
        .unwrap()
    }

    fn fatal_square(center_x: f32, center_y: f32, side: f32) -> ConvexPolygon {
        let half = side / 2.0;
        ConvexPolygon::rectangle(
            Point2D::new(center_x - half, center_y - half),
            Point2D::new(center_x + half, center_y + half),
        )
    }

    #[test]
    fn test_discretize_continuize_round_trip() {
        let env = test_environment(16);
        let state = LatticeState::new(3, -2, 5);
        assert_eq!(env.discretize(&env.continuize(&state)), state);
    }

    #[test]
    fn test_nearest_theta_wraps() {
        let env = test_environment(16);
        assert_eq!(env.nearest_theta(0.01), 0);
        assert_eq!(env.nearest_theta(-0.01), 0);
        assert_eq!(env.nearest_theta(TWO_PI / 16.0 + 0.01), 1);
    }

    #[test]
    fn test_apply_action_matches_end_offset_regardless_of_obstacles() {
        let mut env = test_environment(16);
        let state = LatticeState::new(0, 0, 0);

        let clear = env.apply_action(&state, 0, false).unwrap();
        assert_eq!(clear.state, LatticeState::new(1, 0, 0));
        assert_eq!(clear.penalty, 0.0);

        // A wall across the trajectory changes the penalty, never the state.
        env.add_obstacle_all_thetas(&fatal_square(5.0, 0.0, 2.0), FATAL_COST);
        env.prepare_for_planning();

        let unchecked = env.apply_action(&state, 0, false).unwrap();
        assert_eq!(unchecked.state, clear.state);
        assert_eq!(unchecked.penalty, 0.0);

        let checked = env.apply_action(&state, 0, true).unwrap();
        assert_eq!(checked.state, clear.state);
        assert!(checked.penalty >= FATAL_COST);
    }

    #[test]
    fn test_apply_action_soft_penalty() {
        let mut env = test_environment(16);
        env.add_obstacle_all_thetas(&fatal_square(5.0, 0.0, 2.0), 10.0);
        env.prepare_for_planning();

        let applied = env
            .apply_action(&LatticeState::new(0, 0, 0), 0, true)
            .unwrap();
        assert_eq!(applied.state, LatticeState::new(1, 0, 0));
        assert!(applied.penalty > 0.0);
        assert!(applied.penalty < FATAL_COST);
    }

    #[test]
    fn test_apply_action_invalid_id() {
        let env = test_environment(16);
        assert!(env.apply_action(&LatticeState::new(0, 0, 0), 7, false).is_none());
    }

    #[test]
    fn test_round_safe_prefers_nearest_free_cell() {
        let mut env = test_environment(16);
        let pose = Pose2D::new(12.0, 0.0, 0.0);
        // No obstacles: rounds to the nearest cell.
        assert_eq!(env.round_safe(&pose), Some(LatticeState::new(1, 0, 0)));

        // Block the nearest cell; the next candidate wins.
        env.add_obstacle_all_thetas(&fatal_square(10.0, 0.0, 4.0), FATAL_COST);
        env.prepare_for_planning();
        assert_eq!(env.round_safe(&pose), Some(LatticeState::new(2, 0, 0)));
    }

    #[test]
    fn test_round_safe_fails_when_blocked() {
        let mut env = test_environment(16);
        env.add_obstacle_all_thetas(&fatal_square(0.0, 0.0, 200.0), FATAL_COST);
        env.prepare_for_planning();
        assert_eq!(env.round_safe(&Pose2D::new(0.0, 0.0, 0.0)), None);
    }

    #[test]
    fn test_distance_between_properties() {
        let env = test_environment(16);
        let a = LatticeState::new(0, 0, 0);
        let b = LatticeState::new(3, 4, 7);
        assert_eq!(env.distance_between(&a, &a), 0.0);
        assert_eq!(env.distance_between(&a, &b), env.distance_between(&b, &a));
        assert!((env.distance_between(&a, &b) - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_heading_distance_opposite_headings_equivalent() {
        let env = test_environment(16);
        let a = LatticeState::new(0, 0, 0);
        let b = LatticeState::new(0, 0, 8); // π away
        assert!(env.heading_distance_between(&a, &b) < 1e-5);
    }

    #[test]
    fn test_dump_import_round_trip() {
        let env = test_environment(8);
        let dump = env.dump();
        let imported = LatticeEnvironment::import(&dump, RobotParams::default()).unwrap();
        assert_eq!(imported.dump(), dump);
    }

    #[test]
    fn test_import_preserves_cost_verbatim() {
        let env = test_environment(4);
        let mut dump = env.dump();
        // Tamper with a cost; import must not recompute it away.
        dump.angles[0].prims[0].cost = 42.0;
        let imported = LatticeEnvironment::import(&dump, RobotParams::default()).unwrap();
        assert_eq!(imported.primitives(0, false)[0].cost, 42.0);
    }

    #[test]
    fn test_obstacle_snapshot_round_trip() {
        let mut env = test_environment(4);
        env.add_obstacle_all_thetas(&fatal_square(30.0, 0.0, 10.0), 25.0);
        let snapshot = env.obstacle_snapshot();

        let mut other = test_environment(4);
        other.import_obstacles(&snapshot).unwrap();
        assert_eq!(other.obstacle_snapshot(), snapshot);
    }

    #[test]
    fn test_obstacle_snapshot_angle_mismatch() {
        let mut env = test_environment(4);
        let snapshot = ObstacleSnapshot {
            angles: vec![ObstacleAngleSnapshot::default(); 3],
        };
        assert!(matches!(
            env.import_obstacles(&snapshot),
            Err(PlannerError::Definition { .. })
        ));
    }

    #[test]
    fn test_missing_action_rejected() {
        let mut def = straight_definition(4);
        def.angles[2].prims.clear();
        let result = LatticeEnvironment::from_definition(&def, RobotParams::default());
        assert!(matches!(result, Err(PlannerError::Definition { .. })));
    }

    #[test]
    fn test_path_segment_penalty_and_safety() {
        let mut env = test_environment(16);
        let clear_segment = PathSegment::Line {
            start: Point2D::new(0.0, 50.0),
            end: Point2D::new(10.0, 50.0),
        };
        let blocked_segment = PathSegment::Line {
            start: Point2D::new(0.0, 0.0),
            end: Point2D::new(10.0, 0.0),
        };
        env.add_obstacle_all_thetas(&fatal_square(5.0, 0.0, 2.0), FATAL_COST);
        env.prepare_for_planning();

        assert_eq!(env.apply_path_segment(&clear_segment), 0.0);
        assert!(env.apply_path_segment(&blocked_segment) >= FATAL_COST);
        assert!(env.path_is_safe(&[clear_segment.clone()]));
        assert!(!env.path_is_safe(&[clear_segment, blocked_segment]));
    }
}
