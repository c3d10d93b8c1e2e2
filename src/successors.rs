//! Lazy successor enumeration for the external lattice search.

use log::warn;

use crate::core::Point2D;
use crate::environment::LatticeEnvironment;
use crate::lattice::{LatticeState, StateId};
use crate::obstacles::FATAL_COST;

/// A candidate next state reachable by one action.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Successor {
    /// Packed resulting state.
    pub state: StateId,
    /// Accumulated path cost: `g + primitive cost + penalty`.
    pub total_cost: f32,
    /// The soft obstacle penalty alone.
    pub penalty: f32,
    /// Action id of the primitive that produced this successor.
    pub action: usize,
}

/// Lazy edge producer over an environment, a state, and an accumulated
/// cost.
///
/// Successors are yielded in increasing action-id order. The iterator is
/// finite and not rewindable; construct a new one to re-enumerate.
/// Candidates whose trajectory crosses a fatal obstacle are dead ends and
/// produce no successor.
pub struct SuccessorIterator<'a> {
    env: &'a LatticeEnvironment,
    state: LatticeState,
    /// Continuous position of `state`; primitive-local geometry is
    /// anchored here for both the forward and reverse tables.
    origin: Point2D,
    g: f32,
    reverse: bool,
    next_index: usize,
    warned_unprepared: bool,
}

impl<'a> SuccessorIterator<'a> {
    pub(crate) fn new(
        env: &'a LatticeEnvironment,
        state: LatticeState,
        g: f32,
        reverse: bool,
    ) -> Self {
        debug_assert!((state.theta as usize) < env.num_angles());
        let origin = env.continuize(&state).position();
        Self {
            env,
            state,
            origin,
            g,
            reverse,
            next_index: 0,
            warned_unprepared: false,
        }
    }
}

impl Iterator for SuccessorIterator<'_> {
    type Item = Successor;

    fn next(&mut self) -> Option<Successor> {
        let prims = self.env.primitives(self.state.theta as usize, self.reverse);
        let obstacles = self.env.obstacle_table();

        while self.next_index < prims.len() {
            let prim = &prims[self.next_index];
            self.next_index += 1;

            // Broad phase: reject primitives whose world bounds overlap no
            // cached obstacle bounds. A missing cache with live obstacles
            // means prepare_for_planning was skipped; degrade to checking
            // everything.
            let world_bounds = prim.bounds.translate(self.origin);
            let might_collide = if obstacles.is_prepared() {
                obstacles
                    .union_bounds()
                    .iter()
                    .any(|bounds| bounds.intersects(&world_bounds))
            } else {
                if !self.warned_unprepared {
                    warn!("successor generation without prepared obstacle bounds; treating every primitive as potentially colliding");
                    self.warned_unprepared = true;
                }
                true
            };

            let penalty = if might_collide {
                let action_reverse = self.env.actions()[prim.action_id].reverse;
                self.env
                    .primitive_penalty(prim, self.origin, action_reverse)
            } else {
                0.0
            };
            if penalty >= FATAL_COST {
                continue;
            }

            let next_state = self.state.offset_by(&prim.end_offset, self.env.num_angles());
            debug_assert!(self.reverse || prim.action_id == self.next_index - 1);
            debug_assert!(penalty.is_finite() && (self.g + prim.cost + penalty).is_finite());

            return Some(Successor {
                state: next_state.id(),
                total_cost: self.g + prim.cost + penalty,
                penalty,
                action: prim.action_id,
            });
        }
        None
    }
}
