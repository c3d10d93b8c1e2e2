//! Discretized states, actions, path segments, and motion primitives.
//!
//! The lattice discretizes the continuous (x, y, heading) configuration
//! space into grid cells and a fixed set of headings. Motion between
//! lattice states happens along precomputed motion primitives: short
//! kinematically feasible trajectories, one table entry per (start heading,
//! action) pair.

pub mod action;
pub mod primitive;
pub mod segment;
pub mod state;

pub use action::ActionType;
pub use primitive::{ArcGeometry, MotionPrimitive, PrimitiveGeometry, StateOffset, SweptSample};
pub use segment::{ContinuousPath, PathSegment};
pub use state::{LatticeState, StateId};
