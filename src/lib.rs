//! # Marga-Plan: Lattice Motion-Planning Environment
//!
//! A discretized-configuration-space ("xytheta") planning environment for
//! differential-drive robots: the data structures and queries that turn a
//! continuous robot footprint, a motion-primitive library, and a live
//! obstacle map into a searchable graph of discrete (x, y, heading) states
//! with edge costs. The graph search itself (A*, ARA*, ...) lives outside
//! this crate and drives the environment through
//! [`LatticeEnvironment::get_successors`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use marga_plan::{LatticeEnvironment, LatticeState, RobotParams};
//! use std::path::Path;
//!
//! let mut env = LatticeEnvironment::from_definition_file(
//!     Path::new("primitives.json"),
//!     RobotParams::default(),
//! ).unwrap();
//!
//! // Perception updates obstacles every planning cycle.
//! env.prepare_for_planning();
//!
//! // The search expands states through the successor iterator.
//! for successor in env.get_successors(&LatticeState::new(0, 0, 0), 0.0, false) {
//!     println!("action {} -> cost {:.3}", successor.action, successor.total_cost);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: geometry value types (points, bounds, poses, convex polygons)
//! - [`config`]: robot kinematic parameters
//! - [`lattice`]: discretized states, actions, path segments, motion
//!   primitives
//! - [`obstacles`]: per-heading obstacle lists with broad-phase bounds
//! - [`cspace`]: Minkowski-difference configuration-space expansion
//! - [`environment`]: the planning environment and its queries
//! - [`successors`]: lazy successor enumeration for the external search
//! - [`plan`]: action-sequence plans and replanning checks
//! - [`io`]: JSON definition, dump, and obstacle-snapshot formats
//!
//! ## Data Flow
//!
//! ```text
//!   primitive definition ──► LatticeEnvironment ◄── obstacle updates
//!        (startup, JSON)      │  forward/reverse     (every cycle)
//!                             │  primitive tables,
//!                             │  per-heading obstacles
//!                             ▼
//!                     get_successors(state, g)
//!                             │ lazy, broad+narrow phase
//!                             ▼
//!                    external lattice search ──► Plan
//!                                                 │ append_plan_to_path
//!                                                 ▼
//!                                          ContinuousPath ──► execution
//!                                                 │ plan_is_safe
//!                                                 ▼
//!                                          replan decision
//! ```
//!
//! ## Concurrency
//!
//! The environment is a synchronous, single-threaded library. Queries take
//! `&self` and obstacle mutation takes `&mut self`, so the borrow checker
//! enforces the single-writer discipline: the obstacle set cannot change
//! while a successor iterator borrows the environment.

pub mod config;
pub mod core;
pub mod cspace;
pub mod environment;
pub mod error;
pub mod io;
pub mod lattice;
pub mod obstacles;
pub mod plan;
pub mod successors;

pub use config::RobotParams;
pub use environment::{
    AppliedAction, LatticeEnvironment, PATH_PENALTY_TOLERANCE, REPLAN_PENALTY_BUFFER,
    REVERSE_CONTACT_PENALTY,
};
pub use error::{PlannerError, Result};
pub use lattice::{
    ActionType, ContinuousPath, LatticeState, MotionPrimitive, PathSegment, StateId,
};
pub use obstacles::{Obstacle, ObstacleTable, FATAL_COST};
pub use plan::{Plan, PlanStep, ReplanCheck};
pub use successors::{Successor, SuccessorIterator};
