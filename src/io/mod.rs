//! JSON formats: primitive definitions, environment dumps, and obstacle
//! snapshots.
//!
//! The definition format is what primitive authoring tools produce; loading
//! it recomputes costs from the robot's kinematics. The dump format
//! additionally stores the computed cost, start heading, and end-state
//! offset per primitive, so importing a dump skips kinematic recomputation
//! entirely. Obstacle snapshots round-trip the live obstacle lists. All
//! three load paths fail fast: a malformed file rejects the whole load and
//! the error carries the offending fragment.

pub mod obstacle_format;
pub mod primitive_format;

pub use obstacle_format::{ObstacleAngleSnapshot, ObstacleRecord, ObstacleSnapshot};
pub use primitive_format::{
    AngleDefinition, AngleDump, EnvironmentDump, IntermediatePose, PrimitiveDefinition,
    PrimitiveDump, PrimitiveSetDefinition,
};
