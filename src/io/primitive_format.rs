//! Motion-primitive definition and dump formats.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::lattice::{ActionType, PrimitiveGeometry, StateOffset};

/// Continuous trajectory sample as authored in the definition file.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntermediatePose {
    pub x_mm: f32,
    pub y_mm: f32,
    pub theta_rads: f32,
}

/// One primitive of the definition format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveDefinition {
    /// Action this primitive realizes.
    pub action_index: usize,

    /// Discrete end-state offset (cells and heading steps).
    pub end_pose: StateOffset,

    /// Trajectory samples ordered start to end, in the primitive-local
    /// frame.
    #[serde(default)]
    pub intermediate_poses: Vec<IntermediatePose>,

    /// Authored trajectory geometry (straight / arc / turn in place).
    #[serde(flatten)]
    pub geometry: PrimitiveGeometry,
}

/// All primitives starting from one discretized heading.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AngleDefinition {
    #[serde(default)]
    pub prims: Vec<PrimitiveDefinition>,
}

/// The primitive definition file: the lattice geometry, the action list,
/// and one primitive per (heading, action) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveSetDefinition {
    /// Lattice cell size in millimeters.
    pub resolution_mm: f32,

    /// Number of discretized headings.
    pub num_angles: usize,

    /// Action metadata, ids 0..n in order.
    pub actions: Vec<ActionType>,

    /// Heading in radians for each discretized angle index.
    pub angle_definitions: Vec<f32>,

    /// Per-heading primitive lists.
    pub angles: Vec<AngleDefinition>,
}

impl PrimitiveSetDefinition {
    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One primitive of the dump format: the definition fields plus the
/// computed values, so import skips kinematic recomputation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveDump {
    pub action_index: usize,

    /// Computed traversal cost, stored verbatim.
    pub cost: f32,

    /// Discretized heading the primitive starts from.
    pub start_theta: usize,

    /// Discrete end-state offset.
    pub end_state_offset: StateOffset,

    #[serde(default)]
    pub intermediate_poses: Vec<IntermediatePose>,

    #[serde(flatten)]
    pub geometry: PrimitiveGeometry,
}

/// All dumped primitives starting from one discretized heading.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AngleDump {
    #[serde(default)]
    pub prims: Vec<PrimitiveDump>,
}

/// Round-trippable dump of an environment's immutable tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentDump {
    pub resolution_mm: f32,
    pub num_angles: usize,
    pub actions: Vec<ActionType>,
    pub angle_definitions: Vec<f32>,
    pub angles: Vec<AngleDump>,
}

impl EnvironmentDump {
    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
