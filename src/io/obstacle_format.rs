//! Obstacle snapshot format.
//!
//! One entry per discretized heading, symmetric with the environment's
//! obstacle dump/import pair: `{ "angles": [ { "obstacles": [ { "cost":
//! 12.5, "poly": [ {"x": ..., "y": ...}, ... ] } ] } ] }`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::Point2D;
use crate::error::Result;

/// One serialized obstacle: a cost and a clockwise convex polygon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleRecord {
    pub cost: f32,
    pub poly: Vec<Point2D>,
}

/// Obstacles at one discretized heading.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObstacleAngleSnapshot {
    #[serde(default)]
    pub obstacles: Vec<ObstacleRecord>,
}

/// A full obstacle-set snapshot, one entry per discretized heading.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSnapshot {
    pub angles: Vec<ObstacleAngleSnapshot>,
}

impl ObstacleSnapshot {
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
