//! Error types for MargaPlan.

use thiserror::Error;

/// MargaPlan error type.
///
/// Load-time errors are fail-fast: a malformed definition rejects the whole
/// environment rather than producing a partially populated one. Runtime
/// collision outcomes are never errors; they are reported as penalties by
/// the environment's query methods.
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Structurally incomplete or inconsistent definition data. Carries the
    /// offending JSON fragment for diagnostics.
    #[error("invalid definition ({context}): {fragment}")]
    Definition { context: String, fragment: String },

    /// A motion primitive whose computed cost is not strictly positive.
    /// This is a data-integrity bug in the authored primitive file.
    #[error("non-positive cost {cost} for action '{action}' at start angle {start_theta}")]
    NonPositiveCost {
        action: String,
        start_theta: usize,
        cost: f32,
    },
}

pub type Result<T> = std::result::Result<T, PlannerError>;
