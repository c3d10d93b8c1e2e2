//! Action metadata.

use serde::{Deserialize, Serialize};

fn default_extra_cost_factor() -> f32 {
    1.0
}

/// A named class of motion (forward, reverse, turn in place, ...).
///
/// The `id` is assigned by the primitive definition file and stays stable
/// once assigned; plans and successor records refer to actions by it.
/// Serializes with the wire field names of the definition format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionType {
    /// Stable action identifier (index into each angle's primitive list).
    #[serde(rename = "index")]
    pub id: usize,

    /// Human-readable name, e.g. "forward_short" or "turn_left".
    pub name: String,

    /// Cost multiplier applied after kinematic costing (default: 1.0).
    #[serde(default = "default_extra_cost_factor")]
    pub extra_cost_factor: f32,

    /// Whether the robot drives backwards along this action.
    #[serde(default, rename = "reverse_action")]
    pub reverse: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let json = r#"{"index": 2, "name": "back_up", "reverse_action": true}"#;
        let action: ActionType = serde_json::from_str(json).unwrap();
        assert_eq!(action.id, 2);
        assert_eq!(action.name, "back_up");
        assert!(action.reverse);
        assert_eq!(action.extra_cost_factor, 1.0);

        let round = serde_json::to_string(&action).unwrap();
        let again: ActionType = serde_json::from_str(&round).unwrap();
        assert_eq!(again, action);
    }
}
