//! Kubernetes-standard status condition helpers
//!
//! Condition types written by this crate and the helpers that keep
//! `lastTransitionTime` stable while a condition's status does not change.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Condition status values
pub const CONDITION_TRUE: &str = "True";
pub const CONDITION_FALSE: &str = "False";

// Condition types
pub const CONDITION_READY: &str = "Ready";
pub const CONDITION_SPEC_VALID: &str = "SpecValid";

// Reasons
pub const REASON_VALID: &str = "Valid";
pub const REASON_INVALID_SPEC: &str = "InvalidSpec";

/// Condition represents a condition of a resource
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    /// Last transition time (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    /// Reason for the condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Condition {
    pub fn is_true(&self) -> bool {
        self.status == CONDITION_TRUE
    }
}

/// Build a condition stamped with `at`
pub fn build_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: impl Into<String>,
    at: DateTime<Utc>,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        last_transition_time: Some(at.to_rfc3339()),
        reason: Some(reason.to_string()),
        message: Some(message.into()),
    }
}

/// Condition status string for a boolean
pub fn status_of(value: bool) -> &'static str {
    if value {
        CONDITION_TRUE
    } else {
        CONDITION_FALSE
    }
}

pub fn find_condition<'a>(conditions: &'a [Condition], condition_type: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Set or update a condition in a list, preserving lastTransitionTime when status hasn't changed.
///
/// Returns true when the list changed.
pub fn set_condition(conditions: &mut Vec<Condition>, new: Condition) -> bool {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == new.r#type) {
        if existing.status != new.status {
            *existing = new;
            true
        } else if existing.reason != new.reason || existing.message != new.message {
            existing.reason = new.reason;
            existing.message = new.message;
            true
        } else {
            false
        }
    } else {
        conditions.push(new);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
    }

    #[test]
    fn test_build_condition() {
        let cond = build_condition(CONDITION_READY, CONDITION_TRUE, "Ready", "control plane is ready", at(0));
        assert_eq!(cond.r#type, "Ready");
        assert!(cond.is_true());
        assert_eq!(cond.reason.as_deref(), Some("Ready"));
        assert!(cond.last_transition_time.is_some());
    }

    #[test]
    fn test_set_condition_adds_new() {
        let mut conditions = Vec::new();
        assert!(set_condition(
            &mut conditions,
            build_condition(CONDITION_SPEC_VALID, CONDITION_TRUE, REASON_VALID, "", at(0))
        ));
        assert_eq!(conditions.len(), 1);
    }

    #[test]
    fn test_set_condition_preserves_transition_time_when_status_unchanged() {
        let mut conditions = vec![build_condition(CONDITION_READY, CONDITION_FALSE, "NotReady", "waiting", at(0))];
        let original_time = conditions[0].last_transition_time.clone();

        assert!(set_condition(
            &mut conditions,
            build_condition(CONDITION_READY, CONDITION_FALSE, "Upgrading", "rolling out", at(5))
        ));
        assert_eq!(conditions[0].last_transition_time, original_time);
        assert_eq!(conditions[0].reason.as_deref(), Some("Upgrading"));
    }

    #[test]
    fn test_set_condition_updates_transition_time_on_status_change() {
        let mut conditions = vec![build_condition(CONDITION_READY, CONDITION_FALSE, "NotReady", "waiting", at(0))];

        set_condition(
            &mut conditions,
            build_condition(CONDITION_READY, CONDITION_TRUE, "Ready", "ready", at(5)),
        );
        assert_eq!(conditions[0].last_transition_time, Some(at(5).to_rfc3339()));
    }

    #[test]
    fn test_set_condition_reports_no_change() {
        let mut conditions = vec![build_condition(CONDITION_READY, CONDITION_TRUE, "Ready", "ready", at(0))];
        assert!(!set_condition(
            &mut conditions,
            build_condition(CONDITION_READY, CONDITION_TRUE, "Ready", "ready", at(9))
        ));
        assert!(find_condition(&conditions, CONDITION_READY).is_some());
        assert!(find_condition(&conditions, CONDITION_SPEC_VALID).is_none());
    }
}
