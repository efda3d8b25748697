//! # Operations
//!
//! Sync operations requested on an Application and the state Argo CD
//! reports while processing them.

use super::{Extra, RetryStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation requested on an Application
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncOperation>,
    #[serde(default)]
    pub initiated_by: OperationInitiator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub info: Vec<Info>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryStrategy>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Operation {
    /// Value of the info entry with the given name, if present
    #[must_use]
    pub fn info_value(&self, name: &str) -> Option<&str> {
        self.info
            .iter()
            .find(|i| i.name == name)
            .map(|i| i.value.as_str())
    }
}

/// Who initiated an operation
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationInitiator {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    /// Set when the operation was started by an automated process
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub automated: bool,
}

/// Free-form name/value annotation on an operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Info {
    pub name: String,
    pub value: String,
}

/// Sync request details
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOperation {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub revision: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revisions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sync_options: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Live state of the current (or most recent) operation
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationState {
    #[serde(default)]
    pub operation: Operation,
    #[serde(default)]
    pub phase: OperationPhase,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_result: Option<SyncOperationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Result of a completed sync
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOperationResult {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub revision: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revisions: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl SyncOperationResult {
    /// Revisions the sync actually applied, one per source. Falls back to the
    /// singular `revision` for single-source Applications.
    #[must_use]
    pub fn observed_revisions(&self) -> Vec<String> {
        if self.revisions.is_empty() {
            vec![self.revision.clone()]
        } else {
            self.revisions.clone()
        }
    }
}

/// Lifecycle phase of an operation
///
/// Phases this crate does not know are kept verbatim in `Other` so they can
/// be reported instead of silently mapped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum OperationPhase {
    Running,
    Terminating,
    Failed,
    Error,
    Succeeded,
    Other(String),
}

impl OperationPhase {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            OperationPhase::Running => "Running",
            OperationPhase::Terminating => "Terminating",
            OperationPhase::Failed => "Failed",
            OperationPhase::Error => "Error",
            OperationPhase::Succeeded => "Succeeded",
            OperationPhase::Other(s) => s,
        }
    }

    /// Whether Argo CD has stopped working on the operation
    #[must_use]
    pub fn completed(&self) -> bool {
        !matches!(self, OperationPhase::Running | OperationPhase::Terminating)
    }

    #[must_use]
    pub fn failed(&self) -> bool {
        matches!(self, OperationPhase::Failed | OperationPhase::Error)
    }

    /// Severity used when several phases collapse into one step status.
    /// Higher is more severe; unknown phases have no rank.
    #[must_use]
    pub fn severity(&self) -> Option<u8> {
        match self {
            OperationPhase::Running | OperationPhase::Terminating => Some(2),
            OperationPhase::Failed | OperationPhase::Error => Some(1),
            OperationPhase::Succeeded => Some(0),
            OperationPhase::Other(_) => None,
        }
    }
}

impl Default for OperationPhase {
    fn default() -> Self {
        OperationPhase::Other(String::new())
    }
}

impl From<String> for OperationPhase {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Running" => OperationPhase::Running,
            "Terminating" => OperationPhase::Terminating,
            "Failed" => OperationPhase::Failed,
            "Error" => OperationPhase::Error,
            "Succeeded" => OperationPhase::Succeeded,
            _ => OperationPhase::Other(s),
        }
    }
}

impl From<OperationPhase> for String {
    fn from(phase: OperationPhase) -> Self {
        match phase {
            OperationPhase::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for OperationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_from_string() {
        assert_eq!(OperationPhase::from("Running".to_string()), OperationPhase::Running);
        assert_eq!(OperationPhase::from("Error".to_string()), OperationPhase::Error);
        assert_eq!(
            OperationPhase::from("Paused".to_string()),
            OperationPhase::Other("Paused".to_string())
        );
    }

    #[test]
    fn test_phase_serde() {
        let phase: OperationPhase = serde_json::from_str("\"Succeeded\"").unwrap();
        assert_eq!(phase, OperationPhase::Succeeded);
        assert_eq!(
            serde_json::to_string(&OperationPhase::Other("Weird".to_string())).unwrap(),
            "\"Weird\""
        );
    }

    #[test]
    fn test_phase_completed() {
        assert!(!OperationPhase::Running.completed());
        assert!(!OperationPhase::Terminating.completed());
        assert!(OperationPhase::Succeeded.completed());
        assert!(OperationPhase::Failed.completed());
        assert!(OperationPhase::Error.completed());
    }

    #[test]
    fn test_observed_revisions_fallback() {
        let single = SyncOperationResult {
            revision: "abc".to_string(),
            ..Default::default()
        };
        assert_eq!(single.observed_revisions(), vec!["abc".to_string()]);

        let multi = SyncOperationResult {
            revision: "ignored".to_string(),
            revisions: vec!["a".to_string(), "b".to_string()],
            ..Default::default()
        };
        assert_eq!(multi.observed_revisions(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_info_value() {
        let op = Operation {
            info: vec![Info {
                name: "Reason".to_string(),
                value: "because".to_string(),
            }],
            ..Default::default()
        };
        assert_eq!(op.info_value("Reason"), Some("because"));
        assert_eq!(op.info_value("missing"), None);
    }
}
