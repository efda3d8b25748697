//! # Application
//!
//! The Argo CD `Application` resource and its spec/status.

use super::{ApplicationSource, Extra, Operation, OperationState};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

/// Argo CD Application (`argoproj.io/v1alpha1`)
///
/// # Example
///
/// ```yaml
/// apiVersion: argoproj.io/v1alpha1
/// kind: Application
/// metadata:
///   name: guestbook
///   namespace: argocd
///   annotations:
///     kargo.akuity.io/authorized-stage: my-project:test
/// spec:
///   source:
///     repoURL: https://github.com/example/guestbook.git
///     path: overlays/test
///     targetRevision: main
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ApplicationSpec,
    /// Operation requested on the Application, consumed by the Argo CD
    /// application controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
}

impl Application {
    #[must_use]
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or_default()
    }

    /// Look up an annotation value
    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(key))
            .map(String::as_str)
    }

    /// Current operation state as last reported by Argo CD
    #[must_use]
    pub fn operation_state(&self) -> Option<&OperationState> {
        self.status.as_ref().and_then(|s| s.operation_state.as_ref())
    }

    /// Whether the Application uses the `spec.sources` list rather than the
    /// legacy singular `spec.source`
    #[must_use]
    pub fn has_multiple_sources(&self) -> bool {
        !self.spec.sources.is_empty()
    }

    /// Sources normalized to a list: `spec.sources` when set, otherwise the
    /// singular `spec.source`, otherwise empty
    #[must_use]
    pub fn sources(&self) -> Vec<ApplicationSource> {
        if self.has_multiple_sources() {
            self.spec.sources.clone()
        } else {
            self.spec.source.iter().cloned().collect()
        }
    }
}

/// Application spec
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ApplicationSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<ApplicationSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_policy: Option<SyncPolicy>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Application sync policy
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automated: Option<SyncPolicyAutomated>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sync_options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryStrategy>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Automated sync settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPolicyAutomated {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub prune: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub self_heal: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Retry policy for failed syncs
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryStrategy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<RetryBackoff>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryBackoff {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Application status
///
/// Only `operationState` is typed; sync, health, resources and history are
/// kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_state: Option<OperationState>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sources_prefers_list() {
        let app: Application = serde_json::from_value(json!({
            "metadata": {"name": "app", "namespace": "argocd"},
            "spec": {
                "source": {"repoURL": "https://example.com/single.git"},
                "sources": [
                    {"repoURL": "https://example.com/a.git"},
                    {"repoURL": "https://example.com/b.git"}
                ]
            }
        }))
        .unwrap();

        assert!(app.has_multiple_sources());
        let sources = app.sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].repo_url, "https://example.com/a.git");
    }

    #[test]
    fn test_sources_falls_back_to_single() {
        let app: Application = serde_json::from_value(json!({
            "metadata": {"name": "app"},
            "spec": {"source": {"repoURL": "https://example.com/single.git"}}
        }))
        .unwrap();

        assert!(!app.has_multiple_sources());
        assert_eq!(app.sources().len(), 1);
    }

    #[test]
    fn test_sources_empty() {
        let app = Application::default();
        assert!(app.sources().is_empty());
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = json!({
            "apiVersion": "argoproj.io/v1alpha1",
            "kind": "Application",
            "metadata": {"name": "app", "namespace": "argocd"},
            "spec": {
                "project": "default",
                "destination": {"server": "https://kubernetes.default.svc", "namespace": "guestbook"},
                "source": {"repoURL": "https://example.com/repo.git", "path": "guestbook", "directory": {"recurse": true}},
                "syncPolicy": {"automated": {"prune": true}, "syncOptions": ["CreateNamespace=true"]}
            },
            "status": {
                "health": {"status": "Healthy"},
                "sync": {"status": "Synced", "revision": "abc"}
            }
        });

        let app: Application = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&app).unwrap(), raw);
    }

    #[test]
    fn test_retry_policy_keeps_unknown_fields() {
        let raw = json!({
            "limit": 5,
            "refresh": true,
            "backoff": {"duration": "5s", "factor": 2, "maxDuration": "3m", "jitter": "10%"}
        });

        let retry: RetryStrategy = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(retry.limit, Some(5));
        assert_eq!(retry.extra.get("refresh"), Some(&json!(true)));
        assert_eq!(serde_json::to_value(&retry).unwrap(), raw);
    }
}
