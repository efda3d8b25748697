//! # Types
//!
//! Core types for the Application updater: the updater itself and the errors
//! a reconciliation pass can end with.

use crate::config::UpdaterConfig;
use crate::crd::OperationPhase;
use crate::provider::ApplicationClient;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors a reconciliation pass can end with
///
/// Terminal errors cannot be fixed by retrying the pass, see
/// [`UpdateError::is_terminal`].
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("invalid argocd-update configuration: {0:#}")]
    InvalidConfig(anyhow::Error),

    #[error(
        "Argo CD Application {name:?} in namespace {namespace:?} does not permit mutation by Stage {stage:?} in project {project:?}"
    )]
    Unauthorized {
        namespace: String,
        name: String,
        project: String,
        stage: String,
    },

    #[error(
        "unable to parse value of annotation {annotation:?} ({value:?}) on Argo CD Application {name:?} in namespace {namespace:?}: {reason}"
    )]
    InvalidAuthorization {
        namespace: String,
        name: String,
        annotation: String,
        value: String,
        reason: String,
    },

    #[error("Argo CD Application {name:?} in namespace {namespace:?} not found")]
    ApplicationNotFound { namespace: String, name: String },

    #[error("error getting Argo CD Application {name:?} in namespace {namespace:?}: {error:#}")]
    Fetch {
        namespace: String,
        name: String,
        error: anyhow::Error,
    },

    #[error("error syncing Argo CD Application {name:?} in namespace {namespace:?}: {error:#}")]
    Patch {
        namespace: String,
        name: String,
        error: anyhow::Error,
    },

    #[error(
        "error recording sync event for Argo CD Application {name:?} in namespace {namespace:?}: {error:#}"
    )]
    Event {
        namespace: String,
        name: String,
        error: anyhow::Error,
    },

    #[error(
        "no source of Argo CD Application {name:?} in namespace {namespace:?} matched update intended for source with repoURL {repo_url}{}",
        fmt_chart(.chart)
    )]
    NoMatchingSource {
        namespace: String,
        name: String,
        repo_url: String,
        chart: Option<String>,
    },

    #[error(
        "Argo CD Application {name:?} in namespace {namespace:?} has {sources} source(s) but {revisions} desired revision(s) were computed"
    )]
    SourceMismatch {
        namespace: String,
        name: String,
        sources: usize,
        revisions: usize,
    },

    #[error("Argo CD Application {name:?} in namespace {namespace:?} failed with: {message}")]
    OperationFailed {
        namespace: String,
        name: String,
        message: String,
    },

    #[error("could not determine promotion step status from operation phases [{}]", fmt_phases(.phases))]
    UnknownPhases { phases: Vec<OperationPhase> },
}

fn fmt_chart(chart: &Option<String>) -> String {
    chart
        .as_deref()
        .map(|c| format!(" and chart {c:?}"))
        .unwrap_or_default()
}

fn fmt_phases(phases: &[OperationPhase]) -> String {
    phases
        .iter()
        .map(OperationPhase::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl UpdateError {
    /// Whether retrying the pass can never succeed
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UpdateError::InvalidConfig(_)
                | UpdateError::Unauthorized { .. }
                | UpdateError::InvalidAuthorization { .. }
                | UpdateError::OperationFailed { .. }
        )
    }

    /// Short label used for the errors metric
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateError::InvalidConfig(_) => "invalid_config",
            UpdateError::Unauthorized { .. } => "unauthorized",
            UpdateError::InvalidAuthorization { .. } => "invalid_authorization",
            UpdateError::ApplicationNotFound { .. } => "application_not_found",
            UpdateError::Fetch { .. } => "fetch",
            UpdateError::Patch { .. } => "patch",
            UpdateError::Event { .. } => "event",
            UpdateError::NoMatchingSource { .. } => "no_matching_source",
            UpdateError::SourceMismatch { .. } => "source_mismatch",
            UpdateError::OperationFailed { .. } => "operation_failed",
            UpdateError::UnknownPhases { .. } => "unknown_phases",
        }
    }
}

/// Drives `argocd-update` steps against Argo CD Applications
///
/// Holds no per-promotion state: every pass re-reads the live Applications
/// and decides from scratch.
#[derive(Clone)]
pub struct ArgoCdUpdater {
    pub(crate) client: Arc<dyn ApplicationClient>,
    pub(crate) config: UpdaterConfig,
}

impl fmt::Debug for ArgoCdUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgoCdUpdater")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ArgoCdUpdater {
    #[must_use]
    pub fn new(client: Arc<dyn ApplicationClient>, config: UpdaterConfig) -> Self {
        Self { client, config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_matching_source_message() {
        let err = UpdateError::NoMatchingSource {
            namespace: "argocd".to_string(),
            name: "app".to_string(),
            repo_url: "https://example.com/charts".to_string(),
            chart: Some("guestbook".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("repoURL https://example.com/charts"));
        assert!(msg.contains("chart \"guestbook\""));

        let err = UpdateError::NoMatchingSource {
            namespace: "argocd".to_string(),
            name: "app".to_string(),
            repo_url: "https://example.com/repo.git".to_string(),
            chart: None,
        };
        assert!(!err.to_string().contains("chart"));
    }

    #[test]
    fn test_unknown_phases_message() {
        let err = UpdateError::UnknownPhases {
            phases: vec![
                OperationPhase::Succeeded,
                OperationPhase::Other("Paused".to_string()),
            ],
        };
        assert!(err.to_string().ends_with("[Succeeded, Paused]"));
    }

    #[test]
    fn test_terminal_errors() {
        assert!(UpdateError::InvalidConfig(anyhow::anyhow!("bad")).is_terminal());
        assert!(
            UpdateError::Unauthorized {
                namespace: String::new(),
                name: String::new(),
                project: String::new(),
                stage: String::new(),
            }
            .is_terminal()
        );
        assert!(
            !UpdateError::Fetch {
                namespace: String::new(),
                name: String::new(),
                error: anyhow::anyhow!("connection refused"),
            }
            .is_terminal()
        );
        assert!(
            !UpdateError::ApplicationNotFound {
                namespace: String::new(),
                name: String::new(),
            }
            .is_terminal()
        );
    }
}
