//! # Step Result
//!
//! Status reported back to the promotion scheduler after one pass.

use crate::constants::HEALTH_CHECK_KIND;
use crate::controller::reconciler::UpdateError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a promotion step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum StepStatus {
    Running,
    Succeeded,
    Failed,
    Errored,
}

impl StepStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Running => "Running",
            StepStatus::Succeeded => "Succeeded",
            StepStatus::Failed => "Failed",
            StepStatus::Errored => "Errored",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one reconciliation pass
#[derive(Debug)]
pub struct StepResult {
    pub status: StepStatus,
    /// Error detail, if the pass failed
    pub error: Option<UpdateError>,
    /// Criteria for the downstream health check, set when the pass
    /// completed without an error
    pub health_check: Option<HealthCheck>,
}

impl StepResult {
    #[must_use]
    pub fn errored(error: UpdateError) -> Self {
        Self {
            status: StepStatus::Errored,
            error: Some(error),
            health_check: None,
        }
    }

    /// Whether the scheduler should stop invoking the step
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        match self.status {
            StepStatus::Succeeded | StepStatus::Failed => true,
            StepStatus::Running => false,
            StepStatus::Errored => self.error.as_ref().is_none_or(UpdateError::is_terminal),
        }
    }
}

/// Health check registered for the Applications a step touched
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub kind: String,
    pub config: HealthCheckConfig,
}

impl HealthCheck {
    #[must_use]
    pub fn new(apps: Vec<ApplicationHealthCheck>) -> Self {
        Self {
            kind: HEALTH_CHECK_KIND.to_string(),
            config: HealthCheckConfig { apps },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckConfig {
    pub apps: Vec<ApplicationHealthCheck>,
}

/// What the health checker should verify for one Application
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationHealthCheck {
    pub name: String,
    pub namespace: String,
    /// Desired revision per source, empty where no revision is expected
    pub desired_revisions: Vec<String>,
}
