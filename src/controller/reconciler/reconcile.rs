//! # Reconcile
//!
//! One reconciliation pass of an `argocd-update` step.
//!
//! Applications are processed in configuration order:
//!
//! 1. Fetch the Application and check it authorizes the requesting Stage
//! 2. Derive the desired revision per source (reported for health checks)
//! 3. Decide whether a new sync is needed or the current operation is tracked
//! 4. Fail fast on a tracked operation that failed
//! 5. Otherwise build the desired sources and initiate a sync
//!
//! The phases collected along the way are aggregated into the step status.

use super::authorization::authorize;
use super::operation::must_perform_update;
use super::source::{build_desired_sources, desired_revisions};
use super::status::aggregate_phases;
use super::types::{ArgoCdUpdater, UpdateError};
use crate::crd::OperationPhase;
use crate::observability::metrics;
use crate::step::{
    AppUpdate, ApplicationHealthCheck, ArgoCdUpdateConfig, HealthCheck, StepContext, StepResult,
    StepStatus,
};
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

impl ArgoCdUpdater {
    /// Run one pass from an untyped step configuration
    ///
    /// A configuration that does not parse or validate ends the step with a
    /// terminal error.
    pub async fn reconcile_value(&self, ctx: &StepContext, config: serde_json::Value) -> StepResult {
        match ArgoCdUpdateConfig::from_value(config) {
            Ok(config) => self.reconcile(ctx, &config).await,
            Err(e) => record(StepResult::errored(UpdateError::InvalidConfig(e))),
        }
    }

    /// Run one pass over every Application of the step
    pub async fn reconcile(&self, ctx: &StepContext, config: &ArgoCdUpdateConfig) -> StepResult {
        let span = info_span!(
            "argocd_update.reconcile",
            promotion = %ctx.promotion,
            project = %ctx.project,
            stage = %ctx.stage,
            apps = config.apps.len()
        );

        async move {
            let start = Instant::now();
            metrics::increment_passes();

            let result = self
                .try_reconcile(ctx, config)
                .await
                .unwrap_or_else(StepResult::errored);

            metrics::observe_pass_duration(start.elapsed().as_secs_f64());
            record(result)
        }
        .instrument(span)
        .await
    }

    async fn try_reconcile(
        &self,
        ctx: &StepContext,
        config: &ArgoCdUpdateConfig,
    ) -> Result<StepResult, UpdateError> {
        let mut phases: Vec<OperationPhase> = Vec::with_capacity(config.apps.len());
        let mut health_checks = Vec::with_capacity(config.apps.len());

        for update in &config.apps {
            let namespace = self
                .config
                .namespace_or_default(update.namespace.as_deref())
                .to_string();
            let span = info_span!(
                "argocd_update.application",
                app.namespace = %namespace,
                app.name = %update.name
            );

            let (health_check, outcome) = self
                .reconcile_app(ctx, update, namespace)
                .instrument(span)
                .await?;
            health_checks.push(health_check);

            match outcome {
                TargetOutcome::Phase(phase) => phases.extend(phase),
                TargetOutcome::FailedWithoutMessage => {
                    return Ok(StepResult {
                        status: StepStatus::Errored,
                        error: None,
                        health_check: None,
                    });
                }
            }
        }

        let status = aggregate_phases(&phases)?;
        Ok(StepResult {
            status,
            error: None,
            health_check: Some(HealthCheck::new(health_checks)),
        })
    }

    async fn reconcile_app(
        &self,
        ctx: &StepContext,
        update: &AppUpdate,
        namespace: String,
    ) -> Result<(ApplicationHealthCheck, TargetOutcome), UpdateError> {
        let name = update.name.clone();

        let app = self
            .client
            .get_application(&namespace, &name)
            .await
            .map_err(|error| UpdateError::Fetch {
                namespace: namespace.clone(),
                name: name.clone(),
                error,
            })?
            .ok_or_else(|| UpdateError::ApplicationNotFound {
                namespace: namespace.clone(),
                name: name.clone(),
            })?;

        authorize(&ctx.project, &ctx.stage, &app.metadata)?;

        let desired_revisions = desired_revisions(update, &app);
        let health_check = ApplicationHealthCheck {
            name: name.clone(),
            namespace: namespace.clone(),
            desired_revisions: desired_revisions.clone(),
        };

        let decision = must_perform_update(ctx, update, &app);

        if !decision.must_initiate {
            if let Some(notice) = &decision.notice {
                info!("Argo CD Application {}/{}: {}", namespace, name, notice);
            }
            if decision.phase.as_ref().is_some_and(OperationPhase::failed) {
                let message = app
                    .operation_state()
                    .map(|s| s.message.as_str())
                    .unwrap_or_default();
                if message.is_empty() {
                    warn!(
                        "Operation on Argo CD Application {}/{} failed without a message",
                        namespace, name
                    );
                    return Ok((health_check, TargetOutcome::FailedWithoutMessage));
                }
                return Err(UpdateError::OperationFailed {
                    namespace,
                    name,
                    message: message.to_string(),
                });
            }
            return Ok((health_check, TargetOutcome::Phase(decision.phase)));
        }

        if let Some(notice) = &decision.notice {
            info!(
                "Argo CD Application {}/{}: {}, initiating a new sync",
                namespace, name, notice
            );
        }

        let desired_sources = build_desired_sources(update, &desired_revisions, &app)?;
        self.sync_application(ctx, app, desired_sources).await?;
        Ok((
            health_check,
            TargetOutcome::Phase(Some(OperationPhase::Running)),
        ))
    }
}

/// What one Application contributes to the pass
enum TargetOutcome {
    /// Phase to aggregate, `None` when there is nothing to report
    Phase(Option<OperationPhase>),
    /// The tracked operation failed and carries no message
    FailedWithoutMessage,
}

fn record(result: StepResult) -> StepResult {
    if let Some(error) = &result.error {
        metrics::increment_errors(error.kind());
        if error.is_terminal() {
            warn!("argocd-update step failed: {}", error);
        } else {
            info!("argocd-update pass did not complete: {}", error);
        }
    }
    metrics::increment_step_results(result.status.as_str());
    result
}
