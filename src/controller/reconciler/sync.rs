//! # Sync
//!
//! Initiates a sync of an Application on behalf of a Promotion: writes the
//! desired sources together with a new operation carrying the Promotion's
//! ownership marker, then records an audit event.

use super::merge::merge_application;
use super::types::{ArgoCdUpdater, UpdateError};
use crate::constants::{
    ANNOTATION_REFRESH, ARGOCD_APPLICATION_KIND, ARGOCD_GROUP, ARGOCD_VERSION,
    EVENT_REASON_OPERATION_STARTED, PROMOTION_INFO_KEY, REASON_INFO_KEY, REFRESH_TYPE_HARD,
    SYNC_REASON,
};
use crate::crd::{Application, ApplicationSource, Info, Operation, OperationInitiator, SyncOperation};
use crate::observability::metrics;
use crate::step::StepContext;
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use k8s_openapi::api::core::v1::Event;
use serde_json::json;
use tracing::info;

impl ArgoCdUpdater {
    /// Sync `app` to `desired_sources` for the Promotion in `ctx`
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Patch`] if the Application could not be
    /// written and [`UpdateError::Event`] if the audit event could not be
    /// recorded.
    pub async fn sync_application(
        &self,
        ctx: &StepContext,
        mut app: Application,
        desired_sources: Vec<ApplicationSource>,
    ) -> Result<(), UpdateError> {
        let actor = prepare_sync(
            &mut app,
            ctx,
            &self.config.operation_initiator,
            desired_sources,
        );

        self.client
            .patch_application(&app, merge_application)
            .await
            .map_err(|error| UpdateError::Patch {
                namespace: app.namespace().to_string(),
                name: app.name().to_string(),
                error,
            })?;
        metrics::increment_syncs_initiated();

        let event_error = |error| UpdateError::Event {
            namespace: app.namespace().to_string(),
            name: app.name().to_string(),
            error,
        };
        let event = operation_started_event(&app, &actor).map_err(event_error)?;
        self.client
            .create_event(&event)
            .await
            .map_err(event_error)?;

        info!(
            "Initiated sync of Argo CD Application {}/{} for Promotion {}",
            app.namespace(),
            app.name(),
            ctx.promotion
        );
        Ok(())
    }
}

/// Apply the local changes that make up a sync request
///
/// Sets the hard-refresh annotation, swaps in the desired sources (keeping
/// the singular vs. list shape), attaches a new operation and clears the
/// cached operation state. Returns the username recorded as initiator.
pub fn prepare_sync(
    app: &mut Application,
    ctx: &StepContext,
    operation_initiator: &str,
    desired_sources: Vec<ApplicationSource>,
) -> String {
    app.metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(ANNOTATION_REFRESH.to_string(), REFRESH_TYPE_HARD.to_string());

    if app.has_multiple_sources() {
        app.spec.sources = desired_sources;
    } else {
        app.spec.source = desired_sources.into_iter().next();
    }

    let (username, automated) = match ctx.actor.as_deref().filter(|a| !a.is_empty()) {
        // A human actor keeps manual-sync semantics, e.g. sync window overrides
        Some(actor) => (actor.to_string(), false),
        None => (operation_initiator.to_string(), true),
    };

    let mut sync = SyncOperation {
        revisions: app
            .sources()
            .into_iter()
            .map(|s| s.target_revision)
            .collect(),
        ..Default::default()
    };
    let mut retry = None;
    if let Some(policy) = &app.spec.sync_policy {
        sync.sync_options.clone_from(&policy.sync_options);
        retry.clone_from(&policy.retry);
    }

    app.operation = Some(Operation {
        sync: Some(sync),
        initiated_by: OperationInitiator {
            username: username.clone(),
            automated,
        },
        info: vec![
            Info {
                name: REASON_INFO_KEY.to_string(),
                value: SYNC_REASON.to_string(),
            },
            Info {
                name: PROMOTION_INFO_KEY.to_string(),
                value: ctx.promotion.clone(),
            },
        ],
        retry,
        extra: Default::default(),
    });

    // Argo CD refuses a new operation while the cached state still shows one
    if let Some(status) = app.status.as_mut() {
        status.operation_state = None;
    }

    username
}

/// Build the `OperationStarted` audit event for a freshly initiated sync
///
/// # Errors
///
/// Returns an error if the event cannot be represented.
pub fn operation_started_event(app: &Application, actor: &str) -> Result<Event> {
    let message = if app.has_multiple_sources() {
        format!("{actor} initiated sync")
    } else {
        let revision = app
            .spec
            .source
            .as_ref()
            .map(|s| s.target_revision.as_str())
            .unwrap_or_default();
        format!("{actor} initiated sync to {revision}")
    };

    let now = Utc::now();
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    let nanos = now.timestamp_nanos_opt().unwrap_or_default();

    let event = json!({
        "metadata": {
            "name": format!("{}.{:x}", app.name(), nanos),
            "namespace": app.namespace(),
        },
        "involvedObject": {
            "apiVersion": format!("{ARGOCD_GROUP}/{ARGOCD_VERSION}"),
            "kind": ARGOCD_APPLICATION_KIND,
            "name": app.name(),
            "namespace": app.namespace(),
            "uid": app.metadata.uid,
            "resourceVersion": app.metadata.resource_version,
        },
        "source": {"component": actor},
        "reason": EVENT_REASON_OPERATION_STARTED,
        "message": message,
        "type": "Normal",
        "count": 1,
        "firstTimestamp": timestamp,
        "lastTimestamp": timestamp,
    });

    serde_json::from_value(event).context(format!(
        "Failed to build {EVENT_REASON_OPERATION_STARTED} event for {}/{}",
        app.namespace(),
        app.name()
    ))
}
