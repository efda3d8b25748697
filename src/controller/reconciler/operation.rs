//! # Operation Ownership
//!
//! Decides, from the live operation state of an Application, whether a new
//! sync must be initiated for the Promotion or whether an operation that is
//! already in flight (ours or someone else's) should be tracked instead.
//!
//! ## Decision order
//!
//! 1. No operation state: initiate.
//! 2. Operation not correlated with any Promotion: wait while it runs,
//!    initiate once it completed.
//! 3. Operation correlated with a different Promotion: same as 2.
//! 4. Our operation still running: report its phase.
//! 5. Our operation completed without a sync result: initiate.
//! 6. Our operation completed: compare the revisions it synced against the
//!    desired ones and initiate again on mismatch, otherwise report its
//!    phase.

use super::source::desired_revisions;
use crate::constants::PROMOTION_INFO_KEY;
use crate::crd::{Application, OperationPhase};
use crate::step::{AppUpdate, StepContext};
use thiserror::Error;

/// Why an operation was not simply accepted as ours
///
/// Notices are informational. They are logged, never surfaced as step
/// errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationNotice {
    #[error(
        "current operation was initiated by {initiator:?} without a Promotion reference: waiting for operation to complete"
    )]
    Foreign { initiator: String },

    #[error(
        "current operation was initiated for Promotion {found:?} and not for {expected:?}: waiting for operation to complete"
    )]
    OtherPromotion { found: String, expected: String },

    #[error("operation completed without a sync result")]
    MissingSyncResult,

    #[error(
        "sync result revisions [{}] do not match desired revisions [{}]",
        .observed.join(", "),
        .desired.join(", ")
    )]
    RevisionMismatch {
        observed: Vec<String>,
        desired: Vec<String>,
    },
}

/// Outcome of [`must_perform_update`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDecision {
    /// Phase of the operation being tracked, `None` whenever a new sync
    /// must be initiated
    pub phase: Option<OperationPhase>,
    /// Whether a new sync must be initiated
    pub must_initiate: bool,
    pub notice: Option<OperationNotice>,
}

impl UpdateDecision {
    fn initiate(notice: Option<OperationNotice>) -> Self {
        Self {
            phase: None,
            must_initiate: true,
            notice,
        }
    }

    fn track(phase: OperationPhase, notice: Option<OperationNotice>) -> Self {
        Self {
            phase: Some(phase),
            must_initiate: false,
            notice,
        }
    }
}

/// Decide whether a new sync must be initiated for the Promotion
#[must_use]
pub fn must_perform_update(
    ctx: &StepContext,
    update: &AppUpdate,
    app: &Application,
) -> UpdateDecision {
    let Some(state) = app.operation_state() else {
        return UpdateDecision::initiate(None);
    };
    let phase = state.phase.clone();

    let notice = match state.operation.info_value(PROMOTION_INFO_KEY) {
        None => Some(OperationNotice::Foreign {
            initiator: state.operation.initiated_by.username.clone(),
        }),
        Some(promotion) if promotion != ctx.promotion => Some(OperationNotice::OtherPromotion {
            found: promotion.to_string(),
            expected: ctx.promotion.clone(),
        }),
        Some(_) => None,
    };
    if notice.is_some() {
        if !phase.completed() {
            return UpdateDecision::track(phase, notice);
        }
        return UpdateDecision::initiate(None);
    }

    if !phase.completed() {
        return UpdateDecision::track(phase, None);
    }

    let Some(sync_result) = state.sync_result.as_ref() else {
        return UpdateDecision::initiate(Some(OperationNotice::MissingSyncResult));
    };

    let desired = desired_revisions(update, app);
    if desired.is_empty() {
        return UpdateDecision::track(phase, None);
    }

    let observed = sync_result.observed_revisions();
    let mismatch = desired.iter().enumerate().any(|(i, desired_revision)| {
        !desired_revision.is_empty() && observed.get(i) != Some(desired_revision)
    });
    if mismatch {
        return UpdateDecision::initiate(Some(OperationNotice::RevisionMismatch {
            observed,
            desired,
        }));
    }

    UpdateDecision::track(phase, None)
}
