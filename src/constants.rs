//! # Constants
//!
//! Shared constants used throughout the updater.
//!
//! Annotation keys, info names and event reasons are part of the wire
//! contract with Argo CD and with the promotion controller, so they must not
//! be changed casually.

/// Default namespace Argo CD Applications live in when a target omits one
pub const DEFAULT_ARGOCD_NAMESPACE: &str = "argocd";

/// Default identity recorded as the initiator of operations we request
pub const DEFAULT_OPERATION_INITIATOR: &str = "kargo-controller";

/// Field manager sent with every patch
pub const FIELD_MANAGER: &str = "argocd-update";

/// Argo CD API group/version/kind for Applications
pub const ARGOCD_GROUP: &str = "argoproj.io";
pub const ARGOCD_VERSION: &str = "v1alpha1";
pub const ARGOCD_APPLICATION_KIND: &str = "Application";

/// Annotation that makes Argo CD perform a refresh of the Application
pub const ANNOTATION_REFRESH: &str = "argocd.argoproj.io/refresh";

/// Value of [`ANNOTATION_REFRESH`] requesting a hard refresh
pub const REFRESH_TYPE_HARD: &str = "hard";

/// Annotation on an Application naming the single `<project>:<stage>`
/// allowed to mutate it
pub const ANNOTATION_AUTHORIZED_STAGE: &str = "kargo.akuity.io/authorized-stage";

/// Operation info entry used to correlate an Argo CD operation with the
/// Promotion that requested it
pub const PROMOTION_INFO_KEY: &str = "kargo.akuity.io/promotion";

/// Operation info entry carrying the human readable reason
pub const REASON_INFO_KEY: &str = "Reason";

/// Reason recorded on every operation we initiate
pub const SYNC_REASON: &str = "Promotion triggered a sync of this Application resource.";

/// Event reason Argo CD uses when an operation starts
pub const EVENT_REASON_OPERATION_STARTED: &str = "OperationStarted";

/// Kind reported in the health-check payload
pub const HEALTH_CHECK_KIND: &str = "argocd-update";

/// Default interval between reconciliation passes in `run` (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Default maximum number of passes in `run` before giving up
pub const DEFAULT_MAX_PASSES: u32 = 360;
