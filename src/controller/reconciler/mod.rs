//! # Reconciler
//!
//! Core reconciliation logic for `argocd-update` promotion steps.
//!
//! The reconciler:
//! - Fetches each configured Argo CD Application
//! - Checks the Application authorizes the requesting Stage
//! - Tracks the Application's current operation, or initiates a new sync
//!   when none belongs to the Promotion yet
//! - Patches Applications without clobbering concurrent Argo CD writes
//! - Reports a single step status for all Applications
//!
//! ## Reconciliation Flow
//!
//! 1. Get Application and authorize
//! 2. Derive desired revisions
//! 3. Decide on the operation (track / fail fast / initiate)
//! 4. Build desired sources and sync
//! 5. Aggregate phases into the step status

pub mod authorization;
pub mod merge;
pub mod operation;
pub mod reconcile;
pub mod source;
pub mod status;
pub mod sync;
pub mod types;
pub mod utils;

// Re-export public API
pub use authorization::authorize;
pub use merge::{create_merge_patch, merge_application, merge_values};
pub use operation::{must_perform_update, OperationNotice, UpdateDecision};
pub use source::{apply_source_update, build_desired_sources, desired_revisions, source_matches};
pub use status::aggregate_phases;
pub use sync::{operation_started_event, prepare_sync};
pub use types::{ArgoCdUpdater, UpdateError};
pub use utils::normalize_git_url;
