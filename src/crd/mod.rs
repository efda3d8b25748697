//! # Argo CD Resource Model
//!
//! Typed view of the Argo CD `Application` resource.
//!
//! Only the fields the updater reads or writes are typed. Everything else is
//! carried through untouched in flattened `extra` maps so a typed round trip
//! never drops data written by Argo CD itself.
//!
//! ## Module Structure
//!
//! - `application.rs` - Application, spec, sync policy and status
//! - `source.rs` - Application sources (Helm, Kustomize, plain directories)
//! - `operation.rs` - Operations, operation state and phases

mod application;
mod operation;
mod source;

pub use application::{
    Application, ApplicationSpec, ApplicationStatus, RetryBackoff, RetryStrategy, SyncPolicy,
    SyncPolicyAutomated,
};
pub use operation::{
    Info, Operation, OperationInitiator, OperationPhase, OperationState, SyncOperation,
    SyncOperationResult,
};
pub use source::{ApplicationSource, ApplicationSourceHelm, ApplicationSourceKustomize, HelmParameter};

/// Extra fields preserved verbatim across a typed round trip
pub type Extra = serde_json::Map<String, serde_json::Value>;
