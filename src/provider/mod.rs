//! # Provider Modules
//!
//! Access to the Argo CD Applications being updated.
//!
//! The reconciler only talks to the cluster through [`ApplicationClient`],
//! so it can be driven against a real API server ([`kubernetes::KubeApplicationClient`])
//! or an in-memory fake in tests.

use crate::crd::Application;
use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Event;
use serde_json::Value;

/// Merge function applied to the live object at patch time
///
/// Called as `merge(local, remote)` with the intended object and the freshly
/// fetched live object, both as untyped JSON. Returns the object to write.
pub type MergeFn = fn(&Value, Value) -> Value;

/// Client trait for Argo CD Applications
#[async_trait]
pub trait ApplicationClient: Send + Sync {
    /// Get an Application, `None` if it does not exist
    async fn get_application(&self, namespace: &str, name: &str) -> Result<Option<Application>>;

    /// Write the intended state of an Application
    ///
    /// Implementations must re-fetch the live object, apply `merge` to it and
    /// only send what changed, so fields written concurrently by Argo CD are
    /// not lost.
    async fn patch_application(&self, app: &Application, merge: MergeFn) -> Result<()>;

    /// Record an audit event
    async fn create_event(&self, event: &Event) -> Result<()>;
}

pub mod kubernetes;
