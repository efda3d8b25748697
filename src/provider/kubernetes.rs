//! # Kubernetes Application Client
//!
//! [`ApplicationClient`] backed by the Kubernetes API. Applications are
//! accessed as dynamic objects so fields this crate does not model survive
//! untouched.

use super::{ApplicationClient, MergeFn};
use crate::constants::{
    ARGOCD_APPLICATION_KIND, ARGOCD_GROUP, ARGOCD_VERSION, FIELD_MANAGER,
};
use crate::controller::reconciler::create_merge_patch;
use crate::crd::Application;
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Event;
use kube::{
    api::{Api, ApiResource, Patch, PatchParams, PostParams},
    core::{DynamicObject, GroupVersionKind},
    Client,
};
use tracing::debug;

/// Application client talking to the Kubernetes API server
#[derive(Clone)]
pub struct KubeApplicationClient {
    client: Client,
    resource: ApiResource,
}

impl std::fmt::Debug for KubeApplicationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeApplicationClient")
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}

impl KubeApplicationClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        let gvk = GroupVersionKind {
            group: ARGOCD_GROUP.to_string(),
            version: ARGOCD_VERSION.to_string(),
            kind: ARGOCD_APPLICATION_KIND.to_string(),
        };
        Self {
            client,
            resource: ApiResource::from_gvk(&gvk),
        }
    }

    fn applications(&self, namespace: &str) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, &self.resource)
    }
}

#[async_trait]
impl ApplicationClient for KubeApplicationClient {
    async fn get_application(&self, namespace: &str, name: &str) -> Result<Option<Application>> {
        let Some(object) = self
            .applications(namespace)
            .get_opt(name)
            .await
            .context(format!(
                "Failed to get Argo CD Application: {namespace}/{name}"
            ))?
        else {
            return Ok(None);
        };

        let value = serde_json::to_value(&object)
            .context("Failed to serialize Argo CD Application")?;
        let app = serde_json::from_value(value).context(format!(
            "Failed to parse Argo CD Application: {namespace}/{name}"
        ))?;
        Ok(Some(app))
    }

    async fn patch_application(&self, app: &Application, merge: MergeFn) -> Result<()> {
        let namespace = app.namespace();
        let name = app.name();
        let api = self.applications(namespace);

        let live = api.get(name).await.context(format!(
            "Failed to get Argo CD Application: {namespace}/{name}"
        ))?;
        let remote =
            serde_json::to_value(&live).context("Failed to serialize live Argo CD Application")?;
        let local =
            serde_json::to_value(app).context("Failed to serialize Argo CD Application")?;

        let merged = merge(&local, remote.clone());
        let patch = create_merge_patch(&remote, &merged);
        debug!(
            "Patching Argo CD Application {}/{}: {}",
            namespace, name, patch
        );

        let params = PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        api.patch(name, &params, &Patch::Merge(&patch))
            .await
            .context(format!(
                "Failed to patch Argo CD Application: {namespace}/{name}"
            ))?;
        Ok(())
    }

    async fn create_event(&self, event: &Event) -> Result<()> {
        let namespace = event.metadata.namespace.as_deref().unwrap_or("default");
        let api: Api<Event> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), event)
            .await
            .context(format!("Failed to create Event in namespace {namespace}"))?;
        Ok(())
    }
}
