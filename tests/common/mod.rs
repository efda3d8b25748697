//! Common test utilities for reconciliation tests
//!
//! Provides an in-memory [`ApplicationClient`] that stores Applications as
//! untyped JSON, applies patches through the real merge function and can
//! play the part of the Argo CD application controller.

#![allow(dead_code, reason = "Not every test binary uses every helper")]

use anyhow::{anyhow, Result};
use argocd_update::config::UpdaterConfig;
use argocd_update::controller::reconciler::create_merge_patch;
use argocd_update::crd::Application;
use argocd_update::provider::{ApplicationClient, MergeFn};
use argocd_update::ArgoCdUpdater;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Event;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const PROMOTION: &str = "promo-1";
pub const PROJECT: &str = "my-project";
pub const STAGE: &str = "test";

/// In-memory Application store
#[derive(Default)]
pub struct FakeApplicationClient {
    apps: Mutex<BTreeMap<(String, String), Value>>,
    patches: Mutex<Vec<Value>>,
    events: Mutex<Vec<Event>>,
    fail_get: AtomicBool,
    fail_patch: AtomicBool,
    fail_event: AtomicBool,
}

impl FakeApplicationClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, app: Value) {
        let namespace = app["metadata"]["namespace"].as_str().unwrap().to_string();
        let name = app["metadata"]["name"].as_str().unwrap().to_string();
        self.apps.lock().unwrap().insert((namespace, name), app);
    }

    pub fn app(&self, namespace: &str, name: &str) -> Value {
        self.apps
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .unwrap()
    }

    /// Merge patches sent so far
    pub fn patches(&self) -> Vec<Value> {
        self.patches.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn fail_gets(&self) {
        self.fail_get.store(true, Ordering::Relaxed);
    }

    pub fn fail_patches(&self) {
        self.fail_patch.store(true, Ordering::Relaxed);
    }

    pub fn fail_events(&self) {
        self.fail_event.store(true, Ordering::Relaxed);
    }

    /// Act like the Argo CD application controller finishing the requested
    /// operation: move it into `status.operationState` with the given phase
    pub fn complete_operation(&self, namespace: &str, name: &str, phase: &str, message: &str) {
        let mut apps = self.apps.lock().unwrap();
        let app = apps
            .get_mut(&(namespace.to_string(), name.to_string()))
            .unwrap();
        let operation = app
            .as_object_mut()
            .unwrap()
            .remove("operation")
            .expect("no operation requested");
        let revisions = operation["sync"]["revisions"].clone();
        let mut sync_result = json!({"revisions": revisions});
        if let Some([revision]) = revisions.as_array().map(Vec::as_slice) {
            sync_result = json!({"revision": revision});
        }

        let status = app
            .as_object_mut()
            .unwrap()
            .entry("status")
            .or_insert_with(|| json!({}));
        status["operationState"] = json!({
            "operation": operation,
            "phase": phase,
            "message": message,
            "syncResult": sync_result,
        });
    }

    /// Move the current operation to another phase
    pub fn set_phase(&self, namespace: &str, name: &str, phase: &str) {
        let mut apps = self.apps.lock().unwrap();
        let app = apps
            .get_mut(&(namespace.to_string(), name.to_string()))
            .unwrap();
        app["status"]["operationState"]["phase"] = json!(phase);
    }

    /// Overwrite `status.operationState` directly
    pub fn set_operation_state(&self, namespace: &str, name: &str, state: Value) {
        let mut apps = self.apps.lock().unwrap();
        let app = apps
            .get_mut(&(namespace.to_string(), name.to_string()))
            .unwrap();
        let status = app
            .as_object_mut()
            .unwrap()
            .entry("status")
            .or_insert_with(|| json!({}));
        status["operationState"] = state;
    }
}

#[async_trait]
impl ApplicationClient for FakeApplicationClient {
    async fn get_application(&self, namespace: &str, name: &str) -> Result<Option<Application>> {
        if self.fail_get.load(Ordering::Relaxed) {
            return Err(anyhow!("connection refused"));
        }
        let apps = self.apps.lock().unwrap();
        match apps.get(&(namespace.to_string(), name.to_string())) {
            Some(app) => Ok(Some(serde_json::from_value(app.clone())?)),
            None => Ok(None),
        }
    }

    async fn patch_application(&self, app: &Application, merge: MergeFn) -> Result<()> {
        if self.fail_patch.load(Ordering::Relaxed) {
            return Err(anyhow!(
                "conflict: the object has been modified; please apply your changes to the latest version"
            ));
        }
        let key = (app.namespace().to_string(), app.name().to_string());
        let mut apps = self.apps.lock().unwrap();
        let remote = apps
            .get(&key)
            .cloned()
            .ok_or_else(|| anyhow!("application {}/{} not found", key.0, key.1))?;

        let local = serde_json::to_value(app)?;
        let merged = merge(&local, remote.clone());
        self.patches
            .lock()
            .unwrap()
            .push(create_merge_patch(&remote, &merged));
        apps.insert(key, merged);
        Ok(())
    }

    async fn create_event(&self, event: &Event) -> Result<()> {
        if self.fail_event.load(Ordering::Relaxed) {
            return Err(anyhow!("events is forbidden"));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub fn updater(client: &Arc<FakeApplicationClient>) -> ArgoCdUpdater {
    let client = Arc::clone(client) as Arc<dyn ApplicationClient>;
    ArgoCdUpdater::new(client, UpdaterConfig::default())
}

/// Single-source Git Application authorized for the test Stage
pub fn git_app(name: &str) -> Value {
    json!({
        "apiVersion": "argoproj.io/v1alpha1",
        "kind": "Application",
        "metadata": {
            "name": name,
            "namespace": "argocd",
            "uid": format!("uid-{name}"),
            "resourceVersion": "1",
            "annotations": {"kargo.akuity.io/authorized-stage": format!("{PROJECT}:{STAGE}")}
        },
        "spec": {
            "project": "default",
            "destination": {"server": "https://kubernetes.default.svc", "namespace": "guestbook"},
            "source": {
                "repoURL": "https://github.com/example/guestbook.git",
                "path": "overlays/test",
                "targetRevision": "main"
            },
            "syncPolicy": {"syncOptions": ["CreateNamespace=true"]}
        },
        "status": {
            "health": {"status": "Healthy"},
            "sync": {"status": "Synced", "revision": "0000000"}
        }
    })
}

/// Step configuration updating the Git source of each named Application
pub fn git_config(names: &[&str], revision: &str) -> Value {
    let apps: Vec<Value> = names
        .iter()
        .map(|name| {
            json!({
                "name": name,
                "sources": [{
                    "repoURL": "https://github.com/example/guestbook.git",
                    "desiredRevision": revision,
                    "updateTargetRevision": true
                }]
            })
        })
        .collect();
    json!({ "apps": apps })
}
