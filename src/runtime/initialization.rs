//! # Initialization
//!
//! Crypto provider, logging, metrics and Kubernetes client set-up.

use crate::config::UpdaterConfig;
use crate::observability::metrics;
use anyhow::{Context, Result};
use kube::Client;
use tracing::{debug, info};

/// Install the log subscriber
///
/// `RUST_LOG` takes precedence over `LOG_LEVEL`. `LOG_FORMAT=json` switches
/// to structured JSON output.
pub fn init_tracing(config: &UpdaterConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("argocd_update={}", config.log_level.to_lowercase()).into()
    });

    // try_init fails if a subscriber is already installed, e.g. in tests
    let installed = if config.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };
    if installed.is_err() {
        debug!("Tracing subscriber already installed");
    }
}

/// Prepare the process and connect to the cluster
///
/// # Errors
///
/// Returns an error if metrics cannot be registered or no Kubernetes
/// configuration can be found.
pub async fn initialize(config: &UpdaterConfig) -> Result<Client> {
    // rustls 0.23 needs a process-wide provider before the first TLS connection
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    init_tracing(config);

    info!(
        "Starting argocd-update {} (build {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_GIT_HASH"),
        env!("BUILD_DATETIME")
    );

    metrics::register_metrics().context("Failed to register metrics")?;

    Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")
}
