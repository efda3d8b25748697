//! # Updater Configuration
//!
//! Settings loaded from environment variables.

use std::time::Duration;

/// Process-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// Namespace used for targets that do not name one
    pub argocd_namespace: String,
    /// Identity recorded as the initiator of operations when the Promotion
    /// has no human actor
    pub operation_initiator: String,
    /// Seconds to wait between passes in `run`
    pub poll_interval_secs: u64,
    /// Maximum number of passes in `run`
    pub max_passes: u32,
    /// Port for the metrics/probe server, disabled when unset
    pub metrics_port: Option<u16>,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            argocd_namespace: DEFAULT_ARGOCD_NAMESPACE.to_string(),
            operation_initiator: DEFAULT_OPERATION_INITIATOR.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_passes: DEFAULT_MAX_PASSES,
            metrics_port: None,
            log_level: "INFO".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl UpdaterConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            argocd_namespace: env_var_or_default_str("ARGOCD_NAMESPACE", DEFAULT_ARGOCD_NAMESPACE),
            operation_initiator: env_var_or_default_str(
                "OPERATION_INITIATOR",
                DEFAULT_OPERATION_INITIATOR,
            ),
            poll_interval_secs: env_var_or_default("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS),
            max_passes: env_var_or_default("MAX_PASSES", DEFAULT_MAX_PASSES),
            metrics_port: std::env::var("METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok()),
            log_level: env_var_or_default_str("LOG_LEVEL", "INFO"),
            log_format: env_var_or_default_str("LOG_FORMAT", "text"),
        }
    }

    /// Get poll interval duration
    #[must_use]
    pub fn poll_interval_duration(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Resolve the namespace of a target, falling back to the Argo CD namespace
    #[must_use]
    pub fn namespace_or_default<'a>(&'a self, namespace: Option<&'a str>) -> &'a str {
        match namespace {
            Some(ns) if !ns.is_empty() => ns,
            _ => &self.argocd_namespace,
        }
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
