//! # Promotion Step Types
//!
//! Configuration the promotion scheduler hands to the updater, the context of
//! the Promotion being executed, and the result reported back.
//!
//! - `config.rs` - Per-application and per-source update instructions
//! - `context.rs` - Promotion identity and authorization scope
//! - `result.rs` - Step status, result and health-check payload

mod config;
mod context;
mod result;

pub use config::{
    AppUpdate, ArgoCdUpdateConfig, HelmImageUpdate, HelmUpdate, KustomizeImageUpdate,
    KustomizeUpdate, SourceUpdate,
};
pub use context::StepContext;
pub use result::{ApplicationHealthCheck, HealthCheck, HealthCheckConfig, StepResult, StepStatus};
