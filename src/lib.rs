//! Argo CD Update Library
//!
//! Drives Argo CD Applications to the sources a Promotion asks for and
//! tracks the resulting sync operations until they settle.
//!
//! - `config`: Process configuration from environment variables
//! - `constants`: Well-known names, annotations and defaults
//! - `controller`: Reconciliation logic and the metrics/probe server
//! - `crd`: Typed model of the Argo CD `Application` resource
//! - `observability`: Prometheus metrics
//! - `provider`: Access to Applications (Kubernetes API or test fakes)
//! - `runtime`: Process start-up
//! - `step`: Step configuration, context and result types

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod provider;
pub mod runtime;
pub mod step;

pub use controller::reconciler::{ArgoCdUpdater, UpdateError};
pub use step::{ArgoCdUpdateConfig, StepContext, StepResult, StepStatus};
