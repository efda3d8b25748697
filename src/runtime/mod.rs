//! # Runtime
//!
//! Process start-up shared by the `argocd-update` binary.

pub mod initialization;

pub use initialization::{initialize, init_tracing};
