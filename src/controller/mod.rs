//! # Controller
//!
//! Core controller modules for the Argo CD updater.
//!
//! - `reconciler`: Core reconciliation logic
//! - `server`: HTTP server for metrics and health checks

pub mod reconciler;
pub mod server;
