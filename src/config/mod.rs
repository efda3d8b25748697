//! # Configuration
//!
//! Process-level settings for the updater, loaded from environment variables.

mod updater;

pub use updater::UpdaterConfig;
