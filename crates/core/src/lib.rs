//! R-Droid Core - Engine and shared configuration
//!
//! This crate ties the targeting and build-engine crates together: the
//! engine configuration, the top-level error type and the `Engine` facade
//! that runs matching, splitting and size estimation on its worker pool.

pub mod config;
pub mod error;
pub mod orchestrator;

pub use config::{EngineConfig, MatchingConfig, RuntimeConfig, SizesConfig};
pub use error::{RDroidError, Result};
pub use orchestrator::Engine;

/// R-Droid version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "R-Droid Bundletool";
