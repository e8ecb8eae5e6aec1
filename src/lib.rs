//! R-Droid Bundletool - bundle targeting engine
//!
//! Decides which APKs a device installs, splits modules into targeted
//! fragments and estimates download sizes per device configuration.
//!
//! ## Architecture
//!
//! - `r-droid-targeting`: targeting values, device specs, dimension matchers
//!   and the composite APK matcher
//! - `r-droid-build-engine`: module splits, the splitting pipeline, size
//!   aggregation and merging
//! - `r-droid-core`: configuration, errors and the `Engine` facade

#![warn(clippy::all)]

// Re-export main components for library usage
pub use r_droid_build_engine as build;
pub use r_droid_core as core;
pub use r_droid_targeting as targeting;

/// Prelude module for convenient imports
pub mod prelude {
    pub use r_droid_build_engine::{
        ConfigurationSizes, ModuleEntry, ModuleSplit, ResourceTable, SizeConfiguration, SizeMerger,
        SizeRequest, SplittingConfig, SplittingPipeline,
    };
    pub use r_droid_core::{Engine, EngineConfig, RDroidError};
    pub use r_droid_targeting::{
        ApkCatalog, ApkDescription, ApkMatcher, DeviceSpec, Targeting, TargetingDimension, TargetingValue,
    };
}
