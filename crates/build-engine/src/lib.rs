//! R-Droid Build Engine
//!
//! Splits modules into targeted fragments along configured dimensions and
//! estimates download sizes of the resulting APKs per device configuration.

pub mod config;
pub mod module_split;
pub mod resources;
pub mod sizes;
pub mod splitters;

pub use config::{DensityPinning, SizeRequest, SplitDimension, SplittingConfig, SIZE_DIMENSIONS};
pub use module_split::{ModuleEntry, ModuleSplit};
pub use resources::{ConfigValue, ResourceConfig, ResourceEntry, ResourceId, ResourceTable};
pub use sizes::{format_size, ConfigurationSizes, SizeAggregator, SizeConfiguration, SizeMerger, SizeRow};
pub use splitters::{ModuleSplitSplitter, SplittingPipeline};

use r_droid_targeting::{TargetingDimension, TargetingError};

/// Splitting errors
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
    #[error("Targeting error: {0}")]
    Targeting(#[from] TargetingError),
}

/// Size estimation errors
#[derive(Debug, thiserror::Error)]
pub enum SizeError {
    #[error("No size known for APK {path}")]
    MissingSize { path: String },
    #[error("Sizes cannot be broken down by {0}")]
    UnsupportedDimension(TargetingDimension),
    #[error("Unknown dimension '{0}'")]
    UnknownDimension(String),
    #[error("Targeting error: {0}")]
    Targeting(#[from] TargetingError),
}
