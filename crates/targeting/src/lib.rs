//! R-Droid Targeting - device/artifact matching
//!
//! Typed targeting values for every dimension an APK can be targeted on,
//! device specifications, per-dimension matchers and the composite matcher
//! that selects the APKs a device should install.

pub mod apk_matcher;
pub mod catalog;
pub mod density;
pub mod device;
pub mod error;
pub mod matchers;
pub mod targeting;

pub use apk_matcher::ApkMatcher;
pub use catalog::{
    ApkCatalog, ApkDescription, ApkKind, AssetModule, DeliveryType, ModuleSelection, Targeted, Variant,
    BASE_MODULE,
};
pub use device::DeviceSpec;
pub use error::{IncompatibilityReport, IncompatibleDevice, Result, TargetingError};
pub use matchers::DimensionMatcher;
pub use targeting::{
    Abi, CountrySet, DensityAlias, DeviceFeature, MultiAbi, ScreenDensity, SdkVersion, Targeting,
    TargetingDimension, TargetingValue, TextureCompressionFormat,
};
