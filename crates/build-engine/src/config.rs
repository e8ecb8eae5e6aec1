//! Splitting Configuration
//!
//! Which dimensions modules are split on, density pinning rules and the
//! parameters of a size request.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use r_droid_targeting::{DeviceSpec, ModuleSelection, TargetingDimension};
use serde::{Deserialize, Serialize};

use crate::SizeError;

/// Dimension a module can be split on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitDimension {
    Abi,
    ScreenDensity,
    Language,
    TextureCompressionFormat,
    DeviceTier,
}

impl SplitDimension {
    /// Pipeline order; earlier splitters run first
    pub fn all() -> &'static [SplitDimension] {
        &[
            SplitDimension::Abi,
            SplitDimension::ScreenDensity,
            SplitDimension::Language,
            SplitDimension::TextureCompressionFormat,
            SplitDimension::DeviceTier,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitDimension::Abi => "abi",
            SplitDimension::ScreenDensity => "screen_density",
            SplitDimension::Language => "language",
            SplitDimension::TextureCompressionFormat => "texture_compression_format",
            SplitDimension::DeviceTier => "device_tier",
        }
    }
}

impl fmt::Display for SplitDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resources kept out of density splits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityPinning {
    /// "type/name" resources kept whole in the master split
    pub pinned_resources: Vec<String>,
    /// "type/name" resources whose lowest density stays in the master split
    pub pin_lowest_density_resources: Vec<String>,
    /// Keep the lowest density of every style in the master split
    pub pin_lowest_density_of_styles: bool,
    /// Keep the lowest density of every resource in the master split
    pub pin_lowest_density_of_all: bool,
}

impl DensityPinning {
    /// Whole resource stays in the master split
    pub fn pins_whole(&self, qualified_name: &str) -> bool {
        self.pinned_resources.iter().any(|r| r == qualified_name)
    }

    /// Lowest density value stays in the master split
    pub fn pins_lowest(&self, qualified_name: &str, is_style: bool) -> bool {
        self.pin_lowest_density_of_all
            || (is_style && self.pin_lowest_density_of_styles)
            || self.pin_lowest_density_resources.iter().any(|r| r == qualified_name)
    }
}

/// Splitting pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplittingConfig {
    pub dimensions: BTreeSet<SplitDimension>,
    pub density: DensityPinning,
}

impl Default for SplittingConfig {
    fn default() -> Self {
        Self {
            dimensions: SplitDimension::all().iter().copied().collect(),
            density: DensityPinning::default(),
        }
    }
}

impl SplittingConfig {
    pub fn with_dimensions(mut self, dimensions: &[SplitDimension]) -> Self {
        self.dimensions = dimensions.iter().copied().collect();
        self
    }

    pub fn with_density_pinning(mut self, pinning: DensityPinning) -> Self {
        self.density = pinning;
        self
    }

    /// Enabled dimensions in pipeline order
    pub fn ordered_dimensions(&self) -> Vec<SplitDimension> {
        SplitDimension::all()
            .iter()
            .copied()
            .filter(|d| self.dimensions.contains(d))
            .collect()
    }
}

/// Dimensions a size breakdown may be requested on
pub const SIZE_DIMENSIONS: [TargetingDimension; 7] = [
    TargetingDimension::Abi,
    TargetingDimension::ScreenDensity,
    TargetingDimension::Language,
    TargetingDimension::TextureCompressionFormat,
    TargetingDimension::SdkVersion,
    TargetingDimension::DeviceTier,
    TargetingDimension::CountrySet,
];

/// What a size estimate covers and how it is broken down
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeRequest {
    /// Dimensions shown in the breakdown
    pub dimensions: BTreeSet<TargetingDimension>,
    /// Known device properties; absent fields vary
    pub device: Option<DeviceSpec>,
    pub modules: ModuleSelection,
}

impl SizeRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Break down on `dimensions`; only size dimensions are accepted
    pub fn with_dimensions(mut self, dimensions: &[TargetingDimension]) -> Result<Self, SizeError> {
        for dimension in dimensions {
            if !SIZE_DIMENSIONS.contains(dimension) {
                return Err(SizeError::UnsupportedDimension(*dimension));
            }
        }
        self.dimensions = dimensions.iter().copied().collect();
        Ok(self)
    }

    /// Parse dimension names as given on a command line, e.g. "abi,sdk"
    pub fn with_dimension_names(self, names: &str) -> Result<Self, SizeError> {
        let dimensions = names
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| TargetingDimension::from_str(n).map_err(|_| SizeError::UnknownDimension(n.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        self.with_dimensions(&dimensions)
    }

    pub fn with_device(mut self, device: DeviceSpec) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_modules(mut self, modules: ModuleSelection) -> Self {
        self.modules = modules;
        self
    }

    pub fn shows(&self, dimension: TargetingDimension) -> bool {
        self.dimensions.contains(&dimension)
    }
}
