//! APK Size Estimation
//!
//! Download sizes per device configuration: the aggregator computes min/max
//! totals over every combination of targeting values, the merger joins
//! estimates of independently delivered parts.

mod aggregator;
mod merger;

use std::collections::BTreeMap;

use r_droid_targeting::TargetingDimension;
use serde::{Deserialize, Serialize};

pub use aggregator::SizeAggregator;
pub use merger::SizeMerger;

/// Displayed configuration of a size row. Only requested dimensions are
/// set; an unset dimension is compatible with any value.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SizeConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_density: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture_compression_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_set: Option<String>,
}

impl SizeConfiguration {
    fn slot(&mut self, dimension: TargetingDimension) -> Option<&mut Option<String>> {
        match dimension {
            TargetingDimension::Abi => Some(&mut self.abi),
            TargetingDimension::ScreenDensity => Some(&mut self.screen_density),
            TargetingDimension::Language => Some(&mut self.language),
            TargetingDimension::TextureCompressionFormat => Some(&mut self.texture_compression_format),
            TargetingDimension::SdkVersion => Some(&mut self.sdk_version),
            TargetingDimension::DeviceTier => Some(&mut self.device_tier),
            TargetingDimension::CountrySet => Some(&mut self.country_set),
            _ => None,
        }
    }

    pub fn get(&self, dimension: TargetingDimension) -> Option<&str> {
        match dimension {
            TargetingDimension::Abi => self.abi.as_deref(),
            TargetingDimension::ScreenDensity => self.screen_density.as_deref(),
            TargetingDimension::Language => self.language.as_deref(),
            TargetingDimension::TextureCompressionFormat => self.texture_compression_format.as_deref(),
            TargetingDimension::SdkVersion => self.sdk_version.as_deref(),
            TargetingDimension::DeviceTier => self.device_tier.as_deref(),
            TargetingDimension::CountrySet => self.country_set.as_deref(),
            _ => None,
        }
    }

    /// Set the label of a size dimension; other dimensions are ignored
    pub fn set(&mut self, dimension: TargetingDimension, label: impl Into<String>) {
        if let Some(slot) = self.slot(dimension) {
            *slot = Some(label.into());
        }
    }

    pub fn with(mut self, dimension: TargetingDimension, label: impl Into<String>) -> Self {
        self.set(dimension, label);
        self
    }

    fn fields(&self) -> [&Option<String>; 7] {
        [
            &self.abi,
            &self.screen_density,
            &self.language,
            &self.texture_compression_format,
            &self.sdk_version,
            &self.device_tier,
            &self.country_set,
        ]
    }

    /// No dimension is set to different values on the two sides
    pub fn is_compatible(&self, other: &SizeConfiguration) -> bool {
        self.fields()
            .iter()
            .zip(other.fields().iter())
            .all(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            })
    }

    /// Union of two compatible configurations
    pub fn merged(&self, other: &SizeConfiguration) -> SizeConfiguration {
        fn pick(a: &Option<String>, b: &Option<String>) -> Option<String> {
            a.clone().or_else(|| b.clone())
        }
        SizeConfiguration {
            abi: pick(&self.abi, &other.abi),
            screen_density: pick(&self.screen_density, &other.screen_density),
            language: pick(&self.language, &other.language),
            texture_compression_format: pick(&self.texture_compression_format, &other.texture_compression_format),
            sdk_version: pick(&self.sdk_version, &other.sdk_version),
            device_tier: pick(&self.device_tier, &other.device_tier),
            country_set: pick(&self.country_set, &other.country_set),
        }
    }
}

/// Min and max total size per displayed configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationSizes {
    pub min: BTreeMap<SizeConfiguration, u64>,
    pub max: BTreeMap<SizeConfiguration, u64>,
}

impl ConfigurationSizes {
    /// A single configuration of one size
    pub fn single(config: SizeConfiguration, size: u64) -> Self {
        let mut sizes = Self::default();
        sizes.record(config, size);
        sizes
    }

    /// Fold one observed total into both maps
    pub fn record(&mut self, config: SizeConfiguration, size: u64) {
        self.min
            .entry(config.clone())
            .and_modify(|s| *s = (*s).min(size))
            .or_insert(size);
        self.max
            .entry(config)
            .and_modify(|s| *s = (*s).max(size))
            .or_insert(size);
    }

    /// Fold every row of `other` into this estimate
    pub fn absorb(&mut self, other: ConfigurationSizes) {
        for (config, size) in other.min {
            self.min
                .entry(config)
                .and_modify(|s| *s = (*s).min(size))
                .or_insert(size);
        }
        for (config, size) in other.max {
            self.max
                .entry(config)
                .and_modify(|s| *s = (*s).max(size))
                .or_insert(size);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_empty() && self.max.is_empty()
    }

    pub fn len(&self) -> usize {
        self.min.len()
    }

    /// Rows in configuration order
    pub fn rows(&self) -> Vec<SizeRow> {
        self.min
            .iter()
            .map(|(config, min)| SizeRow {
                config: config.clone(),
                min: *min,
                max: self.max.get(config).copied().unwrap_or(*min),
            })
            .collect()
    }

    /// CSV table with one column per dimension, then MIN and MAX
    pub fn to_csv(&self, dimensions: &[TargetingDimension], human_readable: bool) -> String {
        let render = |bytes: u64| {
            if human_readable {
                format_size(bytes)
            } else {
                bytes.to_string()
            }
        };
        let mut header: Vec<&str> = dimensions.iter().map(|d| d.as_str()).collect();
        header.extend(["MIN", "MAX"]);
        let mut lines = vec![header.join(",")];
        for row in self.rows() {
            let mut cells: Vec<String> = dimensions
                .iter()
                .map(|d| row.config.get(*d).unwrap_or_default().to_string())
                .collect();
            cells.push(render(row.min));
            cells.push(render(row.max));
            lines.push(cells.join(","));
        }
        lines.join("\n")
    }
}

/// One configuration with its size range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRow {
    #[serde(flatten)]
    pub config: SizeConfiguration,
    pub min: u64,
    pub max: u64,
}

/// Format a byte count for people
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_compatibility() {
        let arm = SizeConfiguration::default().with(TargetingDimension::Abi, "arm64-v8a");
        let x86 = SizeConfiguration::default().with(TargetingDimension::Abi, "x86");
        let astc = SizeConfiguration::default().with(TargetingDimension::TextureCompressionFormat, "astc");
        assert!(!arm.is_compatible(&x86));
        assert!(arm.is_compatible(&astc));
        let merged = arm.merged(&astc);
        assert_eq!(merged.get(TargetingDimension::Abi), Some("arm64-v8a"));
        assert_eq!(merged.get(TargetingDimension::TextureCompressionFormat), Some("astc"));
    }

    #[test]
    fn test_record_folds_min_max() {
        let mut sizes = ConfigurationSizes::default();
        sizes.record(SizeConfiguration::default(), 10);
        sizes.record(SizeConfiguration::default(), 30);
        sizes.record(SizeConfiguration::default(), 20);
        let rows = sizes.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].min, rows[0].max), (10, 30));
    }

    #[test]
    fn test_csv() {
        let mut sizes = ConfigurationSizes::default();
        sizes.record(SizeConfiguration::default().with(TargetingDimension::SdkVersion, "21+"), 2048);
        let csv = sizes.to_csv(&[TargetingDimension::SdkVersion], true);
        assert_eq!(csv, "SDK_VERSION,MIN,MAX\n21+,2.00 KB,2.00 KB");
    }

    #[test]
    fn test_ignores_non_size_dimensions() {
        let config = SizeConfiguration::default().with(TargetingDimension::DeviceGroup, "beta");
        assert_eq!(config, SizeConfiguration::default());
    }
}
