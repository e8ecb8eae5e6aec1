//! Engine Configuration
//!
//! Settings read from `config.toml`:
//! - Matching preferences (texture formats, requested modules)
//! - Splitting dimensions and density pinning
//! - Default size breakdown
//! - Worker pool size

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use r_droid_build_engine::{SizeRequest, SplittingConfig, SIZE_DIMENSIONS};
use r_droid_targeting::{DeviceSpec, ModuleSelection, TargetingDimension, TextureCompressionFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RDroidError, Result};

/// Device matching preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Texture formats in order of preference, best first
    pub texture_format_preference: Vec<TextureCompressionFormat>,
    /// Modules to install besides base; empty means install-time modules
    pub requested_modules: Vec<String>,
    /// Select every module regardless of delivery
    pub all_modules: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            texture_format_preference: TextureCompressionFormat::default_preference().to_vec(),
            requested_modules: Vec::new(),
            all_modules: false,
        }
    }
}

impl MatchingConfig {
    pub fn module_selection(&self) -> ModuleSelection {
        if self.all_modules {
            ModuleSelection::All
        } else if self.requested_modules.is_empty() {
            ModuleSelection::InstallTime
        } else {
            ModuleSelection::requested(self.requested_modules.iter().cloned())
        }
    }
}

/// Size breakdown defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizesConfig {
    /// Dimensions shown when the caller asks for none
    pub dimensions: Vec<TargetingDimension>,
    /// Render sizes as KB/MB instead of bytes
    pub human_readable: bool,
}

/// Worker pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Number of worker threads
    pub parallel_jobs: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            parallel_jobs: num_cpus::get(),
        }
    }
}

/// Main engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub matching: MatchingConfig,
    pub splitting: SplittingConfig,
    pub sizes: SizesConfig,
    pub runtime: RuntimeConfig,
}

impl EngineConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "rdroid", "R-Droid").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when no
    /// file exists yet
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| RDroidError::Config("Cannot determine config path".into()))?;

        if config_file.exists() {
            Self::load_from(&config_file).await
        } else {
            info!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load and validate a config file
    pub async fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = tokio::fs::read_to_string(path).await?;
        let config: EngineConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to the default location
    pub async fn save(&self) -> Result<()> {
        let config_file = Self::config_file()
            .ok_or_else(|| RDroidError::Config("Cannot determine config path".into()))?;
        self.save_to(&config_file).await
    }

    /// Save configuration to file
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.runtime.parallel_jobs == 0 {
            return Err(RDroidError::Config("runtime.parallel_jobs must be at least 1".into()));
        }

        let mut seen = BTreeSet::new();
        for format in &self.matching.texture_format_preference {
            if !seen.insert(format) {
                return Err(RDroidError::Config(format!(
                    "texture format {} listed twice in matching.texture_format_preference",
                    format.as_str()
                )));
            }
        }

        if let Some(dimension) = self.sizes.dimensions.iter().find(|d| !SIZE_DIMENSIONS.contains(d)) {
            return Err(RDroidError::Config(format!(
                "sizes.dimensions cannot contain {}",
                dimension
            )));
        }
        Ok(())
    }

    /// Size request with the configured defaults; explicit `dimensions`
    /// replace the configured breakdown
    pub fn size_request(
        &self,
        dimensions: Option<&[TargetingDimension]>,
        device: Option<DeviceSpec>,
    ) -> Result<SizeRequest> {
        let dimensions = dimensions.unwrap_or(&self.sizes.dimensions);
        let mut request = SizeRequest::new()
            .with_dimensions(dimensions)?
            .with_modules(self.matching.module_selection());
        if let Some(device) = device {
            request = request.with_device(device);
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use r_droid_build_engine::SplitDimension;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.runtime.parallel_jobs >= 1);
        assert_eq!(config.matching.module_selection(), ModuleSelection::InstallTime);
        assert_eq!(config.splitting.dimensions.len(), SplitDimension::all().len());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [matching]
            requested_modules = ["feature_camera"]

            [splitting]
            dimensions = ["screen_density"]

            [splitting.density]
            pin_lowest_density_of_all = true

            [sizes]
            dimensions = ["ABI", "SDK_VERSION"]
            "#,
        )
        .unwrap();

        assert_eq!(
            config.matching.module_selection(),
            ModuleSelection::requested(["feature_camera"])
        );
        assert_eq!(config.splitting.ordered_dimensions(), vec![SplitDimension::ScreenDensity]);
        assert!(config.splitting.density.pin_lowest_density_of_all);
        assert_eq!(config.sizes.dimensions, vec![TargetingDimension::Abi, TargetingDimension::SdkVersion]);
        assert_eq!(
            config.matching.texture_format_preference,
            TextureCompressionFormat::default_preference()
        );
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = EngineConfig::default();
        config.runtime.parallel_jobs = 0;
        assert!(matches!(config.validate(), Err(RDroidError::Config(_))));

        let mut config = EngineConfig::default();
        config.matching.texture_format_preference =
            vec![TextureCompressionFormat::Astc, TextureCompressionFormat::Astc];
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.sizes.dimensions = vec![TargetingDimension::DeviceGroup];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_size_request_overrides_dimensions() {
        let mut config = EngineConfig::default();
        config.sizes.dimensions = vec![TargetingDimension::Abi];

        let request = config.size_request(None, None).unwrap();
        assert!(request.shows(TargetingDimension::Abi));

        let request = config
            .size_request(Some(&[TargetingDimension::SdkVersion]), Some(DeviceSpec::new().with_sdk_version(30)))
            .unwrap();
        assert!(!request.shows(TargetingDimension::Abi));
        assert!(request.shows(TargetingDimension::SdkVersion));
        assert!(request.device.is_some());
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = EngineConfig::default();
        config.runtime.parallel_jobs = 3;
        config.sizes.human_readable = true;
        config.splitting.density.pinned_resources.push("drawable/logo".into());
        config.save_to(&path).await.unwrap();

        let loaded = EngineConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[runtime]\nparallel_jobs = 0\n").await.unwrap();
        assert!(EngineConfig::load_from(&path).await.is_err());

        tokio::fs::write(&path, "[runtime\n").await.unwrap();
        assert!(matches!(EngineConfig::load_from(&path).await, Err(RDroidError::TomlParse(_))));
    }
}
