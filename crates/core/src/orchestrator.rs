//! Engine
//!
//! Entry point for callers: owns the configuration and the worker pool and
//! runs device matching, module splitting and size estimation on it.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use r_droid_build_engine::{ConfigurationSizes, ModuleSplit, SizeAggregator, SizeRequest, SplittingPipeline};
use r_droid_targeting::{ApkCatalog, ApkDescription, ApkMatcher, DeviceSpec};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::Result;

/// Matching, splitting and size estimation under one configuration
pub struct Engine {
    config: RwLock<EngineConfig>,
    pool: RwLock<Arc<ThreadPool>>,
}

impl Engine {
    /// Create an engine; fails on invalid settings
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let pool = build_pool(config.runtime.parallel_jobs)?;
        info!("Engine ready with {} worker(s)", config.runtime.parallel_jobs);
        Ok(Self {
            config: RwLock::new(config),
            pool: RwLock::new(Arc::new(pool)),
        })
    }

    /// Get current configuration
    pub fn config(&self) -> EngineConfig {
        self.config.read().clone()
    }

    /// Update configuration; the worker pool is rebuilt when its size changes
    pub fn update_config<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut EngineConfig),
    {
        let mut config = self.config.write();
        let mut updated = config.clone();
        f(&mut updated);
        updated.validate()?;

        let jobs = updated.runtime.parallel_jobs;
        if jobs != config.runtime.parallel_jobs {
            *self.pool.write() = Arc::new(build_pool(jobs)?);
            info!("Worker pool resized to {}", jobs);
        }
        *config = updated;
        Ok(())
    }

    fn pool(&self) -> Arc<ThreadPool> {
        self.pool.read().clone()
    }

    /// Matcher for `device` with the configured preferences
    pub fn matcher(&self, device: &DeviceSpec) -> ApkMatcher {
        let config = self.config.read();
        ApkMatcher::with_texture_preference(device, &config.matching.texture_format_preference)
            .with_modules(config.matching.module_selection())
    }

    /// APKs and asset slices `device` should install
    pub fn select_apks(&self, device: &DeviceSpec, catalog: &ApkCatalog) -> Result<Vec<ApkDescription>> {
        let matcher = self.matcher(device);
        let apks: Vec<ApkDescription> = matcher.matching_apks(catalog)?.into_iter().cloned().collect();
        info!("{} APK(s) selected for {}", apks.len(), device.summary());
        Ok(apks)
    }

    /// Pipeline for the configured dimensions
    pub fn splitting_pipeline(&self) -> SplittingPipeline {
        SplittingPipeline::from_config(&self.config.read().splitting)
    }

    /// Split modules along the configured dimensions on the worker pool
    pub fn split_modules(&self, modules: Vec<ModuleSplit>) -> Result<Vec<ModuleSplit>> {
        let pipeline = self.splitting_pipeline();
        debug!("Splitting stages: {:?}", pipeline.stage_names());
        let splits = self.pool().install(|| pipeline.split_modules(modules))?;
        Ok(splits)
    }

    /// Size request with the configured defaults
    pub fn size_request(
        &self,
        dimensions: Option<&[r_droid_targeting::TargetingDimension]>,
        device: Option<DeviceSpec>,
    ) -> Result<SizeRequest> {
        self.config.read().size_request(dimensions, device)
    }

    /// Min/max download sizes per configuration on the worker pool
    pub fn estimate_sizes(
        &self,
        catalog: &ApkCatalog,
        sizes: &BTreeMap<String, u64>,
        request: &SizeRequest,
    ) -> Result<ConfigurationSizes> {
        let preference = self.config.read().matching.texture_format_preference.clone();
        let aggregator = SizeAggregator::new(sizes, request).with_texture_preference(&preference);
        let estimate = self.pool().install(|| aggregator.aggregate(catalog))?;
        Ok(estimate)
    }
}

fn build_pool(jobs: usize) -> Result<ThreadPool> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(jobs)
        .thread_name(|index| format!("r-droid-worker-{}", index))
        .build()?;
    Ok(pool)
}
