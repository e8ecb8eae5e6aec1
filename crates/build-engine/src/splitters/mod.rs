//! Module Splitters
//!
//! A splitter turns one module split into several along one dimension. The
//! pipeline folds a module through the enabled splitters in order and checks
//! after every stage that nothing was lost, duplicated or left empty.

pub mod abi;
pub mod assets;
pub mod density;
pub mod language;

use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{SplitDimension, SplittingConfig};
use crate::module_split::ModuleSplit;
use crate::resources::{ResourceConfig, ResourceId};
use crate::SplitError;

pub use abi::NativeLibrariesSplitter;
pub use assets::{AssetDirectoryDimension, TargetedAssetsSplitter};
pub use density::ScreenDensityResourcesSplitter;
pub use language::LanguageResourcesSplitter;

/// Splits a module split along one dimension.
///
/// Returns at least one split. Content the dimension does not apply to ends
/// up in a remainder split that keeps the input's targeting and master flag.
pub trait ModuleSplitSplitter: Send + Sync {
    /// Short name for logs and error messages
    fn name(&self) -> &'static str;

    fn split(&self, split: ModuleSplit) -> Result<Vec<ModuleSplit>, SplitError>;
}

/// Ordered chain of splitters
pub struct SplittingPipeline {
    splitters: Vec<Box<dyn ModuleSplitSplitter>>,
}

impl SplittingPipeline {
    pub fn new(splitters: Vec<Box<dyn ModuleSplitSplitter>>) -> Self {
        Self { splitters }
    }

    /// Pipeline with one splitter per enabled dimension, in pipeline order
    pub fn from_config(config: &SplittingConfig) -> Self {
        let splitters = config
            .ordered_dimensions()
            .into_iter()
            .map(|dimension| -> Box<dyn ModuleSplitSplitter> {
                match dimension {
                    SplitDimension::Abi => Box::new(NativeLibrariesSplitter),
                    SplitDimension::ScreenDensity => {
                        Box::new(ScreenDensityResourcesSplitter::new(config.density.clone()))
                    }
                    SplitDimension::Language => Box::new(LanguageResourcesSplitter),
                    SplitDimension::TextureCompressionFormat => Box::new(TargetedAssetsSplitter::new(
                        AssetDirectoryDimension::TextureCompressionFormat,
                    )),
                    SplitDimension::DeviceTier => {
                        Box::new(TargetedAssetsSplitter::new(AssetDirectoryDimension::DeviceTier))
                    }
                }
            })
            .collect();
        Self::new(splitters)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.splitters.iter().map(|s| s.name()).collect()
    }

    /// Fold one module through every stage
    pub fn split(&self, module: ModuleSplit) -> Result<Vec<ModuleSplit>, SplitError> {
        let module_name = module.module_name.clone();
        let mut splits = vec![module];

        for splitter in &self.splitters {
            let stage: Vec<Vec<ModuleSplit>> = splits
                .into_par_iter()
                .map(|split| {
                    let contents = SplitContents::of(&split);
                    let is_master = split.is_master_split;
                    let outputs = splitter.split(split)?;
                    verify_stage(splitter.name(), &contents, is_master, &outputs)?;
                    Ok(outputs)
                })
                .collect::<Result<_, SplitError>>()?;
            splits = stage.into_iter().flatten().collect();
            debug!("{}: {} split(s) after {}", module_name, splits.len(), splitter.name());
        }

        Ok(splits)
    }

    /// Split several modules in parallel, keeping input order
    pub fn split_modules(&self, modules: Vec<ModuleSplit>) -> Result<Vec<ModuleSplit>, SplitError> {
        let count = modules.len();
        let per_module: Vec<Vec<ModuleSplit>> = modules
            .into_par_iter()
            .map(|module| self.split(module))
            .collect::<Result<_, SplitError>>()?;
        let splits: Vec<ModuleSplit> = per_module.into_iter().flatten().collect();
        info!("Split {} module(s) into {} split(s)", count, splits.len());
        Ok(splits)
    }
}

/// Everything a split carries, for coverage checks
#[derive(Debug, Default, PartialEq, Eq)]
struct SplitContents {
    paths: BTreeSet<String>,
    pairs: BTreeSet<(ResourceId, ResourceConfig)>,
}

impl SplitContents {
    fn of(split: &ModuleSplit) -> Self {
        Self {
            paths: split.entries.iter().map(|e| e.path.clone()).collect(),
            pairs: split.resource_pairs(),
        }
    }

    fn shares_with(&self, other: &SplitContents) -> bool {
        !self.paths.is_disjoint(&other.paths) || !self.pairs.is_disjoint(&other.pairs)
    }
}

fn violation(stage: &str, message: String) -> SplitError {
    SplitError::InvariantViolation(format!("{} splitter: {}", stage, message))
}

fn verify_stage(
    stage: &str,
    input: &SplitContents,
    input_is_master: bool,
    outputs: &[ModuleSplit],
) -> Result<(), SplitError> {
    if outputs.is_empty() {
        return Err(violation(stage, "produced no splits".into()));
    }

    let contents: Vec<SplitContents> = outputs.iter().map(SplitContents::of).collect();
    let mut covered = SplitContents::default();
    for c in &contents {
        covered.paths.extend(c.paths.iter().cloned());
        covered.pairs.extend(c.pairs.iter().cloned());
    }
    if covered.paths != input.paths {
        if let Some(lost) = input.paths.difference(&covered.paths).next() {
            return Err(violation(stage, format!("entry {} was lost", lost)));
        }
        if let Some(added) = covered.paths.difference(&input.paths).next() {
            return Err(violation(stage, format!("entry {} appeared from nowhere", added)));
        }
    }
    if covered.pairs != input.pairs {
        if let Some((id, config)) = input.pairs.difference(&covered.pairs).next() {
            return Err(violation(stage, format!("resource {} ({}) was lost", id, config)));
        }
        if let Some((id, config)) = covered.pairs.difference(&input.pairs).next() {
            return Err(violation(stage, format!("resource {} ({}) appeared from nowhere", id, config)));
        }
    }

    let masters = outputs.iter().filter(|s| s.is_master_split).count();
    let expected_masters = usize::from(input_is_master);
    if masters != expected_masters {
        return Err(violation(
            stage,
            format!("produced {} master split(s), expected {}", masters, expected_masters),
        ));
    }

    for (i, split) in outputs.iter().enumerate() {
        if !split.is_master_split && split.is_empty() {
            return Err(violation(stage, format!("produced empty split {}", split.split_id())));
        }
        if split.is_master_split {
            continue;
        }
        for (j, other) in outputs.iter().enumerate().skip(i + 1) {
            if other.is_master_split || split.targeting.is_mutually_exclusive_with(&other.targeting) {
                continue;
            }
            if contents[i].shares_with(&contents[j]) {
                return Err(violation(
                    stage,
                    format!("{} and {} share content", split.split_id(), other.split_id()),
                ));
            }
        }
    }

    Ok(())
}
