//! Targeted Assets Splitter
//!
//! Asset directories carry their targeting in a name suffix, e.g.
//! `assets/textures#tcf_astc/` or `assets/levels#tier_1/`. Each targeted
//! value becomes its own split. For texture formats, the unsuffixed sibling
//! directory becomes a fallback split for devices supporting none of them.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use r_droid_targeting::{Targeting, TargetingValue, TextureCompressionFormat};
use tracing::debug;

use super::ModuleSplitSplitter;
use crate::module_split::{ModuleEntry, ModuleSplit};
use crate::SplitError;

const ASSETS_DIR: &str = "assets/";

/// Dimension encoded in asset directory names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetDirectoryDimension {
    TextureCompressionFormat,
    DeviceTier,
}

impl AssetDirectoryDimension {
    /// Suffix key, as in `#tcf_astc`
    pub fn key(&self) -> &'static str {
        match self {
            AssetDirectoryDimension::TextureCompressionFormat => "tcf",
            AssetDirectoryDimension::DeviceTier => "tier",
        }
    }

    fn parse_value(&self, raw: &str) -> Result<AssetValue, SplitError> {
        let invalid = || {
            SplitError::InvariantViolation(format!("invalid #{}_ value '{}' in asset directory", self.key(), raw))
        };
        match self {
            AssetDirectoryDimension::TextureCompressionFormat => TextureCompressionFormat::from_str(raw)
                .map(AssetValue::Format)
                .map_err(|_| invalid()),
            AssetDirectoryDimension::DeviceTier => raw.parse::<i32>().map(AssetValue::Tier).map_err(|_| invalid()),
        }
    }

    fn is_targeted(&self, targeting: &Targeting) -> bool {
        match self {
            AssetDirectoryDimension::TextureCompressionFormat => !targeting.texture_compression_format.is_empty(),
            AssetDirectoryDimension::DeviceTier => !targeting.device_tier.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum AssetValue {
    Format(TextureCompressionFormat),
    Tier(i32),
}

/// Suffix value for `key` in an asset path, with the directory path the
/// suffix was stripped from.
pub(crate) fn targeted_directory<'a>(path: &'a str, key: &str) -> Option<(&'a str, String)> {
    let rest = path.strip_prefix(ASSETS_DIR)?;
    let segments: Vec<&str> = rest.split('/').collect();
    // The last segment is the file name.
    let (_, dirs) = segments.split_last()?;

    for (index, dir) in dirs.iter().enumerate() {
        let mut parts = dir.split('#');
        let name = parts.next().unwrap_or_default();
        let mut found = None;
        let mut kept = vec![name.to_string()];
        for suffix in parts {
            match suffix.strip_prefix(key).and_then(|s| s.strip_prefix('_')) {
                Some(value) if found.is_none() => found = Some(value),
                _ => kept.push(suffix.to_string()),
            }
        }
        if let Some(value) = found {
            let mut base: Vec<String> = dirs[..index].iter().map(|d| d.to_string()).collect();
            base.push(kept.join("#"));
            return Some((value, format!("{}{}", ASSETS_DIR, base.join("/"))));
        }
    }
    None
}

pub struct TargetedAssetsSplitter {
    dimension: AssetDirectoryDimension,
}

impl TargetedAssetsSplitter {
    pub fn new(dimension: AssetDirectoryDimension) -> Self {
        Self { dimension }
    }

    fn targeting(&self, value: AssetValue, siblings: &BTreeSet<AssetValue>) -> Result<Targeting, SplitError> {
        let targeting = match value {
            AssetValue::Format(format) => {
                let alternatives = siblings.iter().filter_map(|v| match v {
                    AssetValue::Format(f) if *f != format => Some(*f),
                    _ => None,
                });
                Targeting::new().with_texture_compression_format(TargetingValue::new([format], alternatives)?)
            }
            AssetValue::Tier(tier) => {
                let alternatives = siblings.iter().filter_map(|v| match v {
                    AssetValue::Tier(t) if *t != tier => Some(*t),
                    _ => None,
                });
                Targeting::new().with_device_tier(TargetingValue::new([tier], alternatives)?)
            }
        };
        Ok(targeting)
    }

    fn fallback_targeting(&self, siblings: &BTreeSet<AssetValue>) -> Option<Targeting> {
        match self.dimension {
            AssetDirectoryDimension::TextureCompressionFormat => {
                let formats = siblings.iter().filter_map(|v| match v {
                    AssetValue::Format(f) => Some(*f),
                    AssetValue::Tier(_) => None,
                });
                Some(Targeting::new().with_texture_compression_format(TargetingValue::fallback(formats)))
            }
            // Untiered devices are tier 0; unsuffixed assets stay in the remainder.
            AssetDirectoryDimension::DeviceTier => None,
        }
    }
}

impl ModuleSplitSplitter for TargetedAssetsSplitter {
    fn name(&self) -> &'static str {
        match self.dimension {
            AssetDirectoryDimension::TextureCompressionFormat => "texture_compression_format",
            AssetDirectoryDimension::DeviceTier => "device_tier",
        }
    }

    fn split(&self, split: ModuleSplit) -> Result<Vec<ModuleSplit>, SplitError> {
        if self.dimension.is_targeted(&split.targeting) {
            return Ok(vec![split]);
        }

        let key = self.dimension.key();
        let mut by_value: BTreeMap<AssetValue, Vec<ModuleEntry>> = BTreeMap::new();
        let mut base_dirs: BTreeSet<String> = BTreeSet::new();
        let mut untargeted: Vec<ModuleEntry> = Vec::new();
        for entry in &split.entries {
            match targeted_directory(&entry.path, key) {
                Some((raw, base)) => {
                    let value = self.dimension.parse_value(raw)?;
                    by_value.entry(value).or_default().push(entry.clone());
                    base_dirs.insert(format!("{}/", base));
                }
                None => untargeted.push(entry.clone()),
            }
        }
        if by_value.is_empty() {
            return Ok(vec![split]);
        }

        let siblings: BTreeSet<AssetValue> = by_value.keys().copied().collect();
        let mut targeted_splits = Vec::with_capacity(by_value.len() + 1);

        let mut remainder = untargeted;
        if let Some(fallback) = self.fallback_targeting(&siblings) {
            let (fallback_entries, rest): (Vec<ModuleEntry>, Vec<ModuleEntry>) = remainder
                .into_iter()
                .partition(|e| base_dirs.iter().any(|dir| e.path.starts_with(dir.as_str())));
            remainder = rest;
            if !fallback_entries.is_empty() {
                let targeting = split.targeting.merged_with(&fallback)?;
                targeted_splits.push(split.derive(fallback_entries, None, targeting));
            }
        }
        for (value, entries) in by_value {
            let targeting = split.targeting.merged_with(&self.targeting(value, &siblings)?)?;
            targeted_splits.push(split.derive(entries, None, targeting));
        }
        debug!(
            "{}: {} targeted asset split(s) by #{}",
            split.module_name,
            targeted_splits.len(),
            key
        );

        let rest = ModuleSplit {
            entries: remainder,
            ..split
        };
        let mut outputs = Vec::with_capacity(targeted_splits.len() + 1);
        if rest.is_master_split || !rest.is_empty() {
            outputs.push(rest);
        }
        outputs.extend(targeted_splits);
        Ok(outputs)
    }
}
