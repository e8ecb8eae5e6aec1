//! Screen Density Splitter
//!
//! Generates one split per density bucket holding, for every resource, the
//! value a device of that bucket would pick. Whatever no bucket claims stays
//! in the remainder.

use std::collections::{BTreeMap, BTreeSet};

use r_droid_targeting::density::select_best_density;
use r_droid_targeting::{DensityAlias, ScreenDensity, Targeting, TargetingValue};
use tracing::debug;

use super::ModuleSplitSplitter;
use crate::config::DensityPinning;
use crate::module_split::{ModuleEntry, ModuleSplit};
use crate::resources::{ConfigValue, ResourceConfig, ResourceEntry, ResourceId, ResourceTable};
use crate::SplitError;

/// Values of one resource that differ only by density
struct DensityGroup<'a> {
    values: Vec<&'a ConfigValue>,
    /// Density kept in the remainder regardless of buckets
    pinned_dpi: Option<u32>,
}

impl<'a> DensityGroup<'a> {
    /// Value a device of `bucket` resolves to, unless pinned
    fn select(&self, bucket: DensityAlias) -> Option<&'a ConfigValue> {
        let dpis = self.values.iter().filter_map(|v| v.config.specific_density());
        let best = select_best_density(dpis, bucket.dpi())?;
        if self.pinned_dpi == Some(best) {
            return None;
        }
        self.values
            .iter()
            .copied()
            .find(|v| v.config.specific_density() == Some(best))
    }
}

pub struct ScreenDensityResourcesSplitter {
    pinning: DensityPinning,
    buckets: Vec<DensityAlias>,
}

impl ScreenDensityResourcesSplitter {
    pub fn new(pinning: DensityPinning) -> Self {
        Self {
            pinning,
            buckets: DensityAlias::buckets().to_vec(),
        }
    }

    /// Density groups of a resource that take part in splitting
    fn groups<'a>(&self, entry: &'a ResourceEntry) -> Vec<DensityGroup<'a>> {
        let qualified_name = entry.qualified_name();
        // Whole-resource pinning wins over lowest-density pinning.
        if self.pinning.pins_whole(&qualified_name) {
            return Vec::new();
        }
        let pin_lowest = self.pinning.pins_lowest(&qualified_name, entry.is_style());

        let mut by_config: BTreeMap<ResourceConfig, Vec<&'a ConfigValue>> = BTreeMap::new();
        for value in &entry.values {
            if value.config.specific_density().is_some() {
                by_config.entry(value.config.without_density()).or_default().push(value);
            }
        }

        by_config
            .into_values()
            .filter_map(|values| {
                let densities: BTreeSet<u32> = values.iter().filter_map(|v| v.config.specific_density()).collect();
                // A lone density has no alternative to choose between.
                if densities.len() < 2 {
                    return None;
                }
                let pinned_dpi = if pin_lowest { densities.first().copied() } else { None };
                Some(DensityGroup { values, pinned_dpi })
            })
            .collect()
    }

    fn bucket_targeting(&self, bucket: DensityAlias) -> Result<TargetingValue<ScreenDensity>, SplitError> {
        let alternatives = self
            .buckets
            .iter()
            .copied()
            .filter(|b| *b != bucket)
            .map(ScreenDensity::from);
        Ok(TargetingValue::new([ScreenDensity::from(bucket)], alternatives)?)
    }
}

impl ModuleSplitSplitter for ScreenDensityResourcesSplitter {
    fn name(&self) -> &'static str {
        "screen_density"
    }

    fn split(&self, split: ModuleSplit) -> Result<Vec<ModuleSplit>, SplitError> {
        if !split.targeting.screen_density.is_empty() {
            return Ok(vec![split]);
        }
        let Some(table) = split.resource_table.as_ref() else {
            return Ok(vec![split]);
        };

        let groups: Vec<(&ResourceEntry, Vec<DensityGroup<'_>>)> = table
            .entries()
            .iter()
            .map(|entry| (entry, self.groups(entry)))
            .filter(|(_, groups)| !groups.is_empty())
            .collect();
        if groups.is_empty() {
            return Ok(vec![split]);
        }

        let mut claimed: BTreeMap<ResourceId, BTreeSet<ResourceConfig>> = BTreeMap::new();
        let mut bucket_splits = Vec::new();

        for &bucket in &self.buckets {
            let mut selected: Vec<ResourceEntry> = Vec::new();
            for (entry, entry_groups) in &groups {
                let values: Vec<ConfigValue> = entry_groups
                    .iter()
                    .filter_map(|group| group.select(bucket))
                    .cloned()
                    .collect();
                if !values.is_empty() {
                    selected.push(entry.with_values(values));
                }
            }
            if selected.is_empty() {
                debug!("{}: no resources for {}, dropping bucket", split.module_name, bucket.as_str());
                continue;
            }

            for entry in &selected {
                let configs = claimed.entry(entry.id).or_default();
                configs.extend(entry.values.iter().map(|v| v.config.clone()));
            }
            let bucket_table = ResourceTable::new(selected)?;
            let files = bucket_table.referenced_files();
            let entries = split.entries_where(|path| files.contains(path));
            let targeting = split
                .targeting
                .merged_with(&Targeting::new().with_screen_density(self.bucket_targeting(bucket)?))?;
            bucket_splits.push(split.derive(entries, Some(bucket_table), targeting));
        }

        let remainder_table = table.without_pairs(&claimed);
        let kept_files = remainder_table.referenced_files();
        let moved_files: BTreeSet<String> = bucket_splits
            .iter()
            .filter_map(|s| s.resource_table.as_ref())
            .flat_map(|t| t.referenced_files())
            .filter(|f| !kept_files.contains(f))
            .collect();
        let remainder_entries: Vec<ModuleEntry> = split.entries_where(|path| !moved_files.contains(path));

        debug!(
            "{}: {} density split(s), {} resource value(s) left in remainder",
            split.module_name,
            bucket_splits.len(),
            remainder_table.value_count()
        );

        let remainder = ModuleSplit {
            entries: remainder_entries,
            resource_table: Some(remainder_table),
            ..split
        };

        let mut outputs = Vec::with_capacity(bucket_splits.len() + 1);
        if remainder.is_master_split || !remainder.is_empty() {
            outputs.push(remainder);
        }
        outputs.extend(bucket_splits);
        Ok(outputs)
    }
}
