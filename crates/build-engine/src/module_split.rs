//! Module Split
//!
//! Unit the splitting pipeline operates on: a subset of one module's entries
//! and resources plus the targeting that says which devices need it.

use std::collections::BTreeSet;

use r_droid_targeting::{Targeted, Targeting};
use serde::{Deserialize, Serialize};

use crate::resources::{ResourceConfig, ResourceId, ResourceTable};

/// File inside a module
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleEntry {
    /// Path relative to the module root, e.g. "lib/arm64-v8a/libgame.so"
    pub path: String,
    /// Uncompressed size in bytes
    #[serde(default)]
    pub size: u64,
}

impl ModuleEntry {
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

/// A module or a fragment of one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSplit {
    pub module_name: String,
    #[serde(default)]
    pub entries: Vec<ModuleEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_table: Option<ResourceTable>,
    #[serde(default)]
    pub targeting: Targeting,
    /// The remainder every device of the module installs
    #[serde(default)]
    pub is_master_split: bool,
}

impl ModuleSplit {
    /// Whole, untargeted module as it enters the pipeline
    pub fn for_module(
        module_name: impl Into<String>,
        mut entries: Vec<ModuleEntry>,
        resource_table: Option<ResourceTable>,
    ) -> Self {
        entries.sort();
        Self {
            module_name: module_name.into(),
            entries,
            resource_table,
            targeting: Targeting::default(),
            is_master_split: true,
        }
    }

    /// Fragment of this split with different content and targeting
    pub fn derive(
        &self,
        entries: Vec<ModuleEntry>,
        resource_table: Option<ResourceTable>,
        targeting: Targeting,
    ) -> ModuleSplit {
        ModuleSplit {
            module_name: self.module_name.clone(),
            entries,
            resource_table: resource_table.filter(|t| !t.entries().is_empty()),
            targeting,
            is_master_split: false,
        }
    }

    /// Paths of every entry
    pub fn entry_paths(&self) -> BTreeSet<&str> {
        self.entries.iter().map(|e| e.path.as_str()).collect()
    }

    /// `(id, configuration)` pairs of the resource table
    pub fn resource_pairs(&self) -> BTreeSet<(ResourceId, ResourceConfig)> {
        self.resource_table
            .as_ref()
            .map(ResourceTable::pairs)
            .unwrap_or_default()
    }

    /// Carries neither entries nor resource values
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.resource_table.as_ref().map_or(true, ResourceTable::is_empty)
    }

    /// Entries whose path satisfies `keep`
    pub fn entries_where<F>(&self, keep: F) -> Vec<ModuleEntry>
    where
        F: Fn(&str) -> bool,
    {
        self.entries.iter().filter(|e| keep(&e.path)).cloned().collect()
    }

    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    /// Split name as used in APK file names: "base", "base.config.hdpi",
    /// "base.config.arm64_v8a.fr"
    pub fn split_id(&self) -> String {
        let mut suffixes: Vec<String> = Vec::new();
        let t = &self.targeting;
        suffixes.extend(t.abi.values().iter().map(|a| a.as_str().replace('-', "_")));
        suffixes.extend(t.screen_density.values().iter().map(|d| d.to_string()));
        suffixes.extend(t.language.values().iter().cloned());
        suffixes.extend(t.texture_compression_format.values().iter().map(|f| f.to_string()));
        suffixes.extend(t.device_tier.values().iter().map(|tier| format!("tier_{}", tier)));
        if t.texture_compression_format.is_fallback() {
            suffixes.push("other_tcf".to_string());
        }
        if self.is_master_split || suffixes.is_empty() {
            self.module_name.clone()
        } else {
            format!("{}.config.{}", self.module_name, suffixes.join("."))
        }
    }
}

impl Targeted for ModuleSplit {
    fn targeting(&self) -> &Targeting {
        &self.targeting
    }
}
