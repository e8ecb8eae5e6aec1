//! Resource Table
//!
//! Compiled resources of a module: every resource id with the values it
//! carries, one per configuration (density, locale and any other
//! qualifiers). Splitters partition tables by `(id, configuration)` pairs.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use r_droid_targeting::device::locale_language;
use serde::{Deserialize, Serialize};

use crate::SplitError;

/// Density qualifier of resources usable at any density
pub const DENSITY_NODPI: u32 = 0xFFFF;
/// Density qualifier of vector resources
pub const DENSITY_ANYDPI: u32 = 0xFFFE;

/// Packed `0xPPTTEEEE` resource identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub u32);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Configuration a resource value applies to
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceConfig {
    /// Density in dpi, or one of the `nodpi`/`anydpi` markers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<u32>,
    /// Locale qualifier, e.g. "fr" or "fr-CA"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Remaining qualifiers ("land", "night", "v21", ...)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<String>,
}

impl ResourceConfig {
    pub fn with_density(mut self, dpi: u32) -> Self {
        self.density = Some(dpi);
        self
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = Some(locale.to_string());
        self
    }

    pub fn with_qualifier(mut self, qualifier: &str) -> Self {
        self.qualifiers.push(qualifier.to_string());
        self
    }

    /// Density that takes part in density selection
    pub fn specific_density(&self) -> Option<u32> {
        self.density
            .filter(|dpi| *dpi != 0 && *dpi != DENSITY_NODPI && *dpi != DENSITY_ANYDPI)
    }

    /// The same configuration with its density dropped
    pub fn without_density(&self) -> ResourceConfig {
        ResourceConfig {
            density: None,
            ..self.clone()
        }
    }

    /// Language of the locale qualifier
    pub fn language(&self) -> Option<String> {
        self.locale
            .as_deref()
            .map(locale_language)
            .filter(|l| !l.is_empty())
    }
}

impl fmt::Display for ResourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let Some(ref locale) = self.locale {
            parts.push(locale.clone());
        }
        parts.extend(self.qualifiers.iter().cloned());
        match self.density {
            Some(DENSITY_NODPI) => parts.push("nodpi".into()),
            Some(DENSITY_ANYDPI) => parts.push("anydpi".into()),
            Some(dpi) => parts.push(format!("{}dpi", dpi)),
            None => {}
        }
        if parts.is_empty() {
            write!(f, "default")
        } else {
            write!(f, "{}", parts.join("-"))
        }
    }
}

/// One value of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigValue {
    #[serde(default)]
    pub config: ResourceConfig,
    /// Module entry holding the value, for file-based resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl ConfigValue {
    pub fn new(config: ResourceConfig) -> Self {
        Self { config, file: None }
    }

    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.file = Some(path.into());
        self
    }
}

/// A resource and all its configured values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    pub id: ResourceId,
    /// Resource type, e.g. "drawable", "string", "style"
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub values: Vec<ConfigValue>,
}

impl ResourceEntry {
    pub fn new(id: u32, resource_type: &str, name: &str) -> Self {
        Self {
            id: ResourceId(id),
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: ConfigValue) -> Self {
        self.values.push(value);
        self
    }

    /// "type/name", the form pinning rules are written in
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.resource_type, self.name)
    }

    pub fn is_style(&self) -> bool {
        self.resource_type == "style"
    }

    /// Same resource carrying only `values`
    pub fn with_values(&self, values: Vec<ConfigValue>) -> ResourceEntry {
        ResourceEntry {
            id: self.id,
            resource_type: self.resource_type.clone(),
            name: self.name.clone(),
            values,
        }
    }
}

/// Resources of one split, ordered by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ResourceEntry>", into = "Vec<ResourceEntry>")]
pub struct ResourceTable {
    entries: Vec<ResourceEntry>,
}

impl TryFrom<Vec<ResourceEntry>> for ResourceTable {
    type Error = SplitError;

    fn try_from(entries: Vec<ResourceEntry>) -> Result<Self, SplitError> {
        ResourceTable::new(entries)
    }
}

impl From<ResourceTable> for Vec<ResourceEntry> {
    fn from(table: ResourceTable) -> Self {
        table.entries
    }
}

impl ResourceTable {
    /// Build a table; resource ids must be unique
    pub fn new(mut entries: Vec<ResourceEntry>) -> Result<Self, SplitError> {
        entries.sort_by_key(|e| e.id);
        if let Some(pair) = entries.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(SplitError::InvariantViolation(format!(
                "resource {} appears twice in one table",
                pair[0].id
            )));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }

    pub fn entry(&self, id: ResourceId) -> Option<&ResourceEntry> {
        self.entries
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|index| &self.entries[index])
    }

    /// No values at all
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.values.is_empty())
    }

    pub fn value_count(&self) -> usize {
        self.entries.iter().map(|e| e.values.len()).sum()
    }

    /// Every `(id, configuration)` pair in the table
    pub fn pairs(&self) -> BTreeSet<(ResourceId, ResourceConfig)> {
        self.entries
            .iter()
            .flat_map(|e| e.values.iter().map(move |v| (e.id, v.config.clone())))
            .collect()
    }

    /// Module entries the table's values live in
    pub fn referenced_files(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .flat_map(|e| e.values.iter())
            .filter_map(|v| v.file.clone())
            .collect()
    }

    /// Keep the values `keep` accepts, dropping resources left empty
    pub fn filter<F>(&self, mut keep: F) -> ResourceTable
    where
        F: FnMut(&ResourceEntry, &ConfigValue) -> bool,
    {
        let entries = self
            .entries
            .iter()
            .filter_map(|entry| {
                let values: Vec<ConfigValue> = entry
                    .values
                    .iter()
                    .filter(|v| keep(entry, v))
                    .cloned()
                    .collect();
                (!values.is_empty()).then(|| entry.with_values(values))
            })
            .collect();
        ResourceTable { entries }
    }

    /// The table without the given pairs
    pub fn without_pairs(&self, removed: &BTreeMap<ResourceId, BTreeSet<ResourceConfig>>) -> ResourceTable {
        self.filter(|entry, value| {
            removed
                .get(&entry.id)
                .map_or(true, |configs| !configs.contains(&value.config))
        })
    }
}
