//! APK Catalog
//!
//! Produced artifacts as the package-assembly layer hands them over:
//! variants of APKs plus asset modules of asset slices.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TargetingError};
use crate::targeting::Targeting;

/// Name of the module every installation includes
pub const BASE_MODULE: &str = "base";

/// Anything carrying targeting the matchers can classify
pub trait Targeted {
    fn targeting(&self) -> &Targeting;
}

/// Kind of produced artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApkKind {
    #[default]
    Master,
    Split,
    Standalone,
    AssetSlice,
}

/// When a module is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    #[default]
    InstallTime,
    FastFollow,
    OnDemand,
}

/// One produced APK or asset slice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApkDescription {
    /// Path inside the APK set, key of the size table
    pub path: String,
    pub module_name: String,
    #[serde(default)]
    pub kind: ApkKind,
    #[serde(default)]
    pub delivery: DeliveryType,
    #[serde(default)]
    pub targeting: Targeting,
}

impl ApkDescription {
    pub fn new(path: impl Into<String>, module_name: impl Into<String>, targeting: Targeting) -> Self {
        Self {
            path: path.into(),
            module_name: module_name.into(),
            kind: ApkKind::Split,
            delivery: DeliveryType::InstallTime,
            targeting,
        }
    }

    pub fn with_kind(mut self, kind: ApkKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_delivery(mut self, delivery: DeliveryType) -> Self {
        self.delivery = delivery;
        self
    }
}

impl Targeted for ApkDescription {
    fn targeting(&self) -> &Targeting {
        &self.targeting
    }
}

/// APKs delivered together to one installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub number: u32,
    #[serde(default)]
    pub targeting: Targeting,
    #[serde(default)]
    pub apks: Vec<ApkDescription>,
}

impl Targeted for Variant {
    fn targeting(&self) -> &Targeting {
        &self.targeting
    }
}

/// Asset-only module and its slices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetModule {
    pub name: String,
    #[serde(default)]
    pub delivery: DeliveryType,
    #[serde(default)]
    pub slices: Vec<ApkDescription>,
}

/// Everything produced for one app
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApkCatalog {
    pub variants: Vec<Variant>,
    pub asset_modules: Vec<AssetModule>,
}

impl ApkCatalog {
    /// Parse and validate a JSON catalog
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: ApkCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Every APK and asset slice in the catalog
    pub fn all_apks(&self) -> impl Iterator<Item = &ApkDescription> {
        self.variants
            .iter()
            .flat_map(|v| v.apks.iter())
            .chain(self.asset_modules.iter().flat_map(|m| m.slices.iter()))
    }

    /// Variant numbers are unique, paths are unique within a variant and
    /// every targeting record is well formed.
    pub fn validate(&self) -> Result<()> {
        let mut numbers = BTreeSet::new();
        for variant in &self.variants {
            if !numbers.insert(variant.number) {
                return Err(TargetingError::InvariantViolation(format!(
                    "duplicate variant number {}",
                    variant.number
                )));
            }
            variant.targeting.validate()?;
            let mut paths = BTreeSet::new();
            for apk in &variant.apks {
                apk.targeting.validate()?;
                if !paths.insert(apk.path.as_str()) {
                    return Err(TargetingError::InvariantViolation(format!(
                        "duplicate APK path {} in variant {}",
                        apk.path, variant.number
                    )));
                }
            }
        }
        for module in &self.asset_modules {
            for slice in &module.slices {
                slice.targeting.validate()?;
            }
        }
        Ok(())
    }
}

/// Which modules an installation asks for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleSelection {
    /// Install-time modules only
    #[default]
    InstallTime,
    /// Named modules plus base
    Requested(BTreeSet<String>),
    /// Every module in the catalog
    All,
}

impl ModuleSelection {
    pub fn requested<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ModuleSelection::Requested(modules.into_iter().map(Into::into).collect())
    }

    pub fn includes(&self, module_name: &str, delivery: DeliveryType) -> bool {
        match self {
            ModuleSelection::InstallTime => delivery == DeliveryType::InstallTime,
            ModuleSelection::Requested(modules) => module_name == BASE_MODULE || modules.contains(module_name),
            ModuleSelection::All => true,
        }
    }
}
