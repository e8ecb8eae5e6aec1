//! Language matcher
//!
//! Devices install every language split they have a locale for. A fallback
//! artifact serves devices none of whose languages are claimed by siblings.

use std::collections::BTreeSet;

use super::DimensionMatcher;
use crate::device::DeviceSpec;
use crate::error::IncompatibleDevice;
use crate::targeting::{TargetingDimension, TargetingValue};

pub struct LanguageMatcher {
    languages: Vec<String>,
    probed: bool,
}

impl LanguageMatcher {
    pub fn new(device: &DeviceSpec) -> Self {
        Self {
            languages: device.languages(),
            probed: device.supported_locales.is_some(),
        }
    }

    fn claims_device_language(&self, languages: &BTreeSet<String>) -> bool {
        self.languages.iter().any(|l| languages.contains(l))
    }
}

impl DimensionMatcher for LanguageMatcher {
    type Value = String;

    fn dimension(&self) -> TargetingDimension {
        TargetingDimension::Language
    }

    fn is_dimension_present(&self) -> bool {
        self.probed
    }

    fn matches(&self, targeting: &TargetingValue<String>) -> bool {
        if targeting.values().is_empty() {
            return !self.claims_device_language(targeting.alternatives());
        }
        self.claims_device_language(targeting.values())
    }

    fn check_compatible(&self, _targeting: &TargetingValue<String>) -> Result<(), IncompatibleDevice> {
        // Untranslated languages fall back to the default resources.
        Ok(())
    }

    fn device_values(&self) -> Vec<String> {
        self.languages.clone()
    }
}
