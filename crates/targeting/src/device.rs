//! Device Specification
//!
//! Immutable snapshot of one device's capabilities. Every field may be
//! absent, which is distinct from an empty or zero value.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Device capabilities relevant to APK selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceSpec {
    /// Supported ABIs, most preferred first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_abis: Option<Vec<String>>,
    /// Screen density in dpi (0 = unknown)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_density: Option<u32>,
    /// SDK/API level (0 = unknown)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<u32>,
    /// Locales, e.g. "en-US"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_locales: Option<Vec<String>>,
    /// OpenGL extension strings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gl_extensions: Option<Vec<String>>,
    /// System feature strings, e.g. "android.hardware.camera"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_features: Option<Vec<String>>,
    /// Caller-defined device tier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_tier: Option<i32>,
    /// Caller-defined device groups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_groups: Option<BTreeSet<String>>,
    /// ISO country code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

impl DeviceSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON device spec
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_abis(mut self, abis: &[&str]) -> Self {
        self.supported_abis = Some(abis.iter().map(|a| a.to_string()).collect());
        self
    }

    pub fn with_screen_density(mut self, dpi: u32) -> Self {
        self.screen_density = Some(dpi);
        self
    }

    pub fn with_sdk_version(mut self, sdk: u32) -> Self {
        self.sdk_version = Some(sdk);
        self
    }

    pub fn with_locales(mut self, locales: &[&str]) -> Self {
        self.supported_locales = Some(locales.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn with_gl_extensions(mut self, extensions: &[&str]) -> Self {
        self.gl_extensions = Some(extensions.iter().map(|e| e.to_string()).collect());
        self
    }

    pub fn with_device_features(mut self, features: &[&str]) -> Self {
        self.device_features = Some(features.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn with_device_tier(mut self, tier: i32) -> Self {
        self.device_tier = Some(tier);
        self
    }

    pub fn with_device_groups(mut self, groups: &[&str]) -> Self {
        self.device_groups = Some(groups.iter().map(|g| g.to_string()).collect());
        self
    }

    pub fn with_country_code(mut self, country: &str) -> Self {
        self.country_code = Some(country.to_ascii_uppercase());
        self
    }

    /// Language part of every supported locale, deduplicated in device order
    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = Vec::new();
        for locale in self.supported_locales.iter().flatten() {
            let language = locale_language(locale);
            if !language.is_empty() && !languages.contains(&language) {
                languages.push(language);
            }
        }
        languages
    }

    /// OpenGL ES version from the `reqGlEsVersion=0x...` feature
    pub fn gl_es_version(&self) -> Option<u32> {
        self.device_features
            .iter()
            .flatten()
            .filter_map(|feature| feature.strip_prefix("reqGlEsVersion="))
            .filter_map(parse_gl_version)
            .max()
    }

    /// Short description for log lines
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ref abis) = self.supported_abis {
            parts.push(format!("abis={}", abis.join(",")));
        }
        if let Some(dpi) = self.screen_density {
            parts.push(format!("density={}", dpi));
        }
        if let Some(sdk) = self.sdk_version {
            parts.push(format!("sdk={}", sdk));
        }
        if let Some(ref locales) = self.supported_locales {
            parts.push(format!("locales={}", locales.join(",")));
        }
        if let Some(tier) = self.device_tier {
            parts.push(format!("tier={}", tier));
        }
        if let Some(ref country) = self.country_code {
            parts.push(format!("country={}", country));
        }
        if parts.is_empty() {
            "<empty device spec>".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// "en-US", "en_US" and "en" all map to "en"
pub fn locale_language(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn parse_gl_version(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}
