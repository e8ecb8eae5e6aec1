//! Composite APK Matcher
//!
//! Combines every dimension matcher to pick, from a catalog, the variant and
//! the APKs a device should install, and audits compatibility across
//! dimensions so all mismatches surface together.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::catalog::{ApkCatalog, ApkDescription, ModuleSelection, Targeted, Variant};
use crate::device::DeviceSpec;
use crate::error::{IncompatibilityReport, IncompatibleDevice, Result, TargetingError};
use crate::matchers::{
    AbiMatcher, CountrySetMatcher, DeviceFeatureMatcher, DeviceGroupMatcher, DeviceTierMatcher,
    DimensionMatcher, LanguageMatcher, MultiAbiMatcher, ScreenDensityMatcher, SdkVersionMatcher,
    TextureCompressionFormatMatcher,
};
use crate::targeting::{Targeting, TargetingDimension, TextureCompressionFormat};

/// Runs `$body` with the matcher and targeting value of `$dimension` bound
/// to `$matcher` and `$value`.
macro_rules! with_dimension {
    ($self:expr, $targeting:expr, $dimension:expr, |$matcher:ident, $value:ident| $body:expr) => {
        match $dimension {
            TargetingDimension::Abi => {
                let ($matcher, $value) = (&$self.abi, &$targeting.abi);
                $body
            }
            TargetingDimension::MultiAbi => {
                let ($matcher, $value) = (&$self.multi_abi, &$targeting.multi_abi);
                $body
            }
            TargetingDimension::ScreenDensity => {
                let ($matcher, $value) = (&$self.density, &$targeting.screen_density);
                $body
            }
            TargetingDimension::TextureCompressionFormat => {
                let ($matcher, $value) = (&$self.texture, &$targeting.texture_compression_format);
                $body
            }
            TargetingDimension::SdkVersion => {
                let ($matcher, $value) = (&$self.sdk, &$targeting.sdk_version);
                $body
            }
            TargetingDimension::DeviceTier => {
                let ($matcher, $value) = (&$self.tier, &$targeting.device_tier);
                $body
            }
            TargetingDimension::DeviceGroup => {
                let ($matcher, $value) = (&$self.group, &$targeting.device_group);
                $body
            }
            TargetingDimension::DeviceFeature => {
                let ($matcher, $value) = (&$self.feature, &$targeting.device_feature);
                $body
            }
            TargetingDimension::Language => {
                let ($matcher, $value) = (&$self.language, &$targeting.language);
                $body
            }
            TargetingDimension::CountrySet => {
                let ($matcher, $value) = (&$self.country, &$targeting.country_set);
                $body
            }
        }
    };
}

/// Matches artifacts against one device
pub struct ApkMatcher {
    device: DeviceSpec,
    abi: AbiMatcher,
    multi_abi: MultiAbiMatcher,
    density: ScreenDensityMatcher,
    texture: TextureCompressionFormatMatcher,
    sdk: SdkVersionMatcher,
    tier: DeviceTierMatcher,
    group: DeviceGroupMatcher,
    feature: DeviceFeatureMatcher,
    language: LanguageMatcher,
    country: CountrySetMatcher,
    modules: ModuleSelection,
}

impl ApkMatcher {
    /// Create a matcher using the canonical texture format preference
    pub fn new(device: &DeviceSpec) -> Self {
        Self::with_texture_preference(device, TextureCompressionFormat::default_preference())
    }

    pub fn with_texture_preference(device: &DeviceSpec, preference: &[TextureCompressionFormat]) -> Self {
        Self {
            device: device.clone(),
            abi: AbiMatcher::new(device),
            multi_abi: MultiAbiMatcher::new(device),
            density: ScreenDensityMatcher::new(device),
            texture: TextureCompressionFormatMatcher::with_preference(device, preference),
            sdk: SdkVersionMatcher::new(device),
            tier: DeviceTierMatcher::new(device),
            group: DeviceGroupMatcher::new(device),
            feature: DeviceFeatureMatcher::new(device),
            language: LanguageMatcher::new(device),
            country: CountrySetMatcher::new(device),
            modules: ModuleSelection::default(),
        }
    }

    /// Restrict selection to the given modules
    pub fn with_modules(mut self, modules: ModuleSelection) -> Self {
        self.modules = modules;
        self
    }

    pub fn device(&self) -> &DeviceSpec {
        &self.device
    }

    pub fn is_dimension_present(&self, dimension: TargetingDimension) -> bool {
        match dimension {
            TargetingDimension::Abi => self.abi.is_dimension_present(),
            TargetingDimension::MultiAbi => self.multi_abi.is_dimension_present(),
            TargetingDimension::ScreenDensity => self.density.is_dimension_present(),
            TargetingDimension::TextureCompressionFormat => self.texture.is_dimension_present(),
            TargetingDimension::SdkVersion => self.sdk.is_dimension_present(),
            TargetingDimension::DeviceTier => self.tier.is_dimension_present(),
            TargetingDimension::DeviceGroup => self.group.is_dimension_present(),
            TargetingDimension::DeviceFeature => self.feature.is_dimension_present(),
            TargetingDimension::Language => self.language.is_dimension_present(),
            TargetingDimension::CountrySet => self.country.is_dimension_present(),
        }
    }

    /// Dimensions the device reports, in canonical order
    pub fn present_dimensions(&self) -> Vec<TargetingDimension> {
        TargetingDimension::ALL
            .iter()
            .copied()
            .filter(|d| self.is_dimension_present(*d))
            .collect()
    }

    pub fn dimension_matches(&self, dimension: TargetingDimension, targeting: &Targeting) -> bool {
        with_dimension!(self, targeting, dimension, |matcher, value| matcher.matches(value))
    }

    pub fn check_dimension(
        &self,
        dimension: TargetingDimension,
        targeting: &Targeting,
    ) -> std::result::Result<(), IncompatibleDevice> {
        with_dimension!(self, targeting, dimension, |matcher, value| matcher.check_compatible(value))
    }

    /// Every present dimension matches; absent dimensions always match
    pub fn matches(&self, targeting: &Targeting) -> bool {
        TargetingDimension::ALL
            .iter()
            .filter(|d| self.is_dimension_present(**d))
            .all(|d| self.dimension_matches(*d, targeting))
    }

    /// First hard incompatibility of one artifact's targeting
    pub fn check_compatible(&self, targeting: &Targeting) -> std::result::Result<(), IncompatibleDevice> {
        for dimension in self.present_dimensions() {
            if targeting.is_targeted(dimension) {
                self.check_dimension(dimension, targeting)?;
            }
        }
        Ok(())
    }

    /// Compatibility of a whole family of artifacts. A dimension is fine when
    /// at least one artifact targeting it can serve the device; failures are
    /// reported against the family's combined targeting.
    pub fn audit<'a, A, I>(&self, artifacts: I) -> std::result::Result<(), IncompatibilityReport>
    where
        A: Targeted + 'a,
        I: IntoIterator<Item = &'a A>,
    {
        let targetings: Vec<&Targeting> = artifacts.into_iter().map(|a| a.targeting()).collect();
        let mut report = IncompatibilityReport::default();

        for dimension in self.present_dimensions() {
            let targeted: Vec<&Targeting> = targetings
                .iter()
                .copied()
                .filter(|t| t.is_targeted(dimension))
                .collect();
            if targeted.is_empty() || targeted.iter().any(|t| self.check_dimension(dimension, t).is_ok()) {
                continue;
            }
            let union = Targeting::union_in(dimension, &targeted);
            let failure = match self.check_dimension(dimension, &union) {
                Err(err) => err,
                Ok(()) => match self.check_dimension(dimension, targeted[0]) {
                    Err(err) => err,
                    Ok(()) => continue,
                },
            };
            debug!("Incompatible {}: {}", dimension, failure);
            report.failures.push(failure);
        }

        if report.is_empty() {
            Ok(())
        } else {
            Err(report)
        }
    }

    /// Artifacts whose targeting matches the device
    pub fn filter<'a, A: Targeted>(&self, artifacts: &'a [A]) -> Vec<&'a A> {
        artifacts.iter().filter(|a| self.matches(a.targeting())).collect()
    }

    /// The highest-numbered variant matching the device
    pub fn select_variant<'a>(&self, catalog: &'a ApkCatalog) -> Result<&'a Variant> {
        if catalog.variants.is_empty() {
            return Err(TargetingError::NoMatchingApks("the catalog has no variants".into()));
        }
        self.audit(&catalog.variants)?;

        self.filter(&catalog.variants)
            .into_iter()
            .max_by_key(|v| v.number)
            .ok_or_else(|| {
                TargetingError::NoMatchingApks(format!(
                    "no variant matches device {}",
                    self.device.summary()
                ))
            })
    }

    /// APKs and asset slices the device should install
    pub fn matching_apks<'a>(&self, catalog: &'a ApkCatalog) -> Result<Vec<&'a ApkDescription>> {
        let variant = self.select_variant(catalog)?;
        debug!("Selected variant {} for {}", variant.number, self.device.summary());

        let mut by_module: BTreeMap<&str, Vec<&ApkDescription>> = BTreeMap::new();
        for apk in variant
            .apks
            .iter()
            .filter(|apk| self.modules.includes(&apk.module_name, apk.delivery))
        {
            by_module.entry(apk.module_name.as_str()).or_default().push(apk);
        }
        for module in catalog
            .asset_modules
            .iter()
            .filter(|m| self.modules.includes(&m.name, m.delivery))
        {
            by_module.entry(module.name.as_str()).or_default().extend(module.slices.iter());
        }

        let mut report = IncompatibilityReport::default();
        for apks in by_module.values() {
            if let Err(module_report) = self.audit(apks.iter().copied()) {
                report.failures.extend(module_report.failures);
            }
        }
        if !report.is_empty() {
            return Err(report.into());
        }

        let matched: Vec<&ApkDescription> = by_module
            .into_values()
            .flatten()
            .filter(|apk| self.matches(&apk.targeting))
            .collect();
        if matched.is_empty() {
            return Err(TargetingError::NoMatchingApks(format!(
                "no APK of variant {} matches device {}",
                variant.number,
                self.device.summary()
            )));
        }

        info!(
            "Matched {} APK(s) from variant {} for {}",
            matched.len(),
            variant.number,
            self.device.summary()
        );
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ApkKind, AssetModule, DeliveryType};
    use crate::targeting::{Abi, DensityAlias, ScreenDensity, SdkVersion, TargetingValue};

    fn abi_targeting(value: Abi, alternatives: &[Abi]) -> Targeting {
        Targeting::new().with_abi(TargetingValue::new([value], alternatives.iter().copied()).unwrap())
    }

    fn sdk_targeting(min: u32, alternatives: &[u32]) -> Targeting {
        Targeting::new().with_sdk_version(
            TargetingValue::new(
                [SdkVersion { min }],
                alternatives.iter().map(|m| SdkVersion { min: *m }),
            )
            .unwrap(),
        )
    }

    fn pixel() -> DeviceSpec {
        DeviceSpec::new()
            .with_abis(&["arm64-v8a", "armeabi-v7a"])
            .with_screen_density(480)
            .with_sdk_version(30)
    }

    fn split_catalog() -> ApkCatalog {
        let density = |alias: DensityAlias| {
            let all = [DensityAlias::Mdpi, DensityAlias::Xhdpi, DensityAlias::Xxhdpi];
            Targeting::new().with_screen_density(
                TargetingValue::new(
                    [ScreenDensity::Alias(alias)],
                    all.iter().filter(|a| **a != alias).map(|a| ScreenDensity::Alias(*a)),
                )
                .unwrap(),
            )
        };
        ApkCatalog {
            variants: vec![
                Variant {
                    number: 0,
                    targeting: sdk_targeting(21, &[]),
                    apks: vec![
                        ApkDescription::new("base-master.apk", "base", Targeting::default()).with_kind(ApkKind::Master),
                        ApkDescription::new(
                            "base-arm64_v8a.apk",
                            "base",
                            abi_targeting(Abi::Arm64V8a, &[Abi::ArmeabiV7a]),
                        ),
                        ApkDescription::new(
                            "base-armeabi_v7a.apk",
                            "base",
                            abi_targeting(Abi::ArmeabiV7a, &[Abi::Arm64V8a]),
                        ),
                        ApkDescription::new("base-xxhdpi.apk", "base", density(DensityAlias::Xxhdpi)),
                        ApkDescription::new("base-xhdpi.apk", "base", density(DensityAlias::Xhdpi)),
                        ApkDescription::new("camera-master.apk", "camera", Targeting::default())
                            .with_kind(ApkKind::Master)
                            .with_delivery(DeliveryType::OnDemand),
                    ],
                },
            ],
            asset_modules: vec![AssetModule {
                name: "levels".into(),
                delivery: DeliveryType::InstallTime,
                slices: vec![ApkDescription::new("levels-master.apk", "levels", Targeting::default())
                    .with_kind(ApkKind::AssetSlice)],
            }],
        }
    }

    #[test]
    fn test_prefers_device_top_abi() {
        let matcher = ApkMatcher::new(&pixel());
        let apks = vec![
            ApkDescription::new("arm64.apk", "base", abi_targeting(Abi::Arm64V8a, &[Abi::ArmeabiV7a])),
            ApkDescription::new("armv7.apk", "base", abi_targeting(Abi::ArmeabiV7a, &[Abi::Arm64V8a])),
        ];
        let matched = matcher.filter(&apks);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].path, "arm64.apk");
    }

    #[test]
    fn test_absent_dimension_always_matches() {
        // No texture probe: texture-targeted artifacts stay eligible.
        let matcher = ApkMatcher::new(&pixel());
        let targeting = Targeting::new().with_texture_compression_format(
            TargetingValue::new([TextureCompressionFormat::Astc], [TextureCompressionFormat::Etc2]).unwrap(),
        );
        assert!(!matcher.is_dimension_present(TargetingDimension::TextureCompressionFormat));
        assert!(matcher.matches(&targeting));
    }

    #[test]
    fn test_matching_apks_from_catalog() {
        let matcher = ApkMatcher::new(&pixel());
        let catalog = split_catalog();
        let paths: Vec<&str> = matcher
            .matching_apks(&catalog)
            .unwrap()
            .iter()
            .map(|a| a.path.as_str())
            .collect();
        assert_eq!(
            paths,
            vec!["base-master.apk", "base-arm64_v8a.apk", "base-xxhdpi.apk", "levels-master.apk"]
        );
    }

    #[test]
    fn test_requested_modules() {
        let matcher = ApkMatcher::new(&pixel()).with_modules(ModuleSelection::requested(["camera"]));
        let catalog = split_catalog();
        let paths: Vec<String> = matcher
            .matching_apks(&catalog)
            .unwrap()
            .iter()
            .map(|a| a.path.clone())
            .collect();
        assert!(paths.contains(&"camera-master.apk".to_string()));
        assert!(!paths.contains(&"levels-master.apk".to_string()));
    }

    #[test]
    fn test_highest_matching_variant_wins() {
        let catalog = ApkCatalog {
            variants: vec![
                Variant {
                    number: 0,
                    targeting: sdk_targeting(21, &[29]),
                    apks: Vec::new(),
                },
                Variant {
                    number: 1,
                    targeting: sdk_targeting(29, &[21]),
                    apks: Vec::new(),
                },
            ],
            asset_modules: Vec::new(),
        };
        let matcher = ApkMatcher::new(&pixel());
        assert_eq!(matcher.select_variant(&catalog).unwrap().number, 1);

        let old = ApkMatcher::new(&DeviceSpec::new().with_sdk_version(23));
        assert_eq!(old.select_variant(&catalog).unwrap().number, 0);
    }

    #[test]
    fn test_audit_aggregates_dimensions() {
        let device = DeviceSpec::new().with_abis(&["x86"]).with_sdk_version(19);
        let matcher = ApkMatcher::new(&device);
        let apks = vec![
            ApkDescription::new(
                "a.apk",
                "base",
                abi_targeting(Abi::Arm64V8a, &[Abi::ArmeabiV7a]).merged_with(&sdk_targeting(21, &[])).unwrap(),
            ),
            ApkDescription::new("b.apk", "base", abi_targeting(Abi::ArmeabiV7a, &[Abi::Arm64V8a])),
        ];
        let report = matcher.audit(&apks).unwrap_err();
        assert_eq!(
            report.dimensions(),
            vec![TargetingDimension::Abi, TargetingDimension::SdkVersion]
        );
        assert_eq!(report.failures[0].declared, vec!["armeabi-v7a".to_string(), "arm64-v8a".to_string()]);
    }

    #[test]
    fn test_incompatible_catalog_surfaces_report() {
        let device = DeviceSpec::new().with_abis(&["x86"]).with_sdk_version(30);
        let matcher = ApkMatcher::new(&device);
        let err = matcher.matching_apks(&split_catalog()).unwrap_err();
        assert!(matches!(err, TargetingError::IncompatibleReport(_)));
        assert!(err.is_device_mismatch());
    }

    #[test]
    fn test_check_compatible_short_circuits() {
        let device = DeviceSpec::new().with_abis(&["x86"]).with_sdk_version(19);
        let matcher = ApkMatcher::new(&device);
        let targeting = abi_targeting(Abi::Arm64V8a, &[]).merged_with(&sdk_targeting(21, &[])).unwrap();
        let err = matcher.check_compatible(&targeting).unwrap_err();
        assert_eq!(err.dimension, TargetingDimension::Abi);
    }
}
