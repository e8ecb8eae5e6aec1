//! Size Aggregator
//!
//! For every combination of targeting values the APKs of a variant (or the
//! slices of an asset module) are targeted on, builds a synthetic device,
//! lets the matcher pick what it would install and totals those sizes.
//! Combinations collapsing onto the same displayed configuration fold into
//! min/max.

use std::collections::BTreeMap;

use r_droid_targeting::{
    ApkCatalog, ApkDescription, ApkMatcher, AssetModule, DeviceFeature, DeviceSpec, Targeting,
    TargetingDimension, TargetingError, TargetingValue, TextureCompressionFormat, Variant,
};
use rayon::prelude::*;
use tracing::{debug, info};

use super::{ConfigurationSizes, SizeConfiguration};
use crate::config::{SizeRequest, SIZE_DIMENSIONS};
use crate::SizeError;
use crate::SizeMerger;

/// GLES version implying ETC2 support
const GL_ES_3_0: u32 = 0x30000;

/// Label of fallback artifacts in size rows
const FALLBACK_LABEL: &str = "other";

/// Computes size estimates over a catalog
pub struct SizeAggregator<'a> {
    sizes: &'a BTreeMap<String, u64>,
    request: &'a SizeRequest,
    texture_preference: Vec<TextureCompressionFormat>,
}

impl<'a> SizeAggregator<'a> {
    /// `sizes` maps APK paths to their download size
    pub fn new(sizes: &'a BTreeMap<String, u64>, request: &'a SizeRequest) -> Self {
        Self {
            sizes,
            request,
            texture_preference: TextureCompressionFormat::default_preference().to_vec(),
        }
    }

    pub fn with_texture_preference(mut self, preference: &[TextureCompressionFormat]) -> Self {
        self.texture_preference = preference.to_vec();
        self
    }

    /// Estimate for everything the request covers: the variants the device
    /// could get, joined with every included asset module.
    pub fn aggregate(&self, catalog: &ApkCatalog) -> Result<ConfigurationSizes, SizeError> {
        let variants = self.candidate_variants(catalog)?;
        let mut total = if variants.is_empty() {
            ConfigurationSizes::single(SizeConfiguration::default(), 0)
        } else {
            ConfigurationSizes::default()
        };
        for variant in variants {
            total.absorb(self.aggregate_variant(variant)?);
        }

        for module in catalog
            .asset_modules
            .iter()
            .filter(|m| self.request.modules.includes(&m.name, m.delivery))
        {
            let module_sizes = self.aggregate_asset_module(module)?;
            total = SizeMerger::merge(&total, &module_sizes);
        }

        info!("Estimated sizes for {} configuration(s)", total.len());
        Ok(total)
    }

    /// Variants a device matching the request could receive
    fn candidate_variants<'c>(&self, catalog: &'c ApkCatalog) -> Result<Vec<&'c Variant>, SizeError> {
        let Some(device) = self.request.device.as_ref() else {
            return Ok(catalog.variants.iter().collect());
        };
        let matcher = ApkMatcher::with_texture_preference(device, &self.texture_preference);
        let variants: Vec<&Variant> = catalog
            .variants
            .iter()
            .filter(|v| matcher.matches(&v.targeting))
            .collect();
        if variants.is_empty() && !catalog.variants.is_empty() {
            return Err(TargetingError::NoMatchingApks(format!(
                "no variant matches device {}",
                device.summary()
            ))
            .into());
        }
        Ok(variants)
    }

    /// Estimate for one variant's APKs of the requested modules
    pub fn aggregate_variant(&self, variant: &Variant) -> Result<ConfigurationSizes, SizeError> {
        let apks: Vec<&ApkDescription> = variant
            .apks
            .iter()
            .filter(|apk| self.request.modules.includes(&apk.module_name, apk.delivery))
            .collect();
        debug!("Variant {}: {} APK(s) in scope", variant.number, apks.len());
        self.aggregate_apks(&apks, &variant.targeting)
    }

    /// Estimate for one asset module's slices
    pub fn aggregate_asset_module(&self, module: &AssetModule) -> Result<ConfigurationSizes, SizeError> {
        let slices: Vec<&ApkDescription> = module.slices.iter().collect();
        debug!("Asset module {}: {} slice(s)", module.name, slices.len());
        self.aggregate_apks(&slices, &Targeting::default())
    }

    fn aggregate_apks(
        &self,
        apks: &[&ApkDescription],
        pinned: &Targeting,
    ) -> Result<ConfigurationSizes, SizeError> {
        for apk in apks {
            if !self.sizes.contains_key(&apk.path) {
                return Err(SizeError::MissingSize { path: apk.path.clone() });
            }
        }

        let tuples = self.tuples(apks, pinned)?;
        debug!("Evaluating {} targeting combination(s)", tuples.len());

        let totals: Vec<(SizeConfiguration, u64)> = tuples
            .par_iter()
            .map(|tuple| {
                let device = self.synthetic_device(tuple);
                let matcher = ApkMatcher::with_texture_preference(&device, &self.texture_preference);
                let size: u64 = apks
                    .iter()
                    .filter(|apk| matcher.matches(&apk.targeting))
                    .map(|apk| self.sizes.get(&apk.path).copied().unwrap_or_default())
                    .sum();
                (self.configuration(tuple), size)
            })
            .collect();

        let mut sizes = ConfigurationSizes::default();
        for (config, size) in totals {
            sizes.record(config, size);
        }
        Ok(sizes)
    }

    /// Whether the request's device fixes `dimension`
    fn device_knows(&self, dimension: TargetingDimension) -> bool {
        let Some(device) = self.request.device.as_ref() else {
            return false;
        };
        match dimension {
            TargetingDimension::Abi => device.supported_abis.as_ref().is_some_and(|abis| !abis.is_empty()),
            TargetingDimension::ScreenDensity => device.screen_density.is_some_and(|dpi| dpi != 0),
            TargetingDimension::Language => device.supported_locales.is_some(),
            TargetingDimension::TextureCompressionFormat => device.gl_extensions.is_some(),
            TargetingDimension::SdkVersion => device.sdk_version.is_some_and(|sdk| sdk != 0),
            TargetingDimension::DeviceTier => device.device_tier.is_some(),
            TargetingDimension::CountrySet => device.country_code.is_some(),
            _ => false,
        }
    }

    /// Cartesian product of the candidate values of every size dimension
    fn tuples(&self, apks: &[&ApkDescription], pinned: &Targeting) -> Result<Vec<Targeting>, SizeError> {
        let mut tuples = vec![Targeting::default()];
        for dimension in SIZE_DIMENSIONS {
            if self.device_knows(dimension) {
                continue;
            }
            let candidates: Vec<Targeting> = if pinned.is_targeted(dimension) {
                vec![project(pinned, dimension)]
            } else {
                let mut observed: Vec<Targeting> = Vec::new();
                for apk in apks.iter().filter(|apk| apk.targeting.is_targeted(dimension)) {
                    let candidate = project(&apk.targeting, dimension);
                    if !observed.contains(&candidate) {
                        observed.push(candidate);
                    }
                }
                if observed.is_empty() {
                    continue;
                }
                observed
            };

            let mut product = Vec::with_capacity(tuples.len() * candidates.len());
            for tuple in &tuples {
                for candidate in &candidates {
                    product.push(tuple.merged_with(candidate)?);
                }
            }
            tuples = product;
        }
        Ok(tuples)
    }

    /// Device with the request's known properties plus the tuple's values
    fn synthetic_device(&self, tuple: &Targeting) -> DeviceSpec {
        let mut device = self.request.device.clone().unwrap_or_default();

        if !tuple.abi.is_empty() {
            device.supported_abis = Some(tuple.abi.values().iter().map(|a| a.to_string()).collect());
        }
        if let Some(density) = tuple.screen_density.values().iter().next() {
            device.screen_density = Some(density.dpi());
        }
        if !tuple.language.is_empty() {
            device.supported_locales = Some(tuple.language.values().iter().cloned().collect());
        }
        if !tuple.texture_compression_format.is_empty() {
            let mut extensions = Vec::new();
            for format in tuple.texture_compression_format.values() {
                if *format == TextureCompressionFormat::Etc2 {
                    let feature = DeviceFeature::gl_es_version(GL_ES_3_0).to_string();
                    device.device_features.get_or_insert_with(Vec::new).push(feature);
                }
                extensions.extend(format.gl_extensions().first().map(|e| e.to_string()));
            }
            device.gl_extensions = Some(extensions);
        }
        if let Some(sdk) = tuple.sdk_version.values().iter().next() {
            device.sdk_version = Some(sdk.min);
        }
        if let Some(tier) = tuple.device_tier.values().iter().next() {
            device.device_tier = Some(*tier);
        }
        if let Some(country) = tuple
            .country_set
            .values()
            .iter()
            .next()
            .and_then(|set| set.countries.iter().next())
        {
            device.country_code = Some(country.clone());
        }
        device
    }

    /// Displayed configuration of a tuple: requested dimensions only
    fn configuration(&self, tuple: &Targeting) -> SizeConfiguration {
        let mut config = SizeConfiguration::default();
        for dimension in self.request.dimensions.iter().copied() {
            let label = if self.device_knows(dimension) {
                self.request.device.as_ref().and_then(|d| device_label(d, dimension))
            } else {
                tuple_label(tuple, dimension)
            };
            if let Some(label) = label {
                config.set(dimension, label);
            }
        }
        config
    }
}

/// Targeting carrying only `dimension` of `targeting`
fn project(targeting: &Targeting, dimension: TargetingDimension) -> Targeting {
    let t = targeting.clone();
    match dimension {
        TargetingDimension::Abi => Targeting::new().with_abi(t.abi),
        TargetingDimension::ScreenDensity => Targeting::new().with_screen_density(t.screen_density),
        TargetingDimension::Language => Targeting::new().with_language(t.language),
        TargetingDimension::TextureCompressionFormat => {
            Targeting::new().with_texture_compression_format(t.texture_compression_format)
        }
        TargetingDimension::SdkVersion => Targeting::new().with_sdk_version(t.sdk_version),
        TargetingDimension::DeviceTier => Targeting::new().with_device_tier(t.device_tier),
        TargetingDimension::CountrySet => Targeting::new().with_country_set(t.country_set),
        _ => Targeting::new(),
    }
}

fn label_of<T: std::fmt::Display>(value: &TargetingValue<T>) -> Option<String> {
    if value.is_empty() {
        None
    } else if value.values().is_empty() {
        Some(FALLBACK_LABEL.to_string())
    } else {
        Some(value.value_labels().join("+"))
    }
}

fn tuple_label(tuple: &Targeting, dimension: TargetingDimension) -> Option<String> {
    match dimension {
        TargetingDimension::Abi => label_of(&tuple.abi),
        TargetingDimension::ScreenDensity => label_of(&tuple.screen_density),
        TargetingDimension::Language => label_of(&tuple.language),
        TargetingDimension::TextureCompressionFormat => label_of(&tuple.texture_compression_format),
        TargetingDimension::SdkVersion => label_of(&tuple.sdk_version),
        TargetingDimension::DeviceTier => label_of(&tuple.device_tier),
        TargetingDimension::CountrySet => label_of(&tuple.country_set),
        _ => None,
    }
}

fn device_label(device: &DeviceSpec, dimension: TargetingDimension) -> Option<String> {
    match dimension {
        TargetingDimension::Abi => device.supported_abis.as_ref().map(|abis| abis.join("+")),
        TargetingDimension::ScreenDensity => device.screen_density.map(|dpi| {
            r_droid_targeting::DensityAlias::from_dpi(dpi)
                .map(|alias| alias.as_str().to_string())
                .unwrap_or_else(|| format!("{}dpi", dpi))
        }),
        TargetingDimension::Language => Some(device.languages().join("+")),
        TargetingDimension::TextureCompressionFormat => {
            let formats: Vec<String> = r_droid_targeting::matchers::texture::supported_formats(device)
                .iter()
                .map(|f| f.to_string())
                .collect();
            Some(formats.join("+"))
        }
        TargetingDimension::SdkVersion => device.sdk_version.map(|sdk| format!("{}+", sdk)),
        TargetingDimension::DeviceTier => device.device_tier.map(|tier| tier.to_string()),
        TargetingDimension::CountrySet => device.country_code.clone(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use r_droid_targeting::{Abi, ApkKind, CountrySet, DeliveryType, ModuleSelection, SdkVersion};
    use TargetingDimension as D;

    fn apk(path: &str, targeting: Targeting) -> ApkDescription {
        ApkDescription::new(path, "base", targeting)
    }

    fn abi_targeting(abi: Abi) -> Targeting {
        let alternatives = [Abi::Arm64V8a, Abi::X86].into_iter().filter(|a| *a != abi);
        Targeting::new().with_abi(TargetingValue::new([abi], alternatives).unwrap())
    }

    fn variant() -> Variant {
        Variant {
            number: 0,
            targeting: Targeting::new().with_sdk_version(TargetingValue::of([SdkVersion { min: 21 }])),
            apks: vec![
                apk("base-master.apk", Targeting::default()).with_kind(ApkKind::Master),
                apk("base-arm64_v8a.apk", abi_targeting(Abi::Arm64V8a)),
                apk("base-x86.apk", abi_targeting(Abi::X86)),
            ],
        }
    }

    fn size_table() -> BTreeMap<String, u64> {
        [
            ("base-master.apk", 1000),
            ("base-arm64_v8a.apk", 300),
            ("base-x86.apk", 200),
            ("textures-astc.apk", 50),
            ("textures-other.apk", 80),
        ]
        .into_iter()
        .map(|(p, s)| (p.to_string(), s))
        .collect()
    }

    fn catalog_with_textures() -> ApkCatalog {
        let tcf = |f: TextureCompressionFormat| TargetingValue::new([f], []).unwrap();
        ApkCatalog {
            variants: vec![variant()],
            asset_modules: vec![AssetModule {
                name: "textures".into(),
                delivery: DeliveryType::InstallTime,
                slices: vec![
                    ApkDescription::new(
                        "textures-astc.apk",
                        "textures",
                        Targeting::new().with_texture_compression_format(tcf(TextureCompressionFormat::Astc)),
                    ),
                    ApkDescription::new(
                        "textures-other.apk",
                        "textures",
                        Targeting::new().with_texture_compression_format(TargetingValue::fallback([
                            TextureCompressionFormat::Astc,
                        ])),
                    ),
                ],
            }],
        }
    }

    #[test]
    fn test_value_labels() {
        assert_eq!(label_of(&TargetingValue::<Abi>::default()), None);
        assert_eq!(label_of(&TargetingValue::fallback([Abi::X86])), Some("other".to_string()));
        let both = TargetingValue::of([Abi::X86, Abi::Arm64V8a]);
        assert_eq!(label_of(&both), Some("arm64-v8a+x86".to_string()));
    }

    #[test]
    fn test_breakdown_by_abi() {
        let sizes = size_table();
        let request = SizeRequest::new().with_dimensions(&[D::Abi]).unwrap();
        let result = SizeAggregator::new(&sizes, &request).aggregate_variant(&variant()).unwrap();

        let arm = SizeConfiguration::default().with(D::Abi, "arm64-v8a");
        let x86 = SizeConfiguration::default().with(D::Abi, "x86");
        assert_eq!(result.len(), 2);
        assert_eq!(result.min[&arm], 1300);
        assert_eq!(result.max[&x86], 1200);
    }

    #[test]
    fn test_no_dimensions_collapse_to_one_row() {
        let sizes = size_table();
        let request = SizeRequest::new();
        let result = SizeAggregator::new(&sizes, &request).aggregate_variant(&variant()).unwrap();
        let total = SizeConfiguration::default();
        assert_eq!(result.len(), 1);
        assert_eq!(result.min[&total], 1200);
        assert_eq!(result.max[&total], 1300);
    }

    #[test]
    fn test_pinned_variant_dimension_is_labelled() {
        let sizes = size_table();
        let request = SizeRequest::new().with_dimensions(&[D::SdkVersion]).unwrap();
        let result = SizeAggregator::new(&sizes, &request).aggregate_variant(&variant()).unwrap();
        let row = SizeConfiguration::default().with(D::SdkVersion, "21+");
        assert_eq!(result.min.keys().collect::<Vec<_>>(), vec![&row]);
    }

    #[test]
    fn test_known_device_dimension_collapses() {
        let sizes = size_table();
        let request = SizeRequest::new()
            .with_dimensions(&[D::Abi])
            .unwrap()
            .with_device(DeviceSpec::new().with_abis(&["x86"]));
        let result = SizeAggregator::new(&sizes, &request).aggregate_variant(&variant()).unwrap();
        let x86 = SizeConfiguration::default().with(D::Abi, "x86");
        assert_eq!(result.len(), 1);
        assert_eq!((result.min[&x86], result.max[&x86]), (1200, 1200));
    }

    #[test]
    fn test_missing_size_is_an_error() {
        let sizes: BTreeMap<String, u64> = [("base-master.apk".to_string(), 1)].into_iter().collect();
        let request = SizeRequest::new();
        let err = SizeAggregator::new(&sizes, &request).aggregate_variant(&variant()).unwrap_err();
        assert!(matches!(err, SizeError::MissingSize { .. }));
    }

    #[test]
    fn test_asset_modules_merge_with_variants() {
        let sizes = size_table();
        let request = SizeRequest::new()
            .with_dimensions(&[D::Abi, D::TextureCompressionFormat])
            .unwrap();
        let result = SizeAggregator::new(&sizes, &request)
            .aggregate(&catalog_with_textures())
            .unwrap();

        let arm_astc = SizeConfiguration::default()
            .with(D::Abi, "arm64-v8a")
            .with(D::TextureCompressionFormat, "astc");
        let x86_other = SizeConfiguration::default()
            .with(D::Abi, "x86")
            .with(D::TextureCompressionFormat, FALLBACK_LABEL);
        assert_eq!(result.len(), 4);
        assert_eq!(result.min[&arm_astc], 1350);
        assert_eq!(result.max[&x86_other], 1280);
    }

    #[test]
    fn test_on_demand_modules_follow_selection() {
        let sizes = size_table();
        let mut catalog = catalog_with_textures();
        catalog.asset_modules[0].delivery = DeliveryType::OnDemand;

        let install_time = SizeRequest::new();
        let result = SizeAggregator::new(&sizes, &install_time).aggregate(&catalog).unwrap();
        assert_eq!(result.max[&SizeConfiguration::default()], 1300);

        let all = SizeRequest::new().with_modules(ModuleSelection::All);
        let result = SizeAggregator::new(&sizes, &all).aggregate(&catalog).unwrap();
        assert_eq!(result.max[&SizeConfiguration::default()], 1380);
    }

    #[test]
    fn test_country_sets() {
        let latam = CountrySet::new("latam", &["BR", "MX"]);
        let slices = vec![
            ApkDescription::new(
                "latam.apk",
                "promo",
                Targeting::new().with_country_set(TargetingValue::of([latam.clone()])),
            ),
            ApkDescription::new(
                "rest.apk",
                "promo",
                Targeting::new().with_country_set(TargetingValue::fallback([latam])),
            ),
        ];
        let sizes: BTreeMap<String, u64> = [("latam.apk".to_string(), 10), ("rest.apk".to_string(), 4)]
            .into_iter()
            .collect();
        let request = SizeRequest::new().with_dimensions(&[D::CountrySet]).unwrap();
        let module = AssetModule {
            name: "promo".into(),
            delivery: DeliveryType::InstallTime,
            slices,
        };
        let result = SizeAggregator::new(&sizes, &request).aggregate_asset_module(&module).unwrap();
        assert_eq!(result.min[&SizeConfiguration::default().with(D::CountrySet, "latam")], 10);
        assert_eq!(result.min[&SizeConfiguration::default().with(D::CountrySet, FALLBACK_LABEL)], 4);
    }
}
