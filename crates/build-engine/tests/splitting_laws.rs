//! Splitting pipeline laws over generated modules

use std::collections::BTreeSet;

use proptest::prelude::*;
use r_droid_build_engine::{
    ConfigValue, DensityPinning, ModuleEntry, ModuleSplit, ResourceConfig, ResourceEntry, ResourceId, ResourceTable,
    SplittingConfig, SplittingPipeline,
};

const DPIS: [u32; 6] = [120, 160, 240, 320, 480, 640];
const ABIS: [&str; 3] = ["arm64-v8a", "armeabi-v7a", "x86_64"];

#[derive(Debug, Clone)]
struct ResourceSpec {
    densities: BTreeSet<usize>,
    locale: Option<&'static str>,
    with_default: bool,
}

fn resource_spec() -> impl Strategy<Value = ResourceSpec> {
    (
        prop::collection::btree_set(0usize..DPIS.len(), 1..4),
        prop::option::of(prop_oneof![Just("fr"), Just("de")]),
        any::<bool>(),
    )
        .prop_map(|(densities, locale, with_default)| ResourceSpec {
            densities,
            locale,
            with_default,
        })
}

fn build_module(resources: &[ResourceSpec], abis: &BTreeSet<usize>) -> ModuleSplit {
    let mut entries = vec![ModuleEntry::new("dex/classes.dex", 4096)];
    let mut table = Vec::new();

    for (index, spec) in resources.iter().enumerate() {
        let mut resource = ResourceEntry::new(0x7f01_0000 + index as u32, "drawable", &format!("r{}", index));
        let base = match spec.locale {
            Some(locale) => ResourceConfig::default().with_locale(locale),
            None => ResourceConfig::default(),
        };
        if spec.with_default {
            let path = format!("res/drawable/r{}.xml", index);
            resource = resource.with_value(ConfigValue::new(base.clone()).with_file(path.as_str()));
            entries.push(ModuleEntry::new(path, 10));
        }
        for &d in &spec.densities {
            let path = format!("res/drawable-{}-{}dpi/r{}.png", spec.locale.unwrap_or("any"), DPIS[d], index);
            resource = resource.with_value(ConfigValue::new(base.clone().with_density(DPIS[d])).with_file(path.as_str()));
            entries.push(ModuleEntry::new(path, 100 + d as u64));
        }
        table.push(resource);
    }
    for &a in abis {
        entries.push(ModuleEntry::new(format!("lib/{}/libnative.so", ABIS[a]), 2048));
    }

    ModuleSplit::for_module("base", entries, Some(ResourceTable::new(table).unwrap()))
}

/// Resources whose `fr` and `de` values point at one file, optionally with
/// a default value of their own
fn shared_language_module(shared: &[bool]) -> ModuleSplit {
    let mut entries = Vec::new();
    let mut table = Vec::new();
    for (index, with_default) in shared.iter().enumerate() {
        let file = format!("res/raw/r{}.bin", index);
        let mut resource = ResourceEntry::new(0x7f02_0000 + index as u32, "raw", &format!("r{}", index))
            .with_value(ConfigValue::new(ResourceConfig::default().with_locale("fr")).with_file(file.as_str()))
            .with_value(ConfigValue::new(ResourceConfig::default().with_locale("de")).with_file(file.as_str()));
        if *with_default {
            let default_file = format!("res/raw/r{}_default.bin", index);
            resource = resource.with_value(ConfigValue::new(ResourceConfig::default()).with_file(default_file.as_str()));
            entries.push(ModuleEntry::new(default_file, 5));
        }
        entries.push(ModuleEntry::new(file, 10));
        table.push(resource);
    }
    ModuleSplit::for_module("base", entries, Some(ResourceTable::new(table).unwrap()))
}

fn pinning(pin_all: bool, pin_styles: bool) -> DensityPinning {
    DensityPinning {
        pin_lowest_density_of_all: pin_all,
        pin_lowest_density_of_styles: pin_styles,
        ..DensityPinning::default()
    }
}

proptest! {
    #[test]
    fn test_pipeline_covers_without_overlap(
        resources in prop::collection::vec(resource_spec(), 0..6),
        abis in prop::collection::btree_set(0usize..ABIS.len(), 0..3),
        pin_all in any::<bool>(),
    ) {
        let module = build_module(&resources, &abis);
        let config = SplittingConfig::default().with_density_pinning(pinning(pin_all, false));
        let splits = SplittingPipeline::from_config(&config).split(module.clone()).unwrap();

        // Exactly one master split.
        prop_assert_eq!(splits.iter().filter(|s| s.is_master_split).count(), 1);

        // Full coverage of entries and resource values.
        let paths: BTreeSet<&str> = splits.iter().flat_map(|s| s.entry_paths()).collect();
        prop_assert_eq!(paths, module.entry_paths());
        let pairs: BTreeSet<(ResourceId, ResourceConfig)> =
            splits.iter().flat_map(|s| s.resource_pairs()).collect();
        prop_assert_eq!(pairs, module.resource_pairs());

        for (i, split) in splits.iter().enumerate() {
            prop_assert!(split.is_master_split || !split.is_empty());
            if split.is_master_split {
                continue;
            }
            for other in splits.iter().skip(i + 1).filter(|s| !s.is_master_split) {
                if split.targeting.is_mutually_exclusive_with(&other.targeting) {
                    continue;
                }
                prop_assert!(split.entry_paths().is_disjoint(&other.entry_paths()));
                prop_assert!(split.resource_pairs().is_disjoint(&other.resource_pairs()));
            }
        }
    }

    #[test]
    fn test_pin_lowest_keeps_lowest_density_in_master(
        resources in prop::collection::vec(resource_spec(), 1..6),
    ) {
        let module = build_module(&resources, &BTreeSet::new());
        let config = SplittingConfig::default().with_density_pinning(pinning(true, false));
        let splits = SplittingPipeline::from_config(&config).split(module).unwrap();
        let master = splits.iter().find(|s| s.is_master_split).unwrap();
        let master_pairs = master.resource_pairs();

        for (index, spec) in resources.iter().enumerate() {
            let lowest = DPIS[*spec.densities.iter().next().unwrap()];
            let mut config = ResourceConfig::default().with_density(lowest);
            if let Some(locale) = spec.locale {
                config = config.with_locale(locale);
            }
            let pair = (ResourceId(0x7f01_0000 + index as u32), config);
            if spec.densities.len() >= 2 && spec.locale.is_none() {
                prop_assert!(master_pairs.contains(&pair));
            }
        }
    }

    #[test]
    fn test_every_bucket_split_resolves_one_value_per_group(
        resources in prop::collection::vec(resource_spec(), 1..6),
    ) {
        let module = build_module(&resources, &BTreeSet::new());
        let config = SplittingConfig::default().with_dimensions(&[r_droid_build_engine::SplitDimension::ScreenDensity]);
        let splits = SplittingPipeline::from_config(&config).split(module).unwrap();

        for split in splits.iter().filter(|s| !s.is_master_split) {
            let table = split.resource_table.as_ref().unwrap();
            for entry in table.entries() {
                let groups: BTreeSet<ResourceConfig> =
                    entry.values.iter().map(|v| v.config.without_density()).collect();
                prop_assert_eq!(groups.len(), entry.values.len());
            }
        }
    }

    #[test]
    fn test_files_shared_across_languages_split_cleanly(
        shared in prop::collection::vec(any::<bool>(), 1..5),
    ) {
        let module = shared_language_module(&shared);
        let splits = SplittingPipeline::from_config(&SplittingConfig::default()).split(module.clone()).unwrap();

        let master = splits.iter().find(|s| s.is_master_split).unwrap();
        for index in 0..shared.len() {
            let file = format!("res/raw/r{}.bin", index);
            prop_assert!(master.entry_paths().contains(file.as_str()));
        }
        let pairs: BTreeSet<(ResourceId, ResourceConfig)> =
            splits.iter().flat_map(|s| s.resource_pairs()).collect();
        prop_assert_eq!(pairs, module.resource_pairs());
    }
}
