//! Size Merger
//!
//! Joins the estimates of two independently delivered parts, e.g. an app
//! variant and an asset module: every pair of compatible configurations
//! yields their union with the sizes summed.

use std::collections::BTreeMap;

use super::{ConfigurationSizes, SizeConfiguration};

pub struct SizeMerger;

impl SizeMerger {
    /// Commutative join; colliding keys keep the smaller minimum and the
    /// larger maximum.
    pub fn merge(left: &ConfigurationSizes, right: &ConfigurationSizes) -> ConfigurationSizes {
        ConfigurationSizes {
            min: join(&left.min, &right.min, u64::min),
            max: join(&left.max, &right.max, u64::max),
        }
    }

    /// Merge any number of estimates left to right
    pub fn merge_all<'a>(parts: impl IntoIterator<Item = &'a ConfigurationSizes>) -> Option<ConfigurationSizes> {
        parts.into_iter().fold(None, |acc, part| match acc {
            None => Some(part.clone()),
            Some(total) => Some(Self::merge(&total, part)),
        })
    }
}

fn join(
    left: &BTreeMap<SizeConfiguration, u64>,
    right: &BTreeMap<SizeConfiguration, u64>,
    keep: fn(u64, u64) -> u64,
) -> BTreeMap<SizeConfiguration, u64> {
    let mut joined: BTreeMap<SizeConfiguration, u64> = BTreeMap::new();
    for (left_config, left_size) in left {
        for (right_config, right_size) in right {
            if !left_config.is_compatible(right_config) {
                continue;
            }
            let size = left_size.saturating_add(*right_size);
            joined
                .entry(left_config.merged(right_config))
                .and_modify(|s| *s = keep(*s, size))
                .or_insert(size);
        }
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use r_droid_targeting::TargetingDimension::{Abi, TextureCompressionFormat};

    fn sizes(rows: &[(SizeConfiguration, u64, u64)]) -> ConfigurationSizes {
        let mut sizes = ConfigurationSizes::default();
        for (config, min, max) in rows {
            sizes.min.insert(config.clone(), *min);
            sizes.max.insert(config.clone(), *max);
        }
        sizes
    }

    #[test]
    fn test_joins_compatible_rows() {
        let arm = SizeConfiguration::default().with(Abi, "arm64-v8a");
        let x86 = SizeConfiguration::default().with(Abi, "x86");
        let astc = SizeConfiguration::default().with(TextureCompressionFormat, "astc");
        let etc2 = SizeConfiguration::default().with(TextureCompressionFormat, "etc2");

        let app = sizes(&[(arm.clone(), 100, 120), (x86.clone(), 90, 110)]);
        let assets = sizes(&[(astc.clone(), 50, 50), (etc2.clone(), 70, 80)]);
        let merged = SizeMerger::merge(&app, &assets);

        assert_eq!(merged.len(), 4);
        assert_eq!(merged.min[&arm.merged(&astc)], 150);
        assert_eq!(merged.max[&x86.merged(&etc2)], 190);
    }

    #[test]
    fn test_incompatible_rows_are_skipped() {
        let arm = SizeConfiguration::default().with(Abi, "arm64-v8a");
        let x86 = SizeConfiguration::default().with(Abi, "x86");
        let merged = SizeMerger::merge(&sizes(&[(arm, 1, 1)]), &sizes(&[(x86, 2, 2)]));
        assert!(merged.is_empty());
    }

    #[test]
    fn test_collisions_fold() {
        // Both right rows are compatible with the unset left row and merge
        // into the same key.
        let any = SizeConfiguration::default();
        let arm = SizeConfiguration::default().with(Abi, "arm64-v8a");
        let left = sizes(&[(any.clone(), 10, 10), (arm.clone(), 20, 20)]);
        let right = sizes(&[(arm.clone(), 5, 7)]);
        let merged = SizeMerger::merge(&left, &right);
        assert_eq!(merged.min[&arm], 15);
        assert_eq!(merged.max[&arm], 27);
    }

    #[test]
    fn test_commutative() {
        let left = sizes(&[
            (SizeConfiguration::default().with(Abi, "x86"), 3, 9),
            (SizeConfiguration::default(), 1, 2),
        ]);
        let right = sizes(&[(SizeConfiguration::default().with(TextureCompressionFormat, "astc"), 4, 8)]);
        assert_eq!(SizeMerger::merge(&left, &right), SizeMerger::merge(&right, &left));
    }

    #[test]
    fn test_large_sizes_saturate() {
        let left = sizes(&[(SizeConfiguration::default(), u64::MAX - 1, u64::MAX)]);
        let right = sizes(&[(SizeConfiguration::default(), 5, 5)]);
        let merged = SizeMerger::merge(&left, &right);
        assert_eq!(merged.min[&SizeConfiguration::default()], u64::MAX);
        assert_eq!(merged.max[&SizeConfiguration::default()], u64::MAX);
    }

    #[test]
    fn test_merge_all() {
        let part = ConfigurationSizes::single(SizeConfiguration::default(), 10);
        let total = SizeMerger::merge_all([&part, &part, &part]).unwrap();
        assert_eq!(total.min[&SizeConfiguration::default()], 30);
        assert!(SizeMerger::merge_all(std::iter::empty()).is_none());
    }
}
