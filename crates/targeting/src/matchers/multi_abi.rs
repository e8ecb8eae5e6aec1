//! Multi-ABI matcher
//!
//! A multi-ABI set is usable when the device supports every ABI in it. Usable
//! sets are ranked by the device's most preferred ABI they contain, then by
//! how many ABIs they carry.

use std::cmp::Ordering;

use super::{abi::AbiMatcher, matches_by_ranking, DimensionMatcher};
use crate::device::DeviceSpec;
use crate::error::IncompatibleDevice;
use crate::targeting::{MultiAbi, TargetingDimension, TargetingValue};

pub struct MultiAbiMatcher {
    abis: AbiMatcher,
}

impl MultiAbiMatcher {
    pub fn new(device: &DeviceSpec) -> Self {
        Self {
            abis: AbiMatcher::new(device),
        }
    }

    fn is_supported(&self, multi_abi: &MultiAbi) -> bool {
        !multi_abi.abis.is_empty()
            && multi_abi
                .abis
                .iter()
                .all(|abi| self.abis.device_abis().contains(abi))
    }

    /// Device preference rank of every ABI in the set, best first
    fn ranks(&self, multi_abi: &MultiAbi) -> Vec<usize> {
        let device_abis = self.abis.device_abis();
        let mut ranks: Vec<usize> = multi_abi
            .abis
            .iter()
            .filter_map(|abi| device_abis.iter().position(|d| d == abi))
            .collect();
        ranks.sort_unstable();
        ranks
    }

    fn compare(&self, left: &MultiAbi, right: &MultiAbi) -> Ordering {
        let (left_ranks, right_ranks) = (self.ranks(left), self.ranks(right));
        left_ranks
            .first()
            .cmp(&right_ranks.first())
            .then_with(|| right_ranks.len().cmp(&left_ranks.len()))
            .then_with(|| left_ranks.cmp(&right_ranks))
    }

    /// Usable sets from `targeting`, most preferred first
    fn ranking<'a>(&self, targeting: &'a TargetingValue<MultiAbi>) -> Vec<&'a MultiAbi> {
        let mut ranking: Vec<&MultiAbi> = targeting.universe().filter(|m| self.is_supported(m)).collect();
        ranking.sort_by(|a, b| self.compare(a, b));
        ranking
    }
}

impl DimensionMatcher for MultiAbiMatcher {
    type Value = MultiAbi;

    fn dimension(&self) -> TargetingDimension {
        TargetingDimension::MultiAbi
    }

    fn is_dimension_present(&self) -> bool {
        self.abis.is_dimension_present()
    }

    fn matches(&self, targeting: &TargetingValue<MultiAbi>) -> bool {
        matches_by_ranking(self.ranking(targeting), targeting)
    }

    fn check_compatible(&self, targeting: &TargetingValue<MultiAbi>) -> Result<(), IncompatibleDevice> {
        if targeting.is_empty() || !self.ranking(targeting).is_empty() {
            return Ok(());
        }
        Err(self.incompatible(
            targeting,
            "No multi-ABI set of the app is fully supported by the device",
        ))
    }

    fn device_values(&self) -> Vec<String> {
        self.abis.device_values()
    }
}
