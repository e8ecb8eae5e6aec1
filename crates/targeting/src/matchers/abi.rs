//! ABI matcher
//!
//! Ranks ABIs by the device's own preference order.

use tracing::debug;

use super::{matches_by_ranking, DimensionMatcher};
use crate::device::DeviceSpec;
use crate::error::IncompatibleDevice;
use crate::targeting::{Abi, TargetingDimension, TargetingValue};

pub struct AbiMatcher {
    /// Known device ABIs, most preferred first
    device_abis: Vec<Abi>,
    raw_abis: Option<Vec<String>>,
}

impl AbiMatcher {
    pub fn new(device: &DeviceSpec) -> Self {
        let raw_abis = device.supported_abis.clone();
        let mut device_abis = Vec::new();
        for raw in raw_abis.iter().flatten() {
            match raw.parse::<Abi>() {
                Ok(abi) if !device_abis.contains(&abi) => device_abis.push(abi),
                Ok(_) => {}
                Err(_) => debug!("Ignoring unknown device ABI {}", raw),
            }
        }
        Self {
            device_abis,
            raw_abis,
        }
    }

    pub fn device_abis(&self) -> &[Abi] {
        &self.device_abis
    }
}

impl DimensionMatcher for AbiMatcher {
    type Value = Abi;

    fn dimension(&self) -> TargetingDimension {
        TargetingDimension::Abi
    }

    fn is_dimension_present(&self) -> bool {
        self.raw_abis.as_ref().is_some_and(|abis| !abis.is_empty())
    }

    fn matches(&self, targeting: &TargetingValue<Abi>) -> bool {
        matches_by_ranking(&self.device_abis, targeting)
    }

    fn check_compatible(&self, targeting: &TargetingValue<Abi>) -> Result<(), IncompatibleDevice> {
        if targeting.is_empty() || targeting.universe().any(|abi| self.device_abis.contains(abi)) {
            return Ok(());
        }
        Err(self.incompatible(targeting, "The app doesn't have native code supported by the device"))
    }

    fn device_values(&self) -> Vec<String> {
        self.raw_abis.clone().unwrap_or_default()
    }
}
