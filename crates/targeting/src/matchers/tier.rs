//! Device tier matcher
//!
//! Always present: a device without a tier is in tier 0.

use super::DimensionMatcher;
use crate::device::DeviceSpec;
use crate::error::IncompatibleDevice;
use crate::targeting::{TargetingDimension, TargetingValue};

pub const DEFAULT_DEVICE_TIER: i32 = 0;

pub struct DeviceTierMatcher {
    tier: i32,
}

impl DeviceTierMatcher {
    pub fn new(device: &DeviceSpec) -> Self {
        Self {
            tier: device.device_tier.unwrap_or(DEFAULT_DEVICE_TIER),
        }
    }
}

impl DimensionMatcher for DeviceTierMatcher {
    type Value = i32;

    fn dimension(&self) -> TargetingDimension {
        TargetingDimension::DeviceTier
    }

    fn is_dimension_present(&self) -> bool {
        true
    }

    fn matches(&self, targeting: &TargetingValue<i32>) -> bool {
        targeting.values().is_empty() || targeting.values().contains(&self.tier)
    }

    fn check_compatible(&self, targeting: &TargetingValue<i32>) -> Result<(), IncompatibleDevice> {
        if targeting.values().is_empty() || targeting.universe().any(|t| *t == self.tier) {
            return Ok(());
        }
        Err(self.incompatible(
            targeting,
            format!("Device tier {} does not match any of the available device tiers", self.tier),
        ))
    }

    fn device_values(&self) -> Vec<String> {
        vec![self.tier.to_string()]
    }
}
