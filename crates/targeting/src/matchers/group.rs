//! Device group matcher

use std::collections::BTreeSet;

use super::DimensionMatcher;
use crate::device::DeviceSpec;
use crate::error::IncompatibleDevice;
use crate::targeting::{TargetingDimension, TargetingValue};

pub struct DeviceGroupMatcher {
    groups: BTreeSet<String>,
}

impl DeviceGroupMatcher {
    pub fn new(device: &DeviceSpec) -> Self {
        Self {
            groups: device.device_groups.clone().unwrap_or_default(),
        }
    }
}

impl DimensionMatcher for DeviceGroupMatcher {
    type Value = String;

    fn dimension(&self) -> TargetingDimension {
        TargetingDimension::DeviceGroup
    }

    fn is_dimension_present(&self) -> bool {
        true
    }

    fn matches(&self, targeting: &TargetingValue<String>) -> bool {
        targeting.values().is_empty() || !targeting.values().is_disjoint(&self.groups)
    }

    fn check_compatible(&self, targeting: &TargetingValue<String>) -> Result<(), IncompatibleDevice> {
        if targeting.values().is_empty() || targeting.universe().any(|g| self.groups.contains(g)) {
            return Ok(());
        }
        Err(self.incompatible(
            targeting,
            "The device groups do not match any of the available device groups",
        ))
    }

    fn device_values(&self) -> Vec<String> {
        self.groups.iter().cloned().collect()
    }
}
