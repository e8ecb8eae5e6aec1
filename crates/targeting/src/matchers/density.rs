//! Screen density matcher

use super::DimensionMatcher;
use crate::density::select_best_density;
use crate::device::DeviceSpec;
use crate::error::IncompatibleDevice;
use crate::targeting::{ScreenDensity, TargetingDimension, TargetingValue};

pub struct ScreenDensityMatcher {
    dpi: Option<u32>,
}

impl ScreenDensityMatcher {
    pub fn new(device: &DeviceSpec) -> Self {
        Self {
            dpi: device.screen_density,
        }
    }
}

impl DimensionMatcher for ScreenDensityMatcher {
    type Value = ScreenDensity;

    fn dimension(&self) -> TargetingDimension {
        TargetingDimension::ScreenDensity
    }

    fn is_dimension_present(&self) -> bool {
        matches!(self.dpi, Some(dpi) if dpi != 0)
    }

    fn matches(&self, targeting: &TargetingValue<ScreenDensity>) -> bool {
        // Every device density is claimed by its nearest bucket, so an
        // artifact without density values is never displaced.
        if targeting.values().is_empty() {
            return true;
        }
        let requested = self.dpi.unwrap_or_default();
        match select_best_density(targeting.universe().map(|d| d.dpi()), requested) {
            Some(best) => targeting.values().iter().any(|d| d.dpi() == best),
            None => true,
        }
    }

    fn check_compatible(&self, _targeting: &TargetingValue<ScreenDensity>) -> Result<(), IncompatibleDevice> {
        // Some density is always nearest; the device only ever gets a
        // scaled variant, never nothing.
        Ok(())
    }

    fn device_values(&self) -> Vec<String> {
        self.dpi.map(|dpi| vec![dpi.to_string()]).unwrap_or_default()
    }
}
