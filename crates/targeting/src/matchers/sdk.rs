//! SDK version matcher
//!
//! Single-sided: an artifact declares at most one lower bound. Among
//! artifacts the device satisfies, the highest bound wins.

use super::DimensionMatcher;
use crate::device::DeviceSpec;
use crate::error::IncompatibleDevice;
use crate::targeting::{SdkVersion, TargetingDimension, TargetingValue};

pub struct SdkVersionMatcher {
    sdk: Option<u32>,
}

impl SdkVersionMatcher {
    pub fn new(device: &DeviceSpec) -> Self {
        Self {
            sdk: device.sdk_version,
        }
    }

    fn device_sdk(&self) -> u32 {
        self.sdk.unwrap_or_default()
    }
}

impl DimensionMatcher for SdkVersionMatcher {
    type Value = SdkVersion;

    fn dimension(&self) -> TargetingDimension {
        TargetingDimension::SdkVersion
    }

    fn is_dimension_present(&self) -> bool {
        matches!(self.sdk, Some(sdk) if sdk != 0)
    }

    fn matches(&self, targeting: &TargetingValue<SdkVersion>) -> bool {
        let device_sdk = self.device_sdk();
        let min = targeting.values().iter().next().map(|v| v.min).unwrap_or(0);
        if device_sdk < min {
            return false;
        }
        !targeting
            .alternatives()
            .iter()
            .any(|alt| alt.min <= device_sdk && alt.min > min)
    }

    fn check_compatible(&self, targeting: &TargetingValue<SdkVersion>) -> Result<(), IncompatibleDevice> {
        let device_sdk = self.device_sdk();
        if targeting.is_empty() || targeting.values().is_empty() || targeting.universe().any(|v| v.min <= device_sdk) {
            return Ok(());
        }
        let lowest = targeting.universe().map(|v| v.min).min().unwrap_or_default();
        Err(self.incompatible(
            targeting,
            format!(
                "The app requires SDK {} or higher, but the device has SDK {}",
                lowest, device_sdk
            ),
        ))
    }

    fn device_values(&self) -> Vec<String> {
        self.sdk.map(|sdk| vec![sdk.to_string()]).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn min(min: u32) -> SdkVersion {
        SdkVersion { min }
    }

    fn matcher(sdk: u32) -> SdkVersionMatcher {
        SdkVersionMatcher::new(&DeviceSpec::new().with_sdk_version(sdk))
    }

    #[test]
    fn test_highest_satisfied_bound_wins() {
        let m = matcher(30);
        let l = TargetingValue::new([min(21)], [min(23), min(31)]).unwrap();
        let m23 = TargetingValue::new([min(23)], [min(21), min(31)]).unwrap();
        let s31 = TargetingValue::new([min(31)], [min(21), min(23)]).unwrap();
        assert!(!m.matches(&l));
        assert!(m.matches(&m23));
        assert!(!m.matches(&s31));
    }

    #[test]
    fn test_raising_bound_above_device_flips_match() {
        let m = matcher(28);
        assert!(m.matches(&TargetingValue::of([min(28)])));
        assert!(!m.matches(&TargetingValue::of([min(29)])));
    }

    #[test]
    fn test_unbounded_matches_any() {
        assert!(matcher(1).matches(&TargetingValue::default()));
    }

    #[test]
    fn test_incompatible_when_all_bounds_too_high() {
        let m = matcher(19);
        let targeting = TargetingValue::new([min(21)], [min(23)]).unwrap();
        let err = m.check_compatible(&targeting).unwrap_err();
        assert!(err.message.contains("SDK 21"));
        assert!(matcher(21).check_compatible(&targeting).is_ok());
    }

    #[test]
    fn test_presence() {
        assert!(!matcher(0).is_dimension_present());
        assert!(matcher(21).is_dimension_present());
    }
}
