//! Device feature matcher
//!
//! Every required feature must be present on the device. OpenGL ES is a
//! versioned feature compared by magnitude.

use super::DimensionMatcher;
use crate::device::DeviceSpec;
use crate::error::IncompatibleDevice;
use crate::targeting::{DeviceFeature, TargetingDimension, TargetingValue};

pub struct DeviceFeatureMatcher {
    features: Option<Vec<String>>,
    gl_es_version: Option<u32>,
}

impl DeviceFeatureMatcher {
    pub fn new(device: &DeviceSpec) -> Self {
        Self {
            features: device.device_features.clone(),
            gl_es_version: device.gl_es_version(),
        }
    }

    pub fn has_feature(&self, feature: &DeviceFeature) -> bool {
        if feature.name == DeviceFeature::GL_ES_VERSION {
            let required = feature.version.unwrap_or_default();
            return self.gl_es_version.is_some_and(|v| v >= required);
        }
        self.features
            .iter()
            .flatten()
            .any(|f| *f == feature.name)
    }
}

impl DimensionMatcher for DeviceFeatureMatcher {
    type Value = DeviceFeature;

    fn dimension(&self) -> TargetingDimension {
        TargetingDimension::DeviceFeature
    }

    fn is_dimension_present(&self) -> bool {
        self.features.is_some()
    }

    fn matches(&self, targeting: &TargetingValue<DeviceFeature>) -> bool {
        targeting.values().iter().all(|f| self.has_feature(f))
    }

    fn check_compatible(&self, targeting: &TargetingValue<DeviceFeature>) -> Result<(), IncompatibleDevice> {
        if targeting.values().is_empty()
            || self.matches(targeting)
            || targeting.alternatives().iter().any(|f| self.has_feature(f))
        {
            return Ok(());
        }
        Err(self.incompatible(targeting, "The device lacks features the app requires"))
    }

    fn device_values(&self) -> Vec<String> {
        self.features.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_required_features() {
        let m = DeviceFeatureMatcher::new(
            &DeviceSpec::new().with_device_features(&["android.hardware.camera", "reqGlEsVersion=0x30000"]),
        );
        let camera = TargetingValue::of([DeviceFeature::named("android.hardware.camera")]);
        let camera_nfc = TargetingValue::of([
            DeviceFeature::named("android.hardware.camera"),
            DeviceFeature::named("android.hardware.nfc"),
        ]);
        assert!(m.matches(&camera));
        assert!(!m.matches(&camera_nfc));
    }

    #[test]
    fn test_gl_version_by_magnitude() {
        let m = DeviceFeatureMatcher::new(&DeviceSpec::new().with_device_features(&["reqGlEsVersion=0x30001"]));
        assert!(m.matches(&TargetingValue::of([DeviceFeature::gl_es_version(0x30000)])));
        assert!(!m.matches(&TargetingValue::of([DeviceFeature::gl_es_version(0x30002)])));
    }

    #[test]
    fn test_compatible_through_alternative() {
        let m = DeviceFeatureMatcher::new(&DeviceSpec::new().with_device_features(&["android.hardware.wifi"]));
        let targeting = TargetingValue::new(
            [DeviceFeature::named("android.hardware.telephony")],
            [DeviceFeature::named("android.hardware.wifi")],
        )
        .unwrap();
        assert!(!m.matches(&targeting));
        assert!(m.check_compatible(&targeting).is_ok());
    }
}
