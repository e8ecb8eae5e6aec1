//! Country set matcher
//!
//! Always present: a device with no known country only gets fallback
//! artifacts.

use super::DimensionMatcher;
use crate::device::DeviceSpec;
use crate::error::IncompatibleDevice;
use crate::targeting::{CountrySet, TargetingDimension, TargetingValue};

pub struct CountrySetMatcher {
    country: Option<String>,
}

impl CountrySetMatcher {
    pub fn new(device: &DeviceSpec) -> Self {
        Self {
            country: device.country_code.as_ref().map(|c| c.to_ascii_uppercase()),
        }
    }

    fn covers(&self, set: &CountrySet) -> bool {
        self.country.as_deref().is_some_and(|c| set.contains(c))
    }
}

impl DimensionMatcher for CountrySetMatcher {
    type Value = CountrySet;

    fn dimension(&self) -> TargetingDimension {
        TargetingDimension::CountrySet
    }

    fn is_dimension_present(&self) -> bool {
        true
    }

    fn matches(&self, targeting: &TargetingValue<CountrySet>) -> bool {
        if targeting.is_empty() {
            return true;
        }
        if targeting.values().iter().any(|set| self.covers(set)) {
            return true;
        }
        if targeting.alternatives().iter().any(|set| self.covers(set)) {
            return false;
        }
        targeting.values().is_empty()
    }

    fn check_compatible(&self, targeting: &TargetingValue<CountrySet>) -> Result<(), IncompatibleDevice> {
        if targeting.values().is_empty() || targeting.universe().any(|set| self.covers(set)) {
            return Ok(());
        }
        Err(self.incompatible(
            targeting,
            "The device country is not in any of the available country sets",
        ))
    }

    fn device_values(&self) -> Vec<String> {
        self.country.clone().into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sets() -> (CountrySet, CountrySet) {
        (
            CountrySet::new("latam", &["AR", "BR", "MX"]),
            CountrySet::new("sea", &["ID", "TH", "VN"]),
        )
    }

    #[test]
    fn test_country_in_claimed_set() {
        let (latam, sea) = sets();
        let m = CountrySetMatcher::new(&DeviceSpec::new().with_country_code("br"));
        assert!(m.matches(&TargetingValue::new([latam.clone()], [sea.clone()]).unwrap()));
        assert!(!m.matches(&TargetingValue::new([sea.clone()], [latam.clone()]).unwrap()));
        assert!(!m.matches(&TargetingValue::fallback([latam, sea])));
    }

    #[test]
    fn test_unknown_country_gets_fallback() {
        let (latam, sea) = sets();
        let m = CountrySetMatcher::new(&DeviceSpec::new());
        assert!(m.matches(&TargetingValue::fallback([latam.clone(), sea.clone()])));
        assert!(!m.matches(&TargetingValue::new([latam.clone()], [sea.clone()]).unwrap()));
        assert!(m.check_compatible(&TargetingValue::new([latam], [sea]).unwrap()).is_err());
    }
}
