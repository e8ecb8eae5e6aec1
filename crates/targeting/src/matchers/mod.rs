//! Dimension Matchers
//!
//! One matcher per targeting dimension, all built from a [`DeviceSpec`] and
//! sharing the [`DimensionMatcher`] contract.

pub mod abi;
pub mod country;
pub mod density;
pub mod feature;
pub mod group;
pub mod language;
pub mod multi_abi;
pub mod sdk;
pub mod texture;
pub mod tier;

use std::fmt;

pub use abi::AbiMatcher;
pub use country::CountrySetMatcher;
pub use density::ScreenDensityMatcher;
pub use feature::DeviceFeatureMatcher;
pub use group::DeviceGroupMatcher;
pub use language::LanguageMatcher;
pub use multi_abi::MultiAbiMatcher;
pub use sdk::SdkVersionMatcher;
pub use texture::TextureCompressionFormatMatcher;
pub use tier::DeviceTierMatcher;

use crate::error::IncompatibleDevice;
use crate::targeting::{TargetingDimension, TargetingValue};

/// Matching contract shared by every dimension
pub trait DimensionMatcher {
    /// Value type of the dimension
    type Value: Ord + Clone + fmt::Debug + fmt::Display;

    fn dimension(&self) -> TargetingDimension;

    /// Whether the device carries a meaningful value for this dimension
    fn is_dimension_present(&self) -> bool;

    /// Whether an artifact with this targeting should be installed
    fn matches(&self, targeting: &TargetingValue<Self::Value>) -> bool;

    /// Fails when no artifact of the family described by `targeting` can
    /// serve this device. Only meaningful when the dimension is present.
    fn check_compatible(&self, targeting: &TargetingValue<Self::Value>) -> Result<(), IncompatibleDevice>;

    /// Device values for diagnostics
    fn device_values(&self) -> Vec<String>;

    /// Build the incompatibility error for `targeting`
    fn incompatible(&self, targeting: &TargetingValue<Self::Value>, message: impl Into<String>) -> IncompatibleDevice {
        IncompatibleDevice {
            dimension: self.dimension(),
            device_values: self.device_values(),
            declared: targeting.universe_labels(),
            message: message.into(),
        }
    }
}

/// Walk `ranking` from most to least preferred. The first value claimed by
/// the artifact matches; the first value claimed by a sibling does not.
/// When nothing in the ranking is claimed, only the fallback artifact
/// (no values, some alternatives) matches.
pub(crate) fn matches_by_ranking<'a, T: Ord + fmt::Debug + 'a>(
    ranking: impl IntoIterator<Item = &'a T>,
    targeting: &TargetingValue<T>,
) -> bool {
    if targeting.is_empty() {
        return true;
    }
    for candidate in ranking {
        if targeting.values().contains(candidate) {
            return true;
        }
        if targeting.alternatives().contains(candidate) {
            return false;
        }
    }
    targeting.values().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_first_hit_decides() {
        let targeting = TargetingValue::new([2], [1]).unwrap();
        assert!(!matches_by_ranking(&[1, 2], &targeting));
        assert!(matches_by_ranking(&[2, 1], &targeting));
    }

    #[test]
    fn test_ranking_exhausted() {
        let claimed = TargetingValue::new([5], [6]).unwrap();
        assert!(!matches_by_ranking(&[1, 2], &claimed));

        // Fallback rule applies uniformly across ranked dimensions.
        let fallback = TargetingValue::fallback([6]);
        assert!(matches_by_ranking(&[1, 2], &fallback));
        assert!(!matches_by_ranking(&[6], &fallback));
    }

    #[test]
    fn test_ranking_untargeted_matches() {
        assert!(matches_by_ranking(&[1], &TargetingValue::<i32>::default()));
        assert!(matches_by_ranking(&[] as &[i32], &TargetingValue::<i32>::default()));
    }
}
