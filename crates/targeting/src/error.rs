//! Targeting errors
//!
//! Two disjoint kinds: device incompatibility (user-facing) and invariant
//! violations (corrupt catalog or a bug).

use std::fmt;

use thiserror::Error;

use crate::targeting::TargetingDimension;

/// A present device dimension has no usable artifact at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (device: [{}], available: [{}])", device_values.join(", "), declared.join(", "))]
pub struct IncompatibleDevice {
    /// Dimension that failed
    pub dimension: TargetingDimension,
    /// What the device reported for this dimension
    pub device_values: Vec<String>,
    /// Every value the targeting declares (values and alternatives)
    pub declared: Vec<String>,
    /// Dimension-specific explanation
    pub message: String,
}

/// All incompatibilities found during a full compatibility audit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IncompatibilityReport {
    pub failures: Vec<IncompatibleDevice>,
}

impl IncompatibilityReport {
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Dimensions that failed, in audit order
    pub fn dimensions(&self) -> Vec<TargetingDimension> {
        self.failures.iter().map(|f| f.dimension).collect()
    }
}

impl fmt::Display for IncompatibilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.failures.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Targeting errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetingError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Unknown {dimension} value: {value}")]
    UnknownValue {
        dimension: TargetingDimension,
        value: String,
    },

    #[error("Incompatible device: {0}")]
    Incompatible(#[from] IncompatibleDevice),

    #[error("Incompatible device: {0}")]
    IncompatibleReport(IncompatibilityReport),

    #[error("No APKs match the device: {0}")]
    NoMatchingApks(String),

    #[error("Catalog parse error: {0}")]
    Parse(String),
}

impl TargetingError {
    /// Device mismatches are reported to the user; everything else is a bug
    /// or corrupt input.
    pub fn is_device_mismatch(&self) -> bool {
        matches!(
            self,
            TargetingError::Incompatible(_)
                | TargetingError::IncompatibleReport(_)
                | TargetingError::NoMatchingApks(_)
        )
    }
}

impl From<IncompatibilityReport> for TargetingError {
    fn from(report: IncompatibilityReport) -> Self {
        TargetingError::IncompatibleReport(report)
    }
}

impl From<serde_json::Error> for TargetingError {
    fn from(err: serde_json::Error) -> Self {
        TargetingError::Parse(err.to_string())
    }
}

/// Result type alias for targeting operations
pub type Result<T> = std::result::Result<T, TargetingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incompatible_message_lists_both_sides() {
        let err = IncompatibleDevice {
            dimension: TargetingDimension::Abi,
            device_values: vec!["x86".into()],
            declared: vec!["arm64-v8a".into(), "armeabi-v7a".into()],
            message: "No native code for the device ABIs".into(),
        };
        let text = err.to_string();
        assert!(text.contains("device: [x86]"));
        assert!(text.contains("available: [arm64-v8a, armeabi-v7a]"));
    }

    #[test]
    fn test_device_mismatch_classification() {
        assert!(TargetingError::NoMatchingApks("x".into()).is_device_mismatch());
        assert!(!TargetingError::InvariantViolation("x".into()).is_device_mismatch());
    }
}
