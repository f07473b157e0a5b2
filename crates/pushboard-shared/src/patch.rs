//! Request bodies for release mutations.

use serde::{Deserialize, Serialize};

use crate::constants::MAX_ROLLOUT;
use crate::error::ValidationError;
use crate::types::Release;

/// Partial update of a published release. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleasePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollout: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mandatory: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_binary_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ReleasePatch {
    pub fn rollout(rollout: u8) -> Self {
        Self {
            rollout: Some(rollout),
            ..Self::default()
        }
    }

    pub fn disabled(is_disabled: bool) -> Self {
        Self {
            is_disabled: Some(is_disabled),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check the patch can be applied to `current`.
    ///
    /// Rollout never exceeds 100 and never moves backwards on the same
    /// release.
    pub fn validate_against(&self, current: &Release) -> Result<(), ValidationError> {
        if let Some(rollout) = self.rollout {
            if rollout > MAX_ROLLOUT {
                return Err(ValidationError::RolloutOutOfRange(rollout));
            }
            if rollout < current.rollout {
                return Err(ValidationError::RolloutDecrease {
                    current: current.rollout,
                    requested: rollout,
                });
            }
        }
        Ok(())
    }
}

/// Body of a promote call. Fields left unset inherit from the source release.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromoteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollout: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mandatory: Option<bool>,
}

impl PromoteRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.rollout {
            Some(rollout) if rollout > MAX_ROLLOUT => {
                Err(ValidationError::RolloutOutOfRange(rollout))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn release_at(rollout: u8) -> Release {
        Release {
            label: "v7".to_string(),
            package_hash: "h7".to_string(),
            target_binary_range: "*".to_string(),
            is_disabled: false,
            is_mandatory: false,
            rollout,
            upload_time: 0,
            size: 1,
            released_by: "ci".to_string(),
            release_method: "Upload".to_string(),
            blob_url: "https://blobs/".to_string(),
            diff_package_map: BTreeMap::new(),
        }
    }

    #[test]
    fn test_rollout_may_increase() {
        let current = release_at(20);
        assert!(ReleasePatch::rollout(20).validate_against(&current).is_ok());
        assert!(ReleasePatch::rollout(100).validate_against(&current).is_ok());
    }

    #[test]
    fn test_rollout_cannot_decrease() {
        let err = ReleasePatch::rollout(10)
            .validate_against(&release_at(20))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::RolloutDecrease {
                current: 20,
                requested: 10
            }
        );
    }

    #[test]
    fn test_rollout_out_of_range() {
        let err = ReleasePatch::rollout(101)
            .validate_against(&release_at(0))
            .unwrap_err();
        assert_eq!(err, ValidationError::RolloutOutOfRange(101));
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let json = serde_json::to_value(ReleasePatch::disabled(true)).unwrap();
        assert_eq!(json, serde_json::json!({ "is_disabled": true }));
        assert!(ReleasePatch::default().is_empty());
    }
}
