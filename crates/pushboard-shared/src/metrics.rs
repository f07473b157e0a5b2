//! Per-release install metrics and their join with release records.

use serde::{Deserialize, Serialize};

use crate::types::Release;

/// Aggregate install counters of one release, keyed by its label.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metrics {
    pub label: String,
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub installed: u64,
    #[serde(default)]
    pub downloaded: u64,
    /// Rollbacks reported by clients.
    #[serde(default)]
    pub failed: u64,
}

impl Metrics {
    pub fn active_percentage(&self) -> f64 {
        active_percentage(self.active, self.installed)
    }
}

/// Share of installs still running the release, in percent.
///
/// Defined as `0.0` when nothing was installed.
pub fn active_percentage(active: u64, installed: u64) -> f64 {
    if installed == 0 {
        return 0.0;
    }
    active as f64 / installed as f64 * 100.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseWithMetrics {
    pub release: Release,
    pub metrics: Option<Metrics>,
}

impl ReleaseWithMetrics {
    /// Attach the metrics entry carrying the release's label, if any.
    pub fn join(release: Release, metrics: &[Metrics]) -> Self {
        let metrics = metrics.iter().find(|m| m.label == release.label).cloned();
        Self { release, metrics }
    }

    pub fn active_percentage(&self) -> f64 {
        self.metrics
            .as_ref()
            .map(Metrics::active_percentage)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn release(label: &str) -> Release {
        Release {
            label: label.to_string(),
            package_hash: label.to_string(),
            target_binary_range: "*".to_string(),
            is_disabled: false,
            is_mandatory: false,
            rollout: 50,
            upload_time: 0,
            size: 1,
            released_by: "ci".to_string(),
            release_method: "Upload".to_string(),
            blob_url: "https://blobs/".to_string(),
            diff_package_map: BTreeMap::new(),
        }
    }

    #[test]
    fn test_active_percentage_zero_installed() {
        assert_eq!(active_percentage(0, 0), 0.0);
        assert_eq!(active_percentage(42, 0), 0.0);
    }

    #[test]
    fn test_active_percentage_ratio() {
        assert_eq!(active_percentage(1, 4), 25.0);
        assert_eq!(active_percentage(10, 10), 100.0);
        assert!((active_percentage(1, 3) - 33.333_333).abs() < 1e-4);
    }

    #[test]
    fn test_join_metrics_by_label() {
        let metrics = vec![Metrics {
            label: "v1".to_string(),
            active: 3,
            installed: 4,
            downloaded: 5,
            failed: 1,
        }];

        let unmatched = ReleaseWithMetrics::join(release("v2"), &metrics);
        assert_eq!(unmatched.release.label, "v2");
        assert!(unmatched.metrics.is_none());
        assert_eq!(unmatched.active_percentage(), 0.0);

        let matched = ReleaseWithMetrics::join(release("v1"), &metrics);
        assert_eq!(matched.metrics.as_ref().unwrap().failed, 1);
        assert_eq!(matched.active_percentage(), 75.0);
    }
}
