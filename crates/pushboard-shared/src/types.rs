use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_ROLLOUT;
use crate::error::ValidationError;

// App identifier = opaque application name, e.g. "Turneo-iOS"
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct AppId(pub String);

impl AppId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased form used in API paths.
    pub fn slug(&self) -> String {
        self.0.to_lowercase()
    }

    pub fn is_ios(&self) -> bool {
        self.0.to_lowercase().contains("ios")
    }
}

impl std::fmt::Display for AppId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AppId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AppId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Staging,
}

impl Environment {
    pub const ALL: [Environment; 2] = [Environment::Production, Environment::Staging];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
        }
    }

    /// Deployment name as the API spells it.
    pub fn deployment_name(&self) -> &'static str {
        match self {
            Self::Production => "Production",
            Self::Staging => "Staging",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            _ => Err(ValidationError::UnknownEnvironment(s.to_string())),
        }
    }
}

/// Binary delta from one package hash to a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffPackage {
    pub size: u64,
    pub url: String,
}

/// One published update package of an app deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Release {
    pub label: String,
    pub package_hash: String,
    pub target_binary_range: String,
    pub is_disabled: bool,
    pub is_mandatory: bool,
    #[serde(default = "full_rollout")]
    pub rollout: u8,
    /// Epoch milliseconds.
    pub upload_time: i64,
    pub size: u64,
    pub released_by: String,
    pub release_method: String,
    pub blob_url: String,
    #[serde(default)]
    pub diff_package_map: BTreeMap<String, DiffPackage>,
}

fn full_rollout() -> u8 {
    MAX_ROLLOUT
}

impl Release {
    /// Full download location of the bundle.
    pub fn bundle_url(&self) -> String {
        format!(
            "{}/{}",
            self.blob_url.trim_end_matches('/'),
            self.package_hash
        )
    }

    pub fn is_promotion(&self) -> bool {
        self.release_method.eq_ignore_ascii_case("promote")
    }
}

/// Order releases newest first. Stable: equal upload times keep their
/// original relative order.
pub fn sort_newest_first(releases: &mut [Release]) {
    releases.sort_by(|a, b| b.upload_time.cmp(&a.upload_time));
}

/// First release carrying `label`.
pub fn find_release<'a>(releases: &'a [Release], label: &str) -> Option<&'a Release> {
    releases.iter().find(|r| r.label == label)
}
