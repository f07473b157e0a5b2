//! # pushboard-shared
//!
//! Data model shared by the Pushboard crates: apps, releases, install
//! metrics, deployment environments and the request bodies of release
//! mutations.

pub mod constants;
pub mod error;
pub mod format;
pub mod metrics;
pub mod patch;
pub mod types;

pub use error::ValidationError;
pub use metrics::{active_percentage, Metrics, ReleaseWithMetrics};
pub use patch::{PromoteRequest, ReleasePatch};
pub use types::{find_release, sort_newest_first, AppId, DiffPackage, Environment, Release};
