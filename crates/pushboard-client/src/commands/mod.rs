//! Release administration commands.
//!
//! Each command performs its HTTP call through [`crate::api::ApiClient`]
//! and then brings the query cache in line with the backend, so the next
//! navigation shows the change without waiting for the stale window.

pub mod releases;

pub use releases::{download_bundle, edit_rollout, find_cached_release, promote, set_disabled};
