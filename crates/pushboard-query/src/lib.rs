//! # pushboard-query
//!
//! In-memory query cache for the Pushboard console.
//!
//! Values are stored under a [`QueryKey`] together with the time they were
//! fetched. [`QueryCache::ensure`] reuses a value while it is fresh, fetches
//! it otherwise, and joins concurrent callers onto a single in-flight fetch.
//! [`QueryCache::get`] is a plain synchronous read.

mod cache;
mod error;
mod key;

pub use cache::{QueryCache, DEFAULT_STALE_TIME};
pub use error::{QueryError, Result};
pub use key::QueryKey;
