//! Console configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the console can start with zero
//! configuration against a local development backend.

use std::time::Duration;

use pushboard_shared::constants::{
    DEFAULT_API_URL, DEFAULT_APPS, DEFAULT_ORG, DEFAULT_STALE_TIME_MS,
};
use pushboard_shared::{AppId, Environment};

/// Console configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the release management backend.
    /// Env: `PUSHBOARD_API_URL`
    /// Default: `http://localhost:3000`
    pub api_url: String,

    /// Organisation owning the apps, first segment of the apps path.
    /// Env: `PUSHBOARD_ORG`
    /// Default: `turneoapp`
    pub org: String,

    /// Session cookie (`name=value`) sent with every request.
    /// Env: `PUSHBOARD_SESSION_COOKIE`
    /// Default: none (anonymous).
    pub session_cookie: Option<String>,

    /// Static app list. `None` lists apps from the backend instead.
    /// Env: `PUSHBOARD_APPS` (comma separated; empty string = remote)
    /// Default: `Turneo-iOS,Turneo-Android`
    pub static_apps: Option<Vec<AppId>>,

    /// Freshness window of cached queries.
    /// Env: `PUSHBOARD_STALE_TIME_MS`
    /// Default: `5000`
    pub stale_time: Duration,

    /// Deployment shown when the console starts.
    /// Env: `PUSHBOARD_ENVIRONMENT` (production/staging)
    /// Default: `production`
    pub environment: Environment,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            org: DEFAULT_ORG.to_string(),
            session_cookie: None,
            static_apps: Some(DEFAULT_APPS.iter().map(|a| AppId::from(*a)).collect()),
            stale_time: Duration::from_millis(DEFAULT_STALE_TIME_MS),
            environment: Environment::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("PUSHBOARD_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }

        if let Some(org) = lookup("PUSHBOARD_ORG") {
            if !org.is_empty() {
                config.org = org;
            }
        }

        if let Some(cookie) = lookup("PUSHBOARD_SESSION_COOKIE") {
            if !cookie.is_empty() {
                config.session_cookie = Some(cookie);
            }
        }

        if let Some(apps) = lookup("PUSHBOARD_APPS") {
            config.static_apps = parse_app_list(&apps);
        }

        if let Some(val) = lookup("PUSHBOARD_STALE_TIME_MS") {
            match val.parse::<u64>() {
                Ok(ms) => config.stale_time = Duration::from_millis(ms),
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid PUSHBOARD_STALE_TIME_MS, using default");
                }
            }
        }

        if let Some(val) = lookup("PUSHBOARD_ENVIRONMENT") {
            match val.parse::<Environment>() {
                Ok(env) => config.environment = env,
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid PUSHBOARD_ENVIRONMENT, using default");
                }
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}

/// Comma separated app names; blank means "ask the backend".
fn parse_app_list(raw: &str) -> Option<Vec<AppId>> {
    let apps: Vec<AppId> = raw
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(AppId::from)
        .collect();

    if apps.is_empty() {
        None
    } else {
        Some(apps)
    }
}
