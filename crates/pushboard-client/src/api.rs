//! HTTP access to the release management backend.
//!
//! [`ConsoleBackend`] is the read contract the route loaders depend on;
//! [`ApiClient`] implements it over `reqwest` and adds the release
//! mutations used by the admin commands. Every request carries the
//! operator's session cookie.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use percent_encoding::utf8_percent_encode;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use pushboard_shared::constants::{API_VERSION_PREFIX, APP_NAME, AUTHENTICATED_PATH, METRICS_PATH};
use pushboard_shared::{
    AppId, Environment, Metrics, PromoteRequest, Release, ReleasePatch, ValidationError,
};

use crate::config::ClientConfig;
use crate::router::path::SEGMENT;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {url} returned {status}")]
    Status {
        method: &'static str,
        url: String,
        status: StatusCode,
    },

    #[error("Session is not authenticated")]
    Unauthorized,

    #[error("Invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read side of the backend, as consumed by route loaders.
#[async_trait]
pub trait ConsoleBackend: Send + Sync {
    /// Apps in display order.
    async fn list_apps(&self) -> Result<Vec<AppId>, ApiError>;

    /// Releases of one app deployment, in backend order.
    async fn list_releases(&self, app: &AppId, env: Environment)
        -> Result<Vec<Release>, ApiError>;

    /// Install metrics to join with the releases of `app`/`env` by label.
    async fn list_metrics(&self, app: &AppId, env: Environment)
        -> Result<Vec<Metrics>, ApiError>;
}

#[derive(Deserialize)]
struct AppEntry {
    name: String,
}

/// Credentialed client for the release management API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    org: String,
    static_apps: Option<Vec<AppId>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = config.api_url.trim_end_matches('/').to_string();
        let parsed = reqwest::Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;

        let jar = Arc::new(reqwest::cookie::Jar::default());
        if let Some(ref cookie) = config.session_cookie {
            jar.add_cookie_str(cookie, &parsed);
        }

        let http = reqwest::Client::builder()
            .cookie_provider(jar)
            .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            org: config.org.clone(),
            static_apps: config.static_apps.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn apps_url(&self) -> String {
        format!("{}{}/apps/{}", self.base_url, API_VERSION_PREFIX, encode(&self.org))
    }

    fn deployment_url(&self, app: &AppId, env: Environment) -> String {
        format!(
            "{}/{}/deployments/{}",
            self.apps_url(),
            encode(&app.slug()),
            env.deployment_name()
        )
    }

    fn releases_url(&self, app: &AppId, env: Environment) -> String {
        format!("{}/releases", self.deployment_url(app, env))
    }

    fn release_url(&self, app: &AppId, env: Environment, label: &str) -> String {
        format!("{}/{}", self.releases_url(app, env), encode(label))
    }

    fn promote_url(&self, app: &AppId, from: Environment, to: Environment) -> String {
        format!(
            "{}/promote_release/{}",
            self.deployment_url(app, from),
            to.deployment_name()
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        debug!(url, "GET");
        let resp = self
            .http
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        let resp = check_status("GET", url, resp)?;
        Ok(resp.json().await?)
    }

    /// Whether the session cookie is accepted by the backend.
    pub async fn is_authenticated(&self) -> Result<bool, ApiError> {
        let url = format!("{}{}", self.base_url, AUTHENTICATED_PATH);
        let resp = self.http.get(&url).send().await?;
        match check_status("GET", &url, resp) {
            Ok(_) => Ok(true),
            Err(ApiError::Unauthorized) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Apply `patch` to the release `label` and return the updated record.
    pub async fn update_release(
        &self,
        app: &AppId,
        env: Environment,
        label: &str,
        patch: &ReleasePatch,
    ) -> Result<Release, ApiError> {
        let url = self.release_url(app, env, label);
        debug!(url = %url, ?patch, "PATCH");

        let resp = self.http.patch(&url).json(patch).send().await?;
        let resp = check_status("PATCH", &url, resp)?;
        let release: Release = resp.json().await?;

        info!(app = %app, env = %env, label, "Release updated");
        Ok(release)
    }

    /// Copy a release of deployment `from` into deployment `to`.
    pub async fn promote_release(
        &self,
        app: &AppId,
        from: Environment,
        to: Environment,
        request: &PromoteRequest,
    ) -> Result<Release, ApiError> {
        if from == to {
            return Err(ValidationError::SameDeployment.into());
        }
        request.validate()?;

        let url = self.promote_url(app, from, to);
        debug!(url = %url, ?request, "POST");

        let resp = self.http.post(&url).json(request).send().await?;
        let resp = check_status("POST", &url, resp)?;
        let release: Release = resp.json().await?;

        info!(app = %app, from = %from, to = %to, label = %release.label, "Release promoted");
        Ok(release)
    }

    /// Stream the bundle of `release` into `dest`. Returns bytes written.
    pub async fn download_bundle(&self, release: &Release, dest: &Path) -> Result<u64, ApiError> {
        let url = release.bundle_url();
        debug!(url = %url, dest = %dest.display(), "Downloading bundle");

        let resp = self.http.get(&url).send().await?;
        let mut resp = check_status("GET", &url, resp)?;

        // `dest` is only replaced once the whole body is on disk.
        let partial = partial_path(dest);
        let written = match write_body(&mut resp, &partial).await {
            Ok(written) => written,
            Err(e) => {
                warn!(url = %url, error = %e, "Bundle download interrupted");
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };
        if let Err(e) = tokio::fs::rename(&partial, dest).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }

        info!(label = %release.label, bytes = written, "Bundle downloaded");
        Ok(written)
    }
}

#[async_trait]
impl ConsoleBackend for ApiClient {
    async fn list_apps(&self) -> Result<Vec<AppId>, ApiError> {
        if let Some(ref apps) = self.static_apps {
            return Ok(apps.clone());
        }

        let entries: Vec<AppEntry> = self.get_json(&self.apps_url()).await?;
        Ok(entries.into_iter().map(|e| AppId::from(e.name)).collect())
    }

    async fn list_releases(
        &self,
        app: &AppId,
        env: Environment,
    ) -> Result<Vec<Release>, ApiError> {
        self.get_json(&self.releases_url(app, env)).await
    }

    // The metrics endpoint is not scoped per deployment; callers join by label.
    async fn list_metrics(
        &self,
        _app: &AppId,
        _env: Environment,
    ) -> Result<Vec<Metrics>, ApiError> {
        self.get_json(&format!("{}{}", self.base_url, METRICS_PATH))
            .await
    }
}

async fn write_body(resp: &mut Response, path: &Path) -> Result<u64, ApiError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = resp.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Sibling of `dest` that receives the body while it streams in.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(OsString::from).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

fn check_status(method: &'static str, url: &str, resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        return Err(ApiError::Status {
            method,
            url: url.to_string(),
            status,
        });
    }
    Ok(resp)
}
