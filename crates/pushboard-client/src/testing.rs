//! Fixtures shared by the unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use pushboard_shared::{AppId, Environment, Metrics, Release};

use crate::api::{ApiError, ConsoleBackend};

pub fn release(label: &str, upload_time: i64) -> Release {
    Release {
        label: label.to_string(),
        package_hash: format!("hash-{label}"),
        target_binary_range: ">=24.5.0".to_string(),
        is_disabled: false,
        is_mandatory: false,
        rollout: 100,
        upload_time,
        size: 1024,
        released_by: "ops@turneo.app".to_string(),
        release_method: "Upload".to_string(),
        blob_url: "https://blobs.invalid/".to_string(),
        diff_package_map: BTreeMap::new(),
    }
}

pub fn release_json(label: &str, upload_time: i64) -> serde_json::Value {
    serde_json::to_value(release(label, upload_time)).unwrap()
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_backend(router: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Parks a release fetch until the test lets it go.
#[derive(Default)]
pub struct Hold {
    pub started: Notify,
    pub release: Notify,
}

/// In-memory backend with call counters.
#[derive(Default)]
pub struct FakeBackend {
    apps: Vec<AppId>,
    releases: HashMap<(AppId, Environment), Vec<Release>>,
    metrics: Vec<Metrics>,
    holds: Mutex<HashMap<AppId, Arc<Hold>>>,
    fail_releases: bool,
    pub app_calls: AtomicUsize,
    pub release_calls: AtomicUsize,
    pub metrics_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new(apps: &[&str]) -> Self {
        Self {
            apps: apps.iter().map(|a| AppId::from(*a)).collect(),
            ..Self::default()
        }
    }

    pub fn with_releases(self, app: &str, releases: Vec<Release>) -> Self {
        self.with_env_releases(app, Environment::Production, releases)
    }

    pub fn with_env_releases(mut self, app: &str, env: Environment, releases: Vec<Release>) -> Self {
        self.releases.insert((AppId::from(app), env), releases);
        self
    }

    pub fn with_metrics(mut self, metrics: Vec<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn failing_releases(mut self) -> Self {
        self.fail_releases = true;
        self
    }

    /// Make release fetches of `app` wait for `Hold::release`.
    pub fn hold(&self, app: &str) -> Arc<Hold> {
        let hold = Arc::new(Hold::default());
        self.holds.lock().insert(AppId::from(app), hold.clone());
        hold
    }
}

#[async_trait]
impl ConsoleBackend for FakeBackend {
    async fn list_apps(&self) -> Result<Vec<AppId>, ApiError> {
        self.app_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.apps.clone())
    }

    async fn list_releases(&self, app: &AppId, env: Environment) -> Result<Vec<Release>, ApiError> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);

        let hold = self.holds.lock().get(app).cloned();
        if let Some(hold) = hold {
            hold.started.notify_one();
            hold.release.notified().await;
        }

        if self.fail_releases {
            return Err(ApiError::Status {
                method: "GET",
                url: format!("fake://releases/{app}/{env}"),
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        Ok(self
            .releases
            .get(&(app.clone(), env))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_metrics(&self, _app: &AppId, _env: Environment) -> Result<Vec<Metrics>, ApiError> {
        self.metrics_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.metrics.clone())
    }
}
