//! Query definitions: cache keys and their fetch functions.

use std::sync::Arc;

use pushboard_query::{QueryCache, QueryError, QueryKey};
use pushboard_shared::{sort_newest_first, AppId, Environment, Metrics, Release};

use crate::api::ConsoleBackend;

pub fn apps_key() -> QueryKey {
    QueryKey::new("apps")
}

pub fn releases_key(app: &AppId, env: Environment) -> QueryKey {
    QueryKey::new("releases").with(app).with(env)
}

pub fn metrics_key(app: &AppId, env: Environment) -> QueryKey {
    QueryKey::new("metrics").with(app).with(env)
}

pub async fn ensure_apps(
    cache: &QueryCache,
    backend: &Arc<dyn ConsoleBackend>,
) -> Result<Vec<AppId>, QueryError> {
    let backend = backend.clone();
    cache
        .ensure(&apps_key(), move || async move {
            let apps = backend.list_apps().await?;
            Ok::<_, anyhow::Error>(apps)
        })
        .await
}

/// Releases of `app`/`env`, cached newest first.
pub async fn ensure_releases(
    cache: &QueryCache,
    backend: &Arc<dyn ConsoleBackend>,
    app: &AppId,
    env: Environment,
) -> Result<Vec<Release>, QueryError> {
    let backend = backend.clone();
    let owned = app.clone();
    cache
        .ensure(&releases_key(app, env), move || async move {
            let mut releases = backend.list_releases(&owned, env).await?;
            sort_newest_first(&mut releases);
            Ok::<_, anyhow::Error>(releases)
        })
        .await
}

pub async fn ensure_metrics(
    cache: &QueryCache,
    backend: &Arc<dyn ConsoleBackend>,
    app: &AppId,
    env: Environment,
) -> Result<Vec<Metrics>, QueryError> {
    let backend = backend.clone();
    let owned = app.clone();
    cache
        .ensure(&metrics_key(app, env), move || async move {
            let metrics = backend.list_metrics(&owned, env).await?;
            Ok::<_, anyhow::Error>(metrics)
        })
        .await
}

/// Swap `updated` into the cached release list it belongs to.
pub fn replace_cached_release(cache: &QueryCache, app: &AppId, env: Environment, updated: &Release) {
    let key = releases_key(app, env);
    let Some(mut releases) = cache.get::<Vec<Release>>(&key) else {
        return;
    };
    match releases.iter_mut().find(|r| r.label == updated.label) {
        Some(slot) => *slot = updated.clone(),
        None => {
            releases.push(updated.clone());
            sort_newest_first(&mut releases);
        }
    }
    cache.set(&key, releases);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::testing::{release, FakeBackend};

    #[tokio::test]
    async fn test_releases_are_cached_newest_first() {
        let backend = FakeBackend::new(&["A"]).with_releases(
            "A",
            vec![release("r1", 100), release("r3", 300), release("r2", 200)],
        );
        let backend: Arc<dyn ConsoleBackend> = Arc::new(backend);
        let cache = QueryCache::default();
        let app = AppId::from("A");

        let releases = ensure_releases(&cache, &backend, &app, Environment::Production)
            .await
            .unwrap();
        let labels: Vec<_> = releases.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["r3", "r2", "r1"]);

        let cached: Vec<Release> = cache
            .get(&releases_key(&app, Environment::Production))
            .unwrap();
        assert_eq!(cached, releases);
    }

    #[tokio::test]
    async fn test_environments_are_cached_separately() {
        let fake = Arc::new(
            FakeBackend::new(&["A"])
                .with_releases("A", vec![release("prod", 1)])
                .with_env_releases("A", Environment::Staging, vec![release("stage", 1)]),
        );
        let backend: Arc<dyn ConsoleBackend> = fake.clone();
        let cache = QueryCache::default();
        let app = AppId::from("A");

        let prod = ensure_releases(&cache, &backend, &app, Environment::Production)
            .await
            .unwrap();
        let staging = ensure_releases(&cache, &backend, &app, Environment::Staging)
            .await
            .unwrap();

        assert_eq!(prod[0].label, "prod");
        assert_eq!(staging[0].label, "stage");
        assert_eq!(fake.release_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_replace_cached_release() {
        let cache = QueryCache::default();
        let app = AppId::from("A");
        let key = releases_key(&app, Environment::Production);
        cache.set(&key, vec![release("r2", 200), release("r1", 100)]);

        let mut updated = release("r1", 100);
        updated.rollout = 80;
        replace_cached_release(&cache, &app, Environment::Production, &updated);

        let cached: Vec<Release> = cache.get(&key).unwrap();
        assert_eq!(cached[1].rollout, 80);

        replace_cached_release(&cache, &app, Environment::Production, &release("r3", 300));
        let cached: Vec<Release> = cache.get(&key).unwrap();
        assert_eq!(cached[0].label, "r3");
    }
}
