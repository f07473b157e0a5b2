use std::path::Path;
use std::sync::Arc;

use tracing::info;

use pushboard_query::QueryCache;
use pushboard_shared::{find_release, AppId, Environment, PromoteRequest, Release, ReleasePatch};

use crate::api::{ApiClient, ConsoleBackend};
use crate::error::CommandError;
use crate::queries::{ensure_releases, releases_key, replace_cached_release};

/// Release `label` of `app`/`env`, from the cache when fresh.
pub async fn find_cached_release(
    api: &Arc<ApiClient>,
    cache: &QueryCache,
    app: &AppId,
    env: Environment,
    label: &str,
) -> Result<Release, CommandError> {
    let backend: Arc<dyn ConsoleBackend> = api.clone();
    let releases = ensure_releases(cache, &backend, app, env).await?;
    find_release(&releases, label)
        .cloned()
        .ok_or_else(|| CommandError::ReleaseNotFound {
            app: app.clone(),
            env,
            label: label.to_string(),
        })
}

/// Raise the rollout percentage of a release.
pub async fn edit_rollout(
    api: &Arc<ApiClient>,
    cache: &QueryCache,
    app: &AppId,
    env: Environment,
    label: &str,
    rollout: u8,
) -> Result<Release, CommandError> {
    let current = find_cached_release(api, cache, app, env, label).await?;
    let patch = ReleasePatch::rollout(rollout);
    patch.validate_against(&current)?;

    let updated = api.update_release(app, env, label, &patch).await?;
    replace_cached_release(cache, app, env, &updated);

    info!(app = %app, env = %env, label, from = current.rollout, to = updated.rollout, "Rollout changed");
    Ok(updated)
}

pub async fn set_disabled(
    api: &Arc<ApiClient>,
    cache: &QueryCache,
    app: &AppId,
    env: Environment,
    label: &str,
    disabled: bool,
) -> Result<Release, CommandError> {
    let current = find_cached_release(api, cache, app, env, label).await?;
    if current.is_disabled == disabled {
        info!(app = %app, env = %env, label, disabled, "Release already in requested state");
        return Ok(current);
    }

    let updated = api
        .update_release(app, env, label, &ReleasePatch::disabled(disabled))
        .await?;
    replace_cached_release(cache, app, env, &updated);

    info!(app = %app, env = %env, label, disabled, "Release availability changed");
    Ok(updated)
}

/// Promote a release of `from` into `to`. The target deployment's cached
/// releases are marked stale.
pub async fn promote(
    api: &Arc<ApiClient>,
    cache: &QueryCache,
    app: &AppId,
    from: Environment,
    to: Environment,
    request: &PromoteRequest,
) -> Result<Release, CommandError> {
    if let Some(ref label) = request.label {
        find_cached_release(api, cache, app, from, label).await?;
    }

    let promoted = api.promote_release(app, from, to, request).await?;
    let invalidated = cache.invalidate(&releases_key(app, to));

    info!(app = %app, from = %from, to = %to, label = %promoted.label, invalidated, "Promotion done");
    Ok(promoted)
}

/// Download the bundle of a release to `dest`. Returns bytes written.
pub async fn download_bundle(
    api: &Arc<ApiClient>,
    cache: &QueryCache,
    app: &AppId,
    env: Environment,
    label: &str,
    dest: &Path,
) -> Result<u64, CommandError> {
    let release = find_cached_release(api, cache, app, env, label).await?;
    Ok(api.download_bundle(&release, dest).await?)
}

#[cfg(test)]
mod tests {
    use axum::routing::{get, patch, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use pushboard_shared::ValidationError;

    use super::*;
    use crate::api::ApiError;
    use crate::config::ClientConfig;
    use crate::testing::{release, release_json, spawn_backend};

    const PROD: &str = "/v0.1/apps/turneoapp/turneo-ios/deployments/Production/releases";
    const STAGING: &str = "/v0.1/apps/turneoapp/turneo-ios/deployments/Staging/releases";

    fn api(base: &str) -> Arc<ApiClient> {
        let config = ClientConfig {
            api_url: base.to_string(),
            ..ClientConfig::default()
        };
        Arc::new(ApiClient::new(&config).unwrap())
    }

    fn app() -> AppId {
        AppId::from("Turneo-iOS")
    }

    fn patch_echo() -> axum::routing::MethodRouter {
        patch(|Json(body): Json<Value>| async move {
            let mut release = release_json("v1", 100);
            release["rollout"] = json!(40);
            for (field, value) in body.as_object().unwrap() {
                release[field.as_str()] = value.clone();
            }
            Json(release)
        })
    }

    #[tokio::test]
    async fn test_edit_rollout_updates_cache() {
        let router = Router::new()
            .route(
                PROD,
                get(|| async {
                    let mut v1 = release_json("v1", 100);
                    v1["rollout"] = json!(40);
                    Json(json!([v1]))
                }),
            )
            .route(&format!("{PROD}/v1"), patch_echo());
        let base = spawn_backend(router).await;
        let api = api(&base);
        let cache = QueryCache::default();

        let updated = edit_rollout(&api, &cache, &app(), Environment::Production, "v1", 80)
            .await
            .unwrap();
        assert_eq!(updated.rollout, 80);

        let cached: Vec<Release> = cache
            .get(&releases_key(&app(), Environment::Production))
            .unwrap();
        assert_eq!(cached[0].rollout, 80);

        let err = edit_rollout(&api, &cache, &app(), Environment::Production, "v1", 10)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::Validation(ValidationError::RolloutDecrease {
                current: 80,
                requested: 10
            })
        ));

        let err = edit_rollout(&api, &cache, &app(), Environment::Production, "v1", 120)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::Validation(ValidationError::RolloutOutOfRange(120))
        ));

        let err = edit_rollout(&api, &cache, &app(), Environment::Production, "v9", 90)
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::ReleaseNotFound { .. }));
    }

    #[tokio::test]
    async fn test_set_disabled() {
        let router = Router::new()
            .route(PROD, get(|| async { Json(json!([release_json("v1", 100)])) }))
            .route(&format!("{PROD}/v1"), patch_echo());
        let base = spawn_backend(router).await;
        let api = api(&base);
        let cache = QueryCache::default();

        let updated = set_disabled(&api, &cache, &app(), Environment::Production, "v1", true)
            .await
            .unwrap();
        assert!(updated.is_disabled);

        let cached: Vec<Release> = cache
            .get(&releases_key(&app(), Environment::Production))
            .unwrap();
        assert!(cached[0].is_disabled);
    }

    #[tokio::test]
    async fn test_promote_marks_target_stale() {
        let router = Router::new()
            .route(STAGING, get(|| async { Json(json!([release_json("v3", 300)])) }))
            .route(
                "/v0.1/apps/turneoapp/turneo-ios/deployments/Staging/promote_release/Production",
                post(|| async { Json(release_json("v12", 400)) }),
            );
        let base = spawn_backend(router).await;
        let api = api(&base);
        let cache = QueryCache::default();
        let target = releases_key(&app(), Environment::Production);
        cache.set(&target, vec![release("v11", 100)]);

        let request = PromoteRequest {
            label: Some("v3".to_string()),
            ..PromoteRequest::default()
        };
        let promoted = promote(
            &api,
            &cache,
            &app(),
            Environment::Staging,
            Environment::Production,
            &request,
        )
        .await
        .unwrap();
        assert_eq!(promoted.label, "v12");
        assert!(cache.is_stale(&target));

        let err = promote(
            &api,
            &cache,
            &app(),
            Environment::Staging,
            Environment::Staging,
            &PromoteRequest::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            CommandError::Api(ApiError::Validation(ValidationError::SameDeployment))
        ));
    }

    #[tokio::test]
    async fn test_download_bundle_of_cached_release() {
        let router = Router::new().route("/blobs/hash-v5", get(|| async { "bundle-bytes" }));
        let base = spawn_backend(router).await;
        let api = api(&base);
        let cache = QueryCache::default();

        let mut v5 = release("v5", 500);
        v5.blob_url = format!("{base}/blobs/");
        cache.set(&releases_key(&app(), Environment::Staging), vec![v5]);

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("v5.zip");
        let written = download_bundle(&api, &cache, &app(), Environment::Staging, "v5", &dest)
            .await
            .unwrap();
        assert_eq!(written, 12);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "bundle-bytes");
    }
}
