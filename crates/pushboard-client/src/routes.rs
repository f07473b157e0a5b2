//! The console's route tree and the guards and loaders attached to it.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use pushboard_query::QueryError;
use pushboard_shared::{find_release, AppId, Environment, Release, ReleaseWithMetrics};

use crate::error::NavigationError;
use crate::queries::{apps_key, ensure_apps, ensure_metrics, ensure_releases};
use crate::router::{paths, Guard, Loader, NavContext, RouteNode, RoutePath, RouteTable, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteId {
    Root,
    Layout,
    Index,
    Apps,
    App,
    Release,
}

/// Release shown in the detail pane, with its install metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseDetail {
    pub app: AppId,
    pub environment: Environment,
    pub release: ReleaseWithMetrics,
}

/// What a route's loader hands to its view.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteData {
    /// Node has no loader.
    None,
    Layout {
        apps: Vec<AppId>,
    },
    App {
        app: AppId,
        releases: Vec<Release>,
    },
    Release(ReleaseDetail),
    /// Nothing to show: no apps, no releases, an unknown app or an unknown
    /// release label.
    Empty,
}

fn load_failed(route: RouteId) -> impl FnOnce(QueryError) -> NavigationError {
    move |source| NavigationError::Load { route, source }
}

/// Apps from the layout loader of this navigation, or the cache.
async fn layout_apps(ctx: &NavContext, route: RouteId) -> Result<Vec<AppId>, NavigationError> {
    if let Some(RouteData::Layout { apps }) = ctx.loaded(RouteId::Layout) {
        return Ok(apps.clone());
    }
    ensure_apps(&ctx.cache, &ctx.backend)
        .await
        .map_err(load_failed(route))
}

/// `$appId`, when the apps list carries it.
async fn listed_app(ctx: &NavContext, route: RouteId) -> Result<Option<AppId>, NavigationError> {
    let app = AppId::from(ctx.param("appId")?);
    let apps = layout_apps(ctx, route).await?;
    if apps.contains(&app) {
        return Ok(Some(app));
    }
    debug!(app = %app, "App not listed, rendering placeholder");
    Ok(None)
}

pub struct LayoutLoader;

#[async_trait]
impl Loader for LayoutLoader {
    async fn load(&self, ctx: &mut NavContext) -> Result<Step<RouteData>, NavigationError> {
        let apps = ensure_apps(&ctx.cache, &ctx.backend)
            .await
            .map_err(load_failed(RouteId::Layout))?;
        Ok(Step::Continue(RouteData::Layout { apps }))
    }
}

/// Sends `/` back to the release the operator last looked at, while its
/// app is still listed.
pub struct IndexGuard;

#[async_trait]
impl Guard for IndexGuard {
    async fn check(&self, ctx: &NavContext) -> Result<Step<()>, NavigationError> {
        let Some((app, label)) = ctx.state.selection() else {
            return Ok(Step::Continue(()));
        };
        let apps: Vec<AppId> = ctx.cache.get(&apps_key()).unwrap_or_default();
        if apps.contains(app) {
            return Ok(Step::RedirectTo(paths::release(app, label)));
        }
        Ok(Step::Continue(()))
    }
}

/// Picks the newest release of the first app, or settles on the
/// placeholder when either list is empty.
pub struct IndexLoader;

#[async_trait]
impl Loader for IndexLoader {
    async fn load(&self, ctx: &mut NavContext) -> Result<Step<RouteData>, NavigationError> {
        let apps = layout_apps(ctx, RouteId::Index).await?;
        let Some(first) = apps.first() else {
            debug!("No apps, rendering placeholder");
            return Ok(Step::Continue(RouteData::Empty));
        };

        let releases = ensure_releases(&ctx.cache, &ctx.backend, first, ctx.environment())
            .await
            .map_err(load_failed(RouteId::Index))?;
        match releases.first() {
            Some(newest) => Ok(Step::RedirectTo(paths::release(first, &newest.label))),
            None => {
                debug!(app = %first, "No releases, rendering placeholder");
                Ok(Step::Continue(RouteData::Empty))
            }
        }
    }
}

/// Bare `/apps` goes to the first app.
pub struct AppsGuard;

#[async_trait]
impl Guard for AppsGuard {
    async fn check(&self, ctx: &NavContext) -> Result<Step<()>, NavigationError> {
        if !ctx.is_leaf {
            return Ok(Step::Continue(()));
        }
        let apps: Vec<AppId> = ctx.cache.get(&apps_key()).unwrap_or_default();
        match apps.first() {
            Some(first) => Ok(Step::RedirectTo(paths::app(first))),
            None => Ok(Step::Continue(())),
        }
    }
}

pub struct AppLoader;

#[async_trait]
impl Loader for AppLoader {
    async fn load(&self, ctx: &mut NavContext) -> Result<Step<RouteData>, NavigationError> {
        let Some(app) = listed_app(ctx, RouteId::App).await? else {
            ctx.state.selected_app = None;
            ctx.state.selected_release = None;
            return Ok(Step::Continue(RouteData::Empty));
        };
        let releases = ensure_releases(&ctx.cache, &ctx.backend, &app, ctx.environment())
            .await
            .map_err(load_failed(RouteId::App))?;

        ctx.state.selected_app = Some(app.clone());
        if ctx.is_leaf {
            ctx.state.selected_release = None;
        }
        Ok(Step::Continue(RouteData::App { app, releases }))
    }
}

pub struct ReleaseLoader;

#[async_trait]
impl Loader for ReleaseLoader {
    async fn load(&self, ctx: &mut NavContext) -> Result<Step<RouteData>, NavigationError> {
        let label = ctx.param("label")?.to_string();
        let env = ctx.environment();

        let (app, releases) = match ctx.loaded(RouteId::App) {
            Some(RouteData::App { app, releases }) => (app.clone(), releases.clone()),
            _ => {
                let Some(app) = listed_app(ctx, RouteId::Release).await? else {
                    ctx.state.selected_app = None;
                    ctx.state.selected_release = None;
                    return Ok(Step::Continue(RouteData::Empty));
                };
                let releases = ensure_releases(&ctx.cache, &ctx.backend, &app, env)
                    .await
                    .map_err(load_failed(RouteId::Release))?;
                (app, releases)
            }
        };

        let Some(release) = find_release(&releases, &label).cloned() else {
            debug!(app = %app, env = %env, label, "Release not found");
            ctx.state.selected_release = None;
            return Ok(Step::Continue(RouteData::Empty));
        };

        let metrics = ensure_metrics(&ctx.cache, &ctx.backend, &app, env)
            .await
            .map_err(load_failed(RouteId::Release))?;

        ctx.state.selected_app = Some(app.clone());
        ctx.state.selected_release = Some(label);
        Ok(Step::Continue(RouteData::Release(ReleaseDetail {
            app,
            environment: env,
            release: ReleaseWithMetrics::join(release, &metrics),
        })))
    }
}

/// Route tree of the console.
pub fn console_routes() -> RouteTable {
    let mut table = RouteTable::new(RouteNode::new(RouteId::Root, RoutePath::Pathless));
    let root = table.root();

    let layout = table.add(
        root,
        RouteNode::new(RouteId::Layout, RoutePath::Pathless).with_loader(LayoutLoader),
    );
    table.add(
        layout,
        RouteNode::new(RouteId::Index, RoutePath::parse("/"))
            .with_guard(IndexGuard)
            .with_loader(IndexLoader),
    );
    let apps = table.add(
        layout,
        RouteNode::new(RouteId::Apps, RoutePath::parse("apps")).with_guard(AppsGuard),
    );
    let app = table.add(
        apps,
        RouteNode::new(RouteId::App, RoutePath::parse("$appId")).with_loader(AppLoader),
    );
    table.add(
        app,
        RouteNode::new(RouteId::Release, RoutePath::parse("releases/$label"))
            .with_loader(ReleaseLoader),
    );

    table
}
