use thiserror::Error;

use pushboard_query::QueryError;
use pushboard_shared::{AppId, Environment, ValidationError};

use crate::api::ApiError;
use crate::routes::RouteId;

/// Failures that stop a navigation from rendering.
///
/// Redirects are not errors; they travel as [`crate::router::Step::RedirectTo`].
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Loading {route:?} failed: {source}")]
    Load {
        route: RouteId,
        #[source]
        source: QueryError,
    },

    #[error("Route parameter '{0}' is missing")]
    MissingParam(&'static str),

    #[error("Too many redirects while resolving {from} (last target {to})")]
    TooManyRedirects { from: String, to: String },
}

/// Failures of the admin commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Could not load releases: {0}")]
    Query(#[from] QueryError),

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Release {label} not found in {app}/{env}")]
    ReleaseNotFound {
        app: AppId,
        env: Environment,
        label: String,
    },
}
