//! # pushboard-client
//!
//! Release console for over-the-air app updates: an HTTP client for the
//! release management backend, a route table with guard and loader steps
//! backed by the query cache, a navigation controller that resolves console
//! paths into rendered views, and the release administration commands.

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod navigation;
pub mod queries;
pub mod router;
pub mod routes;
pub mod state;
pub mod views;
pub mod widgets;

#[cfg(test)]
mod testing;

use tracing_subscriber::{fmt, EnvFilter};

pub use api::{ApiClient, ApiError, ConsoleBackend};
pub use config::ClientConfig;
pub use error::{CommandError, NavigationError};
pub use navigation::{NavState, NavigationOutcome, Navigator, RenderedRoute};
pub use routes::{console_routes, RouteData, RouteId};
pub use state::ConsoleState;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("pushboard_client=debug,pushboard_query=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
