//! Command line interface of the `pushboard` binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use pushboard_query::QueryCache;
use pushboard_shared::{AppId, Environment, PromoteRequest};

use crate::api::{ApiClient, ConsoleBackend};
use crate::commands;
use crate::config::ClientConfig;
use crate::navigation::{NavigationOutcome, Navigator};
use crate::views;

/// Release console for over-the-air app updates
#[derive(Debug, Parser)]
#[command(name = "pushboard", author, version)]
pub struct Cli {
    /// The subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Backend base URL (overrides PUSHBOARD_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Deployment to work on: production or staging (overrides PUSHBOARD_ENVIRONMENT)
    #[arg(short = 'e', long = "env", global = true)]
    pub environment: Option<Environment>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a console path and print its view
    #[command(name = "view")]
    View {
        /// Console path, e.g. /apps/Turneo-iOS/releases/v141
        #[arg(default_value = "/")]
        path: String,

        /// Print navigation events as JSON lines before the view
        #[arg(long)]
        events: bool,
    },

    /// Raise the rollout percentage of a release
    #[command(name = "rollout")]
    Rollout {
        app: String,
        label: String,
        /// New rollout percentage (0-100, never lower than the current one)
        percent: u8,
    },

    /// Make a release available again
    #[command(name = "enable")]
    Enable { app: String, label: String },

    /// Stop delivering a release
    #[command(name = "disable")]
    Disable { app: String, label: String },

    /// Promote a release from one deployment to another
    #[command(name = "promote")]
    Promote {
        app: String,

        /// Source deployment
        #[arg(long, default_value = "staging")]
        from: Environment,

        /// Target deployment
        #[arg(long, default_value = "production")]
        to: Environment,

        /// Release to promote (latest when omitted)
        #[arg(short = 'l', long)]
        label: Option<String>,

        /// Rollout of the promoted release
        #[arg(short = 'r', long)]
        rollout: Option<u8>,

        /// Mark the promoted release mandatory
        #[arg(long)]
        mandatory: bool,
    },

    /// Download the bundle of a release
    #[command(name = "download")]
    Download {
        app: String,
        label: String,

        /// Destination file
        #[arg(short = 'o', long)]
        out: PathBuf,
    },

    /// Check whether the session cookie is accepted
    #[command(name = "whoami")]
    Whoami,
}

impl Cli {
    /// Apply command line overrides on top of `config`.
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(ref url) = self.api_url {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(env) = self.environment {
            config.environment = env;
        }
        config
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.apply(ClientConfig::from_env());
    info!(
        api_url = %config.api_url,
        org = %config.org,
        env = %config.environment,
        authenticated = config.session_cookie.is_some(),
        "Loaded configuration"
    );

    let api = Arc::new(ApiClient::new(&config)?);
    let cache = QueryCache::new(config.stale_time);
    let env = config.environment;

    match cli.command {
        Command::View { path, events } => {
            let backend: Arc<dyn ConsoleBackend> = api.clone();
            let navigator = Navigator::console(cache, backend, env);
            let mut rx = navigator.events();

            let outcome = navigator.navigate(&path).await;
            if events {
                while let Ok(event) = rx.try_recv() {
                    println!("{}", serde_json::to_string(&event)?);
                }
            }
            if let NavigationOutcome::Rendered(route) = outcome? {
                print!("{}", views::render(&route));
            }
        }
        Command::Rollout {
            app,
            label,
            percent,
        } => {
            let updated =
                commands::edit_rollout(&api, &cache, &AppId::from(app), env, &label, percent)
                    .await?;
            println!("{} rollout is now {}%", updated.label, updated.rollout);
        }
        Command::Enable { app, label } => {
            let updated =
                commands::set_disabled(&api, &cache, &AppId::from(app), env, &label, false).await?;
            println!("{} enabled", updated.label);
        }
        Command::Disable { app, label } => {
            let updated =
                commands::set_disabled(&api, &cache, &AppId::from(app), env, &label, true).await?;
            println!("{} disabled", updated.label);
        }
        Command::Promote {
            app,
            from,
            to,
            label,
            rollout,
            mandatory,
        } => {
            let request = PromoteRequest {
                label,
                rollout,
                is_mandatory: mandatory.then_some(true),
                ..PromoteRequest::default()
            };
            let promoted =
                commands::promote(&api, &cache, &AppId::from(app), from, to, &request).await?;
            println!("Promoted to {to} as {}", promoted.label);
        }
        Command::Download { app, label, out } => {
            let written =
                commands::download_bundle(&api, &cache, &AppId::from(app), env, &label, &out)
                    .await?;
            println!("Wrote {written} bytes to {}", out.display());
        }
        Command::Whoami => {
            if api.is_authenticated().await? {
                println!("Session accepted by {}", api.base_url());
            } else {
                println!("Not logged in to {}", api.base_url());
            }
        }
    }

    Ok(())
}
