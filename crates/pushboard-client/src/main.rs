use clap::Parser;

use pushboard_client::cli::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pushboard_client::init_tracing();

    let cli = Cli::parse();
    tracing::debug!(?cli, "Parsed arguments");

    run(cli).await
}
