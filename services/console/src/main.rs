use anyhow::Result;
use clap::Parser;
use common::Settings;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod commands;
mod weather;

use app::App;
use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    debug!("Using data directory {}", settings.data_dir.display());

    let app = App::new(settings);
    commands::execute(cli, &app).await
}
