mod app;
mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use letterpress_config::AppConfig;

use crate::app::App;
use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    tracing::debug!("Loading config from {}", config_path.display());
    let config = AppConfig::load_or_create(&config_path);

    let app = App::open(config)?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    app.run(cli.command, &mut stdin.lock(), &mut stdout.lock())
}
