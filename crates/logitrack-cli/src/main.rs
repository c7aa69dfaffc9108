use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use logitrack_cli::commands;
use logitrack_cli::config::Cli;
use logitrack_service::HttpService;
use logitrack_store::Catalog;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let service = HttpService::with_config(&cli.client_config())?;
    tracing::debug!("using backend at {}", service.base_url());

    let catalog = Catalog::new(Arc::new(service));
    let mut out = std::io::stdout();
    commands::run(&catalog, cli.command, &mut out).await
}
