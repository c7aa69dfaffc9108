use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// In-memory logitrack backend for local development.
#[derive(Parser, Debug)]
#[command(name = "logitrack-server")]
struct Cli {
    /// Address to bind
    #[arg(long, env = "LOGITRACK_BIND", default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, env = "LOGITRACK_PORT", default_value_t = 4000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let addr = SocketAddr::new(cli.bind.parse()?, cli.port);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("logitrack-server listening on http://{addr}");

    logitrack_server::serve(listener, logitrack_server::routes::new_state()).await?;
    Ok(())
}
