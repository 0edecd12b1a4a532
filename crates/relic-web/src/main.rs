mod error;
mod extract;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use relic_core::clock::{Clock, SystemClock};
use relic_core::config::RelicConfig;
use relic_core::graph::GraphClient;

const DEFAULT_LOG_FILTER: &str = "relic_web=info,relic_core=info,relic::telemetry=info";

#[derive(Parser)]
#[command(
    name = "relic-web",
    about = "Relic: serves the legacy v3 API on top of the graph API",
    version
)]
struct Cli {
    /// Extra config file layered over ~/.config/relic/config.toml
    #[arg(long)]
    config: Option<PathBuf>,
    /// Port to listen on (overrides [web].port)
    #[arg(short, long)]
    port: Option<u16>,
    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

pub struct AppState<B> {
    pub backend: B,
    pub config: RelicConfig,
    pub clock: Arc<dyn Clock>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config = match RelicConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) if cli.config.is_some() => return Err(e.into()),
        Err(e) => {
            tracing::warn!("config: {e}, using defaults");
            RelicConfig::default_config()
        }
    };
    if let Some(port) = cli.port {
        config.web.port = port;
    }

    let backend = GraphClient::from_config(&config.upstream)?;
    tracing::info!(upstream = backend.url(), "upstream graph API");

    let addr = format!("{}:{}", config.web.host, config.web.port);
    let state = Arc::new(AppState {
        backend,
        config,
        clock: Arc::new(SystemClock),
    });
    let app = routes::app(state);

    tracing::info!("relic-web listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("relic-web stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
