//! Wallet actions status server
//!
//! Connects to the ledger node of every configured network and serves
//! health, readiness, verified assets and action status over HTTP.

use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use wallet_actions::api::{self, AppState};
use wallet_actions::assets::PeraAssetDirectory;
use wallet_actions::config::{Network, Settings};
use wallet_actions::ledger::{AlgodClient, LedgerNode};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting wallet-actions v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    info!("Loaded configuration, active network {}", settings.network);

    // One node client per network
    let mut nodes: Vec<(Network, Arc<dyn LedgerNode>)> = Vec::new();
    for network in Network::ALL {
        let client = AlgodClient::new(network, settings.networks.get(network))?;
        info!("{} node: {}", network, client.base_url());
        let node: Arc<dyn LedgerNode> = Arc::new(client);
        nodes.push((network, node));
    }

    let directory = Arc::new(PeraAssetDirectory::new(&settings.assets));

    let state = AppState {
        nodes,
        directory,
        // No actions run in this process; embedding apps pass their WalletApp board
        board: None,
        metrics_enabled: settings.metrics.enabled,
    };

    info!("API server: http://{}:{}", settings.api.host, settings.api.port);
    if settings.metrics.enabled {
        info!(
            "Metrics: http://{}:{}/metrics",
            settings.api.host, settings.api.port
        );
    }

    if let Err(e) = api::run_server(settings.api.clone(), state, shutdown_signal()).await {
        error!("API server error: {}", e);
        return Err(e.into());
    }

    info!("wallet-actions stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wallet_actions=debug,hyper=warn"));

    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping...");
}
