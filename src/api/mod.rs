//! HTTP API for health checks, action status, and monitoring

use crate::assets::{AssetDirectory, VerifiedAsset};
use crate::config::{ApiConfig, Network};
use crate::error::{ActionError, ActionResult};
use crate::ledger::LedgerNode;
use crate::lifecycle::{ActionBoard, ActionSnapshot};

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::future::join_all;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub nodes: Vec<(Network, Arc<dyn LedgerNode>)>,
    pub directory: Arc<dyn AssetDirectory>,
    /// Board of the app that runs actions; `/actions` is served only with one
    pub board: Option<Arc<ActionBoard>>,
    pub metrics_enabled: bool,
}

/// Routes served by the status server
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/assets", get(get_assets));

    if state.board.is_some() {
        app = app.route("/actions", get(get_actions));
    }
    if state.metrics_enabled {
        app = app.route("/metrics", get(get_metrics));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP API server until `shutdown` resolves
pub async fn run_server(
    config: ApiConfig,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> ActionResult<()> {
    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ActionError::Config(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ActionError::Config(format!("API server error: {}", e)))?;

    Ok(())
}

/// Health check endpoint - basic liveness
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check - every configured ledger node answers
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let probes = state.nodes.iter().map(|(network, node)| async move {
        let last_round = match node.status().await {
            Ok(status) => Some(status.last_round),
            Err(e) => {
                warn!("Node health check for {} failed: {}", network, e);
                None
            }
        };
        crate::metrics::record_node_health(network.as_str(), last_round);
        NodeHealth {
            network: *network,
            healthy: last_round.is_some(),
            last_round,
        }
    });
    let nodes = join_all(probes).await;

    let ready = nodes.iter().all(|n| n.healthy);
    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(ReadinessResponse { ready, nodes }))
}

/// Verified assets from the directory
async fn get_assets(State(state): State<AppState>) -> impl IntoResponse {
    match state.directory.verified_assets().await {
        Ok(assets) => (
            StatusCode::OK,
            Json(AssetsResponse {
                assets,
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(AssetsResponse {
                assets: Vec::new(),
                error: Some(e.to_string()),
            }),
        ),
    }
}

/// Current status of every action that is not idle
async fn get_actions(State(state): State<AppState>) -> impl IntoResponse {
    let (in_flight, actions) = state
        .board
        .as_ref()
        .map(|board| (board.in_flight_count(), board.snapshot()))
        .unwrap_or_default();
    Json(ActionsResponse { in_flight, actions })
}

async fn get_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::render(),
    )
}

// Response types

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    nodes: Vec<NodeHealth>,
}

#[derive(Serialize)]
struct NodeHealth {
    network: Network,
    healthy: bool,
    last_round: Option<u64>,
}

#[derive(Serialize)]
struct AssetsResponse {
    assets: Vec<VerifiedAsset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct ActionsResponse {
    in_flight: usize,
    actions: Vec<ActionSnapshot>,
}
