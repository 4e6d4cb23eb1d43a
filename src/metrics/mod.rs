//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Action lifecycle outcomes per action kind
//! - Confirmation rounds and end-to-end latency
//! - Ledger node health per network

use crate::lifecycle::FailureKind;
use crate::tx::ActionKind;

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, CounterVec, Encoder,
    GaugeVec, HistogramVec, TextEncoder,
};

lazy_static! {
    // Action metrics
    pub static ref ACTIONS_STARTED: CounterVec = register_counter_vec!(
        "wallet_actions_started_total",
        "Total action attempts started",
        &["kind"]
    ).unwrap();

    pub static ref ACTIONS_COMPLETED: CounterVec = register_counter_vec!(
        "wallet_actions_completed_total",
        "Total actions confirmed on the ledger",
        &["kind"]
    ).unwrap();

    pub static ref ACTIONS_FAILED: CounterVec = register_counter_vec!(
        "wallet_actions_failed_total",
        "Total actions failed by reason",
        &["kind", "reason"]
    ).unwrap();

    pub static ref CONFIRMATION_ROUNDS: HistogramVec = register_histogram_vec!(
        "wallet_actions_confirmation_rounds",
        "Rounds waited before confirmation",
        &["kind"],
        vec![0.0, 1.0, 2.0, 3.0, 4.0, 8.0, 16.0]
    ).unwrap();

    pub static ref ACTION_LATENCY: HistogramVec = register_histogram_vec!(
        "wallet_actions_latency_seconds",
        "Time from start to terminal status",
        &["kind"],
        vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    ).unwrap();

    // Node metrics
    pub static ref NODE_HEALTHY: GaugeVec = register_gauge_vec!(
        "wallet_actions_node_healthy",
        "Ledger node reachability (1=reachable, 0=unreachable)",
        &["network"]
    ).unwrap();

    pub static ref NODE_LAST_ROUND: GaugeVec = register_gauge_vec!(
        "wallet_actions_node_last_round",
        "Last round reported by the ledger node",
        &["network"]
    ).unwrap();
}

/// Render all registered metrics in the Prometheus text format
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

// Helper functions to record metrics

pub fn record_action_started(kind: ActionKind) {
    ACTIONS_STARTED.with_label_values(&[kind.as_str()]).inc();
}

pub fn record_action_completed(kind: ActionKind, rounds_waited: u64) {
    ACTIONS_COMPLETED.with_label_values(&[kind.as_str()]).inc();
    CONFIRMATION_ROUNDS
        .with_label_values(&[kind.as_str()])
        .observe(rounds_waited as f64);
}

pub fn record_action_failed(kind: ActionKind, reason: FailureKind) {
    ACTIONS_FAILED
        .with_label_values(&[kind.as_str(), reason.as_str()])
        .inc();
}

pub fn record_action_latency(kind: ActionKind, latency_secs: f64) {
    ACTION_LATENCY
        .with_label_values(&[kind.as_str()])
        .observe(latency_secs);
}

pub fn record_node_health(network: &str, last_round: Option<u64>) {
    NODE_HEALTHY
        .with_label_values(&[network])
        .set(if last_round.is_some() { 1.0 } else { 0.0 });
    if let Some(round) = last_round {
        NODE_LAST_ROUND
            .with_label_values(&[network])
            .set(round as f64);
    }
}
