//! JSON API served next to the UI.

pub mod handlers;
pub mod types;


use axum::{
    routing::{get, post},
    Router,
};
use bitcoin::Network;

pub use crate::wallet::{DynWallet, SharedWallet};

/// Shared application state
#[derive(Clone)]
pub struct ApiState {
    pub wallet: SharedWallet,
    pub network: Network,
    /// Unix seconds.
    pub start_time: u64,
}

impl ApiState {
    pub fn new(wallet: SharedWallet, network: Network) -> Self {
        let start_time = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            wallet,
            network,
            start_time,
        }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/state", get(handlers::state))
        .route("/api/consensus/tip", get(handlers::consensus_tip))
        .route("/api/wallet/address", get(handlers::address))
        .route("/api/wallet/balance", get(handlers::balance))
        .route("/api/wallet/outputs", get(handlers::outputs))
        .route("/api/wallet/events", get(handlers::events))
        .route("/api/wallet/sync", post(handlers::sync))
        .with_state(state)
}
