use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bdk_wallet::chain::{ChainPosition, ConfirmationBlockTime};

use super::types::*;
use super::{ApiState, DynWallet};
use crate::error::{ChainError, StoreError, SyncError};
use crate::types::{ChainIndex, SyncReport};

/// Handler error, rendered as a plain-text body with a status code.
#[derive(Debug)]
pub enum ApiError {
    Unavailable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, message).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::Unavailable(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Chain(err) => err.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Runs `f` against the wallet on the blocking pool; chain calls may block
/// on RPC.
async fn with_wallet<T, F>(state: &ApiState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut DynWallet) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let wallet = state.wallet.clone();
    tokio::task::spawn_blocking(move || {
        let mut wallet = wallet
            .lock()
            .map_err(|_| ApiError::Internal("wallet lock poisoned".to_string()))?;
        f(&mut *wallet)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
}

fn confirmation_height(position: &ChainPosition<ConfirmationBlockTime>) -> Option<u32> {
    match position {
        ChainPosition::Confirmed { anchor, .. } => Some(anchor.block_id.height),
        _ => None,
    }
}

/// GET /api/state
pub async fn state(State(state): State<ApiState>) -> Json<StateResponse> {
    Json(StateResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        network: state.network.to_string(),
        start_time: state.start_time,
    })
}

/// GET /api/consensus/tip
pub async fn consensus_tip(State(state): State<ApiState>) -> Result<Json<ChainIndex>, ApiError> {
    let tip = with_wallet(&state, |w| Ok(w.chain().tip()?)).await?;
    Ok(Json(tip))
}

/// GET /api/wallet/address
pub async fn address(State(state): State<ApiState>) -> Result<Json<AddressResponse>, ApiError> {
    let address = with_wallet(&state, |w| Ok(w.address().to_string())).await?;
    Ok(Json(AddressResponse { address }))
}

/// GET /api/wallet/balance
pub async fn balance(State(state): State<ApiState>) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = with_wallet(&state, |w| Ok(w.balance())).await?;
    Ok(Json(BalanceResponse {
        confirmed: balance.confirmed.to_sat(),
        immature: balance.immature.to_sat(),
        pending: (balance.trusted_pending + balance.untrusted_pending).to_sat(),
        total: balance.total().to_sat(),
    }))
}

/// GET /api/wallet/outputs
pub async fn outputs(State(state): State<ApiState>) -> Result<Json<OutputsResponse>, ApiError> {
    let response = with_wallet(&state, |w| {
        let outputs = w
            .unspent()
            .into_iter()
            .map(|utxo| OutputEntry {
                outpoint: utxo.outpoint.to_string(),
                value: utxo.txout.value.to_sat(),
                height: confirmation_height(&utxo.chain_position),
            })
            .collect();
        Ok(OutputsResponse {
            basis: w.tip()?,
            outputs,
        })
    })
    .await?;
    Ok(Json(response))
}

/// GET /api/wallet/events
/// Wallet transactions, unconfirmed first, then newest confirmed.
pub async fn events(State(state): State<ApiState>) -> Result<Json<Vec<EventEntry>>, ApiError> {
    let mut events = with_wallet(&state, |w| {
        let inner = w.inner();
        let events = inner
            .transactions()
            .map(|wtx| {
                let (sent, received) = inner.sent_and_received(&wtx.tx_node.tx);
                EventEntry {
                    txid: wtx.tx_node.txid.to_string(),
                    height: confirmation_height(&wtx.chain_position),
                    received: received.to_sat(),
                    sent: sent.to_sat(),
                }
            })
            .collect::<Vec<_>>();
        Ok(events)
    })
    .await?;

    events.sort_by_key(|e| std::cmp::Reverse(e.height.unwrap_or(u32::MAX)));
    Ok(Json(events))
}

/// POST /api/wallet/sync
pub async fn sync(State(state): State<ApiState>) -> Result<Json<SyncReport>, ApiError> {
    let report = with_wallet(&state, |w| Ok(w.sync()?)).await?;
    log::debug!("[API] sync requested: {:?}", report);
    Ok(Json(report))
}
