use thiserror::Error;

use crate::types::ChainIndex;

/// Errors returned by a chain manager.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("index {0} is not known to the chain manager")]
    UnknownIndex(ChainIndex),

    #[error("chain state lock poisoned")]
    Poisoned,

    #[error("no block at height {0}")]
    MissingHeight(u32),

    #[error("rpc error: {0}")]
    Rpc(#[from] bitcoincore_rpc::Error),
}

/// Errors returned by a wallet store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("wallet store lock poisoned")]
    Poisoned,

    #[error("wallet store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by a sync pass. Every variant carries the collaborator's
/// error unchanged.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Apply(#[from] bdk_wallet::chain::local_chain::CannotConnectError),

    #[error("failed to reload wallet from store: {0}")]
    Reload(String),

    #[error("wallet lock poisoned")]
    Poisoned,
}

/// Errors returned while constructing a wallet.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("failed to create wallet: {0}")]
    Create(String),

    #[error("failed to create wallet: {0}")]
    Store(#[from] StoreError),

    #[error("failed to create wallet: {0}")]
    Chain(#[from] ChainError),

    #[error("initial sync failed: {0}")]
    Sync(#[from] SyncError),
}

/// Errors raised while building the static asset router.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("malformed route segment {segment:?} in {path}")]
    MalformedSegment { path: String, segment: String },

    #[error("conflicting dynamic segments [{existing}] and [{new}] in {path}")]
    ConflictingSlug {
        path: String,
        existing: String,
        new: String,
    },

    #[error("catch-all segment must be last in {0}")]
    CatchAllNotLast(String),

    #[error("duplicate route for {0}")]
    DuplicateRoute(String),
}
