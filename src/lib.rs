pub mod api;
pub mod chain;
pub mod config;
pub mod error;
pub mod runtime;
pub mod types;
pub mod ui;
pub mod wallet;

pub use chain::{ChainManager, MemoryChain, RpcChain};
pub use error::{ChainError, RouterError, StoreError, SyncError, WalletError};
pub use types::{ApplyUpdate, ChainIndex, RevertUpdate, SyncReport};
pub use wallet::{EphemeralWalletStore, SingleAddressWallet, WalletStore};
