//! Chain manager collaborators.
//!
//! A chain manager tracks the best chain and answers "what changed since this
//! index" with a batch of reverted and applied blocks. The wallet never talks
//! to a node directly; it only consumes these batches.

pub mod memory;
pub mod rpc;

#[cfg(test)]
mod tests;

pub use memory::MemoryChain;
pub use rpc::RpcChain;

use bitcoin::Network;

use crate::error::ChainError;
use crate::types::{ApplyUpdate, ChainIndex, RevertUpdate};

/// Reverted blocks (old tip first) and applied blocks (ascending height).
pub type ChainUpdates = (Vec<RevertUpdate>, Vec<ApplyUpdate>);

/// Minimal chain interface used by the wallet.
pub trait ChainManager: Send + Sync {
    /// Network whose consensus parameters this chain follows.
    fn network(&self) -> Network;

    /// Index of the genesis block.
    fn genesis(&self) -> Result<ChainIndex, ChainError>;

    /// Index of the current best block.
    fn tip(&self) -> Result<ChainIndex, ChainError>;

    /// Returns the updates needed to move from `index` to the best chain.
    ///
    /// `None` starts from genesis. At most `max` updates are returned in total;
    /// reverts are emitted before any applies.
    fn updates_since(
        &self,
        index: Option<ChainIndex>,
        max: usize,
    ) -> Result<ChainUpdates, ChainError>;
}
