use std::fmt;

use bitcoin::{Block, BlockHash};
use bdk_wallet::chain::BlockId;
use serde::{Deserialize, Serialize};

/// Identifies a block on a chain by height and hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainIndex {
    pub height: u32,
    pub id: BlockHash,
}

impl ChainIndex {
    pub fn new(height: u32, id: BlockHash) -> Self {
        Self { height, id }
    }

    pub fn of_block(block: &Block, height: u32) -> Self {
        Self {
            height,
            id: block.block_hash(),
        }
    }
}

impl fmt::Display for ChainIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.height, self.id)
    }
}

impl From<BlockId> for ChainIndex {
    fn from(id: BlockId) -> Self {
        Self {
            height: id.height,
            id: id.hash,
        }
    }
}

impl From<ChainIndex> for BlockId {
    fn from(index: ChainIndex) -> Self {
        BlockId {
            height: index.height,
            hash: index.id,
        }
    }
}

/// A block removed from the best chain.
#[derive(Debug, Clone)]
pub struct RevertUpdate {
    pub index: ChainIndex,
    pub block: Block,
}

impl RevertUpdate {
    /// Index of the block this one was built on.
    pub fn parent(&self) -> Option<ChainIndex> {
        self.index
            .height
            .checked_sub(1)
            .map(|height| ChainIndex::new(height, self.block.header.prev_blockhash))
    }
}

/// A block added to the best chain.
#[derive(Debug, Clone)]
pub struct ApplyUpdate {
    pub index: ChainIndex,
    pub block: Block,
}

/// Outcome of a single sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub reverted: usize,
    pub applied: usize,
    pub tip: Option<ChainIndex>,
}
