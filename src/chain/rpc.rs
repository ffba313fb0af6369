use bitcoincore_rpc::{Auth, Client, RpcApi};
use bitcoin::Network;

use super::{ChainManager, ChainUpdates};
use crate::error::ChainError;
use crate::types::{ApplyUpdate, ChainIndex, RevertUpdate};

/// Chain manager backed by a Bitcoin Core node over JSON-RPC.
///
/// Stale blocks report `-1` confirmations from `getblockheader`, which is how
/// the fork point below an orphaned index is found.
pub struct RpcChain {
    client: Client,
    network: Network,
}

impl RpcChain {
    pub fn new(url: &str, user: String, pass: String, network: Network) -> Result<Self, ChainError> {
        let client = Client::new(url, Auth::UserPass(user, pass))?;
        let height = client.get_block_count()?;
        log::info!("[CHAIN] connected to {} at height {}", url, height);
        Ok(Self { client, network })
    }

    fn index_at(&self, height: u64) -> Result<ChainIndex, ChainError> {
        let hash = self.client.get_block_hash(height)?;
        Ok(ChainIndex::new(height as u32, hash))
    }
}

impl ChainManager for RpcChain {
    fn network(&self) -> Network {
        self.network
    }

    fn genesis(&self) -> Result<ChainIndex, ChainError> {
        self.index_at(0)
    }

    fn tip(&self) -> Result<ChainIndex, ChainError> {
        let height = self.client.get_block_count()?;
        self.index_at(height)
    }

    fn updates_since(
        &self,
        index: Option<ChainIndex>,
        max: usize,
    ) -> Result<ChainUpdates, ChainError> {
        let mut reverted = Vec::new();

        let mut cursor = index;
        while let Some(at) = cursor {
            let info = self.client.get_block_header_info(&at.id)?;
            if info.height as u32 != at.height {
                return Err(ChainError::UnknownIndex(at));
            }
            if info.confirmations >= 0 {
                break;
            }
            if reverted.len() >= max {
                return Ok((reverted, Vec::new()));
            }
            let block = self.client.get_block(&at.id)?;
            let parent = at.height.checked_sub(1).ok_or(ChainError::UnknownIndex(at))?;
            cursor = Some(ChainIndex::new(parent, block.header.prev_blockhash));
            reverted.push(RevertUpdate { index: at, block });
        }

        let tip = self.client.get_block_count()?;
        let start = cursor.map(|at| at.height as u64 + 1).unwrap_or(0);
        let room = max.saturating_sub(reverted.len()) as u64;
        let end = tip.min(start.saturating_add(room).saturating_sub(1));

        let mut applied = Vec::new();
        if room > 0 {
            for height in start..=end {
                let index = self.index_at(height)?;
                let block = self.client.get_block(&index.id)?;
                applied.push(ApplyUpdate { index, block });
            }
        }

        log::debug!(
            "[CHAIN] rpc updates since {:?}: {} reverted, {} applied",
            index,
            reverted.len(),
            applied.len()
        );
        Ok((reverted, applied))
    }
}
