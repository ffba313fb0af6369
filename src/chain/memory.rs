use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use bitcoin::block::{Header, Version as BlockVersion};
use bitcoin::constants::genesis_block;
use bitcoin::hashes::Hash;
use bitcoin::transaction::Version;
use bitcoin::{
    absolute, Amount, Block, BlockHash, CompactTarget, Network, OutPoint, ScriptBuf, Sequence,
    Transaction, TxIn, TxMerkleNode, TxOut, Witness,
};

use super::{ChainManager, ChainUpdates};
use crate::error::ChainError;
use crate::types::{ApplyUpdate, ChainIndex, RevertUpdate};

/// Regtest difficulty bits; blocks are never checked for proof of work here.
const REGTEST_BITS: u32 = 0x207f_ffff;
const BLOCK_INTERVAL_SECS: u32 = 600;

#[derive(Debug)]
struct ChainState {
    /// Every block ever seen, including orphaned branches.
    blocks: HashMap<BlockHash, (u32, Block)>,
    /// Best chain, indexed by height.
    best: Vec<BlockHash>,
    /// Bumped for every mined block so sibling blocks never share a hash.
    extra_nonce: u32,
}

impl ChainState {
    fn is_best(&self, index: &ChainIndex) -> bool {
        self.best.get(index.height as usize) == Some(&index.id)
    }

    fn tip(&self) -> ChainIndex {
        let height = self.best.len() as u32 - 1;
        ChainIndex::new(height, self.best[height as usize])
    }

    fn push(&mut self, block: Block) -> ChainIndex {
        let index = ChainIndex::of_block(&block, self.best.len() as u32);
        self.best.push(index.id);
        self.blocks.insert(index.id, (index.height, block));
        index
    }

    fn next_block(&mut self, payout: ScriptBuf, value: Amount, txs: Vec<Transaction>) -> Block {
        let tip = self.tip();
        let height = tip.height + 1;
        self.extra_nonce += 1;

        let time = self
            .blocks
            .get(&tip.id)
            .map(|(_, b)| b.header.time)
            .unwrap_or_default()
            + BLOCK_INTERVAL_SECS;

        let mut txdata = Vec::with_capacity(txs.len() + 1);
        txdata.push(coinbase(height, self.extra_nonce, payout, value));
        txdata.extend(txs);

        let mut block = Block {
            header: Header {
                version: BlockVersion::ONE,
                prev_blockhash: tip.id,
                merkle_root: TxMerkleNode::all_zeros(),
                time,
                bits: CompactTarget::from_consensus(REGTEST_BITS),
                nonce: 0,
            },
            txdata,
        };
        if let Some(root) = block.compute_merkle_root() {
            block.header.merkle_root = root;
        }
        block
    }
}

fn coinbase(height: u32, extra_nonce: u32, payout: ScriptBuf, value: Amount) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: absolute::LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::null(),
            script_sig: ScriptBuf::builder()
                .push_int(height as i64)
                .push_int(extra_nonce as i64)
                .into_script(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value,
            script_pubkey: payout,
        }],
    }
}

/// In-memory chain manager.
///
/// Blocks carry no proof of work; the chain exists to drive wallets in tests
/// and in the demo binary.
#[derive(Debug)]
pub struct MemoryChain {
    network: Network,
    state: RwLock<ChainState>,
}

impl MemoryChain {
    pub fn new(network: Network) -> Self {
        let genesis = genesis_block(network);
        let mut state = ChainState {
            blocks: HashMap::new(),
            best: Vec::new(),
            extra_nonce: 0,
        };
        state.push(genesis);

        Self {
            network,
            state: RwLock::new(state),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ChainState>, ChainError> {
        self.state.read().map_err(|_| ChainError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ChainState>, ChainError> {
        self.state.write().map_err(|_| ChainError::Poisoned)
    }

    /// Height of the best block.
    pub fn height(&self) -> Result<u32, ChainError> {
        Ok(self.read()?.tip().height)
    }

    /// Mines a block containing `txs` after an empty coinbase.
    pub fn mine_block(&self, txs: Vec<Transaction>) -> Result<ChainIndex, ChainError> {
        let mut state = self.write()?;
        let block = state.next_block(ScriptBuf::new(), Amount::ZERO, txs);
        let index = state.push(block);
        log::debug!("[CHAIN] mined {}", index);
        Ok(index)
    }

    /// Mines a block whose coinbase pays `value` to `script`.
    pub fn mine_to(&self, script: &ScriptBuf, value: Amount) -> Result<ChainIndex, ChainError> {
        let mut state = self.write()?;
        let block = state.next_block(script.clone(), value, Vec::new());
        let index = state.push(block);
        log::debug!("[CHAIN] mined {} paying {}", index, value);
        Ok(index)
    }

    /// Mines `n` empty blocks.
    pub fn mine_empty(&self, n: usize) -> Result<ChainIndex, ChainError> {
        let mut state = self.write()?;
        for _ in 0..n {
            let block = state.next_block(ScriptBuf::new(), Amount::ZERO, Vec::new());
            state.push(block);
        }
        Ok(state.tip())
    }

    /// Replaces every block above `fork_height` with `n` fresh empty blocks.
    ///
    /// The replaced blocks stay known so indices on the orphaned branch can
    /// still be reverted.
    pub fn reorg(&self, fork_height: u32, n: usize) -> Result<ChainIndex, ChainError> {
        let mut state = self.write()?;
        if fork_height as usize >= state.best.len() {
            return Err(ChainError::MissingHeight(fork_height));
        }
        let orphaned = state.best.len() - fork_height as usize - 1;
        state.best.truncate(fork_height as usize + 1);
        for _ in 0..n {
            let block = state.next_block(ScriptBuf::new(), Amount::ZERO, Vec::new());
            state.push(block);
        }
        log::info!(
            "[CHAIN] reorg at height {}: {} blocks orphaned, {} applied",
            fork_height,
            orphaned,
            n
        );
        Ok(state.tip())
    }

    /// Returns the block at `height` on the best chain.
    pub fn block_at(&self, height: u32) -> Result<Block, ChainError> {
        let state = self.read()?;
        state
            .best
            .get(height as usize)
            .and_then(|hash| state.blocks.get(hash))
            .map(|(_, block)| block.clone())
            .ok_or(ChainError::MissingHeight(height))
    }
}

impl Default for MemoryChain {
    fn default() -> Self {
        Self::new(Network::Regtest)
    }
}

impl ChainManager for MemoryChain {
    fn network(&self) -> Network {
        self.network
    }

    fn genesis(&self) -> Result<ChainIndex, ChainError> {
        let state = self.read()?;
        Ok(ChainIndex::new(0, state.best[0]))
    }

    fn tip(&self) -> Result<ChainIndex, ChainError> {
        Ok(self.read()?.tip())
    }

    fn updates_since(
        &self,
        index: Option<ChainIndex>,
        max: usize,
    ) -> Result<ChainUpdates, ChainError> {
        let state = self.read()?;
        let mut reverted = Vec::new();

        let mut cursor = index;
        while let Some(at) = cursor {
            if state.is_best(&at) {
                break;
            }
            let block = match state.blocks.get(&at.id) {
                Some((height, block)) if *height == at.height => block,
                _ => return Err(ChainError::UnknownIndex(at)),
            };
            if reverted.len() >= max {
                return Ok((reverted, Vec::new()));
            }
            reverted.push(RevertUpdate {
                index: at,
                block: block.clone(),
            });
            // genesis is always on the best chain, so an orphan has a parent
            let parent = at.height.checked_sub(1).ok_or(ChainError::UnknownIndex(at))?;
            cursor = Some(ChainIndex::new(parent, block.header.prev_blockhash));
        }

        let start = cursor.map(|at| at.height as usize + 1).unwrap_or(0);
        let room = max.saturating_sub(reverted.len());
        let applied = state
            .best
            .iter()
            .enumerate()
            .skip(start)
            .take(room)
            .map(|(height, hash)| {
                let (_, block) = &state.blocks[hash];
                ApplyUpdate {
                    index: ChainIndex::new(height as u32, *hash),
                    block: block.clone(),
                }
            })
            .collect::<Vec<_>>();

        log::trace!(
            "[CHAIN] updates since {:?}: {} reverted, {} applied",
            index,
            reverted.len(),
            applied.len()
        );
        Ok((reverted, applied))
    }
}
