use bitcoin::hashes::Hash;
use bitcoin::{Amount, BlockHash, ScriptBuf};

use crate::chain::{ChainManager, MemoryChain};
use crate::error::ChainError;
use crate::types::ChainIndex;

#[test]
fn updates_from_scratch_start_at_genesis() {
    let chain = MemoryChain::default();
    chain.mine_empty(3).unwrap();

    let (reverted, applied) = chain.updates_since(None, usize::MAX).unwrap();

    assert!(reverted.is_empty());
    assert_eq!(applied.len(), 4);
    assert_eq!(applied[0].index, chain.genesis().unwrap());
    let heights: Vec<u32> = applied.iter().map(|u| u.index.height).collect();
    assert_eq!(heights, vec![0, 1, 2, 3]);
}

#[test]
fn updates_at_tip_are_empty() {
    let chain = MemoryChain::default();
    let tip = chain.mine_empty(2).unwrap();

    let (reverted, applied) = chain.updates_since(Some(tip), usize::MAX).unwrap();

    assert!(reverted.is_empty());
    assert!(applied.is_empty());
}

#[test]
fn max_bounds_total_updates() {
    let chain = MemoryChain::default();
    chain.mine_empty(10).unwrap();

    let (_, applied) = chain.updates_since(None, 4).unwrap();
    assert_eq!(applied.len(), 4);
    assert_eq!(applied.last().unwrap().index.height, 3);
}

#[test]
fn reorg_reverts_orphaned_blocks_then_applies() {
    let chain = MemoryChain::default();
    let old_tip = chain.mine_empty(5).unwrap();

    let new_tip = chain.reorg(3, 3).unwrap();
    assert_eq!(new_tip.height, 6);

    let (reverted, applied) = chain.updates_since(Some(old_tip), usize::MAX).unwrap();

    let reverted_heights: Vec<u32> = reverted.iter().map(|u| u.index.height).collect();
    assert_eq!(reverted_heights, vec![5, 4]);
    assert_eq!(reverted[0].index, old_tip);

    let applied_heights: Vec<u32> = applied.iter().map(|u| u.index.height).collect();
    assert_eq!(applied_heights, vec![4, 5, 6]);
    assert_eq!(applied.last().unwrap().index, new_tip);
    assert_eq!(
        applied[0].block.header.prev_blockhash,
        chain.block_at(3).unwrap().block_hash()
    );
}

#[test]
fn revert_batch_respects_max() {
    let chain = MemoryChain::default();
    let old_tip = chain.mine_empty(5).unwrap();
    chain.reorg(1, 6).unwrap();

    let (reverted, applied) = chain.updates_since(Some(old_tip), 2).unwrap();
    assert_eq!(reverted.len(), 2);
    assert!(applied.is_empty());
}

#[test]
fn unknown_index_is_an_error() {
    let chain = MemoryChain::default();
    chain.mine_empty(2).unwrap();

    let bogus = ChainIndex::new(1, BlockHash::all_zeros());
    match chain.updates_since(Some(bogus), usize::MAX) {
        Err(ChainError::UnknownIndex(index)) => assert_eq!(index, bogus),
        other => panic!("expected UnknownIndex, got {:?}", other.map(|(r, a)| (r.len(), a.len()))),
    }
}

#[test]
fn mined_coinbase_pays_script() {
    let chain = MemoryChain::default();
    let script = ScriptBuf::from_bytes(vec![0x51]);
    let index = chain.mine_to(&script, Amount::from_sat(5_000)).unwrap();

    let block = chain.block_at(index.height).unwrap();
    assert_eq!(block.block_hash(), index.id);
    assert!(block.txdata[0].is_coinbase());
    assert_eq!(block.txdata[0].output[0].script_pubkey, script);
    assert_eq!(block.txdata[0].output[0].value, Amount::from_sat(5_000));
}
