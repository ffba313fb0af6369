use bdk_wallet::Wallet;

use super::store::UpdateTx;
use crate::error::SyncError;
use crate::types::{ApplyUpdate, RevertUpdate, SyncReport};

/// Applies a batch of chain updates to `wallet`, staging the result in `tx`.
///
/// Reverted blocks are staged as checkpoint removals. The in-memory wallet
/// still holds them until it is reloaded from the committed state.
pub fn apply_chain_updates(
    wallet: &mut Wallet,
    tx: &mut UpdateTx,
    reverted: &[RevertUpdate],
    applied: &[ApplyUpdate],
) -> Result<SyncReport, SyncError> {
    for update in reverted {
        log::debug!("[SYNC] revert {}", update.index);
        tx.revert_index(update);
    }

    for update in applied {
        log::trace!("[SYNC] apply {}", update.index);
        wallet.apply_block(&update.block, update.index.height)?;
        tx.apply_index(update.index);
    }

    if let Some(changeset) = wallet.take_staged() {
        tx.stage(changeset);
    }

    Ok(tx.report())
}
