use std::sync::{Mutex, MutexGuard};

use bdk_wallet::chain::Merge;
use bdk_wallet::ChangeSet;

use crate::error::{StoreError, SyncError};
use crate::types::{ChainIndex, RevertUpdate, SyncReport};

/// Persistence backend for a single wallet.
pub trait WalletStore: Send {
    /// Last chain index the store has recorded as applied.
    fn tip(&self) -> Result<Option<ChainIndex>, StoreError>;

    /// Committed wallet state.
    fn changeset(&self) -> Result<ChangeSet, StoreError>;

    /// Records the wallet's initial state.
    fn init(&self, changeset: ChangeSet) -> Result<(), StoreError>;

    /// Runs `f` inside a scoped transaction.
    ///
    /// Everything `f` stages is committed only if it returns `Ok`.
    fn update_chain_state<T, F>(&self, f: F) -> Result<T, SyncError>
    where
        F: FnOnce(&mut UpdateTx) -> Result<T, SyncError>;
}

/// Staged changes of an in-flight chain state update.
#[derive(Debug, Default)]
pub struct UpdateTx {
    tip: Option<ChainIndex>,
    changeset: ChangeSet,
    reverted: usize,
    applied: usize,
}

impl UpdateTx {
    pub fn begin(tip: Option<ChainIndex>) -> Self {
        Self {
            tip,
            ..Default::default()
        }
    }

    pub fn tip(&self) -> Option<ChainIndex> {
        self.tip
    }

    pub fn stage(&mut self, changeset: ChangeSet) {
        self.changeset.merge(changeset);
    }

    /// Moves the tip below a reverted block and drops its checkpoint from
    /// the staged wallet state.
    pub fn revert_index(&mut self, update: &RevertUpdate) {
        let mut changeset = ChangeSet::default();
        changeset
            .local_chain
            .blocks
            .insert(update.index.height, None);
        self.stage(changeset);

        self.tip = update.parent();
        self.reverted += 1;
    }

    pub fn apply_index(&mut self, index: ChainIndex) {
        self.tip = Some(index);
        self.applied += 1;
    }

    pub fn report(&self) -> SyncReport {
        SyncReport {
            reverted: self.reverted,
            applied: self.applied,
            tip: self.tip,
        }
    }

    pub fn into_parts(self) -> (Option<ChainIndex>, ChangeSet) {
        (self.tip, self.changeset)
    }
}

#[derive(Debug, Default)]
struct StoreState {
    tip: Option<ChainIndex>,
    changeset: ChangeSet,
}

/// Non-durable in-memory wallet store. State is lost when dropped.
#[derive(Debug, Default)]
pub struct EphemeralWalletStore {
    state: Mutex<StoreState>,
}

impl EphemeralWalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl WalletStore for EphemeralWalletStore {
    fn tip(&self) -> Result<Option<ChainIndex>, StoreError> {
        Ok(self.lock()?.tip)
    }

    fn changeset(&self) -> Result<ChangeSet, StoreError> {
        Ok(self.lock()?.changeset.clone())
    }

    fn init(&self, changeset: ChangeSet) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.changeset.merge(changeset);
        Ok(())
    }

    fn update_chain_state<T, F>(&self, f: F) -> Result<T, SyncError>
    where
        F: FnOnce(&mut UpdateTx) -> Result<T, SyncError>,
    {
        let mut state = self.lock()?;
        let mut tx = UpdateTx::begin(state.tip);
        let out = f(&mut tx)?;

        let (tip, changeset) = tx.into_parts();
        state.tip = tip;
        state.changeset.merge(changeset);
        log::trace!("[WALLET] store committed, tip {:?}", tip);
        Ok(out)
    }
}
