//! Single-address wallet kept in sync with a chain manager.
//!
//! The wallet engine (`bdk_wallet`) owns balance and UTXO accounting. This
//! module only wires it to a [`ChainManager`] and a [`WalletStore`]:
//! read the store's tip, ask the chain for everything since, and apply the
//! batch inside one store transaction.

pub mod store;
mod update;


pub use store::{EphemeralWalletStore, UpdateTx, WalletStore};
pub use update::apply_chain_updates;

use std::sync::{Arc, Mutex};

use bdk_wallet::{Balance, KeychainKind, LocalOutput, Wallet};
use bitcoin::{Address, Network, PrivateKey, ScriptBuf};

use crate::chain::ChainManager;
use crate::error::{StoreError, SyncError, WalletError};
use crate::types::{ChainIndex, SyncReport};

/// Wallet over a type-erased chain manager, as shared by the binary.
pub type DynWallet = SingleAddressWallet<dyn ChainManager>;
pub type SharedWallet = Arc<Mutex<DynWallet>>;

pub struct SingleAddressWallet<C: ?Sized, S = EphemeralWalletStore> {
    wallet: Wallet,
    /// Private descriptor, needed to restore signers on reload.
    descriptor: String,
    store: S,
    chain: Arc<C>,
}

impl<C: ChainManager + ?Sized> SingleAddressWallet<C> {
    /// Creates a wallet for `key` backed by a fresh ephemeral store and runs
    /// one sync pass before returning.
    ///
    /// If that first sync fails, the error is returned and the wallet is
    /// dropped. Callers never get a wallet that has not synced once.
    pub fn new(chain: Arc<C>, key: PrivateKey) -> Result<Self, WalletError> {
        Self::with_store(chain, key, EphemeralWalletStore::new())
    }
}

impl<C, S> SingleAddressWallet<C, S>
where
    C: ChainManager + ?Sized,
    S: WalletStore,
{
    pub fn with_store(chain: Arc<C>, key: PrivateKey, store: S) -> Result<Self, WalletError> {
        let descriptor = format!("wpkh({})", key.to_wif());
        let genesis = chain.genesis()?;

        let mut wallet = Wallet::create_single(descriptor.clone())
            .network(chain.network())
            .genesis_hash(genesis.id)
            .create_wallet_no_persist()
            .map_err(|e| WalletError::Create(e.to_string()))?;

        if let Some(changeset) = wallet.take_staged() {
            store.init(changeset)?;
        }

        log::info!(
            "[WALLET] Created single address wallet {} on {}",
            wallet.peek_address(KeychainKind::External, 0).address,
            chain.network()
        );

        let mut w = Self {
            wallet,
            descriptor,
            store,
            chain,
        };
        w.sync()?;
        Ok(w)
    }

    /// Brings the wallet up to the chain manager's best chain.
    ///
    /// A tip read failure returns before anything is touched. A failed apply
    /// leaves the store unchanged and reloads the wallet from it. A committed
    /// batch with reverts also reloads, so orphaned checkpoints leave the
    /// wallet together with the store.
    pub fn sync(&mut self) -> Result<SyncReport, SyncError> {
        let index = self.store.tip()?;
        let (reverted, applied) = self.chain.updates_since(index, usize::MAX)?;

        let wallet = &mut self.wallet;
        let result = self
            .store
            .update_chain_state(|tx| apply_chain_updates(wallet, tx, &reverted, &applied));

        match result {
            Ok(report) => {
                if report.reverted > 0 {
                    self.reload()?;
                }
                if report.reverted > 0 || report.applied > 0 {
                    log::info!(
                        "[SYNC] {} reverted, {} applied, tip {:?}",
                        report.reverted,
                        report.applied,
                        report.tip
                    );
                }
                Ok(report)
            }
            Err(err) => {
                log::warn!("[SYNC] update failed, reloading wallet: {}", err);
                self.reload()?;
                Err(err)
            }
        }
    }

    /// Rebuilds the in-memory wallet from the store's committed state.
    fn reload(&mut self) -> Result<(), SyncError> {
        let changeset = self.store.changeset()?;
        let wallet = Wallet::load()
            .descriptor(KeychainKind::External, Some(self.descriptor.clone()))
            .extract_keys()
            .load_wallet_no_persist(changeset)
            .map_err(|e| SyncError::Reload(e.to_string()))?
            .ok_or_else(|| SyncError::Reload("store holds no wallet".to_string()))?;
        self.wallet = wallet;
        Ok(())
    }

    pub fn address(&self) -> Address {
        self.wallet.peek_address(KeychainKind::External, 0).address
    }

    pub fn script_pubkey(&self) -> ScriptBuf {
        self.address().script_pubkey()
    }

    pub fn balance(&self) -> Balance {
        self.wallet.balance()
    }

    pub fn unspent(&self) -> Vec<LocalOutput> {
        self.wallet.list_unspent().collect()
    }

    /// Last index the store has recorded as applied.
    pub fn tip(&self) -> Result<Option<ChainIndex>, StoreError> {
        self.store.tip()
    }

    /// Highest block the wallet engine has connected.
    pub fn checkpoint(&self) -> ChainIndex {
        self.wallet.latest_checkpoint().block_id().into()
    }

    pub fn network(&self) -> Network {
        self.wallet.network()
    }

    pub fn chain(&self) -> &Arc<C> {
        &self.chain
    }

    pub fn inner(&self) -> &Wallet {
        &self.wallet
    }
}
