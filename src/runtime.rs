use std::sync::Arc;
use std::time::{Duration, Instant};

use bitcoin::{Amount, ScriptBuf};

use crate::chain::MemoryChain;
use crate::error::SyncError;
use crate::types::SyncReport;
use crate::wallet::SharedWallet;

/// Coinbase value used when the demo miner pays the wallet.
pub const DEMO_SUBSIDY: Amount = Amount::from_sat(50_000);

/// Mines a block on an in-memory chain before each sync pass.
struct DemoMiner {
    chain: Arc<MemoryChain>,
    payout: ScriptBuf,
}

/// Keeps a shared wallet in sync on a fixed interval.
pub struct SyncLoop {
    wallet: SharedWallet,
    interval: Duration,
    miner: Option<DemoMiner>,

    /// Timeline
    t0: Instant,
}

impl SyncLoop {
    pub fn new(wallet: SharedWallet, interval: Duration) -> Self {
        Self {
            wallet,
            interval,
            miner: None,
            t0: Instant::now(),
        }
    }

    /// Mines one block paying `payout` ahead of every pass.
    pub fn with_miner(mut self, chain: Arc<MemoryChain>, payout: ScriptBuf) -> Self {
        self.miner = Some(DemoMiner { chain, payout });
        self
    }

    fn t(&self) -> u128 {
        self.t0.elapsed().as_millis()
    }

    /// Runs a single pass. The wallet lock is held only for the sync itself.
    pub fn tick(&self) -> Result<SyncReport, SyncError> {
        if let Some(miner) = &self.miner {
            if let Err(err) = miner.chain.mine_to(&miner.payout, DEMO_SUBSIDY) {
                log::warn!("[SYNC] demo miner failed: {}", err);
            }
        }

        let mut wallet = self
            .wallet
            .lock()
            .map_err(|_| SyncError::Poisoned)?;
        wallet.sync()
    }

    pub fn run_forever(self) -> ! {
        log::info!("[SYNC] starting sync loop every {:?}", self.interval);
        loop {
            std::thread::sleep(self.interval);
            match self.tick() {
                Ok(report) => log::trace!("[SYNC] {:>8}ms: {:?}", self.t(), report),
                Err(err) => log::error!("[SYNC] {:>8}ms: sync failed: {}", self.t(), err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainManager;
    use crate::wallet::SingleAddressWallet;
    use bitcoin::secp256k1::SecretKey;
    use bitcoin::{NetworkKind, PrivateKey};
    use std::sync::Mutex;

    fn shared_wallet(chain: &Arc<MemoryChain>) -> SharedWallet {
        let key = PrivateKey::new(SecretKey::from_slice(&[0x07; 32]).unwrap(), NetworkKind::Test);
        let dyn_chain: Arc<dyn ChainManager> = chain.clone();
        Arc::new(Mutex::new(SingleAddressWallet::new(dyn_chain, key).unwrap()))
    }

    #[test]
    fn tick_syncs_shared_wallet() {
        let chain = Arc::new(MemoryChain::default());
        let wallet = shared_wallet(&chain);
        let sync = SyncLoop::new(wallet.clone(), Duration::from_secs(1));

        let tip = chain.mine_empty(3).unwrap();
        let report = sync.tick().unwrap();

        assert_eq!(report.applied, 3);
        assert_eq!(wallet.lock().unwrap().tip().unwrap(), Some(tip));
    }

    #[test]
    fn miner_pays_wallet_each_tick() {
        let chain = Arc::new(MemoryChain::default());
        let wallet = shared_wallet(&chain);
        let payout = wallet.lock().unwrap().script_pubkey();
        let sync = SyncLoop::new(wallet.clone(), Duration::from_secs(1))
            .with_miner(chain.clone(), payout);

        sync.tick().unwrap();
        sync.tick().unwrap();

        assert_eq!(chain.height().unwrap(), 2);
        assert_eq!(
            wallet.lock().unwrap().balance().total(),
            DEMO_SUBSIDY * 2
        );
    }
}
