use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use bitcoin::secp256k1::{rand, SecretKey};
use bitcoin::{Network, PrivateKey};
use clap::{Parser, ValueEnum};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainSource {
    /// In-memory regtest chain, blocks are mined locally.
    Memory,
    /// Bitcoin Core node over JSON-RPC.
    Rpc,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Single-address wallet daemon with an embedded web UI")]
pub struct Args {
    #[arg(long, default_value = "regtest")]
    pub network: Network,

    /// WIF private key. A random key is generated when omitted.
    #[arg(long)]
    pub private_key: Option<String>,

    #[arg(long, value_enum, default_value_t = ChainSource::Memory)]
    pub chain: ChainSource,

    #[arg(long, default_value = "http://127.0.0.1:18443")]
    pub rpc_url: String,

    #[arg(long, default_value = "")]
    pub rpc_user: String,

    #[arg(long, default_value = "")]
    pub rpc_pass: String,

    #[arg(long, default_value = "127.0.0.1:9980")]
    pub http_addr: SocketAddr,

    #[arg(long, default_value_t = 10)]
    pub sync_interval_secs: u64,

    /// Blocks to pre-mine to the wallet (memory chain only).
    #[arg(long, default_value_t = 0)]
    pub mine_blocks: usize,

    /// Mine a block paying the wallet before every sync (memory chain only).
    #[arg(long)]
    pub demo_miner: bool,
}

impl Args {
    pub fn private_key(&self) -> Result<PrivateKey> {
        match &self.private_key {
            Some(wif) => {
                let key = PrivateKey::from_wif(wif).context("invalid --private-key")?;
                Ok(key)
            }
            None => {
                let secret = SecretKey::new(&mut rand::thread_rng());
                log::warn!("[MAIN] No --private-key given, using an ephemeral key");
                Ok(PrivateKey::new(secret, self.network))
            }
        }
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_memory_chain_on_regtest() {
        let args = Args::parse_from(["walletd"]);
        assert_eq!(args.network, Network::Regtest);
        assert_eq!(args.chain, ChainSource::Memory);
        assert_eq!(args.sync_interval(), Duration::from_secs(10));
        assert!(args.private_key().is_ok());
    }

    #[test]
    fn wif_key_round_trips() {
        let key = PrivateKey::new(SecretKey::from_slice(&[3u8; 32]).unwrap(), Network::Regtest);
        let wif = key.to_wif();
        let args = Args::parse_from(["walletd", "--private-key", wif.as_str(), "--chain", "rpc"]);
        assert_eq!(args.private_key().unwrap(), key);
        assert_eq!(args.chain, ChainSource::Rpc);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let args = Args::parse_from(["walletd", "--sync-interval-secs", "0"]);
        assert_eq!(args.sync_interval(), Duration::from_secs(1));
    }

    #[test]
    fn bad_key_is_rejected() {
        let args = Args::parse_from(["walletd", "--private-key", "not-a-key"]);
        assert!(args.private_key().is_err());
    }
}
