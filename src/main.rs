use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::trace::TraceLayer;

use walletd::api::{self, ApiState};
use walletd::config::{Args, ChainSource};
use walletd::runtime::{SyncLoop, DEMO_SUBSIDY};
use walletd::{ui, ChainManager, MemoryChain, RpcChain, SingleAddressWallet};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    println!("[MAIN] Chain source: {:?}", args.chain);

    let key = args.private_key()?;

    let (chain, memory): (Arc<dyn ChainManager>, Option<Arc<MemoryChain>>) = match args.chain {
        ChainSource::Memory => {
            let chain = Arc::new(MemoryChain::new(args.network));
            let dyn_chain: Arc<dyn ChainManager> = chain.clone();
            (dyn_chain, Some(chain))
        }
        ChainSource::Rpc => {
            let chain = RpcChain::new(
                &args.rpc_url,
                args.rpc_user.clone(),
                args.rpc_pass.clone(),
                args.network,
            )
            .context("Failed to connect to Bitcoin Core")?;
            let dyn_chain: Arc<dyn ChainManager> = Arc::new(chain);
            (dyn_chain, None)
        }
    };

    // construction syncs once; over RPC that can take a while
    let mut wallet = tokio::task::spawn_blocking(move || SingleAddressWallet::new(chain, key))
        .await?
        .context("Failed to set up wallet")?;

    log::info!("[MAIN] Wallet address: {}", wallet.address());

    if let Some(memory) = &memory {
        if args.mine_blocks > 0 {
            let payout = wallet.script_pubkey();
            for _ in 0..args.mine_blocks {
                memory.mine_to(&payout, DEMO_SUBSIDY)?;
            }
            let report = wallet.sync()?;
            log::info!("[MAIN] Pre-mined {} blocks to wallet", report.applied);
        }
    }

    let payout = wallet.script_pubkey();
    let wallet = Arc::new(Mutex::new(wallet));

    let mut sync_loop = SyncLoop::new(wallet.clone(), args.sync_interval());
    if args.demo_miner {
        match memory {
            Some(memory) => sync_loop = sync_loop.with_miner(memory, payout),
            None => log::warn!("[MAIN] --demo-miner needs the memory chain, ignoring"),
        }
    }
    std::thread::spawn(move || {
        sync_loop.run_forever();
    });

    let ui = ui::handler().context("Failed to build UI router")?;
    let app = api::router(ApiState::new(wallet, args.network))
        .merge(ui)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(args.http_addr).await?;
    log::info!("[MAIN] walletd listening on http://{}", args.http_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
