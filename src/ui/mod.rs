//! Embedded walletd web UI.

mod router;

#[cfg(test)]
mod tests;

pub use router::{NextRouter, Resolved};

use rust_embed::RustEmbed;

use crate::error::RouterError;

/// Pre-built UI bundled into the binary.
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Assets;

/// Returns the handler serving the walletd UI.
///
/// A bundle that cannot be routed is a build defect; callers treat the error
/// as fatal at startup.
pub fn handler<S>() -> Result<axum::Router<S>, RouterError>
where
    S: Clone + Send + Sync + 'static,
{
    let router = NextRouter::<Assets>::new()?;
    log::info!("[UI] serving embedded walletd UI");
    Ok(router.into_router())
}
