//! Block explorer links for submitted transactions.

use governdao_types::{Chain, TxHash};

/// Used when the chain is unknown or has no explorer of its own.
pub const FALLBACK_EXPLORER_URL: &str = "https://etherscan.io";

/// `<base>/tx/<hash>`, where `base` is the chain's explorer or `fallback`.
pub fn explorer_url(chain: Option<Chain>, hash: &TxHash, fallback: &str) -> String {
    let base = chain.and_then(|c| c.explorer_base()).unwrap_or(fallback);
    format!("{}/tx/{}", base.trim_end_matches('/'), hash)
}
