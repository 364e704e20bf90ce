//! Storage key layout.
//!
//! Proposals and transactions are process-wide; votes are scoped per account
//! so that two wallets used on the same machine never see each other's map.

use governdao_types::AccountId;

/// Cached proposal list (account-independent).
pub const PROPOSALS: &str = "governdao_proposals";

/// Transaction history, newest first (account-independent).
pub const TRANSACTIONS: &str = "governdao_transactions";

/// Selected chain.
pub const NETWORK: &str = "network";

const VOTES_PREFIX: &str = "governdao_votes_";

/// Vote map key for one account.
pub fn votes(account: &AccountId) -> String {
    format!("{VOTES_PREFIX}{account}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_keys_embed_the_account() {
        assert_eq!(votes(&AccountId::new("0xAAA")), "governdao_votes_0xAAA");
        assert_ne!(votes(&AccountId::new("0xAAA")), votes(&AccountId::new("0xBBB")));
    }
}
