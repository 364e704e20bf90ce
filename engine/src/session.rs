//! The caller's view of who is connected and to which chain.

use governdao_types::{AccountId, Chain};

use crate::EngineError;

/// Wallet connection state, owned by the presentation layer and passed by
/// reference into every engine operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub account: Option<AccountId>,
    pub chain: Option<Chain>,
}

impl Session {
    pub fn connected(account: impl Into<AccountId>, chain: Chain) -> Self {
        Self {
            account: Some(account.into()),
            chain: Some(chain),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    /// The active account, or `NotConnected`.
    pub fn require_account(&self) -> Result<&AccountId, EngineError> {
        self.account.as_ref().ok_or(EngineError::NotConnected)
    }
}
