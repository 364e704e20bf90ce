//! A single account's choice on a proposal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a vote. Once recorded for an account and proposal it never changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    For,
    Against,
}

impl VoteChoice {
    /// Map the contract's `support` flag (`true` = for).
    pub fn from_support(support: bool) -> Self {
        if support {
            Self::For
        } else {
            Self::Against
        }
    }

    pub fn is_support(&self) -> bool {
        matches!(self, Self::For)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::For => "for",
            Self::Against => "against",
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
