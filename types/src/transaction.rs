//! Local history of chain writes submitted from this client.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ProposalId, Timestamp, TxHash};

/// What a submitted transaction did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Create,
    Vote,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Create => "create",
            TransactionKind::Vote => "vote",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the append-only transaction history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: TxHash,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Target proposal; the pending sentinel for a create whose id is not known yet.
    #[serde(rename = "proposalId")]
    pub proposal_id: ProposalId,
    pub timestamp: Timestamp,
}

impl TransactionRecord {
    pub fn vote(hash: TxHash, proposal_id: ProposalId, timestamp: Timestamp) -> Self {
        Self {
            hash,
            kind: TransactionKind::Vote,
            proposal_id,
            timestamp,
        }
    }

    pub fn create(hash: TxHash, timestamp: Timestamp) -> Self {
        Self {
            hash,
            kind: TransactionKind::Create,
            proposal_id: ProposalId::pending(),
            timestamp,
        }
    }
}
