//! The governance contract as seen from the client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use governdao_types::{
    AccountId, Proposal, ProposalId, ProposalStatus, Timestamp, TxHash, VoteChoice, VoteTally,
};

use crate::GatewayError;

/// A proposal exactly as the contract's `getProposal` returns it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainProposal {
    pub id: u64,
    pub title: String,
    pub description: String,
    /// Unix seconds.
    pub deadline: u64,
    /// 0 = upcoming, 1 = active, 2 = completed.
    pub status: u8,
    pub for_votes: u64,
    pub against_votes: u64,
    pub creator: String,
}

impl ChainProposal {
    /// Convert into the client model. `index` is the id that was requested,
    /// which is authoritative over whatever id the contract echoes back.
    pub fn into_proposal(self, index: u64) -> Proposal {
        let title = if self.title.is_empty() {
            "Untitled".to_string()
        } else {
            self.title
        };
        Proposal {
            id: ProposalId::from_index(index),
            title,
            description: self.description,
            deadline: Timestamp::new(self.deadline),
            status: ProposalStatus::from_code(self.status),
            votes: VoteTally::new(self.for_votes, self.against_votes),
            creator: AccountId::new(self.creator),
        }
    }
}

/// Receipt for a submitted write. The write may not be visible to reads yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHandle {
    pub hash: TxHash,
}

/// Read/write access to the governance contract.
///
/// Writes are eventually consistent: a returned [`TransactionHandle`] does not
/// mean a subsequent read reflects the write.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Number of proposals ever created; valid ids are `1..=count`.
    async fn proposal_count(&self) -> Result<u64, GatewayError>;

    /// Read one proposal. `Ok(None)` when the contract has no such id.
    async fn proposal(&self, index: u64) -> Result<Option<ChainProposal>, GatewayError>;

    /// Whether `account` has voted on `index`.
    async fn has_voted(&self, account: &AccountId, index: u64) -> Result<bool, GatewayError>;

    /// Direction of `account`'s vote. Only meaningful when [`has_voted`] is true.
    ///
    /// [`has_voted`]: ChainGateway::has_voted
    async fn vote_of(&self, account: &AccountId, index: u64) -> Result<VoteChoice, GatewayError>;

    /// Submit `createProposal` signed by `sender`.
    async fn submit_proposal(
        &self,
        sender: &AccountId,
        title: &str,
        description: &str,
        deadline: Timestamp,
    ) -> Result<TransactionHandle, GatewayError>;

    /// Submit `castVote` signed by `sender`.
    async fn submit_vote(
        &self,
        sender: &AccountId,
        index: u64,
        support: bool,
    ) -> Result<TransactionHandle, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, status: u8) -> ChainProposal {
        ChainProposal {
            id: 3,
            title: title.into(),
            description: "desc".into(),
            deadline: 1_712_000_000,
            status,
            for_votes: 78,
            against_votes: 42,
            creator: "0xabcd".into(),
        }
    }

    #[test]
    fn into_proposal_maps_every_field() {
        let p = raw("Governance Parameter Updates", 1).into_proposal(3);
        assert_eq!(p.id, ProposalId::new("3"));
        assert_eq!(p.title, "Governance Parameter Updates");
        assert_eq!(p.deadline, Timestamp::new(1_712_000_000));
        assert_eq!(p.status, ProposalStatus::Active);
        assert_eq!(p.votes, VoteTally::new(78, 42));
        assert_eq!(p.creator, AccountId::new("0xabcd"));
    }

    #[test]
    fn empty_title_becomes_untitled() {
        assert_eq!(raw("", 0).into_proposal(3).title, "Untitled");
    }
}
