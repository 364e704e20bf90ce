//! Governance proposals as the client sees them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{AccountId, Timestamp, VoteChoice};

/// Identity of a proposal.
///
/// Chain-assigned ids are decimal indices starting at 1. The literal `"0"` is
/// reserved as the "not yet known" sentinel recorded against a freshly
/// submitted create transaction.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(String);

impl ProposalId {
    const PENDING: &'static str = "0";

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The sentinel id for a proposal whose chain index is not known yet.
    pub fn pending() -> Self {
        Self(Self::PENDING.to_string())
    }

    pub fn from_index(index: u64) -> Self {
        Self(index.to_string())
    }

    pub fn is_pending(&self) -> bool {
        self.0 == Self::PENDING
    }

    /// The contract index this id refers to, if it is a chain-assigned id.
    pub fn chain_index(&self) -> Option<u64> {
        match self.0.parse::<u64>() {
            Ok(0) | Err(_) => None,
            Ok(index) => Some(index),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProposalId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Lifecycle stage reported by the contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Upcoming,
    Active,
    Completed,
}

impl ProposalStatus {
    /// Map the contract's `uint8` status. Unknown codes read as upcoming.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Active,
            2 => Self::Completed,
            _ => Self::Upcoming,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Upcoming => 0,
            Self::Active => 1,
            Self::Completed => 2,
        }
    }

    /// Position in the results listing: completed first, upcoming last.
    pub fn results_rank(&self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::Active => 1,
            Self::Upcoming => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// For/against counters of a proposal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteTally {
    #[serde(rename = "for")]
    pub for_votes: u64,
    #[serde(rename = "against")]
    pub against_votes: u64,
}

impl VoteTally {
    pub fn new(for_votes: u64, against_votes: u64) -> Self {
        Self {
            for_votes,
            against_votes,
        }
    }

    pub fn total(&self) -> u64 {
        self.for_votes.saturating_add(self.against_votes)
    }

    /// Share of `for` votes in percent, 0 when nobody voted.
    pub fn for_percentage(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.for_votes as f64 * 100.0 / total as f64,
        }
    }

    /// Count one more vote in the given direction.
    pub fn record(&mut self, choice: VoteChoice) {
        match choice {
            VoteChoice::For => self.for_votes = self.for_votes.saturating_add(1),
            VoteChoice::Against => self.against_votes = self.against_votes.saturating_add(1),
        }
    }
}

/// A governance proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub deadline: Timestamp,
    pub status: ProposalStatus,
    pub votes: VoteTally,
    pub creator: AccountId,
}

impl Proposal {
    /// Whether the deadline has passed relative to `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.deadline.is_before(now)
    }
}

/// Order proposals for a results listing: completed, then active, then upcoming.
/// Stable within each status.
pub fn sort_for_results(proposals: &mut [Proposal]) {
    proposals.sort_by_key(|p| p.status.results_rank());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(id: &str, status: ProposalStatus) -> Proposal {
        Proposal {
            id: ProposalId::new(id),
            title: format!("Proposal {id}"),
            description: String::new(),
            deadline: Timestamp::new(1_700_000_000),
            status,
            votes: VoteTally::default(),
            creator: AccountId::new("0xCREATOR"),
        }
    }

    #[test]
    fn pending_id_has_no_chain_index() {
        assert!(ProposalId::pending().is_pending());
        assert_eq!(ProposalId::pending().chain_index(), None);
        assert_eq!(ProposalId::new("7").chain_index(), Some(7));
        assert_eq!(ProposalId::new("local-1").chain_index(), None);
    }

    #[test]
    fn unknown_status_code_is_upcoming() {
        assert_eq!(ProposalStatus::from_code(1), ProposalStatus::Active);
        assert_eq!(ProposalStatus::from_code(2), ProposalStatus::Completed);
        assert_eq!(ProposalStatus::from_code(9), ProposalStatus::Upcoming);
    }

    #[test]
    fn for_percentage_handles_empty_tally() {
        assert_eq!(VoteTally::default().for_percentage(), 0.0);
        assert_eq!(VoteTally::new(3, 1).for_percentage(), 75.0);
    }

    #[test]
    fn record_touches_only_the_chosen_side() {
        let mut tally = VoteTally::new(5, 2);
        tally.record(VoteChoice::Against);
        assert_eq!(tally, VoteTally::new(5, 3));
    }

    #[test]
    fn tally_serializes_with_for_and_against_keys() {
        let json = serde_json::to_string(&VoteTally::new(1, 2)).unwrap();
        assert_eq!(json, r#"{"for":1,"against":2}"#);
    }

    #[test]
    fn results_order_is_completed_active_upcoming() {
        let mut list = vec![
            proposal("1", ProposalStatus::Upcoming),
            proposal("2", ProposalStatus::Active),
            proposal("3", ProposalStatus::Completed),
            proposal("4", ProposalStatus::Active),
        ];
        sort_for_results(&mut list);
        let ids: Vec<&str> = list.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["3", "2", "4", "1"]);
    }
}
