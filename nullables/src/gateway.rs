//! Nullable chain: a scripted governance contract held in memory.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use governdao_gateway::{ChainGateway, ChainProposal, GatewayError, TransactionHandle};
use governdao_types::{AccountId, Timestamp, TxHash, VoteChoice};

/// A vote write the gateway accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedVote {
    pub sender: AccountId,
    pub index: u64,
    pub support: bool,
}

/// A create write the gateway accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedProposal {
    pub sender: AccountId,
    pub title: String,
    pub description: String,
    pub deadline: Timestamp,
}

#[derive(Default)]
struct ChainState {
    proposals: BTreeMap<u64, ChainProposal>,
    votes: HashMap<(AccountId, u64), bool>,
    count_script: VecDeque<(Duration, u64)>,
    read_delay: Duration,
    reads_unavailable: bool,
    failing_reads: HashSet<u64>,
    vote_lookups_unavailable: bool,
    write_failure: Option<GatewayError>,
    apply_writes: bool,
    submitted_votes: Vec<SubmittedVote>,
    submitted_proposals: Vec<SubmittedProposal>,
    count_calls: usize,
    next_tx: u64,
}

/// A test gateway backed by an in-memory contract.
///
/// Accepted writes are applied to the in-memory contract (unless
/// [`hold_writes`](Self::hold_writes) is set), so later reads observe them the
/// way a real chain eventually would.
pub struct NullGateway {
    state: Mutex<ChainState>,
}

impl NullGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState {
                apply_writes: true,
                ..ChainState::default()
            }),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ChainState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Put a proposal on the chain at its own `id`.
    pub fn insert_proposal(&self, proposal: ChainProposal) {
        self.with_state(|s| {
            s.proposals.insert(proposal.id, proposal);
        });
    }

    /// Convenience: an active proposal with the given tally.
    pub fn insert_active(&self, index: u64, for_votes: u64, against_votes: u64) {
        self.insert_proposal(ChainProposal {
            id: index,
            title: format!("Proposal {index}"),
            description: format!("Description of proposal {index}"),
            deadline: 2_000_000_000,
            status: 1,
            for_votes,
            against_votes,
            creator: "0xCREATOR".to_string(),
        });
    }

    /// Overwrite the on-chain tally of a proposal.
    pub fn set_tally(&self, index: u64, for_votes: u64, against_votes: u64) {
        self.with_state(|s| {
            if let Some(p) = s.proposals.get_mut(&index) {
                p.for_votes = for_votes;
                p.against_votes = against_votes;
            }
        });
    }

    /// Record a vote as already present on chain.
    pub fn record_chain_vote(&self, account: &AccountId, index: u64, support: bool) {
        self.with_state(|s| {
            s.votes.insert((account.clone(), index), support);
        });
    }

    /// Make every read and write fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.with_state(|s| {
            s.reads_unavailable = unavailable;
            s.write_failure =
                unavailable.then(|| GatewayError::Unavailable("null gateway offline".into()));
        });
    }

    /// Make reads of one proposal fail.
    pub fn fail_proposal_read(&self, index: u64) {
        self.with_state(|s| {
            s.failing_reads.insert(index);
        });
    }

    /// Make `has_voted` / `vote_of` fail.
    pub fn fail_vote_lookups(&self, fail: bool) {
        self.with_state(|s| s.vote_lookups_unavailable = fail);
    }

    /// Make every write fail with `error` (`None` restores success).
    pub fn fail_writes(&self, error: Option<GatewayError>) {
        self.with_state(|s| s.write_failure = error);
    }

    /// Accept writes without making them visible to reads.
    pub fn hold_writes(&self, hold: bool) {
        self.with_state(|s| s.apply_writes = !hold);
    }

    /// Delay applied to every proposal and vote-status read.
    pub fn set_read_delay(&self, delay: Duration) {
        self.with_state(|s| s.read_delay = delay);
    }

    /// Queue a reply for the next `proposal_count` call: answer `count` after `delay`.
    pub fn script_count(&self, delay: Duration, count: u64) {
        self.with_state(|s| s.count_script.push_back((delay, count)));
    }

    pub fn submitted_votes(&self) -> Vec<SubmittedVote> {
        self.with_state(|s| s.submitted_votes.clone())
    }

    pub fn submitted_proposals(&self) -> Vec<SubmittedProposal> {
        self.with_state(|s| s.submitted_proposals.clone())
    }

    pub fn count_calls(&self) -> usize {
        self.with_state(|s| s.count_calls)
    }

    fn next_hash(state: &mut ChainState) -> TxHash {
        state.next_tx += 1;
        TxHash::new(format!("0x{:064x}", state.next_tx))
    }

    async fn pause(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for NullGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn offline() -> GatewayError {
    GatewayError::Unavailable("null gateway offline".into())
}

#[async_trait]
impl ChainGateway for NullGateway {
    async fn proposal_count(&self) -> Result<u64, GatewayError> {
        let (delay, scripted) = self.with_state(|s| {
            s.count_calls += 1;
            match s.count_script.pop_front() {
                Some((delay, count)) => (delay, Some(count)),
                None => (s.read_delay, None),
            }
        });
        Self::pause(delay).await;
        self.with_state(|s| {
            if s.reads_unavailable {
                return Err(offline());
            }
            Ok(scripted.unwrap_or_else(|| s.proposals.keys().max().copied().unwrap_or(0)))
        })
    }

    async fn proposal(&self, index: u64) -> Result<Option<ChainProposal>, GatewayError> {
        let delay = self.with_state(|s| s.read_delay);
        Self::pause(delay).await;
        self.with_state(|s| {
            if s.reads_unavailable || s.failing_reads.contains(&index) {
                return Err(offline());
            }
            Ok(s.proposals.get(&index).cloned())
        })
    }

    async fn has_voted(&self, account: &AccountId, index: u64) -> Result<bool, GatewayError> {
        self.with_state(|s| {
            if s.reads_unavailable || s.vote_lookups_unavailable {
                return Err(offline());
            }
            Ok(s.votes.contains_key(&(account.clone(), index)))
        })
    }

    async fn vote_of(&self, account: &AccountId, index: u64) -> Result<VoteChoice, GatewayError> {
        self.with_state(|s| {
            if s.reads_unavailable || s.vote_lookups_unavailable {
                return Err(offline());
            }
            let support = s.votes.get(&(account.clone(), index)).copied().unwrap_or(false);
            Ok(VoteChoice::from_support(support))
        })
    }

    async fn submit_proposal(
        &self,
        sender: &AccountId,
        title: &str,
        description: &str,
        deadline: Timestamp,
    ) -> Result<TransactionHandle, GatewayError> {
        self.with_state(|s| {
            if let Some(err) = s.write_failure.clone() {
                return Err(err);
            }
            s.submitted_proposals.push(SubmittedProposal {
                sender: sender.clone(),
                title: title.to_string(),
                description: description.to_string(),
                deadline,
            });
            if s.apply_writes {
                let index = s.proposals.keys().max().copied().unwrap_or(0) + 1;
                s.proposals.insert(
                    index,
                    ChainProposal {
                        id: index,
                        title: title.to_string(),
                        description: description.to_string(),
                        deadline: deadline.as_secs(),
                        status: 1,
                        for_votes: 0,
                        against_votes: 0,
                        creator: sender.to_string(),
                    },
                );
            }
            Ok(TransactionHandle {
                hash: Self::next_hash(s),
            })
        })
    }

    async fn submit_vote(
        &self,
        sender: &AccountId,
        index: u64,
        support: bool,
    ) -> Result<TransactionHandle, GatewayError> {
        self.with_state(|s| {
            if let Some(err) = s.write_failure.clone() {
                return Err(err);
            }
            s.submitted_votes.push(SubmittedVote {
                sender: sender.clone(),
                index,
                support,
            });
            if s.apply_writes {
                s.votes.insert((sender.clone(), index), support);
                if let Some(p) = s.proposals.get_mut(&index) {
                    if support {
                        p.for_votes += 1;
                    } else {
                        p.against_votes += 1;
                    }
                }
            }
            Ok(TransactionHandle {
                hash: Self::next_hash(s),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn count_is_highest_index() {
        let gateway = NullGateway::new();
        gateway.insert_active(1, 0, 0);
        gateway.insert_active(3, 0, 0);
        assert_eq!(gateway.proposal_count().await.unwrap(), 3);
        assert_eq!(gateway.proposal(2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn accepted_vote_is_visible_to_reads() {
        let gateway = NullGateway::new();
        let account = AccountId::new("0xAAA");
        gateway.insert_active(1, 4, 1);
        gateway.submit_vote(&account, 1, false).await.unwrap();

        assert!(gateway.has_voted(&account, 1).await.unwrap());
        assert_eq!(gateway.vote_of(&account, 1).await.unwrap(), VoteChoice::Against);
        assert_eq!(gateway.proposal(1).await.unwrap().unwrap().against_votes, 2);
    }

    #[tokio::test]
    async fn held_writes_are_recorded_but_invisible() {
        let gateway = NullGateway::new();
        let account = AccountId::new("0xAAA");
        gateway.insert_active(1, 0, 0);
        gateway.hold_writes(true);
        gateway.submit_vote(&account, 1, true).await.unwrap();

        assert_eq!(gateway.submitted_votes().len(), 1);
        assert!(!gateway.has_voted(&account, 1).await.unwrap());
    }

    #[tokio::test]
    async fn offline_gateway_fails_everything() {
        let gateway = NullGateway::new();
        gateway.set_unavailable(true);
        assert!(gateway.proposal_count().await.is_err());
        let err = gateway
            .submit_proposal(&AccountId::new("0xAAA"), "t", "d", Timestamp::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_count_waits_before_answering() {
        let gateway = NullGateway::new();
        gateway.script_count(Duration::from_millis(50), 9);
        let started = tokio::time::Instant::now();
        assert_eq!(gateway.proposal_count().await.unwrap(), 9);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
