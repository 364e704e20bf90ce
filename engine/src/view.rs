//! Snapshots handed to the presentation layer, and the bus that delivers them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use governdao_store::VoteMap;
use governdao_types::{
    sort_for_results, AccountId, Proposal, ProposalId, TransactionKind, TransactionRecord,
    VoteChoice,
};

/// Everything the presentation layer renders, as of one engine mutation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewState {
    pub proposals: Vec<Proposal>,
    /// Account whose votes `vote_records` holds.
    pub account: Option<AccountId>,
    pub vote_records: VoteMap,
    /// Newest first.
    pub transactions: Vec<TransactionRecord>,
    pub is_loading: bool,
}

/// One row of the connected account's voting history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub proposal_id: ProposalId,
    pub title: String,
    pub choice: VoteChoice,
}

impl ViewState {
    pub fn proposal(&self, id: &ProposalId) -> Option<&Proposal> {
        self.proposals.iter().find(|p| &p.id == id)
    }

    pub fn has_voted(&self, id: &ProposalId) -> bool {
        self.vote_records.contains_key(id)
    }

    pub fn vote_of(&self, id: &ProposalId) -> Option<VoteChoice> {
        self.vote_records.get(id).copied()
    }

    /// Transactions touching `id`, newest first.
    pub fn transactions_for(&self, id: &ProposalId) -> impl Iterator<Item = &TransactionRecord> + '_ {
        let id = id.clone();
        self.transactions
            .iter()
            .filter(move |tx| tx.proposal_id == id)
    }

    /// The most recent vote transaction for `id`.
    pub fn latest_vote_transaction(&self, id: &ProposalId) -> Option<&TransactionRecord> {
        self.transactions_for(id)
            .find(|tx| tx.kind == TransactionKind::Vote)
    }

    /// The account's votes joined with cached proposal titles. Votes on
    /// proposals that are not cached are left out.
    pub fn voting_history(&self) -> Vec<HistoryEntry> {
        self.vote_records
            .iter()
            .filter_map(|(id, choice)| {
                self.proposal(id).map(|p| HistoryEntry {
                    proposal_id: id.clone(),
                    title: p.title.clone(),
                    choice: *choice,
                })
            })
            .collect()
    }

    /// Proposals ordered for a results listing.
    pub fn results(&self) -> Vec<Proposal> {
        let mut list = self.proposals.clone();
        sort_for_results(&mut list);
        list
    }
}

/// Handle returned by [`ViewBus::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&ViewState) + Send + Sync>;

/// Synchronous fan-out of view snapshots.
///
/// Listeners run inline on the task that mutated the engine; keep them fast
/// and hand heavy work (re-rendering) to the listener's own scheduler.
#[derive(Default)]
pub struct ViewBus {
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
}

impl ViewBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&ViewState) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, Arc::new(listener)));
        }
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Ok(mut listeners) = self.listeners.lock() else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    pub fn emit(&self, state: &ViewState) {
        // Listeners are called outside the lock so they may (un)subscribe.
        let listeners: Vec<Listener> = match self.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use governdao_types::{ProposalStatus, Timestamp, TxHash, VoteTally};
    use std::sync::atomic::AtomicUsize;

    fn proposal(id: &str, title: &str, status: ProposalStatus) -> Proposal {
        Proposal {
            id: ProposalId::new(id),
            title: title.into(),
            description: String::new(),
            deadline: Timestamp::new(0),
            status,
            votes: VoteTally::default(),
            creator: AccountId::new("0xC"),
        }
    }

    #[test]
    fn emit_calls_all_listeners() {
        let counter = Arc::new(AtomicUsize::new(0));
        let bus = ViewBus::new();

        let c1 = Arc::clone(&counter);
        bus.subscribe(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = Arc::clone(&counter);
        bus.subscribe(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        });

        bus.emit(&ViewState::default());
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let counter = Arc::new(AtomicUsize::new(0));
        let bus = ViewBus::new();
        let c = Arc::clone(&counter);
        let id = bus.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&ViewState::default());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn history_skips_votes_on_uncached_proposals() {
        let mut view = ViewState {
            proposals: vec![proposal("1", "Treasury", ProposalStatus::Active)],
            ..ViewState::default()
        };
        view.vote_records.insert(ProposalId::new("1"), VoteChoice::For);
        view.vote_records.insert(ProposalId::new("9"), VoteChoice::Against);

        let history = view.voting_history();
        assert_eq!(
            history,
            vec![HistoryEntry {
                proposal_id: ProposalId::new("1"),
                title: "Treasury".into(),
                choice: VoteChoice::For,
            }]
        );
    }

    #[test]
    fn latest_vote_transaction_ignores_creates() {
        let id = ProposalId::new("2");
        let view = ViewState {
            transactions: vec![
                TransactionRecord::vote(TxHash::new("0xnew"), id.clone(), Timestamp::new(3)),
                TransactionRecord::create(TxHash::new("0xcreate"), Timestamp::new(2)),
                TransactionRecord::vote(TxHash::new("0xold"), id.clone(), Timestamp::new(1)),
            ],
            ..ViewState::default()
        };

        assert_eq!(view.transactions_for(&id).count(), 2);
        assert_eq!(
            view.latest_vote_transaction(&id).map(|tx| tx.hash.as_str()),
            Some("0xnew")
        );
        assert!(view.latest_vote_transaction(&ProposalId::new("5")).is_none());
    }
}
