//! Typed access to the three persisted namespaces.
//!
//! Failures never propagate out of the adapter: a failed read looks like an
//! absent value and a failed write is dropped. Both are logged at `warn` so the
//! caller can keep working with in-memory state.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use governdao_types::{AccountId, Chain, Proposal, ProposalId, TransactionRecord, VoteChoice};

use crate::{keys, StateStore, StoreError};

/// One account's votes, keyed by proposal id.
pub type VoteMap = BTreeMap<ProposalId, VoteChoice>;

#[derive(Clone)]
pub struct StoreAdapter {
    store: Arc<dyn StateStore>,
}

impl StoreAdapter {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    pub fn load_proposals(&self) -> Option<Vec<Proposal>> {
        self.read(keys::PROPOSALS)
    }

    pub fn save_proposals(&self, proposals: &[Proposal]) {
        self.write(keys::PROPOSALS, &proposals);
    }

    pub fn load_votes(&self, account: &AccountId) -> Option<VoteMap> {
        self.read(&keys::votes(account))
    }

    pub fn save_votes(&self, account: &AccountId, votes: &VoteMap) {
        self.write(&keys::votes(account), votes);
    }

    pub fn load_transactions(&self) -> Option<Vec<TransactionRecord>> {
        self.read(keys::TRANSACTIONS)
    }

    pub fn save_transactions(&self, transactions: &[TransactionRecord]) {
        self.write(keys::TRANSACTIONS, &transactions);
    }

    pub fn load_chain(&self) -> Option<Chain> {
        self.read(keys::NETWORK)
    }

    pub fn save_chain(&self, chain: Chain) {
        self.write(keys::NETWORK, &chain);
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_read(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "failed to load persisted state");
                None
            }
        }
    }

    fn try_read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.store.load(key)? else {
            debug!(key, "nothing persisted");
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(StoreError::from)
            .and_then(|raw| self.store.save(key, &raw));
        if let Err(e) = result {
            warn!(key, error = %e, "failed to persist state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use governdao_types::{ProposalStatus, Timestamp, TxHash, VoteTally};

    fn adapter() -> (Arc<MemoryStore>, StoreAdapter) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), StoreAdapter::new(store))
    }

    fn proposal(id: u64) -> Proposal {
        Proposal {
            id: ProposalId::from_index(id),
            title: "Implement Community Treasury".into(),
            description: "Fund future development".into(),
            deadline: Timestamp::new(1_711_929_600),
            status: ProposalStatus::Active,
            votes: VoteTally::new(156, 23),
            creator: AccountId::new("0x1234"),
        }
    }

    #[test]
    fn proposals_round_trip() {
        let (_, adapter) = adapter();
        let list = vec![proposal(1), proposal(2)];
        adapter.save_proposals(&list);
        assert_eq!(adapter.load_proposals(), Some(list));
    }

    #[test]
    fn vote_maps_are_scoped_per_account() {
        let (_, adapter) = adapter();
        let a = AccountId::new("0xAAA");
        let b = AccountId::new("0xBBB");
        let mut votes = VoteMap::new();
        votes.insert(ProposalId::new("7"), VoteChoice::For);
        adapter.save_votes(&a, &votes);

        assert_eq!(adapter.load_votes(&a), Some(votes));
        assert_eq!(adapter.load_votes(&b), None);
    }

    #[test]
    fn vote_map_is_a_plain_json_object() {
        let (store, adapter) = adapter();
        let account = AccountId::new("0xAAA");
        let mut votes = VoteMap::new();
        votes.insert(ProposalId::new("3"), VoteChoice::Against);
        adapter.save_votes(&account, &votes);

        let raw = store.load("governdao_votes_0xAAA").unwrap().unwrap();
        assert_eq!(raw, r#"{"3":"against"}"#);
    }

    #[test]
    fn transactions_round_trip_in_order() {
        let (_, adapter) = adapter();
        let list = vec![
            TransactionRecord::vote(TxHash::new("0x02"), ProposalId::new("1"), Timestamp::new(20)),
            TransactionRecord::create(TxHash::new("0x01"), Timestamp::new(10)),
        ];
        adapter.save_transactions(&list);
        assert_eq!(adapter.load_transactions(), Some(list));
    }

    #[test]
    fn corrupt_value_reads_as_absent() {
        let (store, adapter) = adapter();
        store.save(keys::PROPOSALS, "{not json").unwrap();
        assert_eq!(adapter.load_proposals(), None);
    }

    #[test]
    fn chain_selection_round_trips() {
        let (_, adapter) = adapter();
        assert_eq!(adapter.load_chain(), None);
        adapter.save_chain(Chain::EthereumSepolia);
        assert_eq!(adapter.load_chain(), Some(Chain::EthereumSepolia));
    }
}
