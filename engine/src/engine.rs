//! The reconciliation engine.
//!
//! Chain reads replace the cached proposal list wholesale. Votes are
//! two-phase: an optimistic local commit that happens before anything is
//! awaited, then a best-effort chain submission whose effect is reconciled
//! by a delayed re-read of the proposal. Engine state sits behind a mutex
//! that is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use governdao_gateway::{ChainGateway, GatewayError};
use governdao_store::{StateStore, StoreAdapter, VoteMap};
use governdao_types::{
    AccountId, Chain, Clock, Proposal, ProposalId, SystemClock, Timestamp, TransactionRecord,
    TxHash, VoteChoice,
};

use crate::{
    explorer_url, EngineConfig, EngineError, ReconcileScheduler, Session, SubscriptionId,
    TaskKey, ViewBus, ViewState,
};

/// How a vote call resolved.
///
/// Except for `AlreadyVoted`, the vote has been committed locally whatever
/// the chain said.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The chain accepted the write; a re-read of the proposal is scheduled.
    Submitted(TransactionRecord),
    /// The chain could not be reached or refused the write.
    LocalOnly { reason: String },
    /// The account had already voted on the proposal. Nothing changed.
    AlreadyVoted(VoteChoice),
}

impl VoteOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, VoteOutcome::Submitted(_))
    }
}

/// Mutable engine state. `votes` always belongs to `scope`.
struct EngineState {
    proposals: Vec<Proposal>,
    scope: Option<AccountId>,
    votes: VoteMap,
    transactions: Vec<TransactionRecord>,
    loads_in_flight: usize,
}

impl EngineState {
    fn snapshot(&self) -> ViewState {
        ViewState {
            proposals: self.proposals.clone(),
            account: self.scope.clone(),
            vote_records: self.votes.clone(),
            transactions: self.transactions.clone(),
            is_loading: self.loads_in_flight > 0,
        }
    }

    fn is_scoped_to(&self, account: &AccountId) -> bool {
        self.scope.as_ref() == Some(account)
    }
}

/// A proposal read from the chain together with the active account's vote on it.
struct Fetched {
    proposal: Proposal,
    vote: Option<VoteChoice>,
}

/// Marks one load as in flight for as long as it lives.
///
/// Dropping it, on completion or when the load future is dropped mid-fetch,
/// lowers the counter and emits a snapshot.
struct LoadGuard<'a> {
    engine: &'a ReconciliationEngine,
}

impl<'a> LoadGuard<'a> {
    fn begin(engine: &'a ReconciliationEngine, account: &AccountId) -> Self {
        let snapshot = {
            let mut state = engine.lock();
            engine.rescope(&mut state, Some(account));
            state.loads_in_flight += 1;
            state.snapshot()
        };
        engine.inner.bus.emit(&snapshot);
        Self { engine }
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        let snapshot = {
            let mut state = self.engine.lock();
            state.loads_in_flight = state.loads_in_flight.saturating_sub(1);
            state.snapshot()
        };
        self.engine.inner.bus.emit(&snapshot);
    }
}

struct Inner {
    gateway: Arc<dyn ChainGateway>,
    store: StoreAdapter,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    seed: Vec<Proposal>,
    state: Mutex<EngineState>,
    bus: ViewBus,
    scheduler: ReconcileScheduler,
}

/// Builder for [`ReconciliationEngine`].
pub struct EngineBuilder {
    gateway: Arc<dyn ChainGateway>,
    store: Arc<dyn StateStore>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    seed: Vec<Proposal>,
}

impl EngineBuilder {
    pub fn new(gateway: Arc<dyn ChainGateway>, store: Arc<dyn StateStore>) -> Self {
        Self {
            gateway,
            store,
            config: EngineConfig::default(),
            clock: Arc::new(SystemClock),
            seed: Vec::new(),
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Proposals shown while no account is connected or the chain has none.
    pub fn seed_proposals(mut self, seed: Vec<Proposal>) -> Self {
        self.seed = seed;
        self
    }

    /// Build the engine, restoring the cached proposal and transaction lists.
    pub fn build(self) -> ReconciliationEngine {
        let store = StoreAdapter::new(self.store);
        let proposals = store.load_proposals().unwrap_or_default();
        let transactions = store.load_transactions().unwrap_or_default();
        info!(
            proposals = proposals.len(),
            transactions = transactions.len(),
            "restored cached state"
        );

        ReconciliationEngine {
            inner: Arc::new(Inner {
                gateway: self.gateway,
                store,
                clock: self.clock,
                config: self.config,
                seed: self.seed,
                state: Mutex::new(EngineState {
                    proposals,
                    scope: None,
                    votes: VoteMap::new(),
                    transactions,
                    loads_in_flight: 0,
                }),
                bus: ViewBus::new(),
                scheduler: ReconcileScheduler::new(),
            }),
        }
    }
}

/// Merges chain reads with optimistic local votes and persists both.
///
/// Cheap to clone; clones share state. Operations that schedule delayed
/// reconciliation must run inside a tokio runtime.
#[derive(Clone)]
pub struct ReconciliationEngine {
    inner: Arc<Inner>,
}

impl ReconciliationEngine {
    pub fn builder(gateway: Arc<dyn ChainGateway>, store: Arc<dyn StateStore>) -> EngineBuilder {
        EngineBuilder::new(gateway, store)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Current snapshot of everything the presentation layer renders.
    pub fn view(&self) -> ViewState {
        self.lock().snapshot()
    }

    /// Register a listener called with a fresh snapshot after every mutation.
    pub fn subscribe(
        &self,
        listener: impl Fn(&ViewState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.bus.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.bus.unsubscribe(id)
    }

    /// Account whose vote map is currently loaded.
    pub fn current_account(&self) -> Option<AccountId> {
        self.lock().scope.clone()
    }

    /// Scope the visible vote map to the session's account.
    ///
    /// Called implicitly by every session-taking operation; call it directly
    /// when the wallet connects, disconnects or switches account.
    pub fn activate(&self, session: &Session) {
        let snapshot = {
            let mut state = self.lock();
            let changed = self.rescope(&mut state, session.account.as_ref());
            changed.then(|| state.snapshot())
        };
        if let Some(snapshot) = snapshot {
            self.inner.bus.emit(&snapshot);
        }
    }

    pub fn has_voted(&self, session: &Session, proposal_id: &ProposalId) -> bool {
        self.vote_of(session, proposal_id).is_some()
    }

    pub fn vote_of(&self, session: &Session, proposal_id: &ProposalId) -> Option<VoteChoice> {
        self.activate(session);
        self.lock().votes.get(proposal_id).copied()
    }

    /// Replace the cached proposals with a fresh read of the whole chain.
    ///
    /// Individual unreadable proposals are skipped. If the count cannot be
    /// read, or no proposal could be read at all, the cached list is kept.
    /// Overlapping loads are not serialised: the last one to finish wins.
    pub async fn load_all(&self, session: &Session) -> Result<(), EngineError> {
        let account = session.require_account()?.clone();

        let superseded = self.inner.scheduler.cancel_proposal_reads();
        if superseded > 0 {
            debug!(superseded, "full load supersedes pending proposal re-reads");
        }

        let loading = LoadGuard::begin(self, &account);
        let fetched = self.fetch_all(&account).await;

        {
            let mut state = self.lock();
            match fetched {
                Ok(fetched) => {
                    info!(count = fetched.len(), account = %account, "proposals loaded from chain");
                    let mut chain_votes = Vec::new();
                    let mut proposals = Vec::with_capacity(fetched.len());
                    for item in fetched {
                        if let Some(vote) = item.vote {
                            chain_votes.push((item.proposal.id.clone(), vote));
                        }
                        proposals.push(item.proposal);
                    }
                    state.proposals = proposals;
                    self.inner.store.save_proposals(&state.proposals);
                    self.merge_chain_votes(&mut state, &account, chain_votes);
                }
                Err(e) => {
                    warn!(error = %e, "chain unavailable, keeping cached proposals");
                }
            }
        }
        drop(loading);
        Ok(())
    }

    /// Vote on a proposal for the session's account.
    ///
    /// The vote and the matching counter are committed and persisted before
    /// the chain is contacted. Chain failures are reported through
    /// [`VoteOutcome::LocalOnly`], never as errors.
    pub async fn cast_vote(
        &self,
        session: &Session,
        proposal_id: &ProposalId,
        support: bool,
    ) -> Result<VoteOutcome, EngineError> {
        let account = session.require_account()?.clone();
        let choice = VoteChoice::from_support(support);

        let (snapshot, existing) = {
            let mut state = self.lock();
            self.rescope(&mut state, Some(&account));
            let existing = state.votes.get(proposal_id).copied();
            if existing.is_none() {
                self.commit_local_vote(&mut state, &account, proposal_id, choice);
            }
            (state.snapshot(), existing)
        };
        self.inner.bus.emit(&snapshot);

        if let Some(existing) = existing {
            debug!(proposal_id = %proposal_id, account = %account, choice = %existing, "already voted");
            return Ok(VoteOutcome::AlreadyVoted(existing));
        }

        let Some(index) = proposal_id.chain_index() else {
            warn!(proposal_id = %proposal_id, "proposal is not on chain, vote kept locally");
            return Ok(VoteOutcome::LocalOnly {
                reason: format!("proposal {proposal_id} has no chain index"),
            });
        };

        match self.inner.gateway.submit_vote(&account, index, support).await {
            Ok(handle) => {
                let record =
                    TransactionRecord::vote(handle.hash, proposal_id.clone(), self.inner.clock.now());
                info!(
                    proposal_id = %proposal_id,
                    account = %account,
                    tx_hash = %record.hash,
                    "vote submitted"
                );
                self.append_transaction(record.clone());
                self.schedule_reread(account, proposal_id.clone(), index);
                Ok(VoteOutcome::Submitted(record))
            }
            Err(e) => {
                warn!(
                    proposal_id = %proposal_id,
                    account = %account,
                    error = %e,
                    "vote submission failed, keeping local vote"
                );
                Ok(VoteOutcome::LocalOnly {
                    reason: e.to_string(),
                })
            }
        }
    }

    pub async fn vote_for(
        &self,
        session: &Session,
        proposal_id: &ProposalId,
    ) -> Result<VoteOutcome, EngineError> {
        self.cast_vote(session, proposal_id, true).await
    }

    pub async fn vote_against(
        &self,
        session: &Session,
        proposal_id: &ProposalId,
    ) -> Result<VoteOutcome, EngineError> {
        self.cast_vote(session, proposal_id, false).await
    }

    /// Submit a new proposal. Nothing is added to the cached list until the
    /// reload scheduled after a successful submission picks it up.
    pub async fn create_proposal(
        &self,
        session: &Session,
        title: &str,
        description: &str,
        deadline: Timestamp,
    ) -> Result<TransactionRecord, EngineError> {
        let account = session.require_account()?.clone();
        self.validate_proposal(title, description, deadline)?;
        self.activate(session);

        let handle = self
            .inner
            .gateway
            .submit_proposal(&account, title.trim(), description.trim(), deadline)
            .await
            .map_err(|e| {
                warn!(account = %account, error = %e, "proposal submission failed");
                EngineError::from(e)
            })?;

        let record = TransactionRecord::create(handle.hash, self.inner.clock.now());
        info!(account = %account, tx_hash = %record.hash, "proposal submitted");
        self.append_transaction(record.clone());
        self.schedule_reload(session.clone());
        Ok(record)
    }

    /// Explorer link for a transaction on the session's chain.
    pub fn explorer_url_for(&self, session: &Session, hash: &TxHash) -> String {
        explorer_url(session.chain, hash, &self.inner.config.fallback_explorer_url)
    }

    /// The chain list when connected and non-empty, otherwise the seed list.
    pub fn displayed_proposals(&self, session: &Session) -> Vec<Proposal> {
        let state = self.lock();
        if (session.is_connected() && !state.proposals.is_empty()) || self.inner.seed.is_empty() {
            state.proposals.clone()
        } else {
            self.inner.seed.clone()
        }
    }

    /// The persisted chain selection, or the configured default.
    pub fn selected_chain(&self) -> Chain {
        self.inner
            .store
            .load_chain()
            .unwrap_or(self.inner.config.default_chain)
    }

    pub fn select_chain(&self, chain: Chain) {
        self.inner.store.save_chain(chain);
        info!(chain = %chain, "chain selected");
    }

    /// Number of reconciliation tasks still waiting to run.
    pub fn pending_reconciliations(&self) -> usize {
        self.inner.scheduler.pending()
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Load `account`'s vote map if it is not the one already loaded.
    fn rescope(&self, state: &mut EngineState, account: Option<&AccountId>) -> bool {
        if state.scope.as_ref() == account {
            return false;
        }
        state.votes = match account {
            Some(account) => self.inner.store.load_votes(account).unwrap_or_default(),
            None => VoteMap::new(),
        };
        state.scope = account.cloned();
        debug!(
            account = account.map(AccountId::as_str),
            votes = state.votes.len(),
            "vote map scoped"
        );
        true
    }

    fn commit_local_vote(
        &self,
        state: &mut EngineState,
        account: &AccountId,
        proposal_id: &ProposalId,
        choice: VoteChoice,
    ) {
        state.votes.insert(proposal_id.clone(), choice);
        match state.proposals.iter_mut().find(|p| &p.id == proposal_id) {
            Some(proposal) => proposal.votes.record(choice),
            None => debug!(proposal_id = %proposal_id, "voted on a proposal that is not cached"),
        }
        self.inner.store.save_votes(account, &state.votes);
        self.inner.store.save_proposals(&state.proposals);
        info!(proposal_id = %proposal_id, account = %account, choice = %choice, "vote committed locally");
    }

    /// Fold votes read from the chain into the vote map. Chain truth wins.
    fn merge_chain_votes(
        &self,
        state: &mut EngineState,
        account: &AccountId,
        chain_votes: Vec<(ProposalId, VoteChoice)>,
    ) {
        if !state.is_scoped_to(account) {
            debug!(account = %account, "account changed during load, discarding chain votes");
            return;
        }
        let mut changed = false;
        for (proposal_id, choice) in chain_votes {
            match state.votes.insert(proposal_id.clone(), choice) {
                Some(local) if local == choice => {}
                Some(local) => {
                    warn!(
                        proposal_id = %proposal_id,
                        account = %account,
                        local = %local,
                        chain = %choice,
                        "local vote disagrees with chain, taking chain"
                    );
                    changed = true;
                }
                None => changed = true,
            }
        }
        if changed {
            self.inner.store.save_votes(account, &state.votes);
        }
    }

    fn append_transaction(&self, record: TransactionRecord) {
        let snapshot = {
            let mut state = self.lock();
            if state.transactions.iter().any(|tx| tx.hash == record.hash) {
                debug!(tx_hash = %record.hash, "transaction already recorded");
            } else {
                state.transactions.insert(0, record);
                self.inner.store.save_transactions(&state.transactions);
            }
            state.snapshot()
        };
        self.inner.bus.emit(&snapshot);
    }

    fn validate_proposal(
        &self,
        title: &str,
        description: &str,
        deadline: Timestamp,
    ) -> Result<(), EngineError> {
        if title.trim().is_empty() {
            return Err(EngineError::InvalidProposal("title is empty".into()));
        }
        if description.trim().is_empty() {
            return Err(EngineError::InvalidProposal("description is empty".into()));
        }
        let now = self.inner.clock.now();
        if deadline <= now {
            return Err(EngineError::InvalidProposal(format!(
                "deadline {deadline} is not after {now}"
            )));
        }
        Ok(())
    }

    async fn fetch_all(&self, account: &AccountId) -> Result<Vec<Fetched>, GatewayError> {
        let count = self.inner.gateway.proposal_count().await?;
        let results = join_all((1..=count).map(|index| self.fetch_one(account, index))).await;

        let mut fetched = Vec::new();
        let mut last_error = None;
        for (index, result) in (1..=count).zip(results) {
            match result {
                Ok(Some(item)) => fetched.push(item),
                Ok(None) => debug!(index, "proposal absent on chain"),
                Err(e) => {
                    warn!(index, error = %e, "skipping unreadable proposal");
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) if fetched.is_empty() => Err(e),
            _ => Ok(fetched),
        }
    }

    async fn fetch_one(
        &self,
        account: &AccountId,
        index: u64,
    ) -> Result<Option<Fetched>, GatewayError> {
        let Some(raw) = self.inner.gateway.proposal(index).await? else {
            return Ok(None);
        };
        let proposal = raw.into_proposal(index);
        let vote = match self.chain_vote(account, index).await {
            Ok(vote) => vote,
            Err(e) => {
                warn!(proposal_id = %proposal.id, error = %e, "vote status unreadable");
                None
            }
        };
        Ok(Some(Fetched { proposal, vote }))
    }

    async fn chain_vote(
        &self,
        account: &AccountId,
        index: u64,
    ) -> Result<Option<VoteChoice>, GatewayError> {
        if !self.inner.gateway.has_voted(account, index).await? {
            return Ok(None);
        }
        self.inner.gateway.vote_of(account, index).await.map(Some)
    }

    fn schedule_reread(&self, account: AccountId, proposal_id: ProposalId, index: u64) {
        let engine = self.clone();
        let delay = self.inner.config.propagation_delay();
        self.inner.scheduler.schedule(
            TaskKey::Proposal(proposal_id.clone()),
            async move {
                tokio::time::sleep(delay).await;
                engine.reconcile_proposal(&account, &proposal_id, index).await;
            },
        );
    }

    /// Replace one cached proposal with its chain state.
    async fn reconcile_proposal(&self, account: &AccountId, proposal_id: &ProposalId, index: u64) {
        let fetched = match self.fetch_one(account, index).await {
            Ok(Some(fetched)) => fetched,
            Ok(None) => {
                debug!(proposal_id = %proposal_id, "proposal not on chain yet, nothing to reconcile");
                return;
            }
            Err(e) => {
                warn!(proposal_id = %proposal_id, error = %e, "re-read failed, keeping local counts");
                return;
            }
        };

        let snapshot = {
            let mut state = self.lock();
            if !state.is_scoped_to(account) {
                debug!(proposal_id = %proposal_id, "account changed since the vote, discarding re-read");
                return;
            }
            let Some(slot) = state.proposals.iter_mut().find(|p| &p.id == proposal_id) else {
                debug!(proposal_id = %proposal_id, "proposal left the cache, discarding re-read");
                return;
            };
            *slot = fetched.proposal;
            self.inner.store.save_proposals(&state.proposals);
            if let Some(vote) = fetched.vote {
                self.merge_chain_votes(&mut state, account, vec![(proposal_id.clone(), vote)]);
            }
            debug!(proposal_id = %proposal_id, "proposal reconciled with chain");
            state.snapshot()
        };
        self.inner.bus.emit(&snapshot);
    }

    fn schedule_reload(&self, session: Session) {
        let engine = self.clone();
        let delay = self.inner.config.reload_after_create();
        self.inner.scheduler.schedule(TaskKey::Reload, async move {
            tokio::time::sleep(delay).await;
            if engine.current_account() != session.account {
                debug!("account changed since proposal creation, skipping reload");
                return;
            }
            if let Err(e) = engine.load_all(&session).await {
                warn!(error = %e, "reload after proposal creation failed");
            }
        });
    }
}
