//! Reconciliation core of the GovernDAO client.
//!
//! The engine sits between a slow, eventually-consistent chain and a
//! presentation layer that wants instant feedback:
//! - proposals are loaded from the chain and cached in the persistent store,
//! - votes are committed locally before the chain sees them and reconciled
//!   against authoritative counts once the write has propagated,
//! - every accepted chain write is appended to a transaction history.
//!
//! The presentation layer reads [`ViewState`] snapshots, either by polling
//! [`ReconciliationEngine::view`] or by subscribing to changes.

pub mod config;
pub mod engine;
pub mod error;
pub mod explorer;
pub mod scheduler;
pub mod session;
pub mod view;

pub use config::EngineConfig;
pub use engine::{EngineBuilder, ReconciliationEngine, VoteOutcome};
pub use error::EngineError;
pub use explorer::{explorer_url, FALLBACK_EXPLORER_URL};
pub use scheduler::{ReconcileScheduler, TaskKey};
pub use session::Session;
pub use view::{HistoryEntry, SubscriptionId, ViewBus, ViewState};
