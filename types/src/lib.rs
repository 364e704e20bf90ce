//! Fundamental types for the GovernDAO client.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! account identifiers, transaction hashes, timestamps, chains, proposals, vote records
//! and transaction history entries.

pub mod account;
pub mod chain;
pub mod error;
pub mod hash;
pub mod proposal;
pub mod time;
pub mod transaction;
pub mod vote;

pub use account::AccountId;
pub use chain::Chain;
pub use error::TypesError;
pub use hash::TxHash;
pub use proposal::{sort_for_results, Proposal, ProposalId, ProposalStatus, VoteTally};
pub use time::{Clock, SystemClock, Timestamp};
pub use transaction::{TransactionKind, TransactionRecord};
pub use vote::VoteChoice;
