//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies of the reconciliation engine (clock, chain,
//! storage) are abstracted behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (failures, latency, chain contents)
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod gateway;
pub mod store;

pub use clock::NullClock;
pub use gateway::{NullGateway, SubmittedProposal, SubmittedVote};
pub use store::NullStore;
