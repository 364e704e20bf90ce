//! Persistence for the GovernDAO client.
//!
//! Every storage backend (LMDB, in-memory, browser storage behind a bridge)
//! implements [`StateStore`]: a flat `load`/`save` contract over string keys.
//! The rest of the codebase talks to it through [`StoreAdapter`], which owns
//! the key layout and the JSON encoding of each logical namespace.

pub mod adapter;
pub mod error;
pub mod keys;
pub mod memory;
pub mod state;

pub use adapter::{StoreAdapter, VoteMap};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use state::StateStore;
