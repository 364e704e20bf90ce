//! LMDB storage backend for the GovernDAO client.
//!
//! Implements [`governdao_store::StateStore`] using the `heed` LMDB bindings.
//! All keys live in a single named database inside one environment, so a
//! process restart sees exactly what the previous run committed.

pub mod environment;
pub mod error;
pub mod state;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use state::LmdbStateStore;
