//! Access to the on-chain governance contract.
//!
//! [`ChainGateway`] is the read/write contract the reconciliation engine
//! consumes. [`RpcGateway`] implements it against a JSON-RPC relay node;
//! tests use the scripted gateway from `governdao-nullables`.

pub mod error;
pub mod gateway;
pub mod rpc;

pub use error::GatewayError;
pub use gateway::{ChainGateway, ChainProposal, TransactionHandle};
pub use rpc::RpcGateway;
