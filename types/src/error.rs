//! Errors raised while parsing client types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("unknown chain: {0}")]
    UnknownChain(String),
}
