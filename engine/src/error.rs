use thiserror::Error;

use governdao_gateway::GatewayError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("no wallet connected")]
    NotConnected,

    #[error("chain unavailable: {0}")]
    ChainUnavailable(String),

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("invalid proposal: {0}")]
    InvalidProposal(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<GatewayError> for EngineError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Rejected(reason) => EngineError::Rejected(reason),
            GatewayError::Unavailable(reason) | GatewayError::InvalidResponse(reason) => {
                EngineError::ChainUnavailable(reason)
            }
        }
    }
}
