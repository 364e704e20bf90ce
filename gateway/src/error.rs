use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The chain could not be reached or did not answer sensibly.
    #[error("chain unavailable: {0}")]
    Unavailable(String),

    /// The chain (or the signer) refused the write.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("invalid response from chain: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}
