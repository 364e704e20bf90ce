//! Chains the client knows how to talk to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Identifies which chain the governance contract lives on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    EthereumMainnet,
    EthereumSepolia,
    PolygonMainnet,
    #[default]
    PolygonMumbai,
    /// A local development chain. Has no block explorer.
    Local,
}

impl Chain {
    pub const ALL: [Chain; 5] = [
        Chain::EthereumMainnet,
        Chain::EthereumSepolia,
        Chain::PolygonMainnet,
        Chain::PolygonMumbai,
        Chain::Local,
    ];

    /// EIP-155 chain id.
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::EthereumMainnet => 1,
            Self::EthereumSepolia => 11_155_111,
            Self::PolygonMainnet => 137,
            Self::PolygonMumbai => 80_001,
            Self::Local => 31_337,
        }
    }

    /// Base URL of the chain's block explorer, if it has one.
    pub fn explorer_base(&self) -> Option<&'static str> {
        match self {
            Self::EthereumMainnet => Some("https://etherscan.io"),
            Self::EthereumSepolia => Some("https://sepolia.etherscan.io"),
            Self::PolygonMainnet => Some("https://polygonscan.com"),
            Self::PolygonMumbai => Some("https://mumbai.polygonscan.com"),
            Self::Local => None,
        }
    }

    pub fn is_testnet(&self) -> bool {
        !matches!(self, Self::EthereumMainnet | Self::PolygonMainnet)
    }

    /// Stable name, also used as the persisted network selection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EthereumMainnet => "ethereum_mainnet",
            Self::EthereumSepolia => "ethereum_sepolia",
            Self::PolygonMainnet => "polygon_mainnet",
            Self::PolygonMumbai => "polygon_mumbai",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Chain::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| TypesError::UnknownChain(s.to_string()))
    }
}
