//! Client configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use governdao_types::Chain;
use governdao_utils::LogFormat;

use crate::{EngineError, FALLBACK_EXPLORER_URL};

/// Configuration for the reconciliation engine and the processes embedding it.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long to wait after a vote is accepted before re-reading the proposal.
    #[serde(default = "default_propagation_delay_ms")]
    pub propagation_delay_ms: u64,

    /// How long to wait after a proposal is created before reloading everything.
    #[serde(default = "default_reload_after_create_ms")]
    pub reload_after_create_ms: u64,

    /// Explorer base used when the active chain has none.
    #[serde(default = "default_fallback_explorer_url")]
    pub fallback_explorer_url: String,

    /// Chain selected when nothing has been persisted yet.
    #[serde(default)]
    pub default_chain: Chain,

    /// Governance relay node endpoint.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Address of the governance contract.
    #[serde(default = "default_contract_address")]
    pub contract_address: String,

    /// Directory holding the persistent store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_propagation_delay_ms() -> u64 {
    2_000
}

fn default_reload_after_create_ms() -> u64 {
    2_000
}

fn default_fallback_explorer_url() -> String {
    FALLBACK_EXPLORER_URL.to_string()
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545/governance".to_string()
}

fn default_contract_address() -> String {
    "0x8B791913eB8C31236640898ca75b9c6116F2fFd7".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./governdao_data")
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    pub fn propagation_delay(&self) -> Duration {
        Duration::from_millis(self.propagation_delay_ms)
    }

    pub fn reload_after_create(&self) -> Duration {
        Duration::from_millis(self.reload_after_create_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            propagation_delay_ms: default_propagation_delay_ms(),
            reload_after_create_ms: default_reload_after_create_ms(),
            fallback_explorer_url: default_fallback_explorer_url(),
            default_chain: Chain::default(),
            rpc_url: default_rpc_url(),
            contract_address: default_contract_address(),
            data_dir: default_data_dir(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = EngineConfig::default();
        let toml_str = config.to_toml_string().expect("should serialize");
        let parsed = EngineConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.propagation_delay(), Duration::from_secs(2));
        assert_eq!(config.default_chain, Chain::PolygonMumbai);
        assert_eq!(config.fallback_explorer_url, "https://etherscan.io");
        assert_eq!(config.log_format, LogFormat::Human);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            propagation_delay_ms = 500
            default_chain = "ethereum_sepolia"
            log_format = "json"
        "#;
        let config = EngineConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.propagation_delay_ms, 500);
        assert_eq!(config.default_chain, Chain::EthereumSepolia);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.reload_after_create_ms, 2_000); // default
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = EngineConfig::from_toml_file("/nonexistent/governdao.toml");
        assert!(matches!(result, Err(EngineError::Config(_))));
    }
}
