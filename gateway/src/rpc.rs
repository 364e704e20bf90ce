//! JSON-RPC gateway to a governance relay node.
//!
//! Every call is a `POST` of a JSON object carrying an `action` name plus the
//! contract address, answered with `{"result": ...}` or
//! `{"error": "...", "code": "..."}`. A `code` of `"rejected"` means the relay
//! or the signer refused a write; everything else is treated as the chain
//! being unavailable.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use governdao_types::{AccountId, Timestamp, TxHash, VoteChoice};

use crate::{ChainGateway, ChainProposal, GatewayError, TransactionHandle};

const REJECTED_CODE: &str = "rejected";

/// HTTP client bound to one relay node and one governance contract.
#[derive(Clone)]
pub struct RpcGateway {
    http: reqwest::Client,
    node_url: String,
    contract: String,
}

impl RpcGateway {
    /// Create a gateway targeting `node_url` (e.g. `http://127.0.0.1:8545/governance`).
    pub fn new(
        node_url: impl Into<String>,
        contract: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::Unavailable(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            node_url: node_url.into(),
            contract: contract.into(),
        })
    }

    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }

    async fn rpc_call<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Value,
    ) -> Result<T, GatewayError> {
        let mut body = params;
        let object = body
            .as_object_mut()
            .ok_or_else(|| GatewayError::InvalidResponse("params must be a JSON object".into()))?;
        object.insert("action".to_string(), json!(action));
        object.insert("contract".to_string(), json!(self.contract));

        debug!(action, "governance rpc call");
        let response = self
            .http
            .post(&self.node_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(GatewayError::Unavailable(format!(
                "node returned HTTP {}",
                response.status()
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("invalid JSON response: {e}")))?;

        decode_response(action, json)
    }
}

/// Split a relay reply into its result or a classified error.
fn decode_response<T: DeserializeOwned>(action: &str, json: Value) -> Result<T, GatewayError> {
    if let Some(message) = json.get("error").and_then(|e| e.as_str()) {
        let code = json.get("code").and_then(|c| c.as_str()).unwrap_or_default();
        return Err(if code == REJECTED_CODE {
            GatewayError::Rejected(message.to_string())
        } else {
            GatewayError::Unavailable(format!("node error: {message}"))
        });
    }

    let result = json.get("result").cloned().unwrap_or(json);
    serde_json::from_value(result)
        .map_err(|e| GatewayError::InvalidResponse(format!("invalid {action} response: {e}")))
}

#[derive(Deserialize)]
struct CountResult {
    count: u64,
}

#[derive(Deserialize)]
struct HasVotedResult {
    voted: bool,
}

#[derive(Deserialize)]
struct VoteResult {
    support: bool,
}

#[async_trait]
impl ChainGateway for RpcGateway {
    async fn proposal_count(&self) -> Result<u64, GatewayError> {
        let result: CountResult = self.rpc_call("proposal_count", json!({})).await?;
        Ok(result.count)
    }

    async fn proposal(&self, index: u64) -> Result<Option<ChainProposal>, GatewayError> {
        let result: ChainProposal = self
            .rpc_call("proposal", json!({ "proposal_id": index }))
            .await?;
        // The contract answers unknown ids with a zeroed struct.
        if result.id == 0 {
            return Ok(None);
        }
        Ok(Some(result))
    }

    async fn has_voted(&self, account: &AccountId, index: u64) -> Result<bool, GatewayError> {
        let result: HasVotedResult = self
            .rpc_call(
                "has_voted",
                json!({ "voter": account.as_str(), "proposal_id": index }),
            )
            .await?;
        Ok(result.voted)
    }

    async fn vote_of(&self, account: &AccountId, index: u64) -> Result<VoteChoice, GatewayError> {
        let result: VoteResult = self
            .rpc_call(
                "get_vote",
                json!({ "voter": account.as_str(), "proposal_id": index }),
            )
            .await?;
        Ok(VoteChoice::from_support(result.support))
    }

    async fn submit_proposal(
        &self,
        sender: &AccountId,
        title: &str,
        description: &str,
        deadline: Timestamp,
    ) -> Result<TransactionHandle, GatewayError> {
        let result: TxResult = self
            .rpc_call(
                "create_proposal",
                json!({
                    "from": sender.as_str(),
                    "title": title,
                    "description": description,
                    "deadline": deadline.as_secs(),
                }),
            )
            .await?;
        Ok(TransactionHandle {
            hash: TxHash::new(result.hash),
        })
    }

    async fn submit_vote(
        &self,
        sender: &AccountId,
        index: u64,
        support: bool,
    ) -> Result<TransactionHandle, GatewayError> {
        let result: TxResult = self
            .rpc_call(
                "cast_vote",
                json!({
                    "from": sender.as_str(),
                    "proposal_id": index,
                    "support": support,
                }),
            )
            .await?;
        Ok(TransactionHandle {
            hash: TxHash::new(result.hash),
        })
    }
}

#[derive(Deserialize)]
struct TxResult {
    hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_code_maps_to_rejected() {
        let err = decode_response::<TxResult>(
            "cast_vote",
            json!({ "error": "user denied signature", "code": "rejected" }),
        )
        .err()
        .unwrap();
        assert_eq!(err, GatewayError::Rejected("user denied signature".into()));
    }

    #[test]
    fn other_errors_map_to_unavailable() {
        let err = decode_response::<CountResult>("proposal_count", json!({ "error": "timeout" }))
            .err()
            .unwrap();
        assert!(matches!(err, GatewayError::Unavailable(_)));
    }

    #[test]
    fn result_field_is_unwrapped() {
        let count: CountResult =
            decode_response("proposal_count", json!({ "result": { "count": 4 } })).unwrap();
        assert_eq!(count.count, 4);
    }

    #[test]
    fn bare_payload_is_accepted() {
        let proposal: ChainProposal = decode_response(
            "proposal",
            json!({
                "id": 2, "title": "Protocol Upgrade v2.0", "description": "",
                "deadline": 1_711_324_800u64, "status": 0,
                "for_votes": 0, "against_votes": 0, "creator": "0x8765"
            }),
        )
        .unwrap();
        assert_eq!(proposal.id, 2);
        assert_eq!(proposal.status, 0);
    }

    #[test]
    fn malformed_result_is_invalid_response() {
        let err = decode_response::<CountResult>("proposal_count", json!({ "result": "three" }))
            .err()
            .unwrap();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_node_is_unavailable() {
        let gateway = RpcGateway::new("http://127.0.0.1:9/governance", "0x0").unwrap();
        let err = gateway.proposal_count().await.unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable(_)));
    }
}
