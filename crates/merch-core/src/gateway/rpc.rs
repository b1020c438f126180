//! ============================================================================
//! Sui JSON-RPC Client - ObjectGateway over HTTP
//! ============================================================================
//! Thin adapter over the full-node JSON-RPC API:
//! - suix_queryEvents / suix_getOwnedObjects (first page only)
//! - sui_getTransactionBlock with object changes
//! - sui_multiGetObjects with content
//! - sui_executeTransactionBlock with effects
//! No retries, no caching; every failure goes back to the caller.
//! ============================================================================

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use super::{
    ChainEvent, EventOrder, ExecutionOutcome, ExecutionStatus, MoveObject, ObjectGateway,
    ObjectRead, SignedTransaction, TransactionDetails,
};
use crate::error::{DecodeError, Result, StoreError};

/// JSON-RPC client for a Sui full node
pub struct SuiRpcClient {
    client: reqwest::Client,
    rpc_url: String,
    next_id: AtomicU64,
}

impl SuiRpcClient {
    /// Create new client for the given full-node URL
    pub fn new(rpc_url: &str) -> Self {
        info!("Initializing SuiRpcClient for {}", rpc_url);

        Self {
            client: reqwest::Client::new(),
            rpc_url: rpc_url.to_string(),
            next_id: AtomicU64::new(1),
        }
    }

    fn request_body(&self, method: &str, params: Value) -> Value {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let body = self.request_body(method, params);
        debug!("RPC {} -> {}", method, self.rpc_url);

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("{} request failed: {}", method, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::Transport(format!(
                "{} returned HTTP {}: {}",
                method, status, text
            )));
        }

        let envelope: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| DecodeError::Response(format!("{}: {}", method, e)))?;

        envelope.into_result(method)
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl<T> RpcResponse<T> {
    fn into_result(self, method: &str) -> Result<T> {
        if let Some(error) = self.error {
            warn!("RPC {} failed ({}): {}", method, error.code, error.message);
            return Err(StoreError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        self.result
            .ok_or_else(|| DecodeError::Response(format!("{}: response has no result", method)).into())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    data: Vec<T>,
    #[serde(default)]
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct RawObjectResponse {
    data: Option<RawObjectData>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawObjectData {
    object_id: String,
    content: Option<RawContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "dataType", rename_all = "camelCase")]
enum RawContent {
    MoveObject {
        #[serde(rename = "type")]
        object_type: String,
        #[serde(default)]
        fields: Map<String, Value>,
    },
    #[serde(other)]
    Other,
}

impl RawObjectResponse {
    /// `requested` fills in the id when an error entry does not carry one
    fn into_object_read(self, requested: &str) -> ObjectRead {
        match self.data {
            Some(RawObjectData {
                object_id,
                content: Some(RawContent::MoveObject { object_type, fields }),
            }) => ObjectRead::Present(MoveObject {
                object_id,
                object_type,
                fields,
            }),
            Some(RawObjectData { object_id, .. }) => ObjectRead::Missing {
                object_id,
                reason: "not a Move object".into(),
            },
            None => {
                let error = self.error.unwrap_or(Value::Null);
                let object_id = error
                    .get("object_id")
                    .and_then(Value::as_str)
                    .unwrap_or(requested)
                    .to_string();
                let reason = error
                    .get("code")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string();
                ObjectRead::Missing { object_id, reason }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawExecuteResponse {
    digest: String,
    effects: Option<RawEffects>,
}

#[derive(Debug, Deserialize)]
struct RawEffects {
    status: RawStatus,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    status: String,
    error: Option<String>,
}

impl RawExecuteResponse {
    fn into_outcome(self) -> Result<ExecutionOutcome> {
        let effects = self.effects.ok_or_else(|| {
            DecodeError::Response(format!("transaction {} returned no effects", self.digest))
        })?;

        let status = if effects.status.status == "success" {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Failure(
                effects
                    .status
                    .error
                    .unwrap_or_else(|| effects.status.status.clone()),
            )
        };

        Ok(ExecutionOutcome {
            digest: self.digest,
            status,
        })
    }
}

fn content_options() -> Value {
    json!({ "showContent": true, "showType": true })
}

#[async_trait]
impl ObjectGateway for SuiRpcClient {
    async fn query_events(
        &self,
        event_type: &str,
        order: EventOrder,
        limit: usize,
    ) -> Result<Vec<ChainEvent>> {
        let descending = order == EventOrder::Descending;
        let page: Page<ChainEvent> = self
            .call(
                "suix_queryEvents",
                json!([{ "MoveEventType": event_type }, null, limit, descending]),
            )
            .await?;

        if page.has_next_page {
            debug!("More than {} {} events; using the first page", limit, event_type);
        }
        Ok(page.data)
    }

    async fn get_transaction(&self, digest: &str) -> Result<TransactionDetails> {
        self.call(
            "sui_getTransactionBlock",
            json!([digest, { "showObjectChanges": true }]),
        )
        .await
    }

    async fn multi_get_objects(&self, ids: &[String]) -> Result<Vec<ObjectRead>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<RawObjectResponse> = self
            .call("sui_multiGetObjects", json!([ids, content_options()]))
            .await?;

        if raw.len() != ids.len() {
            return Err(DecodeError::Response(format!(
                "sui_multiGetObjects returned {} entries for {} ids",
                raw.len(),
                ids.len()
            ))
            .into());
        }

        Ok(raw
            .into_iter()
            .zip(ids)
            .map(|(entry, id)| entry.into_object_read(id))
            .collect())
    }

    async fn get_owned_objects(&self, owner: &str, struct_type: &str) -> Result<Vec<ObjectRead>> {
        let page: Page<RawObjectResponse> = self
            .call(
                "suix_getOwnedObjects",
                json!([
                    owner,
                    { "filter": { "StructType": struct_type }, "options": content_options() },
                    null,
                    null
                ]),
            )
            .await?;

        if page.has_next_page {
            debug!("{} owns more {} objects than one page", owner, struct_type);
        }
        Ok(page
            .data
            .into_iter()
            .map(|entry| entry.into_object_read(""))
            .collect())
    }

    async fn execute_transaction(&self, tx: &SignedTransaction) -> Result<ExecutionOutcome> {
        let raw: RawExecuteResponse = self
            .call(
                "sui_executeTransactionBlock",
                json!([
                    STANDARD.encode(&tx.tx_bytes),
                    tx.signatures,
                    { "showEffects": true },
                    "WaitForLocalExecution"
                ]),
            )
            .await?;

        let outcome = raw.into_outcome()?;
        info!("Executed transaction {}: {:?}", outcome.digest, outcome.status);
        Ok(outcome)
    }
}
