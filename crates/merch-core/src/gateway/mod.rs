//! ============================================================================
//! Gateway Module - Remote Object Gateway over the Sui full node
//! ============================================================================
//! The storefront never talks to the network directly; it goes through:
//! - ObjectGateway: event queries, transaction details, object reads, execution
//! - WalletSigner: the connected wallet that turns a MoveCall into signed bytes
//!
//! `SuiRpcClient` is the JSON-RPC implementation of `ObjectGateway`. Signing
//! stays with the wallet; nothing here holds keys.
//! ============================================================================

mod rpc;

pub use rpc::SuiRpcClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::transactions::MoveCall;

/// Event query ordering by emission sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrder {
    Ascending,
    Descending,
}

/// Event id: the emitting transaction plus the event's position in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventId {
    pub tx_digest: String,
    pub event_seq: String,
}

/// A Move event as returned by `suix_queryEvents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEvent {
    pub id: EventId,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub parsed_json: Value,
    #[serde(default)]
    pub timestamp_ms: Option<String>,
}

/// One entry of a transaction's `objectChanges`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ObjectChange {
    #[serde(rename_all = "camelCase")]
    Created { object_id: String, object_type: String },
    #[serde(rename_all = "camelCase")]
    Mutated { object_id: String, object_type: String },
    #[serde(rename_all = "camelCase")]
    Deleted { object_id: String, object_type: String },
    #[serde(other)]
    Other,
}

/// Transaction details with object changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    pub digest: String,
    #[serde(default)]
    pub object_changes: Vec<ObjectChange>,
}

impl TransactionDetails {
    /// Ids of objects this transaction created with the given Move type
    pub fn created_of_type<'a>(&'a self, object_type: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.object_changes.iter().filter_map(move |change| match change {
            ObjectChange::Created {
                object_id,
                object_type: created_type,
            } if created_type == object_type => Some(object_id.as_str()),
            _ => None,
        })
    }
}

/// Content of a live Move object
#[derive(Debug, Clone, PartialEq)]
pub struct MoveObject {
    pub object_id: String,
    pub object_type: String,
    pub fields: Map<String, Value>,
}

/// Result of reading one object id
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectRead {
    Present(MoveObject),
    /// Deleted, never existed, or not a Move object
    Missing { object_id: String, reason: String },
}

impl ObjectRead {
    pub fn into_present(self) -> Option<MoveObject> {
        match self {
            Self::Present(object) => Some(object),
            Self::Missing { .. } => None,
        }
    }
}

/// Transaction bytes plus the wallet's signatures over them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub tx_bytes: Vec<u8>,
    pub signatures: Vec<String>,
}

/// Status reported by the chain after execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Success,
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub digest: String,
    pub status: ExecutionStatus,
}

/// Read and execute access to the chain
#[async_trait]
pub trait ObjectGateway: Send + Sync {
    async fn query_events(
        &self,
        event_type: &str,
        order: EventOrder,
        limit: usize,
    ) -> Result<Vec<ChainEvent>>;

    async fn get_transaction(&self, digest: &str) -> Result<TransactionDetails>;

    /// One entry per requested id, in request order
    async fn multi_get_objects(&self, ids: &[String]) -> Result<Vec<ObjectRead>>;

    async fn get_owned_objects(&self, owner: &str, struct_type: &str) -> Result<Vec<ObjectRead>>;

    async fn execute_transaction(&self, tx: &SignedTransaction) -> Result<ExecutionOutcome>;
}

/// The connected wallet. Builds and signs the programmable transaction for a
/// call; keys never pass through this crate.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> &str;

    async fn sign(&self, call: &MoveCall) -> Result<SignedTransaction>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_changes_deserialize() {
        let tx: TransactionDetails = serde_json::from_value(json!({
            "digest": "T1",
            "objectChanges": [
                {
                    "type": "created",
                    "sender": "0xadmin",
                    "owner": { "Shared": { "initial_shared_version": 7 } },
                    "objectType": "0xpkg::store::Product",
                    "objectId": "0xp1",
                    "version": "7",
                    "digest": "d1"
                },
                {
                    "type": "mutated",
                    "sender": "0xadmin",
                    "objectType": "0xpkg::store::Store",
                    "objectId": "0xs",
                    "version": "7",
                    "previousVersion": "6",
                    "digest": "d2"
                },
                { "type": "published", "packageId": "0xpkg", "version": "1", "digest": "d3", "modules": ["store"] }
            ]
        }))
        .unwrap();

        assert_eq!(tx.object_changes.len(), 3);
        assert_eq!(tx.object_changes[2], ObjectChange::Other);
        let created: Vec<_> = tx.created_of_type("0xpkg::store::Product").collect();
        assert_eq!(created, vec!["0xp1"]);
        assert_eq!(tx.created_of_type("0xpkg::store::Store").count(), 0);
    }

    #[test]
    fn test_event_deserialize() {
        let event: ChainEvent = serde_json::from_value(json!({
            "id": { "txDigest": "T1", "eventSeq": "0" },
            "packageId": "0xpkg",
            "transactionModule": "store",
            "sender": "0xadmin",
            "type": "0xpkg::store::ProductAdded",
            "parsedJson": { "product_id": "1" },
            "bcs": "abc",
            "timestampMs": "1700000000000"
        }))
        .unwrap();
        assert_eq!(event.id.tx_digest, "T1");
        assert_eq!(event.event_type, "0xpkg::store::ProductAdded");
        assert_eq!(event.timestamp_ms.as_deref(), Some("1700000000000"));
    }
}
