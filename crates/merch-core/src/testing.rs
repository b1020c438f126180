//! In-memory gateway for tests.
//!
//! Holds events, transactions and objects like a tiny chain and counts every
//! call so tests can assert that no remote call happened.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{Result, StoreError};
use crate::gateway::{
    ChainEvent, EventId, EventOrder, ExecutionOutcome, ExecutionStatus, MoveObject, ObjectChange,
    ObjectGateway, ObjectRead, SignedTransaction, TransactionDetails, WalletSigner,
};
use crate::transactions::MoveCall;

#[derive(Default)]
pub(crate) struct MemoryGateway {
    pub events: Mutex<Vec<ChainEvent>>,
    pub transactions: Mutex<HashMap<String, TransactionDetails>>,
    pub objects: Mutex<HashMap<String, MoveObject>>,
    pub owners: Mutex<HashMap<String, Vec<String>>>,
    pub execution_status: Mutex<Option<ExecutionStatus>>,
    pub fail_reads: Mutex<bool>,
    pub calls: AtomicUsize,
    pub executed: AtomicUsize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn executed_count(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }

    pub fn emit(&self, tx_digest: &str, event_type: &str, parsed_json: Value) {
        let mut events = self.events.lock().unwrap();
        let seq = events.len();
        events.push(ChainEvent {
            id: EventId {
                tx_digest: tx_digest.into(),
                event_seq: seq.to_string(),
            },
            event_type: event_type.into(),
            sender: "0xadmin".into(),
            parsed_json,
            timestamp_ms: None,
        });
    }

    pub fn record_created(&self, tx_digest: &str, object_id: &str, object_type: &str) {
        self.transactions
            .lock()
            .unwrap()
            .entry(tx_digest.to_string())
            .or_insert_with(|| TransactionDetails {
                digest: tx_digest.into(),
                object_changes: Vec::new(),
            })
            .object_changes
            .push(ObjectChange::Created {
                object_id: object_id.into(),
                object_type: object_type.into(),
            });
    }

    pub fn put_object(&self, object_id: &str, object_type: &str, fields: Value) {
        let fields: Map<String, Value> = fields.as_object().cloned().unwrap_or_default();
        self.objects.lock().unwrap().insert(
            object_id.to_string(),
            MoveObject {
                object_id: object_id.into(),
                object_type: object_type.into(),
                fields,
            },
        );
    }

    pub fn delete_object(&self, object_id: &str) {
        self.objects.lock().unwrap().remove(object_id);
    }

    pub fn give(&self, owner: &str, object_id: &str) {
        self.owners
            .lock()
            .unwrap()
            .entry(owner.to_string())
            .or_default()
            .push(object_id.to_string());
    }

    pub fn set_failing(&self, failing: bool) {
        *self.fail_reads.lock().unwrap() = failing;
    }

    fn read(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_reads.lock().unwrap() {
            return Err(StoreError::Transport("connection refused".into()));
        }
        Ok(())
    }

    fn lookup(&self, id: &str) -> ObjectRead {
        match self.objects.lock().unwrap().get(id) {
            Some(object) => ObjectRead::Present(object.clone()),
            None => ObjectRead::Missing {
                object_id: id.into(),
                reason: "deleted".into(),
            },
        }
    }
}

#[async_trait]
impl ObjectGateway for MemoryGateway {
    async fn query_events(
        &self,
        event_type: &str,
        order: EventOrder,
        limit: usize,
    ) -> Result<Vec<ChainEvent>> {
        self.read()?;
        let mut events: Vec<ChainEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect();
        if order == EventOrder::Descending {
            events.reverse();
        }
        events.truncate(limit);
        Ok(events)
    }

    async fn get_transaction(&self, digest: &str) -> Result<TransactionDetails> {
        self.read()?;
        self.transactions
            .lock()
            .unwrap()
            .get(digest)
            .cloned()
            .ok_or_else(|| StoreError::Rpc {
                code: -32602,
                message: format!("Could not find the referenced transaction {}", digest),
            })
    }

    async fn multi_get_objects(&self, ids: &[String]) -> Result<Vec<ObjectRead>> {
        self.read()?;
        Ok(ids.iter().map(|id| self.lookup(id)).collect())
    }

    async fn get_owned_objects(&self, owner: &str, struct_type: &str) -> Result<Vec<ObjectRead>> {
        self.read()?;
        let ids = self.owners.lock().unwrap().get(owner).cloned().unwrap_or_default();
        Ok(ids
            .iter()
            .map(|id| self.lookup(id))
            .filter(|read| matches!(read, ObjectRead::Present(o) if o.object_type == struct_type))
            .collect())
    }

    async fn execute_transaction(&self, tx: &SignedTransaction) -> Result<ExecutionOutcome> {
        self.read()?;
        self.executed.fetch_add(1, Ordering::SeqCst);
        let status = self
            .execution_status
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(ExecutionStatus::Success);
        Ok(ExecutionOutcome {
            digest: format!("D{}", tx.tx_bytes.len()),
            status,
        })
    }
}

/// Wallet that "signs" by serializing the call
pub(crate) struct FakeWallet {
    pub address: String,
    pub signed: AtomicUsize,
}

impl FakeWallet {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.into(),
            signed: AtomicUsize::new(0),
        }
    }

    pub fn signed_count(&self) -> usize {
        self.signed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSigner for FakeWallet {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign(&self, call: &MoveCall) -> Result<SignedTransaction> {
        self.signed.fetch_add(1, Ordering::SeqCst);
        let tx_bytes = serde_json::to_vec(call)
            .map_err(|e| StoreError::Transport(format!("wallet rejected call: {}", e)))?;
        Ok(SignedTransaction {
            tx_bytes,
            signatures: vec!["sig".into()],
        })
    }
}
