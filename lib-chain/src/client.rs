//! The `ChainClient` seam.
//!
//! Every wrapper takes an `Arc<dyn ChainClient>` at construction and goes
//! through this trait for all chain interaction. Production code uses the
//! JSON-RPC implementation in `rpc`; tests use `testing::MockChain`.

use crate::error::ChainResult;
use crate::value::Value;
use async_trait::async_trait;
use lib_types::{Address, Hash};
use serde::{Deserialize, Serialize};

/// A submitted, not-yet-mined transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTx {
    pub hash: Hash,
}

/// Receipt of a mined transaction, including the events it emitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: Hash,
    pub block_number: u64,
    pub events: Vec<RawEvent>,
}

impl TxReceipt {
    /// First emitted event with the given name, if any
    pub fn event(&self, name: &str) -> Option<&RawEvent> {
        self.events.iter().find(|e| e.event == name)
    }
}

/// A decoded log entry as delivered by the node.
///
/// `params` carries the event arguments as loose JSON; typed decoding
/// happens in the event fetchers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub event: String,
    pub address: Address,
    pub block_number: u64,
    pub tx_hash: Hash,
    pub params: serde_json::Value,
}

/// Live feed of raw events for one (contract, event) pair
pub type EventSubscription = tokio::sync::broadcast::Receiver<RawEvent>;

/// Contract invocation seam.
///
/// Implementations sign and submit on the caller's behalf; nonce ordering is
/// the caller's responsibility and is achieved by awaiting `wait_mined`
/// between state-mutating sends.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Read-only contract call. Allocates no nonce, mutates nothing.
    async fn call(&self, to: Address, method: &str, args: Vec<Value>) -> ChainResult<Vec<Value>>;

    /// Sign and submit a state-mutating invocation
    async fn send(
        &self,
        to: Address,
        method: &str,
        args: Vec<Value>,
        gas: Option<u64>,
    ) -> ChainResult<PendingTx>;

    /// Deploy a contract artifact, returning its address
    async fn deploy(&self, artifact: &str, args: Vec<Value>, gas: Option<u64>)
        -> ChainResult<Address>;

    /// Block until the transaction is mined and return its receipt
    async fn wait_mined(&self, tx: &PendingTx) -> ChainResult<TxReceipt>;

    /// Past occurrences of an event on a contract, from `from_block` onward
    async fn past_events(
        &self,
        address: Address,
        event: &str,
        from_block: u64,
    ) -> ChainResult<Vec<RawEvent>>;

    /// Subscribe to future occurrences of an event on a contract
    async fn subscribe(&self, address: Address, event: &str) -> ChainResult<EventSubscription>;
}
