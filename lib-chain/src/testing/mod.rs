//! Testing utilities for lib-chain
//!
//! This module provides a scripted in-memory `ChainClient` for wrapper and
//! integration tests: reads return whatever the test programs, sends are
//! recorded and mined instantly, and events can be staged onto receipts or
//! emitted live.

use crate::client::{ChainClient, EventSubscription, PendingTx, RawEvent, TxReceipt};
use crate::error::{ChainError, ChainResult};
use crate::value::Value;
use async_trait::async_trait;
use lib_types::{Address, Hash};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::broadcast;

const EVENT_BUFFER: usize = 64;

/// A recorded state-mutating invocation
#[derive(Debug, Clone, PartialEq)]
pub struct SentTx {
    pub to: Address,
    pub method: String,
    pub args: Vec<Value>,
    pub gas: Option<u64>,
    pub hash: Hash,
}

/// A recorded deployment
#[derive(Debug, Clone, PartialEq)]
pub struct DeployedArtifact {
    pub artifact: String,
    pub args: Vec<Value>,
    pub gas: Option<u64>,
    pub address: Address,
}

#[derive(Default)]
struct MockState {
    queued_returns: HashMap<(Address, String), VecDeque<Vec<Value>>>,
    sticky_returns: HashMap<(Address, String), Vec<Value>>,
    receipt_events: HashMap<String, Vec<(String, serde_json::Value)>>,
    sent: Vec<SentTx>,
    deploys: Vec<DeployedArtifact>,
    receipts: HashMap<Hash, TxReceipt>,
    logs: Vec<RawEvent>,
    channels: HashMap<(Address, String), broadcast::Sender<RawEvent>>,
    block_number: u64,
    counter: u64,
}

/// Scripted in-memory chain client
#[derive(Default)]
pub struct MockChain {
    state: Mutex<MockState>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Program a sticky return for a read-only call
    pub fn stub_call(&self, to: Address, method: &str, returns: Vec<Value>) {
        let mut state = self.state.lock().unwrap();
        state.sticky_returns.insert((to, method.to_string()), returns);
    }

    /// Queue a one-shot return for a read-only call, consumed before any
    /// sticky return for the same (address, method)
    pub fn push_call(&self, to: Address, method: &str, returns: Vec<Value>) {
        let mut state = self.state.lock().unwrap();
        state
            .queued_returns
            .entry((to, method.to_string()))
            .or_default()
            .push_back(returns);
    }

    /// Attach an event to the receipt of every send of `method`.
    ///
    /// The emitting address is the transaction target; block number and
    /// transaction hash are filled in at mining time.
    pub fn stub_receipt_event(&self, method: &str, event: &str, params: serde_json::Value) {
        let mut state = self.state.lock().unwrap();
        state
            .receipt_events
            .entry(method.to_string())
            .or_default()
            .push((event.to_string(), params));
    }

    /// Emit a live event outside any transaction
    pub fn emit(&self, address: Address, event: &str, params: serde_json::Value) {
        let mut state = self.state.lock().unwrap();
        state.block_number += 1;
        state.counter += 1;
        let raw = RawEvent {
            event: event.to_string(),
            address,
            block_number: state.block_number,
            tx_hash: hash_from(state.counter),
            params,
        };
        deliver(&mut state, raw);
    }

    /// All recorded state-mutating invocations, in submission order
    pub fn sent(&self) -> Vec<SentTx> {
        self.state.lock().unwrap().sent.clone()
    }

    /// All recorded deployments, in submission order
    pub fn deploys(&self) -> Vec<DeployedArtifact> {
        self.state.lock().unwrap().deploys.clone()
    }
}

fn hash_from(counter: u64) -> Hash {
    let mut bytes = [0u8; 32];
    bytes[24..].copy_from_slice(&counter.to_be_bytes());
    Hash::new(bytes)
}

fn address_from(counter: u64) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0xde;
    bytes[12..].copy_from_slice(&counter.to_be_bytes());
    Address::new(bytes)
}

fn deliver(state: &mut MockState, raw: RawEvent) {
    if let Some(sender) = state.channels.get(&(raw.address, raw.event.clone())) {
        let _ = sender.send(raw.clone());
    }
    state.logs.push(raw);
}

#[async_trait]
impl ChainClient for MockChain {
    async fn call(&self, to: Address, method: &str, args: Vec<Value>) -> ChainResult<Vec<Value>> {
        let _ = args;
        let mut state = self.state.lock().unwrap();
        let key = (to, method.to_string());
        if let Some(queue) = state.queued_returns.get_mut(&key) {
            if let Some(returns) = queue.pop_front() {
                return Ok(returns);
            }
        }
        state
            .sticky_returns
            .get(&key)
            .cloned()
            .ok_or_else(|| ChainError::Rpc(format!("no scripted return for {method} at {to}")))
    }

    async fn send(
        &self,
        to: Address,
        method: &str,
        args: Vec<Value>,
        gas: Option<u64>,
    ) -> ChainResult<PendingTx> {
        let mut state = self.state.lock().unwrap();
        state.counter += 1;
        state.block_number += 1;
        let hash = hash_from(state.counter);
        let block_number = state.block_number;

        state.sent.push(SentTx {
            to,
            method: method.to_string(),
            args,
            gas,
            hash,
        });

        let events: Vec<RawEvent> = state
            .receipt_events
            .get(method)
            .map(|templates| {
                templates
                    .iter()
                    .map(|(event, params)| RawEvent {
                        event: event.clone(),
                        address: to,
                        block_number,
                        tx_hash: hash,
                        params: params.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        state.receipts.insert(
            hash,
            TxReceipt {
                tx_hash: hash,
                block_number,
                events: events.clone(),
            },
        );
        for event in events {
            deliver(&mut state, event);
        }

        Ok(PendingTx { hash })
    }

    async fn deploy(
        &self,
        artifact: &str,
        args: Vec<Value>,
        gas: Option<u64>,
    ) -> ChainResult<Address> {
        let mut state = self.state.lock().unwrap();
        state.counter += 1;
        let address = address_from(state.counter);
        state.deploys.push(DeployedArtifact {
            artifact: artifact.to_string(),
            args,
            gas,
            address,
        });
        Ok(address)
    }

    async fn wait_mined(&self, tx: &PendingTx) -> ChainResult<TxReceipt> {
        let state = self.state.lock().unwrap();
        state
            .receipts
            .get(&tx.hash)
            .cloned()
            .ok_or_else(|| ChainError::Rpc(format!("unknown transaction {}", tx.hash)))
    }

    async fn past_events(
        &self,
        address: Address,
        event: &str,
        from_block: u64,
    ) -> ChainResult<Vec<RawEvent>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .logs
            .iter()
            .filter(|e| e.address == address && e.event == event && e.block_number >= from_block)
            .cloned()
            .collect())
    }

    async fn subscribe(&self, address: Address, event: &str) -> ChainResult<EventSubscription> {
        let mut state = self.state.lock().unwrap();
        let sender = state
            .channels
            .entry((address, event.to_string()))
            .or_insert_with(|| broadcast::channel(EVENT_BUFFER).0);
        Ok(sender.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_scripted_calls() {
        let chain = MockChain::new();
        let contract = Address::new([1u8; 20]);

        chain.stub_call(contract, "getNumberOfChoices", vec![Value::Uint(5)]);
        chain.push_call(contract, "getNumberOfChoices", vec![Value::Uint(2)]);

        // one-shot first, then sticky
        let first = chain
            .call(contract, "getNumberOfChoices", vec![])
            .await
            .unwrap();
        assert_eq!(first, vec![Value::Uint(2)]);
        let second = chain
            .call(contract, "getNumberOfChoices", vec![])
            .await
            .unwrap();
        assert_eq!(second, vec![Value::Uint(5)]);

        let err = chain.call(contract, "unstubbed", vec![]).await.unwrap_err();
        assert!(matches!(err, ChainError::Rpc(_)));
    }

    #[tokio::test]
    async fn test_send_mines_instantly_with_staged_events() {
        let chain = MockChain::new();
        let contract = Address::new([2u8; 20]);
        chain.stub_receipt_event("propose", "NewProposal", json!({ "id": 1 }));

        let pending = chain
            .send(contract, "propose", vec![Value::Uint(3)], None)
            .await
            .unwrap();
        let receipt = chain.wait_mined(&pending).await.unwrap();

        assert_eq!(receipt.tx_hash, pending.hash);
        assert_eq!(receipt.events.len(), 1);
        assert_eq!(receipt.events[0].event, "NewProposal");
        assert_eq!(receipt.events[0].address, contract);

        let sent = chain.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, "propose");
    }

    #[tokio::test]
    async fn test_past_events_filtering() {
        let chain = MockChain::new();
        let a = Address::new([3u8; 20]);
        let b = Address::new([4u8; 20]);

        chain.emit(a, "NewProposal", json!({ "n": 1 }));
        chain.emit(b, "NewProposal", json!({ "n": 2 }));
        chain.emit(a, "ExecuteProposal", json!({ "n": 3 }));

        let events = chain.past_events(a, "NewProposal", 0).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].params["n"], 1);
    }
}
