//! HTTP JSON-RPC implementation of `ChainClient`.
//!
//! Talks to a node over `agora_*` endpoints. No retry or timeout policy
//! here; transport behavior is whatever the HTTP client defaults to, and
//! node-side failures surface as `ChainError::Rpc` with the node's message.

use crate::client::{ChainClient, EventSubscription, PendingTx, RawEvent, TxReceipt};
use crate::error::{ChainError, ChainResult};
use crate::value::Value;
use async_trait::async_trait;
use lib_types::Address;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const LOG_POLL_INTERVAL: Duration = Duration::from_secs(2);
const SUBSCRIPTION_BUFFER: usize = 256;

/// JSON-RPC chain client
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: String,
    next_id: Arc<AtomicU64>,
}

#[derive(Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    #[allow(dead_code)]
    code: i64,
    message: String,
}

impl RpcClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn rpc_opt<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> ChainResult<Option<T>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(%method, id, "rpc request");
        let response = self.http.post(&self.endpoint).json(&body).send().await?;
        let envelope: RpcEnvelope<T> = response.json().await?;

        if let Some(err) = envelope.error {
            return Err(ChainError::Rpc(err.message));
        }
        Ok(envelope.result)
    }

    async fn rpc<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> ChainResult<T> {
        self.rpc_opt(method, params)
            .await?
            .ok_or_else(|| ChainError::Rpc(format!("empty result for {method}")))
    }

    async fn block_number(&self) -> ChainResult<u64> {
        self.rpc("agora_blockNumber", json!([])).await
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn call(&self, to: Address, method: &str, args: Vec<Value>) -> ChainResult<Vec<Value>> {
        self.rpc("agora_call", json!([to, method, args])).await
    }

    async fn send(
        &self,
        to: Address,
        method: &str,
        args: Vec<Value>,
        gas: Option<u64>,
    ) -> ChainResult<PendingTx> {
        let hash = self
            .rpc("agora_sendTransaction", json!([to, method, args, gas]))
            .await?;
        Ok(PendingTx { hash })
    }

    async fn deploy(
        &self,
        artifact: &str,
        args: Vec<Value>,
        gas: Option<u64>,
    ) -> ChainResult<Address> {
        self.rpc("agora_deploy", json!([artifact, args, gas])).await
    }

    async fn wait_mined(&self, tx: &PendingTx) -> ChainResult<TxReceipt> {
        loop {
            let receipt: Option<TxReceipt> = self
                .rpc_opt("agora_getTransactionReceipt", json!([tx.hash]))
                .await?;
            if let Some(receipt) = receipt {
                debug!(tx_hash = %tx.hash, block = receipt.block_number, "transaction mined");
                return Ok(receipt);
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }

    async fn past_events(
        &self,
        address: Address,
        event: &str,
        from_block: u64,
    ) -> ChainResult<Vec<RawEvent>> {
        self.rpc("agora_getLogs", json!([address, event, from_block]))
            .await
    }

    async fn subscribe(&self, address: Address, event: &str) -> ChainResult<EventSubscription> {
        let (sender, receiver) = broadcast::channel(SUBSCRIPTION_BUFFER);
        let client = self.clone();
        let event = event.to_string();
        let mut from_block = self.block_number().await?.saturating_add(1);

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(LOG_POLL_INTERVAL).await;
                if sender.receiver_count() == 0 {
                    break;
                }
                match client.past_events(address, &event, from_block).await {
                    Ok(logs) => {
                        for log in logs {
                            from_block = from_block.max(log.block_number + 1);
                            let _ = sender.send(log);
                        }
                    }
                    Err(e) => {
                        warn!(%address, %event, error = %e, "log poll failed");
                    }
                }
            }
        });

        Ok(receiver)
    }
}
