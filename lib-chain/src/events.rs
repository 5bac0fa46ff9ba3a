//! Typed event access.
//!
//! An `EventFetcher<T>` is bound to one (contract, event) pair and decodes
//! the raw log parameters into `T`. Decoding is best-effort: entries that
//! fail to decode are logged and skipped, never surfaced as errors.

use crate::client::{ChainClient, EventSubscription, RawEvent};
use crate::error::ChainResult;
use lib_types::{Address, Hash};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

/// One decoded event occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent<T> {
    pub block_number: u64,
    pub tx_hash: Hash,
    pub args: T,
}

/// Factory surface for one (contract, event) pair
pub struct EventFetcher<T> {
    client: Arc<dyn ChainClient>,
    address: Address,
    event: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> EventFetcher<T> {
    pub fn new(client: Arc<dyn ChainClient>, address: Address, event: impl Into<String>) -> Self {
        Self {
            client,
            address,
            event: event.into(),
            _marker: PhantomData,
        }
    }

    pub fn event_name(&self) -> &str {
        &self.event
    }

    /// Fetch and decode past occurrences from `from_block` onward
    pub async fn get(&self, from_block: u64) -> ChainResult<Vec<DecodedEvent<T>>> {
        let raw = self
            .client
            .past_events(self.address, &self.event, from_block)
            .await?;
        Ok(raw.into_iter().filter_map(decode).collect())
    }

    /// Subscribe to future occurrences as a typed stream
    pub async fn watch(&self) -> ChainResult<EventStream<T>> {
        let subscription = self.client.subscribe(self.address, &self.event).await?;
        Ok(EventStream {
            subscription,
            _marker: PhantomData,
        })
    }
}

/// Live typed event stream
pub struct EventStream<T> {
    subscription: EventSubscription,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> EventStream<T> {
    /// Next decoded occurrence, or `None` once the feed closes
    pub async fn next(&mut self) -> Option<DecodedEvent<T>> {
        loop {
            match self.subscription.recv().await {
                Ok(raw) => {
                    if let Some(decoded) = decode(raw) {
                        return Some(decoded);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event stream lagged, occurrences dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

fn decode<T: DeserializeOwned>(raw: RawEvent) -> Option<DecodedEvent<T>> {
    match serde_json::from_value(raw.params) {
        Ok(args) => Some(DecodedEvent {
            block_number: raw.block_number,
            tx_hash: raw.tx_hash,
            args,
        }),
        Err(e) => {
            warn!(event = %raw.event, address = %raw.address, error = %e, "skipping undecodable event");
            None
        }
    }
}
