//! Common wrapper plumbing.

use crate::error::WrapperResult;
use lib_chain::{ChainClient, EventFetcher, PendingTx, TxReceipt, Value};
use lib_types::Address;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// State and helpers shared by every contract wrapper: the contract's name
/// and address, the client handle, typed call/send helpers, and event
/// fetcher access.
#[derive(Clone)]
pub struct ContractWrapper {
    name: String,
    address: Address,
    client: Arc<dyn ChainClient>,
}

impl ContractWrapper {
    pub fn new(name: impl Into<String>, address: Address, client: Arc<dyn ChainClient>) -> Self {
        Self {
            name: name.into(),
            address,
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn client(&self) -> Arc<dyn ChainClient> {
        self.client.clone()
    }

    fn log_call(&self, method: &str) {
        debug!(contract = %self.name, address = %self.address, method, "contract call");
    }

    /// Read-only call against this contract
    pub async fn call(&self, method: &str, args: Vec<Value>) -> WrapperResult<Vec<Value>> {
        self.log_call(method);
        Ok(self.client.call(self.address, method, args).await?)
    }

    /// Submit a state-mutating invocation
    pub async fn send(
        &self,
        method: &str,
        args: Vec<Value>,
        gas: Option<u64>,
    ) -> WrapperResult<PendingTx> {
        self.log_call(method);
        Ok(self.client.send(self.address, method, args, gas).await?)
    }

    /// Submit and await mining
    pub async fn send_mined(
        &self,
        method: &str,
        args: Vec<Value>,
        gas: Option<u64>,
    ) -> WrapperResult<TxReceipt> {
        let pending = self.send(method, args, gas).await?;
        Ok(self.client.wait_mined(&pending).await?)
    }

    /// Typed fetcher for one of this contract's events
    pub fn event_fetcher<T: DeserializeOwned>(&self, event: &str) -> EventFetcher<T> {
        EventFetcher::new(self.client.clone(), self.address, event)
    }
}

impl fmt::Debug for ContractWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractWrapper")
            .field("name", &self.name)
            .field("address", &self.address)
            .finish()
    }
}
