//! Chain access layer for the Agora bindings.
//!
//! Everything that talks to a node lives here: the `ChainClient` seam, its
//! JSON-RPC implementation, typed event fetchers, the transaction lifecycle
//! publisher, deployment lookup, gas schedule, and configuration loading.
//! Signing, ABI encoding, and transport policy are the node client's concern;
//! this crate only shapes requests and interprets returns.

pub mod artifacts;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod gas;
pub mod lifecycle;
pub mod rpc;
pub mod testing;
pub mod value;

pub use artifacts::ArtifactRegistry;
pub use client::{ChainClient, EventSubscription, PendingTx, RawEvent, TxReceipt};
pub use config::{default_config_path, load_config, ChainConfig};
pub use error::{ChainError, ChainResult};
pub use events::{DecodedEvent, EventFetcher, EventStream};
pub use gas::{forge_org_gas_limit, max_gas_limit};
pub use lifecycle::{TxEventContext, TxLifecycle, TxLifecycleEvent};
pub use rpc::RpcClient;
pub use value::{expect_return, Value};
