//! Avatar queries.

use crate::error::WrapperResult;
use lib_chain::{expect_return, ChainClient, Value};
use lib_types::Address;
use std::sync::Arc;

/// Read-only queries against avatar contracts
#[derive(Clone)]
pub struct AvatarService {
    client: Arc<dyn ChainClient>,
}

impl AvatarService {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    /// Address of the avatar's native reputation contract
    pub async fn native_reputation_address(&self, avatar: Address) -> WrapperResult<Address> {
        let ret = self
            .client
            .call(avatar, "nativeReputation", Vec::<Value>::new())
            .await?;
        Ok(expect_return(&ret, 0, "nativeReputation")?.as_address("nativeReputation")?)
    }
}
