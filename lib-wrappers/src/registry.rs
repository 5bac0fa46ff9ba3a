//! Wrapper resolution.
//!
//! Scheme types and voting machines are declared here by name, each with
//! its kind and required permissions. Whether a scheme takes voting
//! parameters is declared at registration, never probed from the contract.

use crate::base::ContractWrapper;
use crate::error::{WrapperError, WrapperResult};
use crate::voting_machine::VotingMachineWrapper;
use lib_chain::{expect_return, ArtifactRegistry, ChainClient, PendingTx, Value};
use lib_types::{Address, Hash, SchemePermissions};
use std::collections::HashMap;
use std::sync::Arc;

/// Whether a scheme is parameterized by a voting machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeKind {
    /// Registered with a parameters hash that references a voting machine
    Universal,
    /// Registered with the zero hash; takes no voting parameters
    Simple,
}

/// A declared scheme type
#[derive(Debug, Clone)]
pub struct SchemeEntry {
    pub kind: SchemeKind,
    pub required_permissions: SchemePermissions,
    pub deployed: Option<Address>,
}

/// Parameter set of a universal scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemeParams {
    pub vote_parameters_hash: Hash,
    pub voting_machine_address: Address,
}

/// Resolved scheme instance: address, kind, required permissions, and the
/// parameter-hash surface
#[derive(Debug, Clone)]
pub struct SchemeHandle {
    base: ContractWrapper,
    kind: SchemeKind,
    required_permissions: SchemePermissions,
}

impl SchemeHandle {
    pub fn address(&self) -> Address {
        self.base.address()
    }

    pub fn name(&self) -> &str {
        self.base.name()
    }

    pub fn kind(&self) -> SchemeKind {
        self.kind
    }

    pub fn required_permissions(&self) -> SchemePermissions {
        self.required_permissions
    }

    /// Hash identifying a parameter set, without registering it
    pub async fn parameters_hash(&self, params: &SchemeParams) -> WrapperResult<Hash> {
        let ret = self
            .base
            .call("getParametersHash", marshal_scheme_params(params))
            .await?;
        Ok(expect_return(&ret, 0, "getParametersHash")?.as_hash("getParametersHash")?)
    }

    /// Register a parameter set. Returns its hash and the pending
    /// registration transaction; callers serialize by awaiting it mined.
    pub async fn set_parameters(&self, params: &SchemeParams) -> WrapperResult<(Hash, PendingTx)> {
        let hash = self.parameters_hash(params).await?;
        let pending = self
            .base
            .send("setParameters", marshal_scheme_params(params), None)
            .await?;
        Ok((hash, pending))
    }
}

fn marshal_scheme_params(params: &SchemeParams) -> Vec<Value> {
    vec![
        params.vote_parameters_hash.into(),
        params.voting_machine_address.into(),
    ]
}

/// Registry of known scheme types and voting machines
pub struct WrapperRegistry {
    client: Arc<dyn ChainClient>,
    schemes: HashMap<String, SchemeEntry>,
    voting_machines: HashMap<String, Option<Address>>,
}

impl WrapperRegistry {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self {
            client,
            schemes: HashMap::new(),
            voting_machines: HashMap::new(),
        }
    }

    /// Registry pre-populated with the standard scheme catalog, with
    /// deployed addresses pulled from the artifact registry where present
    pub fn standard(client: Arc<dyn ChainClient>, artifacts: &ArtifactRegistry) -> Self {
        let mut registry = Self::new(client);

        for name in ["AbsoluteVote", "GenesisProtocol"] {
            registry.register_voting_machine(name, artifacts.get(name));
        }

        let catalog: [(&str, SchemeKind, SchemePermissions); 7] = [
            (
                "SchemeRegistrar",
                SchemeKind::Universal,
                SchemePermissions::REGISTERED | SchemePermissions::CAN_REGISTER_SCHEMES,
            ),
            (
                "UpgradeScheme",
                SchemeKind::Universal,
                SchemePermissions::REGISTERED
                    | SchemePermissions::CAN_REGISTER_SCHEMES
                    | SchemePermissions::CAN_UPGRADE_CONTROLLER,
            ),
            (
                "GlobalConstraintRegistrar",
                SchemeKind::Universal,
                SchemePermissions::REGISTERED
                    | SchemePermissions::CAN_ADD_REMOVE_GLOBAL_CONSTRAINTS,
            ),
            ("ContributionReward", SchemeKind::Universal, SchemePermissions::REGISTERED),
            ("VestingScheme", SchemeKind::Universal, SchemePermissions::REGISTERED),
            (
                "VoteInOrganizationScheme",
                SchemeKind::Universal,
                SchemePermissions::REGISTERED,
            ),
            ("GenesisProtocol", SchemeKind::Universal, SchemePermissions::REGISTERED),
        ];
        for (name, kind, permissions) in catalog {
            registry.register_scheme(name, kind, permissions, artifacts.get(name));
        }

        registry
    }

    pub fn register_voting_machine(&mut self, name: impl Into<String>, deployed: Option<Address>) {
        self.voting_machines.insert(name.into(), deployed);
    }

    pub fn register_scheme(
        &mut self,
        name: impl Into<String>,
        kind: SchemeKind,
        required_permissions: SchemePermissions,
        deployed: Option<Address>,
    ) {
        self.schemes.insert(
            name.into(),
            SchemeEntry {
                kind,
                required_permissions,
                deployed,
            },
        );
    }

    /// Resolve a voting machine by name. An explicit address pins the
    /// instance; otherwise the registered deployment is used.
    pub fn voting_machine(
        &self,
        name: &str,
        address: Option<Address>,
    ) -> WrapperResult<VotingMachineWrapper> {
        let deployed = self
            .voting_machines
            .get(name)
            .ok_or_else(|| WrapperError::NotFound(format!("voting machine {name} is not registered")))?;
        let address = address.or(*deployed).ok_or_else(|| {
            WrapperError::NotFound(format!("voting machine {name} has no deployed address"))
        })?;
        Ok(VotingMachineWrapper::at(address, self.client.clone()))
    }

    /// Resolve a scheme by name. An explicit address pins the instance;
    /// otherwise the registered deployment is used. Unregistered names
    /// cannot be classified and fail.
    pub fn scheme(&self, name: &str, address: Option<Address>) -> WrapperResult<SchemeHandle> {
        let entry = self
            .schemes
            .get(name)
            .ok_or_else(|| WrapperError::NotFound(format!("scheme {name} is not registered")))?;
        let address = address.or(entry.deployed).ok_or_else(|| {
            WrapperError::NotFound(format!("scheme {name} has no deployed address"))
        })?;
        Ok(SchemeHandle {
            base: ContractWrapper::new(name, address, self.client.clone()),
            kind: entry.kind,
            required_permissions: entry.required_permissions,
        })
    }
}
