//! DAO creation orchestration.
//!
//! Two-phase flow against the deployed DaoCreator contract: `forge_org`
//! mints the avatar, token, and reputation in one transaction, then
//! `set_schemes` registers parameter sets and installs the initial scheme
//! roster. Every sub-transaction is awaited mined before the next is
//! submitted, and the whole sequence is announced on the transaction
//! lifecycle feed.

use crate::avatar::AvatarService;
use crate::base::ContractWrapper;
use crate::error::{WrapperError, WrapperResult};
use crate::registry::{SchemeHandle, SchemeKind, SchemeParams, WrapperRegistry};
use crate::voting_machine::{decode_event_address, VotingMachineParams, VotingMachineWrapper};
use lib_chain::{
    forge_org_gas_limit, ArtifactRegistry, ChainClient, EventFetcher, TxEventContext, TxLifecycle,
    TxReceipt, Value,
};
use lib_types::{Address, Amount, Hash, SchemePermissions};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One founding member: address plus initial token and reputation grants
#[derive(Debug, Clone, Deserialize)]
pub struct Founder {
    pub address: Address,
    #[serde(default)]
    pub tokens: Amount,
    #[serde(default)]
    pub reputation: Amount,
}

/// Options for `forge_org`
#[derive(Debug, Clone, Deserialize)]
pub struct ForgeOrgOptions {
    pub name: String,
    pub token_name: String,
    pub token_symbol: String,
    pub founders: Vec<Founder>,
    #[serde(default)]
    pub token_cap: Amount,
    /// When set, the org is forged against the shared universal controller;
    /// otherwise it gets its own controller instance
    #[serde(default = "default_universal_controller")]
    pub universal_controller: bool,
}

fn default_universal_controller() -> bool {
    true
}

/// Outcome of `forge_org`: the mined transaction and the new avatar
#[derive(Debug, Clone)]
pub struct ForgeOrgResult {
    pub tx: TxReceipt,
    pub avatar: Address,
}

/// Voting machine selection and parameters, at the DAO level or per scheme.
///
/// An explicit address pins a machine instance; a name resolves through the
/// registry; with neither, the enclosing default applies. Omitted parameters
/// fall back to the enclosing default's, then to the stock defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaoVotingMachineConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub params: Option<VotingMachineParams>,
}

/// One scheme to install on the new DAO
#[derive(Debug, Clone, Deserialize)]
pub struct SchemeConfig {
    pub name: String,
    #[serde(default)]
    pub address: Option<Address>,
    /// Extra permissions beyond the scheme type's required set
    #[serde(default)]
    pub permissions: SchemePermissions,
    #[serde(default)]
    pub voting_machine_params: Option<DaoVotingMachineConfig>,
}

/// Options for `set_schemes`
#[derive(Debug, Clone, Deserialize)]
pub struct SetSchemesOptions {
    pub avatar: Address,
    pub schemes: Vec<SchemeConfig>,
    /// DAO-wide default voting machine for universal schemes
    #[serde(default)]
    pub voting_machine_params: Option<DaoVotingMachineConfig>,
}

/// `NewOrg` event arguments
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrgArgs {
    #[serde(rename = "_avatar")]
    pub avatar: Address,
}

/// `InitialSchemesSet` event arguments
#[derive(Debug, Clone, Deserialize)]
pub struct InitialSchemesSetArgs {
    #[serde(rename = "_avatar")]
    pub avatar: Address,
}

/// Parameter sets already registered per contract, so a hash is only
/// submitted once per target within one `set_schemes` run
#[derive(Default)]
struct ParamsHashCache {
    seen: HashMap<Address, HashSet<Hash>>,
}

impl ParamsHashCache {
    /// True when this hash has not yet been registered at this contract
    fn insert(&mut self, contract: Address, hash: Hash) -> bool {
        self.seen.entry(contract).or_default().insert(hash)
    }
}

/// A voting machine instance together with the parameter set to register
#[derive(Debug, Clone)]
struct ResolvedMachine {
    machine: VotingMachineWrapper,
    params: VotingMachineParams,
}

/// Wrapper over the deployed DaoCreator contract
pub struct DaoCreatorWrapper {
    base: ContractWrapper,
    artifacts: ArtifactRegistry,
    registry: Arc<WrapperRegistry>,
    avatar: AvatarService,
    lifecycle: TxLifecycle,
    default_voting_machine: Option<String>,
}

impl DaoCreatorWrapper {
    pub fn new(
        address: Address,
        client: Arc<dyn ChainClient>,
        artifacts: ArtifactRegistry,
        registry: Arc<WrapperRegistry>,
        lifecycle: TxLifecycle,
        default_voting_machine: Option<String>,
    ) -> Self {
        Self {
            base: ContractWrapper::new("DaoCreator", address, client.clone()),
            artifacts,
            registry,
            avatar: AvatarService::new(client),
            lifecycle,
            default_voting_machine,
        }
    }

    pub fn address(&self) -> Address {
        self.base.address()
    }

    /// Lifecycle feed carrying kickoff, per-transaction, and completion
    /// events for `forge_org` and `set_schemes`
    pub fn lifecycle(&self) -> &TxLifecycle {
        &self.lifecycle
    }

    pub fn forge_org_transactions_count(&self) -> usize {
        1
    }

    /// Upper bound on the transactions `set_schemes` submits: the final
    /// registration itself, the default machine's parameter set, one
    /// parameter set per scheme, and one per scheme-specific machine
    /// override. Deduplication and parameterless schemes lower the actual
    /// count.
    pub fn set_schemes_transactions_count(&self, options: &SetSchemesOptions) -> usize {
        let overrides = options
            .schemes
            .iter()
            .filter(|s| s.voting_machine_params.is_some())
            .count();
        2 + options.schemes.len() + overrides
    }

    /// Forge a new org: avatar, native token, and native reputation in one
    /// transaction. The avatar address is decoded from the `NewOrg` event.
    pub async fn forge_org(&self, options: &ForgeOrgOptions) -> WrapperResult<ForgeOrgResult> {
        if options.name.is_empty() {
            return Err(WrapperError::MissingArgument("DAO name"));
        }
        if options.token_name.is_empty() {
            return Err(WrapperError::MissingArgument("DAO token name"));
        }
        if options.token_symbol.is_empty() {
            return Err(WrapperError::MissingArgument("DAO token symbol"));
        }
        if options.founders.is_empty() {
            return Err(WrapperError::NoFounders);
        }
        if options.founders.iter().any(|f| f.address.is_zero()) {
            return Err(WrapperError::MissingArgument("founder address"));
        }

        let controller = if options.universal_controller {
            self.artifacts.deployed("UController")?
        } else {
            Address::ZERO
        };

        let ctx = self
            .lifecycle
            .publish_kickoff("forgeOrg", self.forge_org_transactions_count());

        let addresses: Vec<Address> = options.founders.iter().map(|f| f.address).collect();
        let tokens: Vec<Amount> = options.founders.iter().map(|f| f.tokens).collect();
        let reputations: Vec<Amount> = options.founders.iter().map(|f| f.reputation).collect();

        let tx = self
            .base
            .send_mined(
                "forgeOrg",
                vec![
                    options.name.as_str().into(),
                    options.token_name.as_str().into(),
                    options.token_symbol.as_str().into(),
                    addresses.into(),
                    tokens.into(),
                    reputations.into(),
                    controller.into(),
                    options.token_cap.into(),
                ],
                Some(forge_org_gas_limit(options.founders.len())),
            )
            .await?;

        let avatar = decode_event_address(&tx, "NewOrg", "_avatar", "forgeOrg")?;
        ctx.publish_mined(tx.tx_hash);
        ctx.publish_completed();
        Ok(ForgeOrgResult { tx, avatar })
    }

    /// Install the initial scheme roster on a forged org.
    ///
    /// Universal schemes get their voting machine's parameter set and their
    /// own parameter set registered first; simple schemes are installed with
    /// the zero hash. Each parameter set is registered at most once per
    /// contract, and every registration is awaited mined before the final
    /// `setSchemes` is sent.
    pub async fn set_schemes(&self, options: &SetSchemesOptions) -> WrapperResult<TxReceipt> {
        if options.avatar.is_zero() {
            return Err(WrapperError::MissingArgument("avatar address"));
        }

        // resolve every scheme up front so nothing is submitted on bad input
        let mut resolved = Vec::with_capacity(options.schemes.len());
        for config in &options.schemes {
            let handle = self.registry.scheme(&config.name, config.address)?;
            if handle.kind() == SchemeKind::Simple && config.voting_machine_params.is_some() {
                return Err(WrapperError::Unsupported(format!(
                    "scheme {} does not use a voting machine",
                    config.name
                )));
            }
            resolved.push((config, handle));
        }

        let ctx = self
            .lifecycle
            .publish_kickoff("setSchemes", self.set_schemes_transactions_count(options));
        let mut cache = ParamsHashCache::default();

        let default_machine = self.resolve_default_machine(options).await?;
        if let Some(machine) = &default_machine {
            self.register_machine_params(machine, &mut cache, &ctx).await?;
        }

        let mut addresses = Vec::with_capacity(resolved.len());
        let mut hashes = Vec::with_capacity(resolved.len());
        let mut permissions = Vec::with_capacity(resolved.len());

        for (config, handle) in resolved {
            let params_hash = match handle.kind() {
                SchemeKind::Simple => Hash::ZERO,
                SchemeKind::Universal => {
                    let machine = self
                        .resolve_scheme_machine(config, default_machine.as_ref(), options.avatar)
                        .await?;
                    let machine_hash =
                        self.register_machine_params(&machine, &mut cache, &ctx).await?;
                    let scheme_params = SchemeParams {
                        vote_parameters_hash: machine_hash,
                        voting_machine_address: machine.machine.address(),
                    };
                    self.register_scheme_params(&handle, &scheme_params, &mut cache, &ctx)
                        .await?
                }
            };
            addresses.push(handle.address());
            hashes.push(params_hash);
            permissions.push(
                config
                    .permissions
                    .with_required(handle.required_permissions())
                    .to_hex_string(),
            );
        }

        let tx = self
            .base
            .send_mined(
                "setSchemes",
                vec![
                    options.avatar.into(),
                    Value::AddressList(addresses),
                    Value::HashList(hashes),
                    Value::StrList(permissions),
                ],
                None,
            )
            .await?;
        ctx.publish_mined(tx.tx_hash);
        ctx.publish_completed();
        Ok(tx)
    }

    pub fn new_org(&self) -> EventFetcher<NewOrgArgs> {
        self.base.event_fetcher("NewOrg")
    }

    pub fn initial_schemes_set(&self) -> EventFetcher<InitialSchemesSetArgs> {
        self.base.event_fetcher("InitialSchemesSet")
    }

    /// DAO-wide default machine, when one is configured through the options
    /// or the wrapper itself. Its parameter set starts from the options,
    /// with a zero reputation filled in from the avatar's native reputation.
    async fn resolve_default_machine(
        &self,
        options: &SetSchemesOptions,
    ) -> WrapperResult<Option<ResolvedMachine>> {
        let cfg = options.voting_machine_params.as_ref();
        let machine = if let Some(address) = cfg.and_then(|c| c.address) {
            VotingMachineWrapper::at(address, self.base.client())
        } else if let Some(name) = cfg
            .and_then(|c| c.name.as_deref())
            .or(self.default_voting_machine.as_deref())
        {
            self.registry.voting_machine(name, None)?
        } else {
            return Ok(None);
        };

        let mut params = cfg.and_then(|c| c.params.clone()).unwrap_or_default();
        if params.reputation.is_zero() {
            params.reputation = self.avatar.native_reputation_address(options.avatar).await?;
        }
        Ok(Some(ResolvedMachine { machine, params }))
    }

    async fn resolve_scheme_machine(
        &self,
        config: &SchemeConfig,
        default: Option<&ResolvedMachine>,
        avatar: Address,
    ) -> WrapperResult<ResolvedMachine> {
        let no_machine = || {
            WrapperError::Unsupported(format!(
                "universal scheme {} requires a voting machine, but none was supplied",
                config.name
            ))
        };

        let Some(cfg) = config.voting_machine_params.as_ref() else {
            return default.cloned().ok_or_else(no_machine);
        };

        let machine = if let Some(address) = cfg.address {
            VotingMachineWrapper::at(address, self.base.client())
        } else if let Some(name) = cfg.name.as_deref() {
            self.registry.voting_machine(name, None)?
        } else {
            default.ok_or_else(no_machine)?.machine.clone()
        };

        let mut params = cfg
            .params
            .clone()
            .or_else(|| default.map(|d| d.params.clone()))
            .unwrap_or_default();
        if params.reputation.is_zero() {
            params.reputation = self.avatar.native_reputation_address(avatar).await?;
        }
        Ok(ResolvedMachine { machine, params })
    }

    /// Register a machine parameter set unless its hash was already
    /// registered at this machine in the current run
    async fn register_machine_params(
        &self,
        resolved: &ResolvedMachine,
        cache: &mut ParamsHashCache,
        ctx: &TxEventContext,
    ) -> WrapperResult<Hash> {
        let hash = resolved.machine.parameters_hash(&resolved.params).await?;
        if cache.insert(resolved.machine.address(), hash) {
            let (_, pending) = resolved.machine.set_parameters(&resolved.params).await?;
            let receipt = self.base.client().wait_mined(&pending).await?;
            ctx.publish_mined(receipt.tx_hash);
        }
        Ok(hash)
    }

    async fn register_scheme_params(
        &self,
        handle: &SchemeHandle,
        params: &SchemeParams,
        cache: &mut ParamsHashCache,
        ctx: &TxEventContext,
    ) -> WrapperResult<Hash> {
        let hash = handle.parameters_hash(params).await?;
        if cache.insert(handle.address(), hash) {
            let (_, pending) = handle.set_parameters(params).await?;
            let receipt = self.base.client().wait_mined(&pending).await?;
            ctx.publish_mined(receipt.tx_hash);
        }
        Ok(hash)
    }
}
