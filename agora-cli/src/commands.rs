//! Command orchestration.
//!
//! Each command takes the chain client and configuration explicitly, so the
//! same paths run against the scripted test client.

use anyhow::Result;
use lib_chain::{max_gas_limit, ChainClient, ChainConfig, TxLifecycle, TxReceipt};
use lib_types::{Address, Hash};
use lib_wrappers::{
    DaoCreatorWrapper, ForgeOrgOptions, ForgeOrgResult, SetSchemesOptions, VotingMachineParams,
    VotingMachineWrapper, WrapperRegistry,
};
use std::fs;
use std::sync::Arc;
use tracing::info;

/// Outcome of `bootstrap-voting-machine`
#[derive(Debug)]
pub struct BootstrapResult {
    pub machine: Address,
    pub parameters_hash: Hash,
}

/// Deploy a fresh voting machine staking with `stake_token`, then register
/// the stock parameter set on it
pub async fn bootstrap_voting_machine(
    client: Arc<dyn ChainClient>,
    stake_token: Address,
) -> Result<BootstrapResult> {
    let address = client
        .deploy(
            "GenesisProtocol",
            vec![stake_token.into()],
            Some(max_gas_limit()),
        )
        .await?;
    info!(machine = %address, "voting machine deployed");

    let machine = VotingMachineWrapper::at(address, client.clone());
    let (parameters_hash, pending) = machine
        .set_parameters(&VotingMachineParams::default())
        .await?;
    client.wait_mined(&pending).await?;

    Ok(BootstrapResult {
        machine: address,
        parameters_hash,
    })
}

/// Forge a new org from a JSON options file
pub async fn forge_org(
    client: Arc<dyn ChainClient>,
    config: &ChainConfig,
    options_path: &str,
) -> Result<ForgeOrgResult> {
    let options: ForgeOrgOptions = read_options(options_path)?;
    let creator = dao_creator(client, config)?;
    Ok(creator.forge_org(&options).await?)
}

/// Install the initial scheme roster from a JSON options file
pub async fn set_schemes(
    client: Arc<dyn ChainClient>,
    config: &ChainConfig,
    options_path: &str,
) -> Result<TxReceipt> {
    let options: SetSchemesOptions = read_options(options_path)?;
    let creator = dao_creator(client, config)?;
    Ok(creator.set_schemes(&options).await?)
}

fn dao_creator(client: Arc<dyn ChainClient>, config: &ChainConfig) -> Result<DaoCreatorWrapper> {
    let artifacts = config.artifact_registry();
    let address = artifacts.deployed("DaoCreator")?;
    let registry = Arc::new(WrapperRegistry::standard(client.clone(), &artifacts));
    Ok(DaoCreatorWrapper::new(
        address,
        client,
        artifacts,
        registry,
        TxLifecycle::new(),
        config.default_voting_machine.clone(),
    ))
}

fn read_options<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_chain::testing::MockChain;
    use lib_chain::Value;
    use serde_json::json;
    use std::io::Write;

    /// The scripted client allocates deploy addresses deterministically, so
    /// a throwaway instance predicts the address the command will get
    async fn first_deploy_address() -> Address {
        let probe = MockChain::new();
        probe.deploy("GenesisProtocol", vec![], None).await.unwrap()
    }

    fn options_file(value: serde_json::Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{value}").unwrap();
        file
    }

    #[tokio::test]
    async fn test_bootstrap_deploys_and_registers_params() {
        let chain = Arc::new(MockChain::new());
        let machine = first_deploy_address().await;
        let hash = Hash::new([0x42; 32]);
        chain.stub_call(machine, "getParametersHash", vec![Value::Hash(hash)]);

        let stake_token = Address::new([7u8; 20]);
        let result = bootstrap_voting_machine(chain.clone(), stake_token)
            .await
            .unwrap();
        assert_eq!(result.machine, machine);
        assert_eq!(result.parameters_hash, hash);

        let deploys = chain.deploys();
        assert_eq!(deploys.len(), 1);
        assert_eq!(deploys[0].artifact, "GenesisProtocol");
        assert_eq!(deploys[0].args, vec![Value::Address(stake_token)]);
        assert_eq!(deploys[0].gas, Some(max_gas_limit()));

        let sent = chain.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, machine);
        assert_eq!(sent[0].method, "setParameters");
    }

    #[tokio::test]
    async fn test_forge_org_reads_options_from_json() {
        let chain = Arc::new(MockChain::new());
        let creator_addr = Address::new([0xc0; 20]);
        let controller = Address::new([0xcc; 20]);
        let avatar = Address::new([0xaa; 20]);
        chain.stub_receipt_event("forgeOrg", "NewOrg", json!({ "_avatar": avatar }));

        let config = ChainConfig {
            contracts: [
                ("DaoCreator".to_string(), creator_addr),
                ("UController".to_string(), controller),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        };
        let file = options_file(json!({
            "name": "Agora",
            "token_name": "Agora Token",
            "token_symbol": "AGT",
            "founders": [
                { "address": Address::new([1u8; 20]), "tokens": "1000", "reputation": 10 }
            ]
        }));

        let result = forge_org(chain.clone(), &config, file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(result.avatar, avatar);

        let sent = chain.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, creator_addr);
        assert_eq!(sent[0].method, "forgeOrg");
        // universal controller by default
        assert_eq!(sent[0].args[6], Value::Address(controller));
    }

    #[tokio::test]
    async fn test_set_schemes_uses_configured_default_machine() {
        let chain = Arc::new(MockChain::new());
        let creator_addr = Address::new([0xc0; 20]);
        let machine = Address::new([0x1a; 20]);
        let scheme = Address::new([0x2a; 20]);
        let avatar = Address::new([0xaa; 20]);

        chain.stub_call(
            avatar,
            "nativeReputation",
            vec![Value::Address(Address::new([0xee; 20]))],
        );
        chain.stub_call(
            machine,
            "getParametersHash",
            vec![Value::Hash(Hash::new([0x11; 32]))],
        );
        chain.stub_call(
            scheme,
            "getParametersHash",
            vec![Value::Hash(Hash::new([0x22; 32]))],
        );

        let config = ChainConfig {
            default_voting_machine: Some("AbsoluteVote".to_string()),
            contracts: [
                ("DaoCreator".to_string(), creator_addr),
                ("AbsoluteVote".to_string(), machine),
                ("ContributionReward".to_string(), scheme),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        };
        let file = options_file(json!({
            "avatar": avatar,
            "schemes": [{ "name": "ContributionReward" }]
        }));

        let receipt = set_schemes(chain.clone(), &config, file.path().to_str().unwrap())
            .await
            .unwrap();

        let sent = chain.sent();
        let last = sent.last().unwrap();
        assert_eq!(last.method, "setSchemes");
        assert_eq!(last.to, creator_addr);
        assert_eq!(receipt.tx_hash, last.hash);
    }

    #[tokio::test]
    async fn test_commands_require_dao_creator_deployment() {
        let chain = Arc::new(MockChain::new());
        let file = options_file(json!({
            "avatar": Address::new([0xaa; 20]),
            "schemes": []
        }));

        let err = set_schemes(chain, &ChainConfig::default(), file.path().to_str().unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("DaoCreator has not been deployed"));
    }
}
