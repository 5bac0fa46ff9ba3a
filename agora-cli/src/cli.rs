//! Argument parsing and dispatch.

use crate::commands;
use anyhow::Result;
use clap::{Parser, Subcommand};
use lib_chain::{load_config, ChainClient, RpcClient};
use lib_types::Address;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Agora governance CLI
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(name = "agora-cli")]
pub struct AgoraCli {
    /// Configuration file path
    #[arg(short, long, env = "AGORA_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, env = "AGORA_VERBOSE")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: AgoraCommand,
}

/// Agora governance commands
#[derive(Subcommand, Debug, Clone)]
pub enum AgoraCommand {
    /// Deploy a fresh voting machine and register its default parameters
    BootstrapVotingMachine {
        /// Token the machine stakes with
        #[arg(long)]
        stake_token: Address,
    },

    /// Forge a new org from a JSON options file
    ForgeOrg {
        /// Path to a JSON file with the forge options
        #[arg(short, long)]
        options: String,
    },

    /// Install the initial scheme roster from a JSON options file
    SetSchemes {
        /// Path to a JSON file with the scheme options
        #[arg(short, long)]
        options: String,
    },
}

pub async fn run_cli() -> Result<()> {
    let cli = AgoraCli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let client: Arc<dyn ChainClient> = Arc::new(RpcClient::new(config.resolve_endpoint()));

    match cli.command {
        AgoraCommand::BootstrapVotingMachine { stake_token } => {
            let result = commands::bootstrap_voting_machine(client, stake_token).await?;
            println!("voting machine deployed at {}", result.machine);
            println!("default parameters hash {}", result.parameters_hash);
        }
        AgoraCommand::ForgeOrg { options } => {
            let result = commands::forge_org(client, &config, &options).await?;
            println!("org forged, avatar {}", result.avatar);
            println!("tx {}", result.tx.tx_hash);
        }
        AgoraCommand::SetSchemes { options } => {
            let receipt = commands::set_schemes(client, &config, &options).await?;
            println!("schemes set, tx {}", receipt.tx_hash);
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_bootstrap_command() {
        let cli = AgoraCli::parse_from([
            "agora-cli",
            "bootstrap-voting-machine",
            "--stake-token",
            "0x0101010101010101010101010101010101010101",
        ]);
        match cli.command {
            AgoraCommand::BootstrapVotingMachine { stake_token } => {
                assert_eq!(stake_token, Address::new([1u8; 20]));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_malformed_stake_token() {
        let result = AgoraCli::try_parse_from([
            "agora-cli",
            "bootstrap-voting-machine",
            "--stake-token",
            "0x01",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parses_forge_org_with_config() {
        let cli = AgoraCli::parse_from([
            "agora-cli",
            "--config",
            "agora.toml",
            "forge-org",
            "--options",
            "org.json",
        ]);
        assert_eq!(cli.config.as_deref(), Some("agora.toml"));
        match cli.command {
            AgoraCommand::ForgeOrg { options } => assert_eq!(options, "org.json"),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
