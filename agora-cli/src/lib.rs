//! Agora CLI library.
//!
//! One-off governance operations against a deployed contract set: deploying
//! and parameterizing a fresh voting machine, forging an org, and installing
//! its initial schemes. Argument parsing lives in `cli`, command
//! orchestration in `commands`.

pub mod cli;
pub mod commands;

pub use cli::{run_cli, AgoraCli, AgoraCommand};
