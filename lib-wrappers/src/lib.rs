//! Contract wrappers for Agora governance.
//!
//! Typed façades over the deployed governance contracts: the voting machine
//! surface, the DAO creation orchestrator, and the registry that resolves
//! scheme names to wrapper instances. All chain interaction goes through the
//! `ChainClient` seam from lib-chain.

pub mod avatar;
pub mod base;
pub mod dao_creator;
pub mod error;
pub mod registry;
pub mod voting_machine;

pub use avatar::AvatarService;
pub use base::ContractWrapper;
pub use dao_creator::{
    DaoCreatorWrapper, DaoVotingMachineConfig, Founder, ForgeOrgOptions, ForgeOrgResult,
    SchemeConfig, SetSchemesOptions,
};
pub use error::{WrapperError, WrapperResult};
pub use registry::{SchemeEntry, SchemeHandle, SchemeKind, SchemeParams, WrapperRegistry};
pub use voting_machine::{
    ProposalResult, ProposeOptions, VotableProposalStream, VoteRange, VotingMachineParams,
    VotingMachineWrapper,
};
