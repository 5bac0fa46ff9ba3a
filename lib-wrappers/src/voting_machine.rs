//! Voting machine wrapper.
//!
//! Façade over one deployed voting-machine contract. Every operation
//! validates its inputs before submitting anything; choice bounds and vote
//! ranges are queried from the contract at call time, never cached.

use crate::base::ContractWrapper;
use crate::error::{WrapperError, WrapperResult};
use lib_chain::{
    expect_return, ChainClient, ChainError, DecodedEvent, EventFetcher, EventStream, PendingTx,
    TxReceipt, Value,
};
use lib_types::{Address, Amount, Hash};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Options for `propose`
#[derive(Debug, Clone, Deserialize)]
pub struct ProposeOptions {
    pub avatar_address: Address,
    pub executable: Address,
    pub num_of_choices: u32,
    #[serde(default)]
    pub proposal_parameters: Option<Hash>,
    #[serde(default)]
    pub proposer_address: Option<Address>,
}

/// Outcome of `propose`: the mined transaction and the new proposal's id
#[derive(Debug, Clone)]
pub struct ProposalResult {
    pub tx: TxReceipt,
    pub proposal_id: Hash,
}

/// Machine-reported bounds on the number of choices a proposal may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteRange {
    pub min_vote: u32,
    pub max_vote: u32,
}

/// `NewProposal` event arguments
#[derive(Debug, Clone, Deserialize)]
pub struct NewProposalArgs {
    #[serde(rename = "_proposalId")]
    pub proposal_id: Hash,
    #[serde(rename = "_avatar")]
    pub avatar: Address,
    #[serde(rename = "_numOfChoices")]
    pub num_of_choices: u32,
    #[serde(rename = "_proposer")]
    pub proposer: Address,
    #[serde(rename = "_paramsHash")]
    pub params_hash: Hash,
}

/// `CancelProposal` event arguments
#[derive(Debug, Clone, Deserialize)]
pub struct CancelProposalArgs {
    #[serde(rename = "_proposalId")]
    pub proposal_id: Hash,
}

/// `ExecuteProposal` event arguments
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteProposalArgs {
    #[serde(rename = "_proposalId")]
    pub proposal_id: Hash,
    #[serde(rename = "_decision")]
    pub decision: u32,
}

/// `VoteProposal` event arguments
#[derive(Debug, Clone, Deserialize)]
pub struct VoteProposalArgs {
    #[serde(rename = "_proposalId")]
    pub proposal_id: Hash,
    #[serde(rename = "_voter")]
    pub voter: Address,
    #[serde(rename = "_vote")]
    pub vote: u32,
    #[serde(rename = "_reputation")]
    pub reputation: Amount,
}

/// `CancelVoting` event arguments
#[derive(Debug, Clone, Deserialize)]
pub struct CancelVotingArgs {
    #[serde(rename = "_proposalId")]
    pub proposal_id: Hash,
    #[serde(rename = "_voter")]
    pub voter: Address,
}

/// Named parameter set of a voting machine.
///
/// Registered on-chain with `setParameters`; the resulting hash identifies
/// the set and is what proposals and schemes reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingMachineParams {
    pub reputation: Address,
    pub pre_boosted_vote_required_percentage: u128,
    pub pre_boosted_vote_period_limit: u128,
    pub boosted_vote_period_limit: u128,
    pub threshold_const_a: u128,
    pub threshold_const_b: u128,
    pub minimum_staking_fee: u128,
    pub quiet_ending_period: u128,
    pub proposing_rep_reward_const_a: u128,
    pub proposing_rep_reward_const_b: u128,
    pub staker_fee_ratio_for_voters: u128,
    pub voters_reputation_loss_ratio: u128,
    pub voters_gain_rep_ratio_from_lost_rep: u128,
    pub dao_bounty_const: u128,
    pub dao_bounty_limit: u128,
}

impl Default for VotingMachineParams {
    fn default() -> Self {
        Self {
            reputation: Address::ZERO,
            pre_boosted_vote_required_percentage: 50,
            pre_boosted_vote_period_limit: 5_184_000,
            boosted_vote_period_limit: 604_800,
            threshold_const_a: 2_000_000_000_000_000_000,
            threshold_const_b: 10,
            minimum_staking_fee: 0,
            quiet_ending_period: 7_200,
            proposing_rep_reward_const_a: 5_000_000_000_000_000_000,
            proposing_rep_reward_const_b: 5_000_000_000_000_000_000,
            staker_fee_ratio_for_voters: 50,
            voters_reputation_loss_ratio: 1,
            voters_gain_rep_ratio_from_lost_rep: 80,
            dao_bounty_const: 75,
            dao_bounty_limit: 100_000_000_000_000_000_000,
        }
    }
}

impl VotingMachineParams {
    /// Default parameter set bound to a reputation contract
    pub fn for_reputation(reputation: Address) -> Self {
        Self {
            reputation,
            ..Self::default()
        }
    }

    // positional order is fixed by the contract
    fn marshal(&self) -> Vec<Value> {
        vec![
            self.reputation.into(),
            Value::UintList(vec![
                self.pre_boosted_vote_required_percentage,
                self.pre_boosted_vote_period_limit,
                self.boosted_vote_period_limit,
                self.threshold_const_a,
                self.threshold_const_b,
                self.minimum_staking_fee,
                self.quiet_ending_period,
                self.proposing_rep_reward_const_a,
                self.proposing_rep_reward_const_b,
                self.staker_fee_ratio_for_voters,
                self.voters_reputation_loss_ratio,
                self.voters_gain_rep_ratio_from_lost_rep,
                self.dao_bounty_const,
                self.dao_bounty_limit,
            ]),
        ]
    }
}

/// Wrapper over one deployed voting machine
#[derive(Debug, Clone)]
pub struct VotingMachineWrapper {
    base: ContractWrapper,
}

impl VotingMachineWrapper {
    /// Bind to a deployed machine at a known address.
    ///
    /// Voting machines are never deployed through this wrapper; `at` is the
    /// only way to obtain one.
    pub fn at(address: Address, client: Arc<dyn ChainClient>) -> Self {
        Self {
            base: ContractWrapper::new("VotingMachine", address, client),
        }
    }

    pub fn address(&self) -> Address {
        self.base.address()
    }

    /// Create a proposal.
    ///
    /// The choice count must lie within the machine's allowed range,
    /// queried live. Missing parameters hash and proposer default to the
    /// zero hash and zero address.
    pub async fn propose(&self, options: ProposeOptions) -> WrapperResult<ProposalResult> {
        if options.avatar_address.is_zero() {
            return Err(WrapperError::MissingArgument("avatar address"));
        }
        if options.executable.is_zero() {
            return Err(WrapperError::MissingArgument("executable"));
        }
        let range = self.get_allowed_range_of_choices().await?;
        if options.num_of_choices < range.min_vote || options.num_of_choices > range.max_vote {
            return Err(WrapperError::ChoicesOutOfRange {
                given: options.num_of_choices,
                min: range.min_vote,
                max: range.max_vote,
            });
        }

        let proposal_parameters = options.proposal_parameters.unwrap_or(Hash::ZERO);
        let proposer = options.proposer_address.unwrap_or(Address::ZERO);

        let tx = self
            .base
            .send_mined(
                "propose",
                vec![
                    options.num_of_choices.into(),
                    proposal_parameters.into(),
                    options.avatar_address.into(),
                    options.executable.into(),
                    proposer.into(),
                ],
                None,
            )
            .await?;

        let proposal_id = decode_event_hash(&tx, "NewProposal", "_proposalId", "propose")?;
        Ok(ProposalResult { tx, proposal_id })
    }

    pub async fn cancel_proposal(&self, proposal_id: Hash) -> WrapperResult<TxReceipt> {
        require_proposal_id(proposal_id)?;
        self.base
            .send_mined("cancelProposal", vec![proposal_id.into()], None)
            .await
    }

    pub async fn cancel_vote(&self, proposal_id: Hash) -> WrapperResult<TxReceipt> {
        require_proposal_id(proposal_id)?;
        self.base
            .send_mined("cancelVote", vec![proposal_id.into()], None)
            .await
    }

    pub async fn execute(&self, proposal_id: Hash) -> WrapperResult<TxReceipt> {
        require_proposal_id(proposal_id)?;
        self.base
            .send_mined("execute", vec![proposal_id.into()], None)
            .await
    }

    /// Vote on behalf of another voter; only valid when the machine is
    /// owned by the caller
    pub async fn owner_vote(
        &self,
        proposal_id: Hash,
        vote: u32,
        voter_address: Address,
    ) -> WrapperResult<TxReceipt> {
        require_proposal_id(proposal_id)?;
        self.validate_vote(vote, proposal_id).await?;
        if voter_address.is_zero() {
            return Err(WrapperError::MissingArgument("voter address"));
        }
        self.base
            .send_mined(
                "ownerVote",
                vec![proposal_id.into(), vote.into(), voter_address.into()],
                None,
            )
            .await
    }

    pub async fn vote(&self, proposal_id: Hash, vote: u32) -> WrapperResult<TxReceipt> {
        require_proposal_id(proposal_id)?;
        self.validate_vote(vote, proposal_id).await?;
        self.base
            .send_mined("vote", vec![proposal_id.into(), vote.into()], None)
            .await
    }

    /// Vote with an explicit reputation weight.
    ///
    /// The contract takes a second amount slot that is always zero; the
    /// slot is still marshaled.
    pub async fn vote_with_specified_amounts(
        &self,
        proposal_id: Hash,
        vote: u32,
        reputation: Amount,
    ) -> WrapperResult<TxReceipt> {
        require_proposal_id(proposal_id)?;
        self.validate_vote(vote, proposal_id).await?;
        self.base
            .send_mined(
                "voteWithSpecifiedAmounts",
                vec![
                    proposal_id.into(),
                    vote.into(),
                    reputation.into(),
                    Amount::ZERO.into(),
                ],
                None,
            )
            .await
    }

    pub async fn get_number_of_choices(&self, proposal_id: Hash) -> WrapperResult<u32> {
        require_proposal_id(proposal_id)?;
        let ret = self
            .base
            .call("getNumberOfChoices", vec![proposal_id.into()])
            .await?;
        uint32(&ret, "getNumberOfChoices")
    }

    pub async fn is_votable(&self, proposal_id: Hash) -> WrapperResult<bool> {
        require_proposal_id(proposal_id)?;
        let ret = self.base.call("isVotable", vec![proposal_id.into()]).await?;
        Ok(expect_return(&ret, 0, "isVotable")?.as_bool("isVotable")?)
    }

    /// Reputation currently voted for one choice
    pub async fn vote_status(&self, proposal_id: Hash, vote: u32) -> WrapperResult<Amount> {
        require_proposal_id(proposal_id)?;
        self.validate_vote(vote, proposal_id).await?;
        let ret = self
            .base
            .call("voteStatus", vec![proposal_id.into(), vote.into()])
            .await?;
        Ok(Amount::new(
            expect_return(&ret, 0, "voteStatus")?.as_uint("voteStatus")?,
        ))
    }

    pub async fn is_abstain_allow(&self) -> WrapperResult<bool> {
        let ret = self.base.call("isAbstainAllow", vec![]).await?;
        Ok(expect_return(&ret, 0, "isAbstainAllow")?.as_bool("isAbstainAllow")?)
    }

    /// Reputation voted per choice, with the abstain count at index 0
    /// (zero when the machine disallows abstaining).
    ///
    /// The per-choice reads go straight to the contract; the final index
    /// lies one past the choice count and would be rejected by
    /// `vote_status`'s own validation.
    pub async fn get_current_vote_status(&self, proposal_id: Hash) -> WrapperResult<Vec<Amount>> {
        require_proposal_id(proposal_id)?;
        let mut num_choices = self.get_number_of_choices(proposal_id).await?;
        if !self.is_abstain_allow().await? {
            num_choices += 1;
        }

        let mut statuses = Vec::with_capacity(num_choices as usize + 1);
        for vote in 0..=num_choices {
            let ret = self
                .base
                .call("voteStatus", vec![proposal_id.into(), vote.into()])
                .await?;
            statuses.push(Amount::new(
                expect_return(&ret, 0, "voteStatus")?.as_uint("voteStatus")?,
            ));
        }
        Ok(statuses)
    }

    pub async fn get_allowed_range_of_choices(&self) -> WrapperResult<VoteRange> {
        let ret = self.base.call("getAllowedRangeOfChoices", vec![]).await?;
        let min_vote = uint32_at(&ret, 0, "getAllowedRangeOfChoices")?;
        let max_vote = uint32_at(&ret, 1, "getAllowedRangeOfChoices")?;
        Ok(VoteRange { min_vote, max_vote })
    }

    /// Hash identifying a parameter set, without registering it
    pub async fn parameters_hash(&self, params: &VotingMachineParams) -> WrapperResult<Hash> {
        let ret = self.base.call("getParametersHash", params.marshal()).await?;
        Ok(expect_return(&ret, 0, "getParametersHash")?.as_hash("getParametersHash")?)
    }

    /// Register a parameter set. Returns its hash and the pending
    /// registration transaction; callers serialize by awaiting it mined.
    pub async fn set_parameters(
        &self,
        params: &VotingMachineParams,
    ) -> WrapperResult<(Hash, PendingTx)> {
        let hash = self.parameters_hash(params).await?;
        let pending = self.base.send("setParameters", params.marshal(), None).await?;
        Ok((hash, pending))
    }

    pub fn new_proposal(&self) -> EventFetcher<NewProposalArgs> {
        self.base.event_fetcher("NewProposal")
    }

    pub fn cancel_proposal_events(&self) -> EventFetcher<CancelProposalArgs> {
        self.base.event_fetcher("CancelProposal")
    }

    pub fn execute_proposal_events(&self) -> EventFetcher<ExecuteProposalArgs> {
        self.base.event_fetcher("ExecuteProposal")
    }

    pub fn vote_proposal_events(&self) -> EventFetcher<VoteProposalArgs> {
        self.base.event_fetcher("VoteProposal")
    }

    pub fn cancel_voting_events(&self) -> EventFetcher<CancelVotingArgs> {
        self.base.event_fetcher("CancelVoting")
    }

    /// Live stream of proposals that are votable at the time they are
    /// observed. Non-votable proposals are dropped, as are proposals whose
    /// votability cannot be determined.
    pub async fn votable_proposals(&self) -> WrapperResult<VotableProposalStream> {
        let stream = self.new_proposal().watch().await?;
        Ok(VotableProposalStream {
            machine: self.clone(),
            stream,
        })
    }

    async fn validate_vote(&self, vote: u32, proposal_id: Hash) -> WrapperResult<()> {
        let num_choices = self.get_number_of_choices(proposal_id).await?;
        if vote > num_choices {
            return Err(WrapperError::InvalidVote { vote, num_choices });
        }
        Ok(())
    }
}

/// Asynchronously filtered stream of votable proposals
pub struct VotableProposalStream {
    machine: VotingMachineWrapper,
    stream: EventStream<NewProposalArgs>,
}

impl VotableProposalStream {
    /// Next votable proposal, or `None` once the underlying feed closes
    pub async fn next(&mut self) -> Option<DecodedEvent<NewProposalArgs>> {
        loop {
            let event = self.stream.next().await?;
            match self.machine.is_votable(event.args.proposal_id).await {
                Ok(true) => return Some(event),
                Ok(false) => continue,
                Err(e) => {
                    warn!(proposal_id = %event.args.proposal_id, error = %e, "votability check failed, dropping proposal");
                    continue;
                }
            }
        }
    }
}

fn require_proposal_id(proposal_id: Hash) -> WrapperResult<()> {
    if proposal_id.is_zero() {
        return Err(WrapperError::MissingArgument("proposalId"));
    }
    Ok(())
}

fn uint32(ret: &[Value], method: &str) -> WrapperResult<u32> {
    uint32_at(ret, 0, method)
}

fn uint32_at(ret: &[Value], index: usize, method: &str) -> WrapperResult<u32> {
    let value = expect_return(ret, index, method)?.as_uint(method)?;
    u32::try_from(value).map_err(|_| {
        WrapperError::Chain(ChainError::UnexpectedReturn {
            method: method.to_string(),
            expected: "uint in u32 range",
        })
    })
}

/// Pull one hash-valued argument out of a receipt event
pub(crate) fn decode_event_hash(
    tx: &TxReceipt,
    event: &str,
    param: &str,
    method: &'static str,
) -> WrapperResult<Hash> {
    let raw = tx.event(event).ok_or(ChainError::UnexpectedReturn {
        method: method.to_string(),
        expected: "receipt event",
    })?;
    let value = raw.params.get(param).ok_or(ChainError::UnexpectedReturn {
        method: method.to_string(),
        expected: "event argument",
    })?;
    serde_json::from_value(value.clone()).map_err(|_| {
        WrapperError::Chain(ChainError::UnexpectedReturn {
            method: method.to_string(),
            expected: "hash event argument",
        })
    })
}

/// Pull one address-valued argument out of a receipt event
pub(crate) fn decode_event_address(
    tx: &TxReceipt,
    event: &str,
    param: &str,
    method: &'static str,
) -> WrapperResult<Address> {
    let raw = tx.event(event).ok_or(ChainError::UnexpectedReturn {
        method: method.to_string(),
        expected: "receipt event",
    })?;
    let value = raw.params.get(param).ok_or(ChainError::UnexpectedReturn {
        method: method.to_string(),
        expected: "event argument",
    })?;
    serde_json::from_value(value.clone()).map_err(|_| {
        WrapperError::Chain(ChainError::UnexpectedReturn {
            method: method.to_string(),
            expected: "address event argument",
        })
    })
}
