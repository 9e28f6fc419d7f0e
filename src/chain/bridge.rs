// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Contract calls for the DeCriCo deployment.
//!
//! Every submission waits for its receipt, fails with
//! [`ChainError::Reverted`] on a failed status and decodes the identifying
//! event from the receipt logs. A receipt without that event is a
//! [`ChainError::MissingEvent`]; ids are never synthesized.

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, U256},
    providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
    rpc::types::Log,
    signers::local::PrivateKeySigner,
    sol_types::SolEvent,
};
use tokio_util::sync::CancellationToken;

use crate::models::{Amount, WalletAddress};
use crate::storage::{NewAidRequest, NewProposal};

use super::contracts::{IAidRequest, IDonation, IGovernance};
use super::error::ChainError;
use super::types::{
    index_of, lookup, parse_address, to_wallet, ChainConfig, ChainProposal, ChainRequest,
    Submitted, TxReceipt, PROPOSAL_CATEGORIES, PROPOSAL_STATUSES, REQUEST_CATEGORIES,
    REQUEST_STATUSES,
};
use super::units::{from_timestamp, to_amount, to_timestamp, to_u256, to_u64};

/// Write operations the action layer needs from the chain.
#[allow(async_fn_in_trait)]
pub trait ChainActions {
    /// Address that signs submissions.
    fn account(&self) -> WalletAddress;

    /// Network name recorded alongside donations.
    fn network(&self) -> String;

    /// Register a request; yields its on-chain id.
    async fn create_request(&self, input: &NewAidRequest) -> Result<Submitted<u64>, ChainError>;

    /// Send `amount` to `recipient` against an on-chain request; yields the
    /// donation id.
    async fn donate(
        &self,
        request_chain_id: u64,
        recipient: &WalletAddress,
        amount: Amount,
        message: Option<&str>,
        anonymous: bool,
    ) -> Result<Submitted<u64>, ChainError>;

    async fn vote_request(
        &self,
        request_chain_id: u64,
        approve: bool,
    ) -> Result<Submitted<()>, ChainError>;

    /// Open a proposal for `voting_period_secs`; yields its on-chain id.
    async fn create_proposal(
        &self,
        input: &NewProposal,
        voting_period_secs: u64,
    ) -> Result<Submitted<u64>, ChainError>;

    async fn vote_proposal(
        &self,
        proposal_chain_id: u64,
        support: bool,
    ) -> Result<Submitted<()>, ChainError>;
}

/// Receipt plus the logs needed to decode events.
struct Confirmed {
    receipt: TxReceipt,
    logs: Vec<Log>,
}

impl Confirmed {
    fn event<E: SolEvent>(&self, emitter: Address) -> Result<E, ChainError> {
        find_event(&self.logs, emitter).ok_or_else(|| ChainError::MissingEvent {
            event: E::SIGNATURE,
            tx_hash: self.receipt.tx_hash.clone(),
        })
    }
}

/// First log emitted by `emitter` that decodes as `E`.
pub(crate) fn find_event<E: SolEvent>(logs: &[Log], emitter: Address) -> Option<E> {
    logs.iter()
        .filter(|log| log.inner.address == emitter)
        .find_map(|log| log.log_decode::<E>().ok())
        .map(|decoded| decoded.inner.data)
}

pub struct ChainBridge {
    config: ChainConfig,
    provider: DynProvider,
    account: Address,
    cancel: CancellationToken,
}

impl ChainBridge {
    /// Build a signing provider for `config`. No network traffic happens
    /// until the first call.
    pub fn connect(config: ChainConfig, signer: PrivateKeySigner) -> Self {
        let account = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(config.rpc_url.clone())
            .erased();

        tracing::info!(
            chain_id = config.chain_id,
            account = %account,
            "Chain bridge configured"
        );

        Self {
            config,
            provider,
            account,
            cancel: CancellationToken::new(),
        }
    }

    /// Create a signer from a hex private key (with or without `0x`).
    pub fn signer_from_hex(private_key_hex: &str) -> Result<PrivateKeySigner, ChainError> {
        let key_bytes = alloy::hex::decode(private_key_hex.trim())
            .map_err(|e| ChainError::InvalidPrivateKey(e.to_string()))?;

        PrivateKeySigner::from_slice(&key_bytes)
            .map_err(|e| ChainError::InvalidPrivateKey(e.to_string()))
    }

    /// Abort confirmation waits when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    fn aid(&self) -> IAidRequest::IAidRequestInstance<DynProvider> {
        IAidRequest::new(self.config.aid_request, self.provider.clone())
    }

    fn donations(&self) -> IDonation::IDonationInstance<DynProvider> {
        IDonation::new(self.config.donation, self.provider.clone())
    }

    fn governance(&self) -> IGovernance::IGovernanceInstance<DynProvider> {
        IGovernance::new(self.config.governance, self.provider.clone())
    }

    async fn confirm(
        &self,
        pending: PendingTransactionBuilder<Ethereum>,
        to: Address,
        action: &'static str,
    ) -> Result<Confirmed, ChainError> {
        let tx_hash = format!("{:?}", pending.tx_hash());
        tracing::info!(action, tx_hash = %tx_hash, "Transaction submitted");

        let receipt = tokio::select! {
            receipt = pending.get_receipt() => receipt?,
            _ = self.cancel.cancelled() => {
                tracing::warn!(action, tx_hash = %tx_hash, "Confirmation wait cancelled");
                return Err(ChainError::Cancelled);
            }
        };

        if !receipt.status() {
            tracing::warn!(action, tx_hash = %tx_hash, "Transaction reverted");
            return Err(ChainError::Reverted { tx_hash });
        }

        tracing::info!(
            action,
            tx_hash = %tx_hash,
            block = ?receipt.block_number,
            "Transaction confirmed"
        );

        Ok(Confirmed {
            logs: receipt.inner.logs().to_vec(),
            receipt: TxReceipt {
                explorer_url: self.config.tx_url(&tx_hash),
                tx_hash,
                to: to_wallet(to),
                block_number: receipt.block_number,
                gas_used: receipt.gas_used as u64,
            },
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_request(&self, id: u64) -> Result<ChainRequest, ChainError> {
        let raw = self.aid().getRequest(U256::from(id)).call().await?;
        request_from_raw(raw)
    }

    pub async fn request_count(&self) -> Result<u64, ChainError> {
        let count = self.aid().requestCount().call().await?;
        to_u64(count, "request count")
    }

    pub async fn get_proposal(&self, id: u64) -> Result<ChainProposal, ChainError> {
        let raw = self.governance().getProposal(U256::from(id)).call().await?;
        proposal_from_raw(raw)
    }

    pub async fn proposal_count(&self) -> Result<u64, ChainError> {
        let count = self.governance().proposalCount().call().await?;
        to_u64(count, "proposal count")
    }

    /// Lifetime total sent through the donation contract by `donor`.
    pub async fn total_donated(&self, donor: &WalletAddress) -> Result<Amount, ChainError> {
        let total = self
            .donations()
            .totalDonated(parse_address(&donor.0)?)
            .call()
            .await?;
        to_amount(total)
    }

    /// Native balance of `address`.
    pub async fn balance_of(&self, address: &WalletAddress) -> Result<Amount, ChainError> {
        let balance = self.provider.get_balance(parse_address(&address.0)?).await?;
        to_amount(balance)
    }

    pub async fn block_number(&self) -> Result<u64, ChainError> {
        Ok(self.provider.get_block_number().await?)
    }
}

impl ChainActions for ChainBridge {
    fn account(&self) -> WalletAddress {
        to_wallet(self.account)
    }

    fn network(&self) -> String {
        self.config.network_name()
    }

    async fn create_request(&self, input: &NewAidRequest) -> Result<Submitted<u64>, ChainError> {
        let aid = self.aid();
        let pending = aid
            .createRequest(
                input.title.clone(),
                input.description.clone(),
                index_of(&REQUEST_CATEGORIES, &input.category),
                input.location.clone(),
                to_u256(input.target_amount),
                from_timestamp(input.deadline),
                input.urgent,
            )
            .send()
            .await?;
        let confirmed = self
            .confirm(pending, self.config.aid_request, "create_request")
            .await?;
        let event: IAidRequest::RequestCreated = confirmed.event(self.config.aid_request)?;

        Ok(Submitted {
            value: to_u64(event.requestId, "request id")?,
            receipt: confirmed.receipt,
        })
    }

    async fn donate(
        &self,
        request_chain_id: u64,
        recipient: &WalletAddress,
        amount: Amount,
        message: Option<&str>,
        anonymous: bool,
    ) -> Result<Submitted<u64>, ChainError> {
        let recipient = parse_address(&recipient.0)?;
        let donations = self.donations();
        let pending = donations
            .donate(
                U256::from(request_chain_id),
                recipient,
                message.unwrap_or_default().to_string(),
                anonymous,
            )
            .value(to_u256(amount))
            .send()
            .await?;
        let confirmed = self.confirm(pending, self.config.donation, "donate").await?;
        let event: IDonation::DonationMade = confirmed.event(self.config.donation)?;

        Ok(Submitted {
            value: to_u64(event.donationId, "donation id")?,
            receipt: confirmed.receipt,
        })
    }

    async fn vote_request(
        &self,
        request_chain_id: u64,
        approve: bool,
    ) -> Result<Submitted<()>, ChainError> {
        let aid = self.aid();
        let pending = aid
            .verifyRequest(U256::from(request_chain_id), approve)
            .send()
            .await?;
        let confirmed = self
            .confirm(pending, self.config.aid_request, "vote_request")
            .await?;
        let _: IAidRequest::RequestVerified = confirmed.event(self.config.aid_request)?;

        Ok(Submitted {
            value: (),
            receipt: confirmed.receipt,
        })
    }

    async fn create_proposal(
        &self,
        input: &NewProposal,
        voting_period_secs: u64,
    ) -> Result<Submitted<u64>, ChainError> {
        let governance = self.governance();
        let pending = governance
            .createProposal(
                input.title.clone(),
                input.description.clone(),
                index_of(&PROPOSAL_CATEGORIES, &input.category),
                U256::from(voting_period_secs),
            )
            .send()
            .await?;
        let confirmed = self
            .confirm(pending, self.config.governance, "create_proposal")
            .await?;
        let event: IGovernance::ProposalCreated = confirmed.event(self.config.governance)?;

        Ok(Submitted {
            value: to_u64(event.proposalId, "proposal id")?,
            receipt: confirmed.receipt,
        })
    }

    async fn vote_proposal(
        &self,
        proposal_chain_id: u64,
        support: bool,
    ) -> Result<Submitted<()>, ChainError> {
        let governance = self.governance();
        let pending = governance
            .vote(U256::from(proposal_chain_id), support)
            .send()
            .await?;
        let confirmed = self
            .confirm(pending, self.config.governance, "vote_proposal")
            .await?;
        let _: IGovernance::VoteCast = confirmed.event(self.config.governance)?;

        Ok(Submitted {
            value: (),
            receipt: confirmed.receipt,
        })
    }
}

fn request_from_raw(raw: IAidRequest::Request) -> Result<ChainRequest, ChainError> {
    Ok(ChainRequest {
        id: to_u64(raw.id, "request id")?,
        requester: to_wallet(raw.requester),
        title: raw.title,
        description: raw.description,
        category: lookup(&REQUEST_CATEGORIES, raw.category, "request category")?,
        location: raw.location,
        target_amount: to_amount(raw.targetAmount)?,
        raised_amount: to_amount(raw.raisedAmount)?,
        deadline: to_timestamp(raw.deadline)?,
        status: lookup(&REQUEST_STATUSES, raw.status, "request status")?,
        urgent: raw.urgent,
        verified: raw.verified,
    })
}

fn proposal_from_raw(raw: IGovernance::Proposal) -> Result<ChainProposal, ChainError> {
    Ok(ChainProposal {
        id: to_u64(raw.id, "proposal id")?,
        proposer: to_wallet(raw.proposer),
        title: raw.title,
        description: raw.description,
        category: lookup(&PROPOSAL_CATEGORIES, raw.category, "proposal category")?,
        votes_for: to_u64(raw.votesFor, "votes for")?,
        votes_against: to_u64(raw.votesAgainst, "votes against")?,
        deadline: to_timestamp(raw.deadline)?,
        status: lookup(&PROPOSAL_STATUSES, raw.status, "proposal status")?,
    })
}
