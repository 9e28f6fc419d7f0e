// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! The same flows as [`Actions`](super::Actions), recorded on the hosted
//! backend instead of the local store.
//!
//! The backend has no multi-table transactions: after a confirmed receipt
//! the rows are written one by one and the first failure is logged with
//! the transaction hash.

use std::future::Future;

use chrono::Utc;
use uuid::Uuid;

use crate::chain::{ChainActions, TxReceipt};
use crate::error::{AppError, AppResult};
use crate::models::Amount;
use crate::remote::{
    DonationInsert, DonationRow, ProposalRow, RemoteError, RemoteRepository, RemoteResult,
    RemoteStoreClient, RequestRow, RowTarget, UserRow, VoteRow,
};
use crate::storage::{NewAidRequest, NewProposal, RequestStatus, TransactionType, VoteType};

use super::{
    check_donation_amount, check_open_for_verification, check_signer, check_voting_open,
    closed_for_donations, proposal_on_chain, request_on_chain, require_role,
    verification_description, voting_period_secs, DonationNote, DONATION_REPUTATION,
    GOVERNANCE_REPUTATION, VERIFICATION_REPUTATION,
};

pub struct RemoteActions<'a, C> {
    remote: RemoteRepository<'a>,
    chain: &'a C,
    quorum: u32,
}

impl<'a, C: ChainActions> RemoteActions<'a, C> {
    pub fn new(client: &'a RemoteStoreClient, chain: &'a C) -> Self {
        Self {
            remote: RemoteRepository::new(client),
            chain,
            quorum: 1,
        }
    }

    pub fn with_quorum(mut self, quorum: u32) -> Self {
        self.quorum = quorum.max(1);
        self
    }

    /// Send `amount` to the creator of `request_id`.
    pub async fn donate(
        &self,
        donor: &UserRow,
        request_id: Uuid,
        amount: Amount,
        note: DonationNote,
    ) -> AppResult<DonationRow> {
        check_donation_amount(amount)?;
        check_signer(&donor.wallet_address, &self.chain.account())?;

        let request = self.remote.request(request_id).await?;
        if request.status != RequestStatus::Active || request.deadline <= Utc::now() {
            return Err(closed_for_donations());
        }
        let creator = self.remote.user(request.creator_id).await?;
        if creator.wallet_address.is_empty() {
            tracing::warn!(%request_id, creator_id = %creator.id, "Recipient has no wallet");
            return Err(AppError::RecipientWalletMissing);
        }
        let chain_id = request_on_chain(request.chain_id)?;

        let submitted = self
            .chain
            .donate(
                chain_id,
                &creator.wallet_address,
                amount,
                note.message.as_deref(),
                note.anonymous,
            )
            .await?;
        let receipt = submitted.receipt;
        let network = self.chain.network();
        let description = format!("Donation to \"{}\"", request.title);

        let donation = self
            .commit(Some(&receipt), async {
                let donation = self
                    .remote
                    .record_donation(&DonationInsert {
                        donor_id: donor.id,
                        request_id,
                        amount,
                        tx_hash: &receipt.tx_hash,
                        network: &network,
                        message: note.message.as_deref(),
                        anonymous: note.anonymous,
                    })
                    .await?;
                self.remote.credit_request(&request, amount).await?;
                self.remote
                    .log_transaction(
                        TransactionType::Donation,
                        &donor.wallet_address,
                        &creator.wallet_address,
                        Some(amount),
                        &description,
                        Some(&receipt.tx_hash),
                    )
                    .await?;
                self.reward(donor.id, DONATION_REPUTATION).await?;
                Ok::<_, RemoteError>(donation)
            })
            .await?;
        tracing::info!(
            donation_id = %donation.id,
            %request_id,
            amount = %amount,
            tx_hash = %receipt.tx_hash,
            "Remote donation completed"
        );
        Ok(donation)
    }

    pub async fn create_request(
        &self,
        creator: &UserRow,
        input: NewAidRequest,
    ) -> AppResult<RequestRow> {
        require_role(creator.role, creator.role.can_create_requests(), "create aid requests")?;
        input.validate(Utc::now())?;
        check_signer(&creator.wallet_address, &self.chain.account())?;

        let submitted = self.chain.create_request(&input).await?;
        let receipt = submitted.receipt;
        let description = format!("Created aid request \"{}\"", input.title);

        self.commit(Some(&receipt), async {
            let request = self
                .remote
                .create_request(creator.id, &input, Some(submitted.value))
                .await?;
            self.remote
                .log_transaction(
                    TransactionType::RequestCreation,
                    &creator.wallet_address,
                    &receipt.to,
                    None,
                    &description,
                    Some(&receipt.tx_hash),
                )
                .await?;
            Ok::<_, RemoteError>(request)
        })
        .await
    }

    /// Record a verifier's decision and settle the request once the votes
    /// reach the quorum.
    pub async fn vote_on_request(
        &self,
        verifier: &UserRow,
        request_id: Uuid,
        vote_type: VoteType,
        comment: Option<String>,
    ) -> AppResult<VoteRow> {
        require_role(verifier.role, verifier.role.can_verify(), "verify requests")?;
        let target = RowTarget::Request(request_id);
        let request = self.remote.request(request_id).await?;
        check_open_for_verification(request.status)?;
        self.ensure_not_voted(verifier, target).await?;

        let receipt = match request.chain_id {
            Some(chain_id) => {
                check_signer(&verifier.wallet_address, &self.chain.account())?;
                let submitted = self
                    .chain
                    .vote_request(chain_id, vote_type.is_support())
                    .await?;
                Some(submitted.receipt)
            }
            None => None,
        };
        let description = verification_description(vote_type, &request.title);

        let vote = self
            .commit(receipt.as_ref(), async {
                let vote = self
                    .remote
                    .cast_vote(verifier.id, target, vote_type, comment.as_deref())
                    .await?;
                let votes = self.remote.votes_for(target).await?;
                self.remote
                    .settle_request(&request, &votes, self.quorum)
                    .await?;
                if let Some(receipt) = &receipt {
                    self.remote
                        .log_transaction(
                            TransactionType::Verification,
                            &verifier.wallet_address,
                            &receipt.to,
                            None,
                            &description,
                            Some(&receipt.tx_hash),
                        )
                        .await?;
                }
                self.reward(verifier.id, VERIFICATION_REPUTATION).await?;
                Ok::<_, RemoteError>(vote)
            })
            .await?;
        tracing::info!(
            vote_id = %vote.id,
            %request_id,
            vote_type = vote_type.as_str(),
            "Remote request vote recorded"
        );
        Ok(vote)
    }

    pub async fn vote_on_proposal(
        &self,
        voter: &UserRow,
        proposal_id: Uuid,
        vote_type: VoteType,
        comment: Option<String>,
    ) -> AppResult<VoteRow> {
        require_role(voter.role, voter.role.can_govern(), "vote on proposals")?;
        let target = RowTarget::Proposal(proposal_id);
        let proposal = self.remote.proposal(proposal_id).await?;
        check_voting_open(proposal.status, proposal.deadline)?;
        self.ensure_not_voted(voter, target).await?;
        check_signer(&voter.wallet_address, &self.chain.account())?;
        let chain_id = proposal_on_chain(proposal.chain_id)?;

        let submitted = self
            .chain
            .vote_proposal(chain_id, vote_type.is_support())
            .await?;
        let receipt = submitted.receipt;
        let description = format!("Voted {} on \"{}\"", vote_type.as_str(), proposal.title);

        self.commit(Some(&receipt), async {
            let vote = self
                .remote
                .cast_vote(voter.id, target, vote_type, comment.as_deref())
                .await?;
            let votes = self.remote.votes_for(target).await?;
            self.remote.update_proposal_tally(proposal_id, &votes).await?;
            self.remote
                .log_transaction(
                    TransactionType::Vote,
                    &voter.wallet_address,
                    &receipt.to,
                    None,
                    &description,
                    Some(&receipt.tx_hash),
                )
                .await?;
            self.reward(voter.id, GOVERNANCE_REPUTATION).await?;
            Ok::<_, RemoteError>(vote)
        })
        .await
    }

    pub async fn create_proposal(
        &self,
        proposer: &UserRow,
        input: NewProposal,
    ) -> AppResult<ProposalRow> {
        require_role(proposer.role, proposer.role.can_govern(), "create proposals")?;
        let now = Utc::now();
        input.validate(now)?;
        check_signer(&proposer.wallet_address, &self.chain.account())?;

        let submitted = self
            .chain
            .create_proposal(&input, voting_period_secs(&input, now))
            .await?;
        let receipt = submitted.receipt;
        let description = format!("Created proposal \"{}\"", input.title);

        self.commit(Some(&receipt), async {
            let proposal = self
                .remote
                .create_proposal(proposer.id, &input, Some(submitted.value))
                .await?;
            self.remote
                .log_transaction(
                    TransactionType::ProposalCreation,
                    &proposer.wallet_address,
                    &receipt.to,
                    None,
                    &description,
                    Some(&receipt.tx_hash),
                )
                .await?;
            Ok::<_, RemoteError>(proposal)
        })
        .await
    }

    async fn ensure_not_voted(&self, voter: &UserRow, target: RowTarget) -> AppResult<()> {
        if self.remote.has_voted(voter.id, target).await? {
            return Err(RemoteError::AlreadyVoted.into());
        }
        Ok(())
    }

    /// Reputation is read back first so the patch starts from the stored
    /// value rather than the caller's copy.
    async fn reward(&self, user_id: Uuid, points: u32) -> RemoteResult<()> {
        let user = self.remote.user(user_id).await?;
        self.remote.add_reputation(&user, points).await?;
        Ok(())
    }

    async fn commit<T>(
        &self,
        receipt: Option<&TxReceipt>,
        writes: impl Future<Output = RemoteResult<T>>,
    ) -> AppResult<T> {
        writes.await.map_err(|e| {
            if let Some(receipt) = receipt {
                tracing::error!(
                    tx_hash = %receipt.tx_hash,
                    error = %e,
                    "Confirmed transaction could not be recorded remotely"
                );
            }
            e.into()
        })
    }
}
