// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Balance-affecting user flows.
//!
//! Each flow validates first, submits to the chain, and only after the
//! receipt is confirmed writes the records (entity, audit log entry,
//! reputation). [`Actions`] writes them to the local store in a single
//! transaction; [`RemoteActions`] writes them to the hosted backend.

mod remote;

#[cfg(test)]
pub(crate) mod mock_chain;

pub use remote::RemoteActions;

use chrono::Utc;

use crate::chain::{ChainActions, TxReceipt};
use crate::error::{AppError, AppResult, ValidationErrors};
use crate::models::{Amount, RecordId, WalletAddress};
use crate::session::Role;
use crate::storage::repository::{donations, votes};
use crate::storage::{
    AidRequest, Donation, LocalStore, NewAidRequest, NewProposal, Proposal, ProposalStatus,
    RequestRepository, RequestStatus, StoreError, StoredTransaction, TransactionType, User,
    UserRepository, Vote, VoteRepository, VoteTarget, VoteType, WriteScope,
};

pub const DONATION_REPUTATION: u32 = 10;
pub const VERIFICATION_REPUTATION: u32 = 5;
pub const GOVERNANCE_REPUTATION: u32 = 2;

/// Optional donation details.
#[derive(Debug, Clone, Default)]
pub struct DonationNote {
    pub message: Option<String>,
    pub anonymous: bool,
}

pub struct Actions<'a, C> {
    store: &'a LocalStore,
    chain: &'a C,
    quorum: u32,
}

impl<'a, C: ChainActions> Actions<'a, C> {
    pub fn new(store: &'a LocalStore, chain: &'a C) -> Self {
        Self {
            store,
            chain,
            quorum: 1,
        }
    }

    /// Approvals (or rejections) needed to settle a request's verification.
    pub fn with_quorum(mut self, quorum: u32) -> Self {
        self.quorum = quorum.max(1);
        self
    }

    pub async fn donate(
        &self,
        donor: &User,
        request_id: RecordId,
        amount: Amount,
    ) -> AppResult<Donation> {
        self.donate_with(donor, request_id, amount, DonationNote::default())
            .await
    }

    /// Send `amount` to the creator of `request_id`.
    ///
    /// Fails with [`AppError::RecipientWalletMissing`] before touching the
    /// chain when the creator has no wallet address.
    pub async fn donate_with(
        &self,
        donor: &User,
        request_id: RecordId,
        amount: Amount,
        note: DonationNote,
    ) -> AppResult<Donation> {
        check_donation_amount(amount)?;
        self.require_signer(donor)?;

        let request = RequestRepository::new(self.store).get(request_id)?;
        if !request.is_open(Utc::now()) {
            return Err(closed_for_donations());
        }
        let creator = UserRepository::new(self.store).get(request.creator_id)?;
        if !creator.has_wallet() {
            tracing::warn!(request_id, creator_id = creator.id, "Recipient has no wallet");
            return Err(AppError::RecipientWalletMissing);
        }
        let chain_id = on_chain(&request)?;

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

        let donation = Donation::confirmed(
            donor.id,
            request.id,
            amount,
            receipt.tx_hash.clone(),
            self.chain.network(),
        )
        .with_message(note.message)
        .anonymous(note.anonymous);
        let audit = audit_entry(
            TransactionType::Donation,
            &donor.wallet_address,
            &creator.wallet_address,
            Some(amount),
            format!("Donation to \"{}\"", request.title),
            &receipt,
        );

        let donation = self.commit(&receipt, |scope| {
            let donation = donations::record_in(scope, donation)?;
            scope.insert(audit)?;
            add_reputation(scope, donor.id, DONATION_REPUTATION)?;
            Ok(donation)
        })?;
        tracing::info!(
            donation_id = donation.id,
            request_id,
            amount = %amount,
            tx_hash = %receipt.tx_hash,
            "Donation completed"
        );
        Ok(donation)
    }

    /// Validate, register on chain, then store with the on-chain id.
    pub async fn create_request(&self, creator: &User, input: NewAidRequest) -> AppResult<AidRequest> {
        require_role(creator.role, creator.role.can_create_requests(), "create aid requests")?;
        input.validate(Utc::now())?;
        self.require_signer(creator)?;

        let submitted = self.chain.create_request(&input).await?;
        let receipt = submitted.receipt;
        let audit = audit_entry(
            TransactionType::RequestCreation,
            &creator.wallet_address,
            &receipt.to,
            None,
            format!("Created aid request \"{}\"", input.title),
            &receipt,
        );
        let request = AidRequest::new(creator.id, input).with_chain_id(submitted.value);

        let request = self.commit(&receipt, |scope| {
            let request = scope.insert(request)?;
            scope.insert(audit)?;
            Ok(request)
        })?;
        tracing::info!(
            request_id = request.id,
            chain_id = submitted.value,
            "Aid request created"
        );
        Ok(request)
    }

    /// Record a verifier's decision on a request.
    ///
    /// Requests that were never registered on chain are verified locally.
    pub async fn vote_on_request(
        &self,
        verifier: &User,
        request_id: RecordId,
        vote_type: VoteType,
        comment: Option<String>,
    ) -> AppResult<Vote> {
        require_role(verifier.role, verifier.role.can_verify(), "verify requests")?;
        let target = VoteTarget::Request(request_id);
        let request = RequestRepository::new(self.store).get(request_id)?;
        check_open_for_verification(request.status)?;
        self.ensure_not_voted(verifier, target)?;

        let receipt = match request.chain_id {
            Some(chain_id) => {
                self.require_signer(verifier)?;
                let submitted = self
                    .chain
                    .vote_request(chain_id, vote_type.is_support())
                    .await?;
                Some(submitted.receipt)
            }
            None => None,
        };

        let vote = Vote::new(verifier.id, target, vote_type).with_comment(comment);
        let quorum = self.quorum;
        let description = verification_description(vote_type, &request.title);
        let record = |scope: &WriteScope<'_>| -> Result<Vote, StoreError> {
            let vote = votes::cast_in(scope, vote, quorum)?;
            if let Some(receipt) = &receipt {
                scope.insert(audit_entry(
                    TransactionType::Verification,
                    &verifier.wallet_address,
                    &receipt.to,
                    None,
                    description,
                    receipt,
                ))?;
            }
            add_reputation(scope, verifier.id, VERIFICATION_REPUTATION)?;
            Ok(vote)
        };
        let vote = match &receipt {
            Some(receipt) => self.commit(receipt, record)?,
            None => self.store.write(record)?,
        };
        tracing::info!(
            vote_id = vote.id,
            request_id,
            vote_type = vote_type.as_str(),
            "Request vote recorded"
        );
        Ok(vote)
    }

    pub async fn vote_on_proposal(
        &self,
        voter: &User,
        proposal_id: RecordId,
        vote_type: VoteType,
        comment: Option<String>,
    ) -> AppResult<Vote> {
        require_role(voter.role, voter.role.can_govern(), "vote on proposals")?;
        let target = VoteTarget::Proposal(proposal_id);
        let proposal = self.store.read(|scope| scope.require::<Proposal>(proposal_id))?;
        check_voting_open(proposal.status, proposal.deadline)?;
        self.ensure_not_voted(voter, target)?;
        self.require_signer(voter)?;
        let chain_id = proposal_on_chain(proposal.chain_id)?;

        let submitted = self
            .chain
            .vote_proposal(chain_id, vote_type.is_support())
            .await?;
        let receipt = submitted.receipt;
        let audit = audit_entry(
            TransactionType::Vote,
            &voter.wallet_address,
            &receipt.to,
            None,
            format!("Voted {} on \"{}\"", vote_type.as_str(), proposal.title),
            &receipt,
        );
        let vote = Vote::new(voter.id, target, vote_type).with_comment(comment);
        let quorum = self.quorum;

        let vote = self.commit(&receipt, |scope| {
            let vote = votes::cast_in(scope, vote, quorum)?;
            scope.insert(audit)?;
            add_reputation(scope, voter.id, GOVERNANCE_REPUTATION)?;
            Ok(vote)
        })?;
        tracing::info!(
            vote_id = vote.id,
            proposal_id,
            vote_type = vote_type.as_str(),
            "Proposal vote recorded"
        );
        Ok(vote)
    }

    pub async fn create_proposal(&self, proposer: &User, input: NewProposal) -> AppResult<Proposal> {
        require_role(proposer.role, proposer.role.can_govern(), "create proposals")?;
        let now = Utc::now();
        input.validate(now)?;
        self.require_signer(proposer)?;

        let voting_period = voting_period_secs(&input, now);
        let submitted = self.chain.create_proposal(&input, voting_period).await?;
        let receipt = submitted.receipt;
        let audit = audit_entry(
            TransactionType::ProposalCreation,
            &proposer.wallet_address,
            &receipt.to,
            None,
            format!("Created proposal \"{}\"", input.title),
            &receipt,
        );
        let proposal = Proposal::new(proposer.id, input).with_chain_id(submitted.value);

        let proposal = self.commit(&receipt, |scope| {
            let proposal = scope.insert(proposal)?;
            scope.insert(audit)?;
            Ok(proposal)
        })?;
        tracing::info!(
            proposal_id = proposal.id,
            chain_id = submitted.value,
            "Proposal created"
        );
        Ok(proposal)
    }

    /// The chain signs as `user`: they need a wallet and it must be the
    /// bridge's account.
    fn require_signer(&self, user: &User) -> AppResult<()> {
        check_signer(&user.wallet_address, &self.chain.account())
    }

    fn ensure_not_voted(&self, voter: &User, target: VoteTarget) -> AppResult<()> {
        if VoteRepository::new(self.store).has_voted(voter.id, target)? {
            return Err(StoreError::AlreadyVoted(target.to_string()).into());
        }
        Ok(())
    }

    /// Write the local records for a confirmed transaction. A failure here
    /// leaves the chain ahead of the store, so it is logged with the hash.
    fn commit<T>(
        &self,
        receipt: &TxReceipt,
        f: impl FnOnce(&WriteScope<'_>) -> Result<T, StoreError>,
    ) -> AppResult<T> {
        self.store.write(f).map_err(|e| {
            tracing::error!(
                tx_hash = %receipt.tx_hash,
                error = %e,
                "Confirmed transaction could not be recorded locally"
            );
            e.into()
        })
    }
}

fn on_chain(request: &AidRequest) -> AppResult<u64> {
    request_on_chain(request.chain_id)
}

fn require_role(role: Role, allowed: bool, action: &str) -> AppResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("{role} accounts cannot {action}")))
    }
}

fn check_signer(wallet: &WalletAddress, account: &WalletAddress) -> AppResult<()> {
    if wallet.is_empty() {
        return Err(AppError::WalletNotConnected);
    }
    if !wallet.matches(account) {
        return Err(AppError::Forbidden(
            "The connected wallet does not belong to this account".to_string(),
        ));
    }
    Ok(())
}

fn check_donation_amount(amount: Amount) -> AppResult<()> {
    if amount.is_zero() {
        return Err(
            ValidationErrors::single("amount", "Donation amount must be greater than zero").into(),
        );
    }
    Ok(())
}

fn closed_for_donations() -> AppError {
    ValidationErrors::single("request_id", "This request is no longer accepting donations").into()
}

/// Only active requests can still be verified or rejected.
fn check_open_for_verification(status: RequestStatus) -> AppResult<()> {
    if status != RequestStatus::Active {
        return Err(ValidationErrors::single(
            "request_id",
            format!("This request is {} and can no longer be verified", status.as_str()),
        )
        .into());
    }
    Ok(())
}

fn check_voting_open(status: ProposalStatus, deadline: chrono::DateTime<Utc>) -> AppResult<()> {
    if status != ProposalStatus::Active || deadline <= Utc::now() {
        return Err(
            ValidationErrors::single("proposal_id", "Voting on this proposal has closed").into(),
        );
    }
    Ok(())
}

fn request_on_chain(chain_id: Option<u64>) -> AppResult<u64> {
    chain_id.ok_or_else(|| {
        ValidationErrors::single("request_id", "This request is not registered on chain").into()
    })
}

fn proposal_on_chain(chain_id: Option<u64>) -> AppResult<u64> {
    chain_id.ok_or_else(|| {
        ValidationErrors::single("proposal_id", "This proposal is not registered on chain").into()
    })
}

fn voting_period_secs(input: &NewProposal, now: chrono::DateTime<Utc>) -> u64 {
    (input.deadline - now).num_seconds().max(0) as u64
}

fn verification_description(vote_type: VoteType, title: &str) -> String {
    format!(
        "{} aid request \"{}\"",
        if vote_type.is_support() { "Approved" } else { "Rejected" },
        title
    )
}

fn audit_entry(
    tx_type: TransactionType,
    from: &WalletAddress,
    to: &WalletAddress,
    amount: Option<Amount>,
    description: String,
    receipt: &TxReceipt,
) -> StoredTransaction {
    let mut entry =
        StoredTransaction::new_pending(tx_type, from.clone(), to.clone(), amount, description)
            .with_hash(receipt.tx_hash.clone());
    entry.mark_confirmed(receipt.block_number, Some(receipt.gas_used));
    entry
}

fn add_reputation(scope: &WriteScope<'_>, user_id: RecordId, points: u32) -> Result<(), StoreError> {
    scope.update::<User, _>(user_id, |u| u.reputation = u.reputation.saturating_add(points))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::TempDir;

    use super::mock_chain::{MockChain, RECIPIENT, SIGNER};
    use super::*;
    use crate::chain::ChainError;
    use crate::storage::{
        DonationRepository, ProposalCategory, ProposalRepository, RequestCategory,
        TransactionRepository,
    };

    struct Fixture {
        _dir: TempDir,
        store: LocalStore,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::open(&dir.path().join("actions.redb")).unwrap();
        Fixture { _dir: dir, store }
    }

    fn user(store: &LocalStore, wallet: &str, name: &str, role: Role) -> User {
        UserRepository::new(store)
            .create(User::new(
                WalletAddress::from(wallet),
                format!("{}@example.org", name.to_lowercase()),
                name.to_string(),
                role,
            ))
            .unwrap()
    }

    fn new_request(target: Amount) -> NewAidRequest {
        NewAidRequest {
            title: "Flood relief for Sylhet".to_string(),
            description: "Drinking water and dry food for displaced families".to_string(),
            category: RequestCategory::Disaster,
            location: "Sylhet".to_string(),
            target_amount: target,
            deadline: Utc::now() + Duration::days(30),
            urgent: true,
            media_urls: Vec::new(),
            external_links: Vec::new(),
        }
    }

    fn stored_request(store: &LocalStore, creator: &User, chain_id: Option<u64>) -> AidRequest {
        let mut request = AidRequest::new(creator.id, new_request(Amount::eth(10)));
        request.chain_id = chain_id;
        RequestRepository::new(store).create(request).unwrap()
    }

    #[tokio::test]
    async fn donation_to_creator_without_wallet_never_reaches_chain() {
        let fx = fixture();
        let chain = MockChain::new();
        let donor = user(&fx.store, SIGNER, "Dana", Role::Donor);
        let creator = user(&fx.store, "", "Rafi", Role::Requester);
        let request = stored_request(&fx.store, &creator, Some(3));

        let err = Actions::new(&fx.store, &chain)
            .donate(&donor, request.id, Amount::eth(1))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RecipientWalletMissing));
        assert!(chain.calls().is_empty());
        assert!(DonationRepository::new(&fx.store).list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn donations_raise_total_log_and_reward() {
        let fx = fixture();
        let chain = MockChain::new();
        let donor = user(&fx.store, SIGNER, "Dana", Role::Donor);
        let creator = user(&fx.store, RECIPIENT, "Rafi", Role::Requester);
        let request = stored_request(&fx.store, &creator, Some(3));
        let actions = Actions::new(&fx.store, &chain);

        for eth in [2, 3, 4] {
            actions
                .donate(&donor, request.id, Amount::eth(eth))
                .await
                .unwrap();
        }

        let request = RequestRepository::new(&fx.store).get(request.id).unwrap();
        assert_eq!(request.raised_amount, Amount::eth(9));
        assert_eq!(request.progress(), 90.0);
        assert_eq!(request.status, RequestStatus::Active);
        assert_eq!(
            chain.calls()[0],
            format!("donate:3:{RECIPIENT}:{}", Amount::eth(2).wei())
        );

        let audit = TransactionRepository::new(&fx.store)
            .by_type(TransactionType::Donation)
            .unwrap();
        assert_eq!(audit.len(), 3);
        assert!(audit.iter().all(|t| t.block_number.is_some()));

        let donor = UserRepository::new(&fx.store).get(donor.id).unwrap();
        assert_eq!(donor.reputation, 3 * DONATION_REPUTATION);
    }

    #[tokio::test]
    async fn rejected_transaction_writes_nothing() {
        let fx = fixture();
        let chain = MockChain::failing(ChainError::Rejected);
        let donor = user(&fx.store, SIGNER, "Dana", Role::Donor);
        let creator = user(&fx.store, RECIPIENT, "Rafi", Role::Requester);
        let request = stored_request(&fx.store, &creator, Some(3));

        let err = Actions::new(&fx.store, &chain)
            .donate(&donor, request.id, Amount::eth(1))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Chain(ChainError::Rejected)));
        assert_eq!(chain.calls().len(), 1);
        assert!(DonationRepository::new(&fx.store).list().unwrap().is_empty());
        assert_eq!(
            RequestRepository::new(&fx.store)
                .get(request.id)
                .unwrap()
                .raised_amount,
            Amount::ZERO
        );
    }

    #[tokio::test]
    async fn donation_input_is_validated_first() {
        let fx = fixture();
        let chain = MockChain::new();
        let donor = user(&fx.store, SIGNER, "Dana", Role::Donor);
        let creator = user(&fx.store, RECIPIENT, "Rafi", Role::Requester);
        let offline = stored_request(&fx.store, &creator, None);
        let actions = Actions::new(&fx.store, &chain);

        let zero = actions.donate(&donor, offline.id, Amount::ZERO).await;
        assert!(matches!(zero, Err(AppError::Validation(_))));

        let unregistered = actions.donate(&donor, offline.id, Amount::eth(1)).await;
        assert!(matches!(unregistered, Err(AppError::Validation(_))));

        let stranger = user(
            &fx.store,
            "0x1111111111111111111111111111111111111111",
            "Other",
            Role::Donor,
        );
        let wrong_signer = actions.donate(&stranger, offline.id, Amount::eth(1)).await;
        assert!(matches!(wrong_signer, Err(AppError::Forbidden(_))));

        assert!(chain.calls().is_empty());
    }

    #[tokio::test]
    async fn create_request_stores_chain_id() {
        let fx = fixture();
        let chain = MockChain::new();
        let creator = user(&fx.store, SIGNER, "Rafi", Role::Requester);
        let donor = user(&fx.store, RECIPIENT, "Dana", Role::Donor);
        let actions = Actions::new(&fx.store, &chain);

        let forbidden = actions
            .create_request(&donor, new_request(Amount::eth(5)))
            .await;
        assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

        let mut invalid = new_request(Amount::eth(5));
        invalid.title = "Hi".to_string();
        let invalid = actions.create_request(&creator, invalid).await;
        assert!(matches!(invalid, Err(AppError::Validation(e)) if e.fields().any(|f| f == "title")));
        assert!(chain.calls().is_empty());

        let request = actions
            .create_request(&creator, new_request(Amount::eth(5)))
            .await
            .unwrap();
        assert_eq!(request.chain_id, Some(41));
        assert_eq!(
            RequestRepository::new(&fx.store).by_chain_id(41).unwrap().map(|r| r.id),
            Some(request.id)
        );
        let audit = TransactionRepository::new(&fx.store)
            .by_type(TransactionType::RequestCreation)
            .unwrap();
        assert_eq!(audit.len(), 1);
    }

    #[tokio::test]
    async fn second_request_vote_is_rejected_before_chain() {
        let fx = fixture();
        let chain = MockChain::new();
        let verifier = user(&fx.store, SIGNER, "Vera", Role::Verifier);
        let creator = user(&fx.store, RECIPIENT, "Rafi", Role::Requester);
        let request = stored_request(&fx.store, &creator, Some(3));
        let actions = Actions::new(&fx.store, &chain);

        actions
            .vote_on_request(&verifier, request.id, VoteType::Approve, None)
            .await
            .unwrap();
        let again = actions
            .vote_on_request(&verifier, request.id, VoteType::Reject, None)
            .await;

        assert!(matches!(
            again,
            Err(AppError::Store(StoreError::AlreadyVoted(_)))
        ));
        assert_eq!(chain.calls(), vec!["vote_request:3:true".to_string()]);
        assert!(RequestRepository::new(&fx.store).get(request.id).unwrap().verified);
        assert_eq!(
            UserRepository::new(&fx.store).get(verifier.id).unwrap().reputation,
            VERIFICATION_REPUTATION
        );
    }

    #[tokio::test]
    async fn unregistered_request_is_verified_locally() {
        let fx = fixture();
        let chain = MockChain::new();
        let verifier = user(&fx.store, SIGNER, "Vera", Role::Verifier);
        let creator = user(&fx.store, RECIPIENT, "Rafi", Role::Requester);
        let request = stored_request(&fx.store, &creator, None);

        Actions::new(&fx.store, &chain)
            .vote_on_request(&verifier, request.id, VoteType::Approve, None)
            .await
            .unwrap();

        assert!(chain.calls().is_empty());
        assert!(RequestRepository::new(&fx.store).get(request.id).unwrap().verified);
        assert!(TransactionRepository::new(&fx.store).list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn closed_request_cannot_be_verified() {
        let fx = fixture();
        let chain = MockChain::new();
        let verifier = user(&fx.store, SIGNER, "Vera", Role::Verifier);
        let creator = user(&fx.store, RECIPIENT, "Rafi", Role::Requester);
        let request = stored_request(&fx.store, &creator, Some(3));
        RequestRepository::new(&fx.store)
            .set_status(request.id, RequestStatus::Cancelled)
            .unwrap();

        let result = Actions::new(&fx.store, &chain)
            .vote_on_request(&verifier, request.id, VoteType::Approve, None)
            .await;

        assert!(matches!(result, Err(AppError::Validation(e)) if e.fields().any(|f| f == "request_id")));
        assert!(chain.calls().is_empty());
        assert!(!VoteRepository::new(&fx.store)
            .has_voted(verifier.id, VoteTarget::Request(request.id))
            .unwrap());
    }

    #[tokio::test]
    async fn donors_cannot_verify() {
        let fx = fixture();
        let chain = MockChain::new();
        let donor = user(&fx.store, SIGNER, "Dana", Role::Donor);
        let creator = user(&fx.store, RECIPIENT, "Rafi", Role::Requester);
        let request = stored_request(&fx.store, &creator, Some(3));

        let result = Actions::new(&fx.store, &chain)
            .vote_on_request(&donor, request.id, VoteType::Approve, None)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn proposal_lifecycle() {
        let fx = fixture();
        let chain = MockChain::new();
        let admin = user(&fx.store, SIGNER, "Ada", Role::Admin);
        let actions = Actions::new(&fx.store, &chain);

        let proposal = actions
            .create_proposal(
                &admin,
                NewProposal {
                    title: "Lower platform fee".to_string(),
                    description: "Reduce the fee charged on every donation to zero".to_string(),
                    rationale: String::new(),
                    implementation: String::new(),
                    timeline: String::new(),
                    category: ProposalCategory::Platform,
                    deadline: Utc::now() + Duration::days(7),
                },
            )
            .await
            .unwrap();
        assert_eq!(proposal.chain_id, Some(7));

        actions
            .vote_on_proposal(&admin, proposal.id, VoteType::Approve, None)
            .await
            .unwrap();
        let again = actions
            .vote_on_proposal(&admin, proposal.id, VoteType::Approve, None)
            .await;
        assert!(matches!(
            again,
            Err(AppError::Store(StoreError::AlreadyVoted(_)))
        ));

        let stored = ProposalRepository::new(&fx.store).get(proposal.id).unwrap();
        assert_eq!(stored.votes_for, 1);
        assert_eq!(
            chain.calls(),
            vec![
                "create_proposal:Lower platform fee".to_string(),
                "vote_proposal:7:true".to_string()
            ]
        );
    }
}
