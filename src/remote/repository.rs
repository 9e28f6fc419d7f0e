// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Named queries against the hosted backend.

use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{Amount, WalletAddress};
use crate::session::Role;
use crate::storage::{
    DonationStatus, NewAidRequest, NewProposal, ProposalStatus, RequestStatus, TransactionType,
    TxStatus, VoteType,
};

use super::client::RemoteStoreClient;
use super::query::Query;
use super::rows::{
    DonationRow, ProposalRow, RequestRow, RowTarget, TransactionRow, UserRow, VoteRow,
    AID_REQUESTS, DONATIONS, PROPOSALS, TRANSACTIONS, USERS, VOTES,
};
use super::{RemoteError, RemoteResult};

const REQUESTER_EMBED: &str = "requester:users!creator_id";
const REQUESTER_COLUMNS: &str = "id,name,wallet_address,verified";

/// A confirmed donation to store remotely.
#[derive(Debug, Clone)]
pub struct DonationInsert<'a> {
    pub donor_id: Uuid,
    pub request_id: Uuid,
    pub amount: Amount,
    pub tx_hash: &'a str,
    pub network: &'a str,
    pub message: Option<&'a str>,
    pub anonymous: bool,
}

pub struct RemoteRepository<'a> {
    client: &'a RemoteStoreClient,
}

impl<'a> RemoteRepository<'a> {
    pub fn new(client: &'a RemoteStoreClient) -> Self {
        Self { client }
    }

    pub async fn user(&self, id: Uuid) -> RemoteResult<UserRow> {
        required(
            self.client.select_one(&Query::table(USERS).eq("id", id)).await?,
            USERS,
            id,
        )
    }

    pub async fn user_by_wallet(&self, wallet: &WalletAddress) -> RemoteResult<Option<UserRow>> {
        self.client
            .select_one(&Query::table(USERS).ilike("wallet_address", &wallet.normalized()))
            .await
    }

    pub async fn create_user(
        &self,
        wallet: &WalletAddress,
        email: &str,
        name: &str,
        role: Role,
    ) -> RemoteResult<UserRow> {
        let body = user_body(wallet, email, name, role);
        first(self.client.insert(USERS, &body).await?, USERS)
    }

    /// Set a user's reputation to `current + points`.
    ///
    /// PostgREST has no increment, so concurrent awards can overwrite each
    /// other; `user` should be freshly loaded.
    pub async fn add_reputation(&self, user: &UserRow, points: u32) -> RemoteResult<UserRow> {
        let patch = json!({ "reputation": user.reputation.saturating_add(points) });
        first(
            self.client
                .update(&Query::table(USERS).eq("id", user.id), &patch)
                .await?,
            USERS,
        )
    }

    pub async fn request(&self, id: Uuid) -> RemoteResult<RequestRow> {
        required(
            self.client
                .select_one(&Query::table(AID_REQUESTS).eq("id", id))
                .await?,
            AID_REQUESTS,
            id,
        )
    }

    /// Requests with their requester and votes embedded, newest first.
    pub async fn requests_with_details(
        &self,
        status: Option<RequestStatus>,
    ) -> RemoteResult<Vec<RequestRow>> {
        self.client
            .select(&requests_with_details_query(status))
            .await
    }

    pub async fn requests_by_creator(&self, creator_id: Uuid) -> RemoteResult<Vec<RequestRow>> {
        self.client
            .select(
                &Query::table(AID_REQUESTS)
                    .eq("creator_id", creator_id)
                    .order("created_at", true),
            )
            .await
    }

    pub async fn create_request(
        &self,
        creator_id: Uuid,
        input: &NewAidRequest,
        chain_id: Option<u64>,
    ) -> RemoteResult<RequestRow> {
        let body = request_body(creator_id, input, chain_id);
        let row: RequestRow = first(self.client.insert(AID_REQUESTS, &body).await?, AID_REQUESTS)?;
        tracing::info!(request_id = %row.id, "Remote aid request created");
        Ok(row)
    }

    pub async fn update_request_status(
        &self,
        id: Uuid,
        status: RequestStatus,
    ) -> RemoteResult<RequestRow> {
        let patch = json!({
            "status": status,
            "updated_at": Utc::now(),
        });
        self.patch_request(id, &patch).await
    }

    /// Add a confirmed donation to `request`, completing it once the target
    /// is reached.
    pub async fn credit_request(&self, request: &RequestRow, amount: Amount) -> RemoteResult<RequestRow> {
        self.patch_request(request.id, &credit_patch(request, amount))
            .await
    }

    /// Apply a verification outcome: verified once approvals reach the
    /// quorum, cancelled once rejections do.
    pub async fn settle_request(
        &self,
        request: &RequestRow,
        votes: &[VoteRow],
        quorum: u32,
    ) -> RemoteResult<Option<RequestRow>> {
        match settle_patch(request, votes, quorum) {
            Some(patch) => self.patch_request(request.id, &patch).await.map(Some),
            None => Ok(None),
        }
    }

    async fn patch_request(&self, id: Uuid, patch: &Value) -> RemoteResult<RequestRow> {
        first(
            self.client
                .update(&Query::table(AID_REQUESTS).eq("id", id), patch)
                .await?,
            AID_REQUESTS,
        )
    }

    pub async fn record_donation(&self, donation: &DonationInsert<'_>) -> RemoteResult<DonationRow> {
        let body = donation_body(donation);
        first(self.client.insert(DONATIONS, &body).await?, DONATIONS)
    }

    pub async fn donations_for_request(&self, request_id: Uuid) -> RemoteResult<Vec<DonationRow>> {
        self.client
            .select(
                &Query::table(DONATIONS)
                    .eq("request_id", request_id)
                    .eq("status", DonationStatus::Completed.as_str())
                    .order("created_at", true),
            )
            .await
    }

    pub async fn has_voted(&self, voter_id: Uuid, target: RowTarget) -> RemoteResult<bool> {
        let existing: Option<Value> = self
            .client
            .select_one(&ballot_query(voter_id, target))
            .await?;
        Ok(existing.is_some())
    }

    pub async fn votes_for(&self, target: RowTarget) -> RemoteResult<Vec<VoteRow>> {
        let query = match target {
            RowTarget::Request(id) => Query::table(VOTES).eq("request_id", id),
            RowTarget::Proposal(id) => Query::table(VOTES).eq("proposal_id", id),
        };
        self.client.select(&query).await
    }

    /// Insert a vote. The backend's unique constraint on (voter, target)
    /// turns a second vote into [`RemoteError::AlreadyVoted`].
    pub async fn cast_vote(
        &self,
        voter_id: Uuid,
        target: RowTarget,
        vote_type: VoteType,
        comment: Option<&str>,
    ) -> RemoteResult<VoteRow> {
        let body = vote_body(voter_id, target, vote_type, comment);
        match self.client.insert(VOTES, &body).await {
            Ok(rows) => first(rows, VOTES),
            Err(RemoteError::Conflict(_)) => Err(RemoteError::AlreadyVoted),
            Err(e) => Err(e),
        }
    }

    pub async fn proposal(&self, id: Uuid) -> RemoteResult<ProposalRow> {
        required(
            self.client
                .select_one(&Query::table(PROPOSALS).eq("id", id))
                .await?,
            PROPOSALS,
            id,
        )
    }

    pub async fn proposals(&self, status: Option<ProposalStatus>) -> RemoteResult<Vec<ProposalRow>> {
        let mut query = Query::table(PROPOSALS);
        if let Some(status) = status {
            query = query.eq("status", status.as_str());
        }
        self.client.select(&query.order("created_at", true)).await
    }

    pub async fn create_proposal(
        &self,
        proposer_id: Uuid,
        input: &NewProposal,
        chain_id: Option<u64>,
    ) -> RemoteResult<ProposalRow> {
        let body = proposal_body(proposer_id, input, chain_id);
        let row: ProposalRow = first(self.client.insert(PROPOSALS, &body).await?, PROPOSALS)?;
        tracing::info!(proposal_id = %row.id, "Remote proposal created");
        Ok(row)
    }

    /// Store the tally recomputed from the proposal's votes.
    pub async fn update_proposal_tally(
        &self,
        id: Uuid,
        votes: &[VoteRow],
    ) -> RemoteResult<ProposalRow> {
        let (votes_for, votes_against) = count_votes(votes);
        let patch = json!({
            "votes_for": votes_for,
            "votes_against": votes_against,
        });
        first(
            self.client
                .update(&Query::table(PROPOSALS).eq("id", id), &patch)
                .await?,
            PROPOSALS,
        )
    }

    pub async fn log_transaction(
        &self,
        tx_type: TransactionType,
        from: &WalletAddress,
        to: &WalletAddress,
        amount: Option<Amount>,
        description: &str,
        tx_hash: Option<&str>,
    ) -> RemoteResult<TransactionRow> {
        let body = transaction_body(tx_type, from, to, amount, description, tx_hash);
        first(self.client.insert(TRANSACTIONS, &body).await?, TRANSACTIONS)
    }
}

/// `return=representation` inserts echo the stored rows; an empty echo means
/// row-level security filtered the result.
fn first<T>(rows: Vec<T>, table: &str) -> RemoteResult<T> {
    rows.into_iter()
        .next()
        .ok_or_else(|| RemoteError::NotFound(format!("{table} row not returned")))
}

fn required<T>(row: Option<T>, table: &str, id: Uuid) -> RemoteResult<T> {
    row.ok_or_else(|| RemoteError::NotFound(format!("{table} {id}")))
}

fn requests_with_details_query(status: Option<RequestStatus>) -> Query {
    let mut query = Query::table(AID_REQUESTS)
        .select("*")
        .embed(REQUESTER_EMBED, REQUESTER_COLUMNS)
        .embed(VOTES, "*");
    if let Some(status) = status {
        query = query.eq("status", status.as_str());
    }
    query.order("urgent", true).order("created_at", true)
}

fn ballot_query(voter_id: Uuid, target: RowTarget) -> Query {
    let query = Query::table(VOTES).select("id").eq("voter_id", voter_id);
    match target {
        RowTarget::Request(id) => query.eq("request_id", id),
        RowTarget::Proposal(id) => query.eq("proposal_id", id),
    }
}

fn user_body(wallet: &WalletAddress, email: &str, name: &str, role: Role) -> Value {
    json!({
        "wallet_address": wallet.normalized(),
        "email": email,
        "name": name,
        "role": role,
    })
}

fn request_body(creator_id: Uuid, input: &NewAidRequest, chain_id: Option<u64>) -> Value {
    json!({
        "creator_id": creator_id,
        "chain_id": chain_id,
        "title": input.title,
        "description": input.description,
        "category": input.category,
        "location": input.location,
        "target_amount": input.target_amount,
        "raised_amount": Amount::ZERO,
        "deadline": input.deadline,
        "status": RequestStatus::Active,
        "urgent": input.urgent,
        "media_urls": input.media_urls,
        "external_links": input.external_links,
    })
}

fn credit_patch(request: &RequestRow, amount: Amount) -> Value {
    let raised = request.raised_amount.saturating_add(amount);
    let status = if request.status == RequestStatus::Active && raised >= request.target_amount {
        RequestStatus::Completed
    } else {
        request.status
    };
    json!({
        "raised_amount": raised,
        "status": status,
        "updated_at": Utc::now(),
    })
}

fn count_votes(votes: &[VoteRow]) -> (u32, u32) {
    votes.iter().fold((0, 0), |(support, against), v| {
        if v.vote_type.is_support() {
            (support + 1, against)
        } else {
            (support, against + 1)
        }
    })
}

fn settle_patch(request: &RequestRow, votes: &[VoteRow], quorum: u32) -> Option<Value> {
    if request.verified {
        return None;
    }
    let (approvals, rejections) = count_votes(votes);
    if approvals >= quorum {
        Some(json!({ "verified": true, "updated_at": Utc::now() }))
    } else if rejections >= quorum && request.status == RequestStatus::Active {
        Some(json!({ "status": RequestStatus::Cancelled, "updated_at": Utc::now() }))
    } else {
        None
    }
}

fn donation_body(donation: &DonationInsert<'_>) -> Value {
    json!({
        "donor_id": donation.donor_id,
        "request_id": donation.request_id,
        "amount": donation.amount,
        "tx_hash": donation.tx_hash,
        "network": donation.network,
        "status": DonationStatus::Completed,
        "message": donation.message,
        "anonymous": donation.anonymous,
    })
}

fn vote_body(voter_id: Uuid, target: RowTarget, vote_type: VoteType, comment: Option<&str>) -> Value {
    json!({
        "voter_id": voter_id,
        "request_id": target.request_id(),
        "proposal_id": target.proposal_id(),
        "vote_type": vote_type,
        "comment": comment,
    })
}

fn proposal_body(proposer_id: Uuid, input: &NewProposal, chain_id: Option<u64>) -> Value {
    json!({
        "proposer_id": proposer_id,
        "chain_id": chain_id,
        "title": input.title,
        "description": input.description,
        "rationale": input.rationale,
        "implementation": input.implementation,
        "timeline": input.timeline,
        "category": input.category,
        "deadline": input.deadline,
        "status": ProposalStatus::Active,
        "votes_for": 0,
        "votes_against": 0,
    })
}

fn transaction_body(
    tx_type: TransactionType,
    from: &WalletAddress,
    to: &WalletAddress,
    amount: Option<Amount>,
    description: &str,
    tx_hash: Option<&str>,
) -> Value {
    let status = match tx_hash {
        Some(_) => TxStatus::Confirmed,
        None => TxStatus::Pending,
    };
    json!({
        "tx_type": tx_type,
        "from_address": from.normalized(),
        "to_address": to.normalized(),
        "amount": amount,
        "description": description,
        "status": status,
        "tx_hash": tx_hash,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::remote::test_server::TestServer;
    use crate::storage::RequestCategory;

    const VOTER: Uuid = Uuid::from_u128(0x0a1b2c3d_0000_4000_8000_000000000002);
    const REQUEST: Uuid = Uuid::from_u128(0x6f1c2a52_8a4b_4a55_9b8a_0c1d2e3f4a5b);

    fn param(query: &Query, key: &str) -> Vec<String> {
        query
            .to_params()
            .into_iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v)
            .collect()
    }

    fn request_row(raised: Amount, status: RequestStatus) -> RequestRow {
        RequestRow {
            id: REQUEST,
            chain_id: Some(3),
            title: "Flood relief".to_string(),
            description: "Boats and food for stranded families".to_string(),
            category: RequestCategory::Disaster,
            location: "Sindh".to_string(),
            target_amount: Amount::eth(10),
            raised_amount: raised,
            creator_id: Uuid::nil(),
            deadline: Utc::now() + Duration::days(5),
            status,
            urgent: false,
            verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            requester: None,
            votes: None,
        }
    }

    fn vote_row(vote_type: VoteType) -> VoteRow {
        VoteRow {
            id: Uuid::new_v4(),
            voter_id: Uuid::new_v4(),
            request_id: Some(REQUEST),
            proposal_id: None,
            vote_type,
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn first_of_empty_echo_is_not_found() {
        let rows: Vec<u8> = vec![];
        assert!(matches!(first(rows, VOTES), Err(RemoteError::NotFound(_))));
        assert_eq!(first(vec![7u8, 8], VOTES).unwrap(), 7);
    }

    #[test]
    fn vote_body_sets_exactly_one_target() {
        let body = vote_body(VOTER, RowTarget::Proposal(REQUEST), VoteType::Reject, Some("no"));
        assert!(body["request_id"].is_null());
        assert_eq!(body["proposal_id"], json!(REQUEST));
        assert_eq!(body["vote_type"], "reject");
        assert_eq!(body["comment"], "no");

        let body = vote_body(VOTER, RowTarget::Request(REQUEST), VoteType::Approve, None);
        assert_eq!(body["request_id"], json!(REQUEST));
        assert!(body["proposal_id"].is_null());
    }

    #[test]
    fn details_query_embeds_requester_and_votes() {
        let query = requests_with_details_query(Some(RequestStatus::Active));
        assert_eq!(
            param(&query, "select"),
            vec!["*,requester:users!creator_id(id,name,wallet_address,verified),votes(*)"]
        );
        assert_eq!(param(&query, "status"), vec!["eq.active"]);
        assert_eq!(param(&query, "order"), vec!["urgent.desc,created_at.desc"]);

        let all = requests_with_details_query(None);
        assert!(param(&all, "status").is_empty());
    }

    #[test]
    fn ballot_query_filters_voter_and_target() {
        let query = ballot_query(VOTER, RowTarget::Request(REQUEST));
        assert_eq!(param(&query, "voter_id"), vec![format!("eq.{VOTER}")]);
        assert_eq!(param(&query, "request_id"), vec![format!("eq.{REQUEST}")]);
        assert!(param(&query, "proposal_id").is_empty());
    }

    #[test]
    fn request_body_starts_unfunded_and_active() {
        let input = NewAidRequest {
            title: "Clean water wells".to_string(),
            description: "Two hand-pump wells for the village school".to_string(),
            category: RequestCategory::Other,
            location: "Tamale".to_string(),
            target_amount: Amount::eth(3),
            deadline: Utc::now() + Duration::days(30),
            urgent: true,
            media_urls: vec!["https://img.example/well.jpg".to_string()],
            external_links: Vec::new(),
        };
        let body = request_body(VOTER, &input, Some(9));
        assert_eq!(body["creator_id"], json!(VOTER));
        assert_eq!(body["chain_id"], 9);
        assert_eq!(body["target_amount"], "3000000000000000000");
        assert_eq!(body["raised_amount"], "0");
        assert_eq!(body["status"], "active");
        assert_eq!(body["media_urls"][0], "https://img.example/well.jpg");

        assert!(request_body(VOTER, &input, None)["chain_id"].is_null());
    }

    #[test]
    fn donation_body_is_completed_with_wei_text() {
        let body = donation_body(&DonationInsert {
            donor_id: VOTER,
            request_id: REQUEST,
            amount: Amount::eth(2),
            tx_hash: "0xabc",
            network: "sepolia",
            message: None,
            anonymous: true,
        });
        assert_eq!(body["amount"], "2000000000000000000");
        assert_eq!(body["status"], "completed");
        assert_eq!(body["tx_hash"], "0xabc");
        assert_eq!(body["anonymous"], true);
        assert!(body["message"].is_null());
    }

    #[test]
    fn transaction_status_follows_hash() {
        let from = WalletAddress::from("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12");
        let to = WalletAddress::from("0x8ba1f109551bd432803012645ac136ddd64dba72");
        let confirmed = transaction_body(
            TransactionType::Donation,
            &from,
            &to,
            Some(Amount::eth(1)),
            "Donation",
            Some("0xabc"),
        );
        assert_eq!(confirmed["status"], "confirmed");
        assert_eq!(confirmed["from_address"], from.normalized());

        let pending =
            transaction_body(TransactionType::Vote, &from, &to, None, "Vote", None);
        assert_eq!(pending["status"], "pending");
        assert!(pending["amount"].is_null());
    }

    #[test]
    fn credit_completes_at_target() {
        let patch = credit_patch(&request_row(Amount::eth(6), RequestStatus::Active), Amount::eth(3));
        assert_eq!(patch["raised_amount"], "9000000000000000000");
        assert_eq!(patch["status"], "active");

        let patch = credit_patch(&request_row(Amount::eth(6), RequestStatus::Active), Amount::eth(4));
        assert_eq!(patch["status"], "completed");
    }

    #[test]
    fn settle_follows_quorum() {
        let request = request_row(Amount::ZERO, RequestStatus::Active);
        let approvals = [vote_row(VoteType::Approve), vote_row(VoteType::Approve)];
        assert!(settle_patch(&request, &approvals[..1], 2).is_none());
        assert_eq!(settle_patch(&request, &approvals, 2).unwrap()["verified"], true);

        let rejections = [vote_row(VoteType::Reject)];
        assert_eq!(
            settle_patch(&request, &rejections, 1).unwrap()["status"],
            "cancelled"
        );
    }

    #[tokio::test]
    async fn second_vote_conflict_is_already_voted() {
        let server = TestServer::start(|req| {
            assert_eq!(req.method, "POST");
            assert!(req.target.starts_with("/rest/v1/votes"));
            (
                409,
                r#"{"code":"23505","message":"duplicate key value violates unique constraint \"votes_voter_request_key\""}"#
                    .to_string(),
            )
        })
        .await;
        let client = server.client();

        let result = RemoteRepository::new(&client)
            .cast_vote(VOTER, RowTarget::Request(REQUEST), VoteType::Approve, None)
            .await;

        assert!(matches!(result, Err(RemoteError::AlreadyVoted)));
        let sent: Value = serde_json::from_str(&server.requests()[0].body).unwrap();
        assert_eq!(sent["voter_id"], json!(VOTER));
        assert_eq!(sent["request_id"], json!(REQUEST));
    }

    #[tokio::test]
    async fn other_vote_failures_pass_through() {
        let server = TestServer::start(|_| (500, r#"{"message":"boom"}"#.to_string())).await;
        let client = server.client();

        let result = RemoteRepository::new(&client)
            .cast_vote(VOTER, RowTarget::Request(REQUEST), VoteType::Approve, None)
            .await;

        assert!(matches!(result, Err(RemoteError::Api { status: 500, .. })));
    }

    #[tokio::test]
    async fn missing_request_is_not_found() {
        let server = TestServer::start(|_| (200, "[]".to_string())).await;
        let client = server.client();

        let result = RemoteRepository::new(&client).request(REQUEST).await;

        assert!(matches!(result, Err(RemoteError::NotFound(what)) if what.contains("aid_requests")));
        assert!(server.requests()[0].target.contains("limit=1"));
    }
}
