// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Vote repository.
//!
//! ## Uniqueness
//!
//! Each vote carries a `ballot` index entry (`voter@target`) declared unique.
//! The uniqueness check and the insert run in the same write transaction, so
//! two concurrent casts by one voter cannot both land.
//!
//! ## Effects
//!
//! - Proposal votes bump `votes_for` / `votes_against`.
//! - Request votes verify the request once approvals reach the quorum, and
//!   cancel an unverified request once rejections reach it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::RecordId;
use crate::storage::database::{LocalStore, Record, StoreError, StoreResult, Table, WriteScope};

use super::proposals::{Proposal, ProposalStatus};
use super::requests::{AidRequest, RequestStatus};

/// What a vote is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum VoteTarget {
    /// Verification vote on an aid request
    Request(RecordId),
    /// Governance vote on a proposal
    Proposal(RecordId),
}

impl fmt::Display for VoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteTarget::Request(id) => write!(f, "request:{id}"),
            VoteTarget::Proposal(id) => write!(f, "proposal:{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Approve,
    Reject,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Approve => "approve",
            VoteType::Reject => "reject",
        }
    }

    /// On-chain `support` flag.
    pub fn is_support(&self) -> bool {
        matches!(self, VoteType::Approve)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(default)]
    pub id: RecordId,
    pub voter_id: RecordId,
    pub target: VoteTarget,
    pub vote_type: VoteType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(voter_id: RecordId, target: VoteTarget, vote_type: VoteType) -> Self {
        Self {
            id: 0,
            voter_id,
            target,
            vote_type,
            comment: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }
}

fn ballot_key(voter_id: RecordId, target: VoteTarget) -> String {
    format!("{voter_id}@{target}")
}

impl Record for Vote {
    const TABLE: Table = Table::Votes;

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("voter", self.voter_id.to_string()),
            ("target", self.target.to_string()),
            ("ballot", ballot_key(self.voter_id, self.target)),
        ]
    }

    fn unique_fields() -> &'static [&'static str] {
        &["ballot"]
    }
}

/// Approve/reject counts for one target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub approve: u32,
    pub reject: u32,
}

impl Tally {
    fn from_votes<'v>(votes: impl IntoIterator<Item = &'v Vote>) -> Self {
        votes.into_iter().fold(Tally::default(), |mut t, v| {
            match v.vote_type {
                VoteType::Approve => t.approve += 1,
                VoteType::Reject => t.reject += 1,
            }
            t
        })
    }
}

/// Repository for votes.
pub struct VoteRepository<'a> {
    store: &'a LocalStore,
    quorum: u32,
}

impl<'a> VoteRepository<'a> {
    /// Repository with a verification quorum of one vote.
    pub fn new(store: &'a LocalStore) -> Self {
        Self { store, quorum: 1 }
    }

    /// Number of matching votes that verifies (or cancels) a request.
    pub fn with_quorum(mut self, quorum: u32) -> Self {
        self.quorum = quorum.max(1);
        self
    }

    /// Cast a vote and apply its effect on the target atomically.
    ///
    /// A second vote by the same voter on the same target fails with
    /// [`StoreError::AlreadyVoted`] and changes nothing.
    pub fn cast(&self, vote: Vote) -> StoreResult<Vote> {
        let quorum = self.quorum;
        let vote = self.store.write(|scope| cast_in(scope, vote, quorum))?;
        tracing::info!(
            vote_id = vote.id,
            voter_id = vote.voter_id,
            target = %vote.target,
            vote_type = vote.vote_type.as_str(),
            "Vote cast"
        );
        Ok(vote)
    }

    pub fn has_voted(&self, voter_id: RecordId, target: VoteTarget) -> StoreResult<bool> {
        self.store
            .read(|scope| scope.exists_by::<Vote>("ballot", &ballot_key(voter_id, target)))
    }

    pub fn by_target(&self, target: VoteTarget) -> StoreResult<Vec<Vote>> {
        self.store.find_by("target", &target.to_string())
    }

    pub fn by_voter(&self, voter_id: RecordId) -> StoreResult<Vec<Vote>> {
        self.store.find_by("voter", &voter_id.to_string())
    }

    pub fn tally(&self, target: VoteTarget) -> StoreResult<Tally> {
        Ok(Tally::from_votes(&self.by_target(target)?))
    }
}

/// Insert `vote` inside an open write transaction and apply its effect.
pub(crate) fn cast_in(scope: &WriteScope<'_>, vote: Vote, quorum: u32) -> StoreResult<Vote> {
    match vote.target {
        VoteTarget::Request(id) => {
            scope.require::<AidRequest>(id)?;
        }
        VoteTarget::Proposal(id) => {
            let proposal = scope.require::<Proposal>(id)?;
            if proposal.status != ProposalStatus::Active {
                return Err(StoreError::Invalid(format!(
                    "Proposal {id} is {} and no longer accepts votes",
                    proposal.status.as_str()
                )));
            }
        }
    }

    let vote = scope.insert(vote).map_err(|e| match e {
        StoreError::Duplicate { value, .. } => StoreError::AlreadyVoted(value),
        other => other,
    })?;
    apply_effect(scope, &vote, quorum)?;
    Ok(vote)
}

fn apply_effect(scope: &WriteScope<'_>, vote: &Vote, quorum: u32) -> StoreResult<()> {
    match vote.target {
        VoteTarget::Proposal(id) => {
            scope.update::<Proposal, _>(id, |p| match vote.vote_type {
                VoteType::Approve => p.votes_for = p.votes_for.saturating_add(1),
                VoteType::Reject => p.votes_against = p.votes_against.saturating_add(1),
            })?;
        }
        VoteTarget::Request(id) => {
            let votes = scope.find_by::<Vote>("target", &vote.target.to_string())?;
            let tally = Tally::from_votes(&votes);
            scope.update::<AidRequest, _>(id, |r| {
                if tally.approve >= quorum && !r.verified {
                    r.verified = true;
                } else if tally.reject >= quorum
                    && !r.verified
                    && r.status == RequestStatus::Active
                {
                    r.status = RequestStatus::Cancelled;
                }
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repository::proposals::{NewProposal, ProposalCategory, ProposalRepository};
    use crate::storage::repository::requests::{NewAidRequest, RequestCategory, RequestRepository};
    use chrono::Duration;

    fn temp_store() -> (LocalStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(&dir.path().join("votes.redb")).unwrap();
        (store, dir)
    }

    fn request(store: &LocalStore) -> AidRequest {
        RequestRepository::new(store)
            .create(AidRequest::new(
                1,
                NewAidRequest {
                    title: "School roof".to_string(),
                    description: "Repair the primary school roof before the rains".to_string(),
                    category: RequestCategory::Education,
                    location: "Mzuzu".to_string(),
                    target_amount: crate::models::Amount::eth(3),
                    deadline: Utc::now() + Duration::days(20),
                    urgent: false,
                    media_urls: vec![],
                    external_links: vec![],
                },
            ))
            .unwrap()
    }

    fn proposal(store: &LocalStore, deadline: DateTime<Utc>) -> Proposal {
        ProposalRepository::new(store)
            .create(Proposal::new(
                1,
                NewProposal {
                    title: "Lower platform fee".to_string(),
                    description: "Reduce the platform fee to zero for medical requests".to_string(),
                    rationale: "Medical requests are time critical".to_string(),
                    implementation: "Update fee schedule".to_string(),
                    timeline: "Next release".to_string(),
                    category: ProposalCategory::Funding,
                    deadline,
                },
            ))
            .unwrap()
    }

    #[test]
    fn duplicate_vote_is_rejected() {
        let (store, _dir) = temp_store();
        let req = request(&store);
        let repo = VoteRepository::new(&store);
        let target = VoteTarget::Request(req.id);

        repo.cast(Vote::new(5, target, VoteType::Approve)).unwrap();
        let second = repo.cast(Vote::new(5, target, VoteType::Reject));
        assert!(matches!(second, Err(StoreError::AlreadyVoted(_))));
        assert_eq!(repo.by_target(target).unwrap().len(), 1);
        assert!(repo.has_voted(5, target).unwrap());
        assert!(!repo.has_voted(6, target).unwrap());
    }

    #[test]
    fn same_voter_may_vote_on_different_targets() {
        let (store, _dir) = temp_store();
        let a = request(&store);
        let b = request(&store);
        let repo = VoteRepository::new(&store);
        repo.cast(Vote::new(5, VoteTarget::Request(a.id), VoteType::Approve))
            .unwrap();
        repo.cast(Vote::new(5, VoteTarget::Request(b.id), VoteType::Approve))
            .unwrap();
        assert_eq!(repo.by_voter(5).unwrap().len(), 2);
    }

    #[test]
    fn request_is_verified_at_quorum() {
        let (store, _dir) = temp_store();
        let req = request(&store);
        let repo = VoteRepository::new(&store).with_quorum(2);
        let target = VoteTarget::Request(req.id);

        repo.cast(Vote::new(5, target, VoteType::Approve)).unwrap();
        assert!(!RequestRepository::new(&store).get(req.id).unwrap().verified);

        repo.cast(Vote::new(6, target, VoteType::Approve)).unwrap();
        assert!(RequestRepository::new(&store).get(req.id).unwrap().verified);
        assert_eq!(repo.tally(target).unwrap(), Tally { approve: 2, reject: 0 });
    }

    #[test]
    fn rejection_cancels_unverified_request() {
        let (store, _dir) = temp_store();
        let req = request(&store);
        let repo = VoteRepository::new(&store);
        repo.cast(Vote::new(5, VoteTarget::Request(req.id), VoteType::Reject))
            .unwrap();

        let stored = RequestRepository::new(&store).get(req.id).unwrap();
        assert_eq!(stored.status, RequestStatus::Cancelled);
        assert!(!stored.verified);
    }

    #[test]
    fn proposal_votes_update_tallies() {
        let (store, _dir) = temp_store();
        let prop = proposal(&store, Utc::now() + Duration::days(7));
        let repo = VoteRepository::new(&store);
        let target = VoteTarget::Proposal(prop.id);

        repo.cast(Vote::new(5, target, VoteType::Approve)).unwrap();
        repo.cast(Vote::new(6, target, VoteType::Approve)).unwrap();
        repo.cast(Vote::new(7, target, VoteType::Reject)).unwrap();

        let stored = ProposalRepository::new(&store).get(prop.id).unwrap();
        assert_eq!((stored.votes_for, stored.votes_against), (2, 1));
    }

    #[test]
    fn closed_proposal_rejects_votes() {
        let (store, _dir) = temp_store();
        let prop = proposal(&store, Utc::now() - Duration::days(1));
        ProposalRepository::new(&store)
            .finalize_expired(Utc::now())
            .unwrap();

        let result = VoteRepository::new(&store).cast(Vote::new(
            5,
            VoteTarget::Proposal(prop.id),
            VoteType::Approve,
        ));
        assert!(matches!(result, Err(StoreError::Invalid(_))));
    }

    #[test]
    fn vote_on_missing_target_is_not_found() {
        let (store, _dir) = temp_store();
        let result = VoteRepository::new(&store).cast(Vote::new(
            5,
            VoteTarget::Request(404),
            VoteType::Approve,
        ));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn target_serializes_tagged() {
        let json = serde_json::to_string(&VoteTarget::Proposal(3)).unwrap();
        assert_eq!(json, r#"{"kind":"proposal","id":3}"#);
    }
}
