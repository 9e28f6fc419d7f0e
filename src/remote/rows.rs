// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Wire shapes of the hosted backend tables.
//!
//! Rows are keyed by UUID primary keys. Amount columns are `text` holding
//! wei, so they map onto [`Amount`] without precision loss.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Amount, WalletAddress};
use crate::session::Role;
use crate::storage::{
    DonationStatus, ProposalCategory, ProposalStatus, RequestCategory, RequestStatus,
    TransactionType, TxStatus, VoteType,
};

pub const USERS: &str = "users";
pub const AID_REQUESTS: &str = "aid_requests";
pub const DONATIONS: &str = "donations";
pub const VOTES: &str = "votes";
pub const PROPOSALS: &str = "proposals";
pub const TRANSACTIONS: &str = "transactions";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: Uuid,
    pub wallet_address: WalletAddress,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub reputation: u32,
    #[serde(default)]
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Embedded requester columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub wallet_address: Option<WalletAddress>,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRow {
    pub id: Uuid,
    #[serde(default)]
    pub chain_id: Option<u64>,
    pub title: String,
    pub description: String,
    pub category: RequestCategory,
    pub location: String,
    pub target_amount: Amount,
    #[serde(default)]
    pub raised_amount: Amount,
    pub creator_id: Uuid,
    pub deadline: DateTime<Utc>,
    pub status: RequestStatus,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present when the query embeds the creator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<UserSummary>,
    /// Present when the query embeds votes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<Vec<VoteRow>>,
}

impl RequestRow {
    pub fn progress(&self) -> f64 {
        self.raised_amount.percentage_of(self.target_amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationRow {
    pub id: Uuid,
    pub amount: Amount,
    pub donor_id: Uuid,
    pub request_id: Uuid,
    pub tx_hash: String,
    pub network: String,
    pub status: DonationStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
    pub created_at: DateTime<Utc>,
}

/// Vote target on the backend: exactly one of the two foreign keys is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTarget {
    Request(Uuid),
    Proposal(Uuid),
}

impl RowTarget {
    pub fn request_id(&self) -> Option<Uuid> {
        match self {
            RowTarget::Request(id) => Some(*id),
            RowTarget::Proposal(_) => None,
        }
    }

    pub fn proposal_id(&self) -> Option<Uuid> {
        match self {
            RowTarget::Request(_) => None,
            RowTarget::Proposal(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteRow {
    pub id: Uuid,
    pub voter_id: Uuid,
    #[serde(default)]
    pub request_id: Option<Uuid>,
    #[serde(default)]
    pub proposal_id: Option<Uuid>,
    pub vote_type: VoteType,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl VoteRow {
    pub fn target(&self) -> Option<RowTarget> {
        match (self.request_id, self.proposal_id) {
            (Some(id), None) => Some(RowTarget::Request(id)),
            (None, Some(id)) => Some(RowTarget::Proposal(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalRow {
    pub id: Uuid,
    #[serde(default)]
    pub chain_id: Option<u64>,
    pub title: String,
    pub description: String,
    pub category: ProposalCategory,
    pub proposer_id: Uuid,
    #[serde(default)]
    pub votes_for: u32,
    #[serde(default)]
    pub votes_against: u32,
    pub deadline: DateTime<Utc>,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: Uuid,
    pub tx_type: TransactionType,
    pub from_address: WalletAddress,
    pub to_address: WalletAddress,
    #[serde(default)]
    pub amount: Option<Amount>,
    pub description: String,
    pub status: TxStatus,
    #[serde(default)]
    pub tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_row_with_embedded_relations() {
        let json = r#"{
            "id": "6f1c2a52-8a4b-4a55-9b8a-0c1d2e3f4a5b",
            "title": "Flood relief",
            "description": "Boats and food for stranded families",
            "category": "disaster",
            "location": "Sindh",
            "target_amount": "10000000000000000000",
            "raised_amount": "9000000000000000000",
            "creator_id": "0a1b2c3d-0000-4000-8000-000000000001",
            "deadline": "2026-12-01T00:00:00Z",
            "status": "active",
            "urgent": true,
            "created_at": "2026-10-01T08:00:00Z",
            "updated_at": "2026-10-02T08:00:00Z",
            "requester": {
                "id": "0a1b2c3d-0000-4000-8000-000000000001",
                "name": "Riya",
                "wallet_address": null
            },
            "votes": [{
                "id": "0a1b2c3d-0000-4000-8000-0000000000aa",
                "voter_id": "0a1b2c3d-0000-4000-8000-000000000002",
                "request_id": "6f1c2a52-8a4b-4a55-9b8a-0c1d2e3f4a5b",
                "proposal_id": null,
                "vote_type": "approve",
                "created_at": "2026-10-03T08:00:00Z"
            }]
        }"#;
        let row: RequestRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.progress(), 90.0);
        assert!(!row.verified);
        let requester = row.requester.as_ref().unwrap();
        assert!(requester.wallet_address.is_none());
        let votes = row.votes.as_ref().unwrap();
        assert!(matches!(votes[0].target(), Some(RowTarget::Request(id)) if id == row.id));
    }

    #[test]
    fn vote_row_without_target_is_rejected() {
        let vote = VoteRow {
            id: Uuid::nil(),
            voter_id: Uuid::nil(),
            request_id: Some(Uuid::nil()),
            proposal_id: Some(Uuid::nil()),
            vote_type: VoteType::Reject,
            comment: None,
            created_at: Utc::now(),
        };
        assert!(vote.target().is_none());
    }
}
