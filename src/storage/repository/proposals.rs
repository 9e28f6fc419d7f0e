// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Governance proposal repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;
use crate::models::RecordId;
use crate::storage::database::{LocalStore, Record, StoreError, StoreResult, Table};

/// Proposal categories. The order matches the on-chain enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalCategory {
    Platform,
    Policy,
    Funding,
    Technical,
    Community,
    Other,
}

impl ProposalCategory {
    pub const ALL: [ProposalCategory; 6] = [
        ProposalCategory::Platform,
        ProposalCategory::Policy,
        ProposalCategory::Funding,
        ProposalCategory::Technical,
        ProposalCategory::Community,
        ProposalCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalCategory::Platform => "platform",
            ProposalCategory::Policy => "policy",
            ProposalCategory::Funding => "funding",
            ProposalCategory::Technical => "technical",
            ProposalCategory::Community => "community",
            ProposalCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    #[default]
    Active,
    Passed,
    Rejected,
    Executed,
}

impl ProposalStatus {
    pub const ALL: [ProposalStatus; 4] = [
        ProposalStatus::Active,
        ProposalStatus::Passed,
        ProposalStatus::Rejected,
        ProposalStatus::Executed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Active => "active",
            ProposalStatus::Passed => "passed",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Executed => "executed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub implementation: String,
    #[serde(default)]
    pub timeline: String,
    pub category: ProposalCategory,
    pub proposer_id: RecordId,
    #[serde(default)]
    pub votes_for: u32,
    #[serde(default)]
    pub votes_against: u32,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields of a new proposal.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProposal {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub implementation: String,
    #[serde(default)]
    pub timeline: String,
    pub category: ProposalCategory,
    pub deadline: DateTime<Utc>,
}

impl NewProposal {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.title.trim().len() < 5 {
            errors.add("title", "Title must be at least 5 characters");
        }
        if self.description.trim().len() < 20 {
            errors.add("description", "Description must be at least 20 characters");
        }
        if self.deadline <= now {
            errors.add("deadline", "Voting deadline must be in the future");
        }
        errors.into_result()
    }
}

impl Proposal {
    pub fn new(proposer_id: RecordId, input: NewProposal) -> Self {
        Self {
            id: 0,
            chain_id: None,
            title: input.title,
            description: input.description,
            rationale: input.rationale,
            implementation: input.implementation,
            timeline: input.timeline,
            category: input.category,
            proposer_id,
            votes_for: 0,
            votes_against: 0,
            deadline: input.deadline,
            status: ProposalStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Outcome by simple majority; ties are rejected.
    fn outcome(&self) -> ProposalStatus {
        if self.votes_for > self.votes_against {
            ProposalStatus::Passed
        } else {
            ProposalStatus::Rejected
        }
    }
}

impl Record for Proposal {
    const TABLE: Table = Table::Proposals;

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            ("proposer", self.proposer_id.to_string()),
            ("status", self.status.as_str().to_string()),
        ];
        if let Some(chain_id) = self.chain_id {
            entries.push(("chain_id", chain_id.to_string()));
        }
        entries
    }

    fn unique_fields() -> &'static [&'static str] {
        &["chain_id"]
    }
}

pub struct ProposalRepository<'a> {
    store: &'a LocalStore,
}

impl<'a> ProposalRepository<'a> {
    pub fn new(store: &'a LocalStore) -> Self {
        Self { store }
    }

    pub fn create(&self, proposal: Proposal) -> StoreResult<Proposal> {
        let proposal = self.store.insert(proposal)?;
        tracing::debug!(
            proposal_id = proposal.id,
            proposer_id = proposal.proposer_id,
            "Proposal created"
        );
        Ok(proposal)
    }

    pub fn get(&self, id: RecordId) -> StoreResult<Proposal> {
        self.store.read(|scope| scope.require(id))
    }

    /// All proposals, newest first.
    pub fn list(&self) -> StoreResult<Vec<Proposal>> {
        let mut proposals = self.store.list::<Proposal>()?;
        proposals.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(proposals)
    }

    pub fn by_proposer(&self, proposer_id: RecordId) -> StoreResult<Vec<Proposal>> {
        self.store.find_by("proposer", &proposer_id.to_string())
    }

    pub fn by_status(&self, status: ProposalStatus) -> StoreResult<Vec<Proposal>> {
        self.store.find_by("status", status.as_str())
    }

    /// Close every active proposal whose deadline has passed.
    ///
    /// Returns the proposals that changed status.
    pub fn finalize_expired(&self, now: DateTime<Utc>) -> StoreResult<Vec<Proposal>> {
        let closed = self.store.write(|scope| {
            let expired: Vec<Proposal> = scope
                .find_by::<Proposal>("status", ProposalStatus::Active.as_str())?
                .into_iter()
                .filter(|p| p.deadline <= now)
                .collect();
            let mut closed = Vec::with_capacity(expired.len());
            for proposal in expired {
                let outcome = proposal.outcome();
                closed.push(scope.update::<Proposal, _>(proposal.id, |p| p.status = outcome)?);
            }
            Ok(closed)
        })?;
        if !closed.is_empty() {
            tracing::info!(count = closed.len(), "Finalized expired proposals");
        }
        Ok(closed)
    }

    /// Mark a passed proposal as executed.
    pub fn mark_executed(&self, id: RecordId) -> StoreResult<Proposal> {
        self.store.write(|scope| {
            let proposal = scope.require::<Proposal>(id)?;
            if proposal.status != ProposalStatus::Passed {
                return Err(StoreError::Invalid(format!(
                    "Proposal {id} is {}; only passed proposals can be executed",
                    proposal.status.as_str()
                )));
            }
            scope.update::<Proposal, _>(id, |p| p.status = ProposalStatus::Executed)
        })
    }
}
