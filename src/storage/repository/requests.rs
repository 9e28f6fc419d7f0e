// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Aid request repository.
//!
//! An aid request is a funding campaign owned by its creator. Donations raise
//! `raised_amount`; verifier votes flip `verified` or cancel the request.
//! Every update stamps `updated_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;
use crate::models::{Amount, RecordId};
use crate::storage::database::{LocalStore, Record, StoreResult, Table};

/// Fixed request categories. The order matches the on-chain enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestCategory {
    Medical,
    Education,
    Disaster,
    Food,
    Shelter,
    Other,
}

impl RequestCategory {
    pub const ALL: [RequestCategory; 6] = [
        RequestCategory::Medical,
        RequestCategory::Education,
        RequestCategory::Disaster,
        RequestCategory::Food,
        RequestCategory::Shelter,
        RequestCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestCategory::Medical => "medical",
            RequestCategory::Education => "education",
            RequestCategory::Disaster => "disaster",
            RequestCategory::Food => "food",
            RequestCategory::Shelter => "shelter",
            RequestCategory::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim().to_lowercase())
    }
}

/// Request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 3] = [
        RequestStatus::Active,
        RequestStatus::Completed,
        RequestStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Active => "active",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }
}

/// A funding campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AidRequest {
    #[serde(default)]
    pub id: RecordId,
    /// Identifier assigned by the aid request contract, once submitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    pub title: String,
    pub description: String,
    pub category: RequestCategory,
    pub location: String,
    pub target_amount: Amount,
    #[serde(default)]
    pub raised_amount: Amount,
    /// Owning user
    pub creator_id: RecordId,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub external_links: Vec<String>,
}

/// Caller-supplied fields of a new request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAidRequest {
    pub title: String,
    pub description: String,
    pub category: RequestCategory,
    pub location: String,
    pub target_amount: Amount,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub external_links: Vec<String>,
}

impl NewAidRequest {
    /// Form-level checks; every failing field is reported.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.title.trim().len() < 5 {
            errors.add("title", "Title must be at least 5 characters");
        }
        if self.title.len() > 120 {
            errors.add("title", "Title must be at most 120 characters");
        }
        if self.description.trim().len() < 20 {
            errors.add("description", "Description must be at least 20 characters");
        }
        if self.location.trim().is_empty() {
            errors.add("location", "Location is required");
        }
        if self.target_amount.is_zero() {
            errors.add("target_amount", "Target amount must be greater than zero");
        }
        if self.deadline <= now {
            errors.add("deadline", "Deadline must be in the future");
        }
        errors.into_result()
    }
}

impl AidRequest {
    /// Build an active, unfunded request owned by `creator_id`.
    pub fn new(creator_id: RecordId, input: NewAidRequest) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            chain_id: None,
            title: input.title,
            description: input.description,
            category: input.category,
            location: input.location,
            target_amount: input.target_amount,
            raised_amount: Amount::ZERO,
            creator_id,
            deadline: input.deadline,
            status: RequestStatus::Active,
            urgent: input.urgent,
            verified: false,
            created_at: now,
            updated_at: now,
            media_urls: input.media_urls,
            external_links: input.external_links,
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == RequestStatus::Active && self.deadline > now
    }

    /// Funding progress in percent (two decimals, capped at 100).
    pub fn progress(&self) -> f64 {
        self.raised_amount.percentage_of(self.target_amount)
    }

    /// Add a confirmed donation; completes the request once the target is met.
    pub(crate) fn apply_donation(&mut self, amount: Amount) {
        self.raised_amount = self.raised_amount.saturating_add(amount);
        if self.status == RequestStatus::Active && self.raised_amount >= self.target_amount {
            self.status = RequestStatus::Completed;
        }
        self.updated_at = Utc::now();
    }
}

impl Record for AidRequest {
    const TABLE: Table = Table::AidRequests;

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            ("creator", self.creator_id.to_string()),
            ("status", self.status.as_str().to_string()),
            ("category", self.category.as_str().to_string()),
        ];
        if let Some(chain_id) = self.chain_id {
            entries.push(("chain_id", chain_id.to_string()));
        }
        entries
    }

    fn unique_fields() -> &'static [&'static str] {
        &["chain_id"]
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Partial update of a request; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<RequestCategory>,
    pub location: Option<String>,
    pub target_amount: Option<Amount>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<RequestStatus>,
    pub urgent: Option<bool>,
    pub verified: Option<bool>,
    pub chain_id: Option<u64>,
    pub media_urls: Option<Vec<String>>,
    pub external_links: Option<Vec<String>>,
}

impl RequestUpdate {
    fn apply(self, request: &mut AidRequest) {
        if let Some(title) = self.title {
            request.title = title;
        }
        if let Some(description) = self.description {
            request.description = description;
        }
        if let Some(category) = self.category {
            request.category = category;
        }
        if let Some(location) = self.location {
            request.location = location;
        }
        if let Some(target) = self.target_amount {
            request.target_amount = target;
        }
        if let Some(deadline) = self.deadline {
            request.deadline = deadline;
        }
        if let Some(status) = self.status {
            request.status = status;
        }
        if let Some(urgent) = self.urgent {
            request.urgent = urgent;
        }
        if let Some(verified) = self.verified {
            request.verified = verified;
        }
        if self.chain_id.is_some() {
            request.chain_id = self.chain_id;
        }
        if let Some(media) = self.media_urls {
            request.media_urls = media;
        }
        if let Some(links) = self.external_links {
            request.external_links = links;
        }
    }
}

/// Repository for aid requests.
pub struct RequestRepository<'a> {
    store: &'a LocalStore,
}

impl<'a> RequestRepository<'a> {
    pub fn new(store: &'a LocalStore) -> Self {
        Self { store }
    }

    pub fn create(&self, request: AidRequest) -> StoreResult<AidRequest> {
        let request = self.store.insert(request)?;
        tracing::debug!(
            request_id = request.id,
            creator_id = request.creator_id,
            category = request.category.as_str(),
            "Aid request created"
        );
        Ok(request)
    }

    pub fn get(&self, id: RecordId) -> StoreResult<AidRequest> {
        self.store.read(|scope| scope.require(id))
    }

    /// Merge `update` into the stored request and stamp `updated_at`.
    pub fn update(&self, id: RecordId, update: RequestUpdate) -> StoreResult<AidRequest> {
        self.store
            .update::<AidRequest, _>(id, |request| update.apply(request))
    }

    pub fn set_status(&self, id: RecordId, status: RequestStatus) -> StoreResult<AidRequest> {
        self.update(
            id,
            RequestUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
    }

    pub fn by_creator(&self, creator_id: RecordId) -> StoreResult<Vec<AidRequest>> {
        Ok(newest_first(
            self.store.find_by("creator", &creator_id.to_string())?,
        ))
    }

    pub fn by_status(&self, status: RequestStatus) -> StoreResult<Vec<AidRequest>> {
        Ok(newest_first(self.store.find_by("status", status.as_str())?))
    }

    pub fn by_category(&self, category: RequestCategory) -> StoreResult<Vec<AidRequest>> {
        Ok(newest_first(self.store.find_by("category", category.as_str())?))
    }

    pub fn by_chain_id(&self, chain_id: u64) -> StoreResult<Option<AidRequest>> {
        Ok(self
            .store
            .find_by::<AidRequest>("chain_id", &chain_id.to_string())?
            .into_iter()
            .next())
    }

    /// All requests, newest first.
    pub fn list(&self) -> StoreResult<Vec<AidRequest>> {
        Ok(newest_first(self.store.list()?))
    }

    /// Active requests whose deadline has not passed; urgent ones first.
    pub fn active(&self, now: DateTime<Utc>) -> StoreResult<Vec<AidRequest>> {
        let mut requests: Vec<AidRequest> = self
            .by_status(RequestStatus::Active)?
            .into_iter()
            .filter(|r| r.deadline > now)
            .collect();
        requests.sort_by(|a, b| b.urgent.cmp(&a.urgent).then(b.created_at.cmp(&a.created_at)));
        Ok(requests)
    }

    /// Case-insensitive match on title, description or location.
    pub fn search(&self, text: &str) -> StoreResult<Vec<AidRequest>> {
        let needle = text.trim().to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .filter(|r| {
                r.title.to_lowercase().contains(&needle)
                    || r.description.to_lowercase().contains(&needle)
                    || r.location.to_lowercase().contains(&needle)
            })
            .collect())
    }
}

fn newest_first(mut requests: Vec<AidRequest>) -> Vec<AidRequest> {
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    requests
}
