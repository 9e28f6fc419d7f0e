// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Donation repository.
//!
//! Recording a completed donation and raising the request's total happen in
//! one write transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Amount, RecordId};
use crate::storage::database::{LocalStore, Record, StoreError, StoreResult, Table, WriteScope};

use super::requests::AidRequest;

/// Donation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    /// Submitted on chain, not yet confirmed
    Pending,
    /// Confirmed; counted towards the request
    #[default]
    Completed,
    /// Reverted or abandoned
    Failed,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Completed => "completed",
            DonationStatus::Failed => "failed",
        }
    }
}

/// A contribution from a donor to an aid request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    #[serde(default)]
    pub id: RecordId,
    pub amount: Amount,
    pub donor_id: RecordId,
    pub request_id: RecordId,
    /// Transaction hash (0x prefixed); empty for off-chain records
    #[serde(default)]
    pub tx_hash: String,
    pub network: String,
    #[serde(default)]
    pub status: DonationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
    pub created_at: DateTime<Utc>,
}

impl Donation {
    /// A completed donation confirmed by `tx_hash`.
    pub fn confirmed(
        donor_id: RecordId,
        request_id: RecordId,
        amount: Amount,
        tx_hash: String,
        network: String,
    ) -> Self {
        Self {
            id: 0,
            amount,
            donor_id,
            request_id,
            tx_hash,
            network,
            status: DonationStatus::Completed,
            message: None,
            anonymous: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    pub fn anonymous(mut self, anonymous: bool) -> Self {
        self.anonymous = anonymous;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == DonationStatus::Completed
    }
}

impl Record for Donation {
    const TABLE: Table = Table::Donations;

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            ("donor", self.donor_id.to_string()),
            ("request", self.request_id.to_string()),
            ("status", self.status.as_str().to_string()),
        ];
        if !self.tx_hash.is_empty() {
            entries.push(("tx_hash", self.tx_hash.to_ascii_lowercase()));
        }
        entries
    }

    fn unique_fields() -> &'static [&'static str] {
        &["tx_hash"]
    }
}

/// Repository for donations.
pub struct DonationRepository<'a> {
    store: &'a LocalStore,
}

impl<'a> DonationRepository<'a> {
    pub fn new(store: &'a LocalStore) -> Self {
        Self { store }
    }

    /// Store a donation. A completed donation also raises its request's
    /// `raised_amount` in the same transaction.
    pub fn record(&self, donation: Donation) -> StoreResult<Donation> {
        let donation = self.store.write(|scope| record_in(scope, donation))?;
        tracing::info!(
            donation_id = donation.id,
            request_id = donation.request_id,
            amount = %donation.amount,
            status = donation.status.as_str(),
            "Donation recorded"
        );
        Ok(donation)
    }

    /// Move a pending donation to completed once its transaction confirms.
    pub fn confirm(&self, id: RecordId, tx_hash: &str) -> StoreResult<Donation> {
        self.store.write(|scope| {
            let current = scope.require::<Donation>(id)?;
            if current.status != DonationStatus::Pending {
                return Err(StoreError::Invalid(format!(
                    "Donation {id} is {}, not pending",
                    current.status.as_str()
                )));
            }
            let donation = scope.update::<Donation, _>(id, |d| {
                d.status = DonationStatus::Completed;
                d.tx_hash = tx_hash.to_string();
            })?;
            credit_request(scope, &donation)?;
            Ok(donation)
        })
    }

    /// Mark a pending donation as failed.
    pub fn fail(&self, id: RecordId) -> StoreResult<Donation> {
        self.store.write(|scope| {
            let current = scope.require::<Donation>(id)?;
            if current.status != DonationStatus::Pending {
                return Err(StoreError::Invalid(format!(
                    "Donation {id} is {}, not pending",
                    current.status.as_str()
                )));
            }
            scope.update::<Donation, _>(id, |d| d.status = DonationStatus::Failed)
        })
    }

    pub fn get(&self, id: RecordId) -> StoreResult<Donation> {
        self.store.read(|scope| scope.require(id))
    }

    pub fn by_donor(&self, donor_id: RecordId) -> StoreResult<Vec<Donation>> {
        Ok(newest_first(
            self.store.find_by("donor", &donor_id.to_string())?,
        ))
    }

    pub fn by_request(&self, request_id: RecordId) -> StoreResult<Vec<Donation>> {
        Ok(newest_first(
            self.store.find_by("request", &request_id.to_string())?,
        ))
    }

    pub fn by_tx_hash(&self, tx_hash: &str) -> StoreResult<Option<Donation>> {
        Ok(self
            .store
            .find_by::<Donation>("tx_hash", &tx_hash.to_ascii_lowercase())?
            .into_iter()
            .next())
    }

    /// All donations, newest first.
    pub fn list(&self) -> StoreResult<Vec<Donation>> {
        Ok(newest_first(self.store.list()?))
    }
}

/// Insert `donation` inside an open write transaction, crediting its request
/// when completed.
pub(crate) fn record_in(scope: &WriteScope<'_>, donation: Donation) -> StoreResult<Donation> {
    scope.require::<AidRequest>(donation.request_id)?;
    let donation = scope.insert(donation)?;
    if donation.is_completed() {
        credit_request(scope, &donation)?;
    }
    Ok(donation)
}

fn credit_request(scope: &WriteScope<'_>, donation: &Donation) -> StoreResult<()> {
    let request = scope.update::<AidRequest, _>(donation.request_id, |r| {
        r.apply_donation(donation.amount)
    })?;
    tracing::debug!(
        request_id = request.id,
        raised = %request.raised_amount,
        status = request.status.as_str(),
        "Request total updated"
    );
    Ok(())
}

fn newest_first(mut donations: Vec<Donation>) -> Vec<Donation> {
    donations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    donations
}
