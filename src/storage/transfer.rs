// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Whole-database JSON export and import.
//!
//! Import replaces every table in a single write transaction, keeps record
//! ids, and rebuilds the secondary indexes and id counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::database::{rebuild_indexes, LocalStore, StoreError, StoreResult, SCHEMA_VERSION};
use super::repository::{AidRequest, Donation, Proposal, StoredTransaction, User, Vote};

/// Full snapshot of the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseDump {
    pub schema_version: u32,
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub aid_requests: Vec<AidRequest>,
    #[serde(default)]
    pub donations: Vec<Donation>,
    #[serde(default)]
    pub transactions: Vec<StoredTransaction>,
    #[serde(default)]
    pub proposals: Vec<Proposal>,
    #[serde(default)]
    pub votes: Vec<Vote>,
}

impl DatabaseDump {
    pub fn record_count(&self) -> usize {
        self.users.len()
            + self.aid_requests.len()
            + self.donations.len()
            + self.transactions.len()
            + self.proposals.len()
            + self.votes.len()
    }
}

impl LocalStore {
    /// Snapshot every table in one read transaction, ordered by id.
    pub fn export(&self) -> StoreResult<DatabaseDump> {
        self.read(|scope| {
            Ok(DatabaseDump {
                schema_version: SCHEMA_VERSION,
                exported_at: Utc::now(),
                users: scope.list()?,
                aid_requests: scope.list()?,
                donations: scope.list()?,
                transactions: scope.list()?,
                proposals: scope.list()?,
                votes: scope.list()?,
            })
        })
    }

    pub fn export_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(&self.export()?)?)
    }

    /// Replace the entire contents of the store with `dump`.
    pub fn import(&self, dump: &DatabaseDump) -> StoreResult<usize> {
        if dump.schema_version > SCHEMA_VERSION {
            return Err(StoreError::SchemaTooNew {
                found: dump.schema_version,
                supported: SCHEMA_VERSION,
            });
        }

        self.write(|scope| {
            scope.clear_all()?;
            for user in &dump.users {
                scope.put(user)?;
            }
            for request in &dump.aid_requests {
                scope.put(request)?;
            }
            for donation in &dump.donations {
                scope.put(donation)?;
            }
            for tx in &dump.transactions {
                scope.put(tx)?;
            }
            for proposal in &dump.proposals {
                scope.put(proposal)?;
            }
            for vote in &dump.votes {
                scope.put(vote)?;
            }
            rebuild_indexes(scope)?;
            Ok(())
        })?;

        let count = dump.record_count();
        tracing::info!(
            records = count,
            exported_at = %dump.exported_at,
            "Imported database dump"
        );
        Ok(count)
    }

    pub fn import_json(&self, json: &str) -> StoreResult<usize> {
        let dump: DatabaseDump = serde_json::from_str(json)?;
        self.import(&dump)
    }
}
