// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Embedded local store backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`, `aid_requests`, `donations`, `transactions`, `proposals`,
//!   `votes`: record id → serialized record (JSON bytes)
//! - `indexes`: composite key (`table|field|value|id`) → record id
//! - `meta`: key → u64 (schema version, per-table id counters)
//!
//! Equality lookups are prefix range scans over `indexes`. Uniqueness is
//! checked inside the same write transaction that inserts the record, and
//! redb admits a single writer at a time, so check and insert are atomic.

use std::path::{Path, PathBuf};

use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::models::RecordId;

use super::repository::{AidRequest, Donation, Proposal, StoredTransaction, User, Vote};

// =============================================================================
// Table Definitions
// =============================================================================

const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");
const AID_REQUESTS: TableDefinition<u64, &[u8]> = TableDefinition::new("aid_requests");
const DONATIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("donations");
const TRANSACTIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("transactions");
const PROPOSALS: TableDefinition<u64, &[u8]> = TableDefinition::new("proposals");
const VOTES: TableDefinition<u64, &[u8]> = TableDefinition::new("votes");

/// Secondary indexes: `table|field|value|id` → id.
const INDEXES: TableDefinition<&str, u64> = TableDefinition::new("indexes");

/// Schema version and id counters.
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Current schema version of the local store.
pub const SCHEMA_VERSION: u32 = 3;

/// Logical tables of the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    AidRequests,
    Donations,
    Transactions,
    Proposals,
    Votes,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Users,
        Table::AidRequests,
        Table::Donations,
        Table::Transactions,
        Table::Proposals,
        Table::Votes,
    ];

    /// Table name as stored in redb and used in index keys.
    pub fn name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::AidRequests => "aid_requests",
            Table::Donations => "donations",
            Table::Transactions => "transactions",
            Table::Proposals => "proposals",
            Table::Votes => "votes",
        }
    }

    /// Human-readable entity name for error messages.
    pub fn label(self) -> &'static str {
        match self {
            Table::Users => "User",
            Table::AidRequests => "Aid request",
            Table::Donations => "Donation",
            Table::Transactions => "Transaction",
            Table::Proposals => "Proposal",
            Table::Votes => "Vote",
        }
    }

    fn definition(self) -> TableDefinition<'static, u64, &'static [u8]> {
        match self {
            Table::Users => USERS,
            Table::AidRequests => AID_REQUESTS,
            Table::Donations => DONATIONS,
            Table::Transactions => TRANSACTIONS,
            Table::Proposals => PROPOSALS,
            Table::Votes => VOTES,
        }
    }

    fn counter_key(self) -> String {
        format!("next_id:{}", self.name())
    }
}

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{table} with {field} `{value}` already exists")]
    Duplicate {
        table: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("already voted: {0}")]
    AlreadyVoted(String),

    #[error("invalid operation: {0}")]
    Invalid(String),

    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Record Trait
// =============================================================================

/// An entity persisted in one of the local store tables.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const TABLE: Table;

    fn id(&self) -> RecordId;

    fn set_id(&mut self, id: RecordId);

    /// Secondary index entries as `(field, value)` pairs.
    fn index_entries(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Indexed fields whose values must be unique across the table.
    fn unique_fields() -> &'static [&'static str] {
        &[]
    }

    /// Called on every [`WriteScope::update`] after the caller's changes.
    fn touch(&mut self) {}
}

/// Sort direction for [`LocalStore::list_sorted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Escape separators so a value can never spill into the next key segment.
fn escape_value(value: &str) -> String {
    value.replace('%', "%25").replace('|', "%7C")
}

/// Build the prefix shared by every index entry for `(table, field, value)`.
fn index_prefix(table: Table, field: &str, value: &str) -> String {
    format!("{}|{}|{}|", table.name(), field, escape_value(value))
}

/// Build a composite key for the indexes table.
///
/// Format: `table|field|value|zero_padded_id`. The fixed-width id keeps
/// entries for one value in ascending id order.
fn index_key(table: Table, field: &str, value: &str, id: RecordId) -> String {
    format!("{}{:020}", index_prefix(table, field, value), id)
}

/// Upper bound for a prefix scan: `~` sorts after every digit.
fn prefix_end(prefix: &str) -> String {
    format!("{prefix}~")
}

// =============================================================================
// Generic Table Access
// =============================================================================

fn load<R, T>(table: &T, id: RecordId) -> StoreResult<Option<R>>
where
    R: Record,
    T: ReadableTable<u64, &'static [u8]>,
{
    match table.get(id)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

fn load_all<R, T>(table: &T) -> StoreResult<Vec<R>>
where
    R: Record,
    T: ReadableTable<u64, &'static [u8]>,
{
    let mut records = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        records.push(serde_json::from_slice(value.value())?);
    }
    Ok(records)
}

fn scan_ids<T>(index: &T, prefix: &str) -> StoreResult<Vec<RecordId>>
where
    T: ReadableTable<&'static str, u64>,
{
    let end = prefix_end(prefix);
    let mut ids = Vec::new();
    for entry in index.range(prefix..end.as_str())? {
        let (_, id) = entry?;
        ids.push(id.value());
    }
    Ok(ids)
}

// =============================================================================
// Read Scope
// =============================================================================

/// Typed view over a read transaction.
pub struct ReadScope {
    txn: ReadTransaction,
}

impl ReadScope {
    pub fn get<R: Record>(&self, id: RecordId) -> StoreResult<Option<R>> {
        let table = self.txn.open_table(R::TABLE.definition())?;
        load(&table, id)
    }

    /// Like [`ReadScope::get`] but a missing record is an error.
    pub fn require<R: Record>(&self, id: RecordId) -> StoreResult<R> {
        self.get(id)?
            .ok_or_else(|| StoreError::NotFound(format!("{} {id}", R::TABLE.label())))
    }

    pub fn list<R: Record>(&self) -> StoreResult<Vec<R>> {
        let table = self.txn.open_table(R::TABLE.definition())?;
        load_all(&table)
    }

    pub fn find_by<R: Record>(&self, field: &str, value: &str) -> StoreResult<Vec<R>> {
        let index = self.txn.open_table(INDEXES)?;
        let table = self.txn.open_table(R::TABLE.definition())?;
        let mut records = Vec::new();
        for id in scan_ids(&index, &index_prefix(R::TABLE, field, value))? {
            if let Some(record) = load(&table, id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    pub fn exists_by<R: Record>(&self, field: &str, value: &str) -> StoreResult<bool> {
        let index = self.txn.open_table(INDEXES)?;
        Ok(!scan_ids(&index, &index_prefix(R::TABLE, field, value))?.is_empty())
    }

    pub fn count<R: Record>(&self) -> StoreResult<usize> {
        let table = self.txn.open_table(R::TABLE.definition())?;
        let mut count = 0;
        for entry in table.iter()? {
            entry?;
            count += 1;
        }
        Ok(count)
    }
}

// =============================================================================
// Write Scope
// =============================================================================

/// Typed view over a write transaction.
///
/// Everything done through one scope commits or aborts together.
pub struct WriteScope<'t> {
    txn: &'t WriteTransaction,
}

impl WriteScope<'_> {
    pub fn get<R: Record>(&self, id: RecordId) -> StoreResult<Option<R>> {
        let table = self.txn.open_table(R::TABLE.definition())?;
        load(&table, id)
    }

    pub fn require<R: Record>(&self, id: RecordId) -> StoreResult<R> {
        self.get(id)?
            .ok_or_else(|| StoreError::NotFound(format!("{} {id}", R::TABLE.label())))
    }

    pub fn list<R: Record>(&self) -> StoreResult<Vec<R>> {
        let table = self.txn.open_table(R::TABLE.definition())?;
        load_all(&table)
    }

    pub fn find_by<R: Record>(&self, field: &str, value: &str) -> StoreResult<Vec<R>> {
        let ids = {
            let index = self.txn.open_table(INDEXES)?;
            scan_ids(&index, &index_prefix(R::TABLE, field, value))?
        };
        let table = self.txn.open_table(R::TABLE.definition())?;
        let mut records = Vec::new();
        for id in ids {
            if let Some(record) = load(&table, id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    pub fn exists_by<R: Record>(&self, field: &str, value: &str) -> StoreResult<bool> {
        let index = self.txn.open_table(INDEXES)?;
        Ok(!scan_ids(&index, &index_prefix(R::TABLE, field, value))?.is_empty())
    }

    /// Insert a new record, assigning the next id of its table.
    pub fn insert<R: Record>(&self, mut record: R) -> StoreResult<R> {
        let id = self.allocate_id(R::TABLE)?;
        record.set_id(id);
        self.check_unique(&record)?;
        self.write_record(&record)?;
        Ok(record)
    }

    /// Apply `f` to a stored record and write it back with fresh index entries.
    pub fn update<R, F>(&self, id: RecordId, f: F) -> StoreResult<R>
    where
        R: Record,
        F: FnOnce(&mut R),
    {
        let mut record = self.require::<R>(id)?;
        self.remove_index_entries(&record)?;
        f(&mut record);
        record.set_id(id);
        record.touch();
        self.check_unique(&record)?;
        self.write_record(&record)?;
        Ok(record)
    }

    /// Write a record under its existing id (import path).
    ///
    /// The table counter is raised past the id so later inserts never collide.
    pub fn put<R: Record>(&self, record: &R) -> StoreResult<()> {
        if record.id() == 0 {
            return Err(StoreError::Invalid(format!(
                "{} record without id",
                R::TABLE.label()
            )));
        }
        if let Some(existing) = self.get::<R>(record.id())? {
            self.remove_index_entries(&existing)?;
        }
        self.check_unique(record)?;
        self.write_record(record)?;

        let mut meta = self.txn.open_table(META)?;
        let key = R::TABLE.counter_key();
        let next = meta.get(key.as_str())?.map(|v| v.value()).unwrap_or(1);
        if record.id() >= next {
            meta.insert(key.as_str(), record.id() + 1)?;
        }
        Ok(())
    }

    /// Remove a record and its index entries. Returns the removed record.
    pub fn delete<R: Record>(&self, id: RecordId) -> StoreResult<Option<R>> {
        let Some(record) = self.get::<R>(id)? else {
            return Ok(None);
        };
        self.remove_index_entries(&record)?;
        let mut table = self.txn.open_table(R::TABLE.definition())?;
        table.remove(id)?;
        Ok(Some(record))
    }

    /// Rewrite every index entry of a table from its stored records.
    pub fn reindex<R: Record>(&self) -> StoreResult<usize> {
        let records = self.list::<R>()?;
        let mut index = self.txn.open_table(INDEXES)?;
        for record in &records {
            for (field, value) in record.index_entries() {
                index.insert(
                    index_key(R::TABLE, field, &value, record.id()).as_str(),
                    record.id(),
                )?;
            }
        }
        Ok(records.len())
    }

    /// Drop every record, index entry and counter of all tables.
    pub fn clear_all(&self) -> StoreResult<()> {
        for table in Table::ALL {
            self.txn.delete_table(table.definition())?;
            self.txn.open_table(table.definition())?;
        }
        self.clear_indexes()?;
        let mut meta = self.txn.open_table(META)?;
        for table in Table::ALL {
            meta.remove(table.counter_key().as_str())?;
        }
        Ok(())
    }

    fn clear_indexes(&self) -> StoreResult<()> {
        self.txn.delete_table(INDEXES)?;
        self.txn.open_table(INDEXES)?;
        Ok(())
    }

    fn allocate_id(&self, table: Table) -> StoreResult<RecordId> {
        let mut meta = self.txn.open_table(META)?;
        let key = table.counter_key();
        let id = meta.get(key.as_str())?.map(|v| v.value()).unwrap_or(1);
        meta.insert(key.as_str(), id + 1)?;
        Ok(id)
    }

    fn check_unique<R: Record>(&self, record: &R) -> StoreResult<()> {
        let unique = R::unique_fields();
        if unique.is_empty() {
            return Ok(());
        }
        let index = self.txn.open_table(INDEXES)?;
        for (field, value) in record.index_entries() {
            if !unique.contains(&field) {
                continue;
            }
            let ids = scan_ids(&index, &index_prefix(R::TABLE, field, &value))?;
            if ids.iter().any(|id| *id != record.id()) {
                return Err(StoreError::Duplicate {
                    table: R::TABLE.name(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }

    fn write_record<R: Record>(&self, record: &R) -> StoreResult<()> {
        let json = serde_json::to_vec(record)?;
        {
            let mut table = self.txn.open_table(R::TABLE.definition())?;
            table.insert(record.id(), json.as_slice())?;
        }
        let mut index = self.txn.open_table(INDEXES)?;
        for (field, value) in record.index_entries() {
            index.insert(
                index_key(R::TABLE, field, &value, record.id()).as_str(),
                record.id(),
            )?;
        }
        Ok(())
    }

    fn remove_index_entries<R: Record>(&self, record: &R) -> StoreResult<()> {
        let mut index = self.txn.open_table(INDEXES)?;
        for (field, value) in record.index_entries() {
            index.remove(index_key(R::TABLE, field, &value, record.id()).as_str())?;
        }
        Ok(())
    }
}

// =============================================================================
// Migrations
// =============================================================================

type Migration = fn(&WriteScope<'_>) -> StoreResult<()>;

/// Ordered schema migrations; entry `n` upgrades version `n` to `n + 1`.
const MIGRATIONS: [(&str, Migration); SCHEMA_VERSION as usize] = [
    ("create tables", migrate_create_tables),
    ("rebuild secondary indexes", migrate_rebuild_indexes),
    ("normalize wallet addresses", migrate_normalize_wallets),
];

fn migrate_create_tables(scope: &WriteScope<'_>) -> StoreResult<()> {
    for table in Table::ALL {
        scope.txn.open_table(table.definition())?;
    }
    scope.txn.open_table(INDEXES)?;
    Ok(())
}

fn migrate_rebuild_indexes(scope: &WriteScope<'_>) -> StoreResult<()> {
    rebuild_indexes(scope).map(|_| ())
}

fn migrate_normalize_wallets(scope: &WriteScope<'_>) -> StoreResult<()> {
    for user in scope.list::<User>()? {
        scope.update::<User, _>(user.id, |u| {
            u.wallet_address = u.wallet_address.normalized().into();
        })?;
    }
    for tx in scope.list::<StoredTransaction>()? {
        scope.update::<StoredTransaction, _>(tx.id, |t| {
            t.from = t.from.normalized().into();
            t.to = t.to.normalized().into();
        })?;
    }
    Ok(())
}

/// Drop the indexes table and rebuild it from every stored record.
pub(crate) fn rebuild_indexes(scope: &WriteScope<'_>) -> StoreResult<usize> {
    scope.clear_indexes()?;
    let mut total = 0;
    total += scope.reindex::<User>()?;
    total += scope.reindex::<AidRequest>()?;
    total += scope.reindex::<Donation>()?;
    total += scope.reindex::<StoredTransaction>()?;
    total += scope.reindex::<Proposal>()?;
    total += scope.reindex::<Vote>()?;
    Ok(total)
}

// =============================================================================
// LocalStore
// =============================================================================

/// Versioned, indexed embedded database for the six DeCriCo tables.
pub struct LocalStore {
    db: Database,
    path: PathBuf,
}

impl LocalStore {
    /// Open (or create) the database at the given path and migrate it.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // META must exist before any read transaction looks at the version.
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(META)?;
        }
        write_txn.commit()?;

        let store = Self {
            db,
            path: path.to_path_buf(),
        };
        store.migrate()?;

        tracing::debug!(path = %path.display(), "Local store opened");
        Ok(store)
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Schema version recorded in the database.
    pub fn schema_version(&self) -> StoreResult<u32> {
        let read_txn = self.db.begin_read()?;
        let meta = read_txn.open_table(META)?;
        let version = meta.get(SCHEMA_VERSION_KEY)?.map(|v| v.value()).unwrap_or(0);
        Ok(version as u32)
    }

    fn migrate(&self) -> StoreResult<()> {
        let found = self.schema_version()?;
        if found > SCHEMA_VERSION {
            return Err(StoreError::SchemaTooNew {
                found,
                supported: SCHEMA_VERSION,
            });
        }
        if found == SCHEMA_VERSION {
            return Ok(());
        }

        self.write(|scope| {
            for (index, (name, migration)) in MIGRATIONS.iter().enumerate().skip(found as usize) {
                migration(scope)?;
                tracing::info!(version = index + 1, migration = *name, "Applied local store migration");
            }
            let mut meta = scope.txn.open_table(META)?;
            meta.insert(SCHEMA_VERSION_KEY, u64::from(SCHEMA_VERSION))?;
            Ok(())
        })
    }

    /// Run `f` against a read transaction.
    pub fn read<T>(&self, f: impl FnOnce(&ReadScope) -> StoreResult<T>) -> StoreResult<T> {
        let scope = ReadScope {
            txn: self.db.begin_read()?,
        };
        f(&scope)
    }

    /// Run `f` against a write transaction; commits on `Ok`, aborts on `Err`.
    pub fn write<T>(&self, f: impl FnOnce(&WriteScope<'_>) -> StoreResult<T>) -> StoreResult<T> {
        let txn = self.db.begin_write()?;
        let result = {
            let scope = WriteScope { txn: &txn };
            f(&scope)
        };
        match result {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort) = txn.abort() {
                    tracing::warn!(error = %abort, "Failed to abort local store transaction");
                }
                Err(e)
            }
        }
    }

    // =========================================================================
    // Single-call conveniences
    // =========================================================================

    pub fn insert<R: Record>(&self, record: R) -> StoreResult<R> {
        self.write(|scope| scope.insert(record))
    }

    pub fn get<R: Record>(&self, id: RecordId) -> StoreResult<Option<R>> {
        self.read(|scope| scope.get(id))
    }

    pub fn update<R, F>(&self, id: RecordId, f: F) -> StoreResult<R>
    where
        R: Record,
        F: FnOnce(&mut R),
    {
        self.write(|scope| scope.update(id, f))
    }

    pub fn delete<R: Record>(&self, id: RecordId) -> StoreResult<Option<R>> {
        self.write(|scope| scope.delete(id))
    }

    pub fn find_by<R: Record>(&self, field: &str, value: &str) -> StoreResult<Vec<R>> {
        self.read(|scope| scope.find_by(field, value))
    }

    pub fn list<R: Record>(&self) -> StoreResult<Vec<R>> {
        self.read(|scope| scope.list())
    }

    /// Full scan sorted by `key`.
    pub fn list_sorted<R, K, F>(&self, key: F, order: SortOrder) -> StoreResult<Vec<R>>
    where
        R: Record,
        K: Ord,
        F: Fn(&R) -> K,
    {
        let mut records = self.list::<R>()?;
        records.sort_by(|a, b| {
            let ordering = key(a).cmp(&key(b));
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
        Ok(records)
    }

    pub fn count<R: Record>(&self) -> StoreResult<usize> {
        self.read(|scope| scope.count::<R>())
    }
}

// =============================================================================
// Tests
// =============================================================================
