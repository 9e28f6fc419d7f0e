// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Transaction repository for the platform's audit log.
//!
//! Every balance-affecting or governance action is logged here with its
//! chain transaction hash, so that history survives independently of the
//! entity tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Amount, RecordId, WalletAddress};
use crate::storage::database::{LocalStore, Record, StoreResult, Table};

/// Kind of logged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Donation,
    RequestCreation,
    Vote,
    ProposalCreation,
    Verification,
    Withdrawal,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Donation => "donation",
            TransactionType::RequestCreation => "request_creation",
            TransactionType::Vote => "vote",
            TransactionType::ProposalCreation => "proposal_creation",
            TransactionType::Verification => "verification",
            TransactionType::Withdrawal => "withdrawal",
        }
    }
}

/// Transaction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Transaction has been submitted but not yet confirmed
    #[default]
    Pending,
    /// Transaction has been confirmed in a block
    Confirmed,
    /// Transaction failed or was reverted
    Failed,
}

/// Stored transaction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTransaction {
    #[serde(default)]
    pub id: RecordId,
    pub tx_type: TransactionType,
    /// Sender address
    pub from: WalletAddress,
    /// Recipient or contract address
    pub to: WalletAddress,
    /// Value moved, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    pub description: String,
    #[serde(default)]
    pub status: TxStatus,
    /// Transaction hash (0x prefixed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// Gas used (if confirmed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    /// Block number (if confirmed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl StoredTransaction {
    /// Create a new pending transaction record.
    pub fn new_pending(
        tx_type: TransactionType,
        from: WalletAddress,
        to: WalletAddress,
        amount: Option<Amount>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            tx_type,
            from: from.normalized().into(),
            to: to.normalized().into(),
            amount,
            description: description.into(),
            status: TxStatus::Pending,
            tx_hash: None,
            gas_used: None,
            block_number: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_hash(mut self, tx_hash: impl Into<String>) -> Self {
        self.tx_hash = Some(tx_hash.into());
        self
    }

    /// Mark the transaction as confirmed.
    pub fn mark_confirmed(&mut self, block_number: Option<u64>, gas_used: Option<u64>) {
        self.status = TxStatus::Confirmed;
        self.block_number = block_number;
        self.gas_used = gas_used;
    }

    /// Mark the transaction as failed.
    pub fn mark_failed(&mut self) {
        self.status = TxStatus::Failed;
    }
}

impl Record for StoredTransaction {
    const TABLE: Table = Table::Transactions;

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![("type", self.tx_type.as_str().to_string())];
        for address in [&self.from, &self.to] {
            if !address.is_empty() {
                entries.push(("address", address.normalized()));
            }
        }
        if let Some(hash) = &self.tx_hash {
            entries.push(("tx_hash", hash.to_ascii_lowercase()));
        }
        entries
    }
}

/// Repository for the transaction audit log.
pub struct TransactionRepository<'a> {
    store: &'a LocalStore,
}

impl<'a> TransactionRepository<'a> {
    pub fn new(store: &'a LocalStore) -> Self {
        Self { store }
    }

    /// Append an entry to the log.
    pub fn log(&self, tx: StoredTransaction) -> StoreResult<StoredTransaction> {
        let tx = self.store.insert(tx)?;
        tracing::debug!(
            tx_id = tx.id,
            tx_type = tx.tx_type.as_str(),
            tx_hash = tx.tx_hash.as_deref().unwrap_or(""),
            "Transaction logged"
        );
        Ok(tx)
    }

    pub fn get(&self, id: RecordId) -> StoreResult<StoredTransaction> {
        self.store.read(|scope| scope.require(id))
    }

    /// Entries where `address` is the sender or the recipient, newest first.
    pub fn by_address(&self, address: &WalletAddress) -> StoreResult<Vec<StoredTransaction>> {
        Ok(newest_first(
            self.store.find_by("address", &address.normalized())?,
        ))
    }

    pub fn by_type(&self, tx_type: TransactionType) -> StoreResult<Vec<StoredTransaction>> {
        Ok(newest_first(self.store.find_by("type", tx_type.as_str())?))
    }

    pub fn by_tx_hash(&self, tx_hash: &str) -> StoreResult<Vec<StoredTransaction>> {
        self.store.find_by("tx_hash", &tx_hash.to_ascii_lowercase())
    }

    /// All entries, newest first.
    pub fn list(&self) -> StoreResult<Vec<StoredTransaction>> {
        Ok(newest_first(self.store.list()?))
    }

    /// Pending entries (for status polling).
    pub fn list_pending(&self) -> StoreResult<Vec<StoredTransaction>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|tx| tx.status == TxStatus::Pending)
            .collect())
    }

    pub fn update_status(&self, id: RecordId, status: TxStatus) -> StoreResult<StoredTransaction> {
        self.store
            .update::<StoredTransaction, _>(id, |tx| tx.status = status)
    }

    /// Update transaction status from blockchain receipt.
    pub fn update_from_receipt(
        &self,
        id: RecordId,
        block_number: Option<u64>,
        gas_used: Option<u64>,
        success: bool,
    ) -> StoreResult<StoredTransaction> {
        self.store.update::<StoredTransaction, _>(id, |tx| {
            if success {
                tx.mark_confirmed(block_number, gas_used);
            } else {
                tx.mark_failed();
            }
        })
    }
}

fn newest_first(mut txs: Vec<StoredTransaction>) -> Vec<StoredTransaction> {
    txs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    txs
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "0xA11CE00000000000000000000000000000000001";
    const BOB: &str = "0xB0B0000000000000000000000000000000000002";
    const CONTRACT: &str = "0xC0C0000000000000000000000000000000000003";

    fn temp_store() -> (LocalStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(&dir.path().join("txs.redb")).unwrap();
        (store, dir)
    }

    #[test]
    fn new_pending_normalizes_addresses() {
        let tx = StoredTransaction::new_pending(
            TransactionType::Donation,
            ALICE.into(),
            BOB.into(),
            Some(Amount::eth(1)),
            "Donation",
        );
        assert_eq!(tx.status, TxStatus::Pending);
        assert_eq!(tx.from.0, ALICE.to_ascii_lowercase());
    }

    #[test]
    fn by_address_matches_either_side() {
        let (store, _dir) = temp_store();
        let repo = TransactionRepository::new(&store);
        repo.log(StoredTransaction::new_pending(
            TransactionType::Donation,
            ALICE.into(),
            BOB.into(),
            Some(Amount::eth(1)),
            "Donation to Bob",
        ))
        .unwrap();
        repo.log(StoredTransaction::new_pending(
            TransactionType::Vote,
            BOB.into(),
            CONTRACT.into(),
            None,
            "Vote",
        ))
        .unwrap();

        assert_eq!(repo.by_address(&ALICE.into()).unwrap().len(), 1);
        assert_eq!(repo.by_address(&BOB.into()).unwrap().len(), 2);
        assert_eq!(
            repo.by_address(&BOB.to_ascii_lowercase().into()).unwrap().len(),
            2
        );
        assert_eq!(repo.by_type(TransactionType::Vote).unwrap().len(), 1);
    }

    #[test]
    fn self_transfer_listed_once() {
        let (store, _dir) = temp_store();
        let repo = TransactionRepository::new(&store);
        repo.log(StoredTransaction::new_pending(
            TransactionType::Withdrawal,
            ALICE.into(),
            ALICE.into(),
            Some(Amount::eth(1)),
            "Self",
        ))
        .unwrap();
        assert_eq!(repo.by_address(&ALICE.into()).unwrap().len(), 1);
    }

    #[test]
    fn receipt_updates_status() {
        let (store, _dir) = temp_store();
        let repo = TransactionRepository::new(&store);
        let tx = repo
            .log(
                StoredTransaction::new_pending(
                    TransactionType::Donation,
                    ALICE.into(),
                    BOB.into(),
                    Some(Amount::eth(1)),
                    "Donation",
                )
                .with_hash("0xFEED"),
            )
            .unwrap();
        assert_eq!(repo.list_pending().unwrap().len(), 1);

        let confirmed = repo
            .update_from_receipt(tx.id, Some(100), Some(21_000), true)
            .unwrap();
        assert_eq!(confirmed.status, TxStatus::Confirmed);
        assert_eq!(confirmed.block_number, Some(100));
        assert!(repo.list_pending().unwrap().is_empty());
        assert_eq!(repo.by_tx_hash("0xfeed").unwrap().len(), 1);

        let failed = repo.update_status(tx.id, TxStatus::Failed).unwrap();
        assert_eq!(failed.status, TxStatus::Failed);
    }
}
