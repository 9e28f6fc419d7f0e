// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! # Local Store
//!
//! Embedded persistence for DeCriCo, backed by a single redb file.
//!
//! ## Layout
//!
//! ```text
//! {DATA_DIR}/
//!   decrico.redb
//!     users, aid_requests, donations,
//!     transactions, proposals, votes   # id -> JSON record
//!     indexes                          # table|field|value|id -> id
//!     meta                             # schema_version, next_id:<table>
//! ```
//!
//! ## Important Notes
//!
//! - Every operation returns a `StoreResult`; nothing is retried
//! - Writes through one `LocalStore::write` closure commit together
//! - Opening a file written by a newer schema fails instead of guessing

pub mod analytics;
pub mod database;
pub mod repository;
pub mod seed;
pub mod transfer;

pub use analytics::{
    Analytics, CategoryStats, DonorTotal, PlatformStats, RequestProgress, RoleCounts, UserStats,
};
pub use database::{
    LocalStore, ReadScope, Record, SortOrder, StoreError, StoreResult, Table, WriteScope,
    SCHEMA_VERSION,
};
pub use repository::{
    AidRequest, Donation, DonationRepository, DonationStatus, NewAidRequest, NewProposal,
    ProfileUpdate, Proposal, ProposalCategory, ProposalRepository, ProposalStatus,
    RequestCategory, RequestRepository, RequestStatus, RequestUpdate, StoredTransaction, Tally,
    TransactionRepository, TransactionType, TxStatus, User, UserProfile, UserRepository, Vote,
    VoteRepository, VoteTarget, VoteType,
};
pub use seed::{seed_sample_data, SeedReport};
pub use transfer::DatabaseDump;
