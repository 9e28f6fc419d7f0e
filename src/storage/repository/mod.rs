// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Repository layer providing typed access to the local store.
//!
//! Each repository provides the operations for one entity type, using
//! [`LocalStore`](super::LocalStore) transactions for all reads and writes.

pub mod donations;
pub mod proposals;
pub mod requests;
pub mod transactions;
pub mod users;
pub mod votes;

pub use donations::{Donation, DonationRepository, DonationStatus};
pub use proposals::{NewProposal, Proposal, ProposalCategory, ProposalRepository, ProposalStatus};
pub use requests::{
    AidRequest, NewAidRequest, RequestCategory, RequestRepository, RequestStatus, RequestUpdate,
};
pub use transactions::{StoredTransaction, TransactionRepository, TransactionType, TxStatus};
pub use users::{ProfileUpdate, User, UserProfile, UserRepository};
pub use votes::{Tally, Vote, VoteRepository, VoteTarget, VoteType};
