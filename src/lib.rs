// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! DeCriCo Core - data layer of the DeCriCo donation platform
//!
//! Aid requests, donations, verification votes and governance proposals,
//! persisted locally or on a hosted backend and settled on an EVM chain.
//!
//! ## Modules
//!
//! - `storage` - Embedded redb store, repositories, analytics, import/export
//! - `remote` - Hosted backend client (PostgREST)
//! - `chain` - Contract bridge (alloy)
//! - `session` - Signed-in user, roles, connected wallet
//! - `actions` - Flows that move funds: store writes follow chain receipts
//! - `state` - `AppContext`, the explicit application container

pub mod actions;
pub mod chain;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod remote;
pub mod session;
pub mod state;
pub mod storage;
