// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! EVM chain bridge.
//!
//! Three contracts make up a deployment: the aid request registry, the
//! donation router and governance. [`ChainBridge`] signs with a local key
//! and implements [`ChainActions`], the seam the action layer is written
//! against.

pub mod bridge;
pub mod contracts;
pub mod error;
pub mod types;
pub mod units;

pub use bridge::{ChainActions, ChainBridge};
pub use error::ChainError;
pub use types::{ChainConfig, ChainProposal, ChainRequest, ContractAddresses, Submitted, TxReceipt};
pub use units::{format_amount, parse_amount};
