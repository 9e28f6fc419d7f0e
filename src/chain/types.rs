// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Chain bridge types and configuration.

use std::str::FromStr;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::models::{Amount, WalletAddress};
use crate::storage::{ProposalCategory, ProposalStatus, RequestCategory, RequestStatus};

use super::error::ChainError;

/// Raw contract addresses as configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractAddresses {
    pub aid_request: String,
    pub donation: String,
    pub governance: String,
}

/// Network and contract configuration for the bridge.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// RPC endpoint URL
    pub rpc_url: Url,
    /// Chain ID
    pub chain_id: u64,
    /// Block explorer URL
    pub explorer_url: String,
    pub aid_request: Address,
    pub donation: Address,
    pub governance: Address,
}

impl ChainConfig {
    pub fn new(
        rpc_url: &str,
        chain_id: u64,
        explorer_url: &str,
        contracts: ContractAddresses,
    ) -> Result<Self, ChainError> {
        let rpc_url = rpc_url
            .trim()
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;
        Ok(Self {
            rpc_url,
            chain_id,
            explorer_url: explorer_url.trim_end_matches('/').to_string(),
            aid_request: parse_address(&contracts.aid_request)?,
            donation: parse_address(&contracts.donation)?,
            governance: parse_address(&contracts.governance)?,
        })
    }

    /// Block explorer URL for a transaction.
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, tx_hash)
    }

    /// Human-readable network name used in stored records.
    pub fn network_name(&self) -> String {
        match self.chain_id {
            1 => "mainnet".to_string(),
            11_155_111 => "sepolia".to_string(),
            31_337 => "localhost".to_string(),
            other => format!("chain-{other}"),
        }
    }
}

pub fn parse_address(value: &str) -> Result<Address, ChainError> {
    Address::from_str(value.trim())
        .map_err(|e| ChainError::InvalidAddress(format!("{value}: {e}")))
}

pub(crate) fn to_wallet(address: Address) -> WalletAddress {
    WalletAddress(address.to_checksum(None))
}

/// Transaction receipt after confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: String,
    /// Contract the transaction called
    pub to: WalletAddress,
    /// Block number where transaction was included
    pub block_number: Option<u64>,
    /// Gas actually used
    pub gas_used: u64,
    /// Explorer URL for the transaction
    pub explorer_url: String,
}

/// Result of a confirmed submission together with what its event yielded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted<T> {
    pub value: T,
    pub receipt: TxReceipt,
}

/// On-chain view of an aid request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainRequest {
    pub id: u64,
    pub requester: WalletAddress,
    pub title: String,
    pub description: String,
    pub category: RequestCategory,
    pub location: String,
    pub target_amount: Amount,
    pub raised_amount: Amount,
    pub deadline: DateTime<Utc>,
    pub status: RequestStatus,
    pub urgent: bool,
    pub verified: bool,
}

/// On-chain view of a governance proposal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainProposal {
    pub id: u64,
    pub proposer: WalletAddress,
    pub title: String,
    pub description: String,
    pub category: ProposalCategory,
    pub votes_for: u64,
    pub votes_against: u64,
    pub deadline: DateTime<Utc>,
    pub status: ProposalStatus,
}

/// Contract enum orders.
pub const REQUEST_CATEGORIES: [RequestCategory; 6] = RequestCategory::ALL;
pub const REQUEST_STATUSES: [RequestStatus; 3] = RequestStatus::ALL;
pub const PROPOSAL_CATEGORIES: [ProposalCategory; 6] = ProposalCategory::ALL;
pub const PROPOSAL_STATUSES: [ProposalStatus; 4] = ProposalStatus::ALL;

/// Translate a contract enum value through its lookup table.
pub fn lookup<T: Copy>(table: &[T], value: u8, kind: &'static str) -> Result<T, ChainError> {
    table
        .get(usize::from(value))
        .copied()
        .ok_or(ChainError::UnknownEnum { kind, value })
}

/// Index of `item` in its lookup table, as sent to the contract.
pub fn index_of<T: PartialEq>(table: &[T], item: &T) -> u8 {
    table.iter().position(|t| t == item).unwrap_or(0) as u8
}
