// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

use alloy::transports::TransportError;

use crate::models::AmountError;

/// JSON-RPC code for a request the user declined in their wallet.
pub const USER_REJECTED_CODE: i64 = 4001;
/// JSON-RPC code for a wallet request that is already awaiting approval.
pub const REQUEST_PENDING_CODE: i64 = -32002;

/// Errors that can occur during chain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Value out of range: {0}")]
    ValueOutOfRange(String),

    #[error("Unknown {kind} value {value}")]
    UnknownEnum { kind: &'static str, value: u8 },

    #[error("Transaction rejected by user")]
    Rejected,

    #[error("Insufficient funds for transaction")]
    InsufficientFunds,

    #[error("A wallet request is already pending")]
    RequestPending,

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("Transaction {tx_hash} did not emit {event}")]
    MissingEvent { event: &'static str, tx_hash: String },

    #[error("Waiting for confirmation was cancelled")]
    Cancelled,
}

impl ChainError {
    /// Classify a wallet/RPC failure by error code first, then by message.
    pub fn classify(code: Option<i64>, message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if code == Some(USER_REJECTED_CODE)
            || lower.contains("user rejected")
            || lower.contains("user denied")
        {
            ChainError::Rejected
        } else if lower.contains("insufficient funds") {
            ChainError::InsufficientFunds
        } else if code == Some(REQUEST_PENDING_CODE) || lower.contains("already pending") {
            ChainError::RequestPending
        } else {
            ChainError::Rpc(message.to_string())
        }
    }

    fn from_transport(err: &TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => Self::classify(Some(payload.code), &payload.message),
            None => Self::classify(None, &err.to_string()),
        }
    }
}

impl From<alloy::contract::Error> for ChainError {
    fn from(err: alloy::contract::Error) -> Self {
        match err {
            alloy::contract::Error::TransportError(ref t) => Self::from_transport(t),
            other => {
                let message = other.to_string();
                match Self::classify(None, &message) {
                    ChainError::Rpc(message) => ChainError::Contract(message),
                    classified => classified,
                }
            }
        }
    }
}

impl From<alloy::providers::PendingTransactionError> for ChainError {
    fn from(err: alloy::providers::PendingTransactionError) -> Self {
        match err {
            alloy::providers::PendingTransactionError::TransportError(ref t) => {
                Self::from_transport(t)
            }
            other => ChainError::Rpc(other.to_string()),
        }
    }
}

impl From<TransportError> for ChainError {
    fn from(err: TransportError) -> Self {
        Self::from_transport(&err)
    }
}
