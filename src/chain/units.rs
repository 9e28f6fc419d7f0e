// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Conversions between contract integers and domain values.

use alloy::primitives::U256;
use chrono::{DateTime, Utc};

use crate::models::{format_decimal, parse_decimal, Amount};

use super::error::ChainError;

pub fn to_u256(amount: Amount) -> U256 {
    U256::from(amount.wei())
}

/// Contract amounts wider than 128 bits cannot be represented as [`Amount`].
pub fn to_amount(value: U256) -> Result<Amount, ChainError> {
    u128::try_from(value)
        .map(Amount::from_wei)
        .map_err(|_| ChainError::ValueOutOfRange(format!("amount {value}")))
}

pub fn to_u64(value: U256, what: &str) -> Result<u64, ChainError> {
    u64::try_from(value).map_err(|_| ChainError::ValueOutOfRange(format!("{what} {value}")))
}

pub fn to_timestamp(value: U256) -> Result<DateTime<Utc>, ChainError> {
    let secs = i64::try_from(to_u64(value, "timestamp")?)
        .map_err(|_| ChainError::ValueOutOfRange(format!("timestamp {value}")))?;
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| ChainError::ValueOutOfRange(format!("timestamp {value}")))
}

/// Unix seconds; times before the epoch clamp to zero.
pub fn from_timestamp(time: DateTime<Utc>) -> U256 {
    U256::from(time.timestamp().max(0) as u64)
}

/// Parse a human-readable amount (e.g. `"1.5"`) into smallest units.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, ChainError> {
    Ok(U256::from(parse_decimal(amount, decimals)?))
}

/// Exact decimal rendering of smallest units, trailing zeros trimmed.
pub fn format_amount(value: U256, decimals: u8) -> Result<String, ChainError> {
    let value = u128::try_from(value)
        .map_err(|_| ChainError::ValueOutOfRange(format!("amount {value}")))?;
    Ok(format_decimal(value, decimals))
}
