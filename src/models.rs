// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! # Shared Data Types
//!
//! Value types used by every layer of the crate: the local store records,
//! the remote rows and the chain bridge all speak in these.
//!
//! ## Wallet Address Type
//!
//! The [`WalletAddress`] newtype wraps Ethereum-style addresses (0x-prefixed,
//! 40 hex characters). Comparisons and index keys use the lowercase form.
//!
//! ## Amounts
//!
//! [`Amount`] holds a value in the chain's smallest unit (wei). It is
//! serialized as a decimal string so that JSON consumers never lose precision,
//! and converted to/from decimal ETH strings only at the boundary.

use std::fmt;
use std::iter::Sum;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Identifier assigned by the local store (per-table auto increment, from 1).
pub type RecordId = u64;

/// Decimals of the base currency (ETH).
pub const ETH_DECIMALS: u8 = 18;

// =============================================================================
// Wallet Address Type
// =============================================================================

/// Ethereum-compatible wallet address wrapper.
///
/// Format: `0x` followed by 40 hexadecimal characters (20 bytes).
///
/// # Example
///
/// ```rust,ignore
/// let addr = WalletAddress::from("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct WalletAddress(pub String);

impl WalletAddress {
    /// Lowercase form used for comparisons and index keys.
    pub fn normalized(&self) -> String {
        self.0.trim().to_ascii_lowercase()
    }

    /// `true` when the address is `0x` + 40 hex characters.
    pub fn is_valid(&self) -> bool {
        let value = self.0.trim();
        value.len() == 42
            && (value.starts_with("0x") || value.starts_with("0X"))
            && value[2..].chars().all(|c| c.is_ascii_hexdigit())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Case-insensitive comparison.
    pub fn matches(&self, other: &WalletAddress) -> bool {
        self.normalized() == other.normalized()
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WalletAddress {
    fn from(value: String) -> Self {
        WalletAddress(value)
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        WalletAddress(value.to_string())
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

// =============================================================================
// Amount
// =============================================================================

/// Errors raised when parsing decimal amounts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("Too many decimal places (max {0})")]
    TooManyDecimals(u8),

    #[error("Amount overflow")]
    Overflow,
}

/// An amount in the smallest unit of the base currency (wei).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_wei(wei: u128) -> Self {
        Amount(wei)
    }

    pub const fn wei(self) -> u128 {
        self.0
    }

    /// Whole ETH convenience constructor (tests and seed data).
    pub fn eth(whole: u64) -> Self {
        Amount(u128::from(whole) * 10u128.pow(u32::from(ETH_DECIMALS)))
    }

    /// Parse a decimal ETH string such as `"1.5"`.
    pub fn from_eth(value: &str) -> Result<Self, AmountError> {
        parse_decimal(value, ETH_DECIMALS).map(Amount)
    }

    /// Decimal ETH representation with trailing zeros trimmed.
    pub fn to_eth_string(self) -> String {
        format_decimal(self.0, ETH_DECIMALS)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Share of `self` in `total` as a percentage with two decimals, capped at 100.
    pub fn percentage_of(self, total: Amount) -> f64 {
        if total.is_zero() {
            return 0.0;
        }
        let basis_points = self.0.saturating_mul(10_000) / total.0;
        (basis_points.min(10_000) as f64) / 100.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ETH", self.to_eth_string())
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Amount::saturating_add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl de::Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an amount in wei as a decimal string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                let digits = v.trim();
                if !is_digits(digits) {
                    return Err(E::custom(format!("invalid wei amount `{v}`")));
                }
                digits
                    .parse::<u128>()
                    .map(Amount)
                    .map_err(|_| E::custom(format!("invalid wei amount `{v}`")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(Amount(u128::from(v)))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
                Ok(Amount(v))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Parse a human-readable decimal into smallest units.
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "1.5")
/// * `decimals` - Number of decimals (18 for ETH)
pub fn parse_decimal(amount: &str, decimals: u8) -> Result<u128, AmountError> {
    let amount = amount.trim();
    let parts: Vec<&str> = amount.split('.').collect();

    if parts.len() > 2 || parts[0].is_empty() && parts.get(1).map_or(true, |d| d.is_empty()) {
        return Err(AmountError::InvalidFormat(amount.to_string()));
    }

    if !parts[0].is_empty() && !is_digits(parts[0]) {
        return Err(AmountError::InvalidFormat(amount.to_string()));
    }

    let whole = if parts[0].is_empty() {
        0
    } else {
        parts[0]
            .parse::<u128>()
            .map_err(|_| AmountError::InvalidFormat(amount.to_string()))?
    };

    let fraction = match parts.get(1) {
        Some(dec_str) if !dec_str.is_empty() => {
            if dec_str.len() > decimals as usize {
                return Err(AmountError::TooManyDecimals(decimals));
            }
            if !is_digits(dec_str) {
                return Err(AmountError::InvalidFormat(amount.to_string()));
            }
            let padded = format!("{:0<width$}", dec_str, width = decimals as usize);
            padded
                .parse::<u128>()
                .map_err(|_| AmountError::InvalidFormat(amount.to_string()))?
        }
        _ => 0,
    };

    let multiplier = 10u128.pow(u32::from(decimals));
    whole
        .checked_mul(multiplier)
        .and_then(|w| w.checked_add(fraction))
        .ok_or(AmountError::Overflow)
}

/// `u128::from_str` accepts a leading `+`; amounts are plain digits only.
fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Format smallest units as a decimal string, trailing zeros trimmed.
pub fn format_decimal(amount: u128, decimals: u8) -> String {
    if amount == 0 {
        return "0".to_string();
    }

    let divisor = 10u128.pow(u32::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder == 0 {
        return whole.to_string();
    }

    let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
    format!("{}.{}", whole, decimal_str.trim_end_matches('0'))
}
