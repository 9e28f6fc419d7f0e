// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! Application-level errors.
//!
//! Each layer has its own error enum ([`StoreError`], [`RemoteError`],
//! [`ChainError`]); [`AppError`] aggregates them for the action layer and
//! turns them into messages that can be shown to a user.

use std::fmt;

use crate::chain::ChainError;
use crate::remote::RemoteError;
use crate::storage::StoreError;

/// A single failing form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Field-level validation failures, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Names of failing fields (a field may repeat).
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.errors.iter().map(|e| e.field)
    }

    /// `Ok` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("request creator has no wallet address")]
    RecipientWalletMissing,

    #[error("no wallet connected")]
    WalletNotConnected,

    #[error("not signed in")]
    NotSignedIn,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

pub type AppResult<T> = Result<T, AppError>;

const GENERIC_STORE_MESSAGE: &str = "Could not save or load your data. Please try again.";
const GENERIC_CHAIN_MESSAGE: &str = "The blockchain transaction failed. Please try again.";

impl AppError {
    /// Message suitable for display. Internal details are logged, not shown.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(errors) => errors
                .errors()
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            AppError::Forbidden(reason) => reason.clone(),
            AppError::RecipientWalletMissing => {
                "The creator of this request has not connected a wallet yet, so donations cannot be sent."
                    .to_string()
            }
            AppError::WalletNotConnected => "Please connect your wallet first.".to_string(),
            AppError::NotSignedIn => "Please sign in to continue.".to_string(),
            AppError::Config(_) => {
                tracing::error!(error = %self, "Configuration error");
                "The application is not configured correctly.".to_string()
            }
            AppError::Io(e) => {
                tracing::error!(error = %e, "File error");
                "Could not read or write the file.".to_string()
            }
            AppError::Store(StoreError::AlreadyVoted(_))
            | AppError::Remote(RemoteError::AlreadyVoted) => {
                "You have already voted on this.".to_string()
            }
            AppError::Store(StoreError::NotFound(what)) => format!("{what} was not found."),
            AppError::Store(StoreError::Duplicate { field, .. }) => {
                format!("A record with this {field} already exists.")
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "Local store error");
                GENERIC_STORE_MESSAGE.to_string()
            }
            AppError::Remote(RemoteError::Conflict(_)) => {
                "This record already exists.".to_string()
            }
            AppError::Remote(e) => {
                tracing::error!(error = %e, "Remote store error");
                GENERIC_STORE_MESSAGE.to_string()
            }
            AppError::Chain(ChainError::Rejected) => {
                "The transaction was rejected in your wallet.".to_string()
            }
            AppError::Chain(ChainError::InsufficientFunds) => {
                "Insufficient funds to complete this transaction.".to_string()
            }
            AppError::Chain(ChainError::RequestPending) => {
                "A wallet request is already pending. Open your wallet to continue.".to_string()
            }
            AppError::Chain(e) => {
                tracing::error!(error = %e, "Chain error");
                GENERIC_CHAIN_MESSAGE.to_string()
            }
        }
    }
}
