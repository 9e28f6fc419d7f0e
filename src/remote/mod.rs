// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! # Remote Store
//!
//! Request/response access to the hosted relational backend (Supabase's
//! PostgREST API). Every call is a fresh round trip: there is no client-side
//! cache, no optimistic update and no conflict resolution beyond mapping the
//! backend's unique-violation response to [`RemoteError::Conflict`].
//!
//! ## Layout
//!
//! - [`query`] builds PostgREST filter/order/embed parameters
//! - [`client`] sends them and maps failures
//! - [`rows`] are the wire shapes of the backend tables
//! - [`repository`] holds the platform's named queries

pub mod client;
pub mod query;
pub mod repository;
pub mod rows;

#[cfg(test)]
pub(crate) mod test_server;

pub use client::RemoteStoreClient;
pub use query::Query;
pub use repository::{DonationInsert, RemoteRepository};
pub use rows::{
    DonationRow, ProposalRow, RequestRow, RowTarget, TransactionRow, UserRow, UserSummary, VoteRow,
};

use url::Url;

/// PostgREST path below the project URL.
const REST_PATH: &str = "rest/v1/";

/// SQLSTATE for unique_violation.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Project URL, e.g. `https://abc.supabase.co/`
    pub url: Url,
    /// Public (anon) API key
    pub anon_key: String,
}

impl RemoteConfig {
    pub fn new(url: &str, anon_key: impl Into<String>) -> Result<Self, url::ParseError> {
        let mut url = Url::parse(url.trim())?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self {
            url,
            anon_key: anon_key.into(),
        })
    }

    /// Base URL of the REST API.
    pub fn rest_url(&self) -> Result<Url, url::ParseError> {
        self.url.join(REST_PATH)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("response was invalid: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("backend returned {status}: {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("already voted")]
    AlreadyVoted,

    #[error("not found: {0}")]
    NotFound(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_url_keeps_project_path() {
        let cfg = RemoteConfig::new("https://abc.supabase.co", "anon").unwrap();
        assert_eq!(cfg.rest_url().unwrap().as_str(), "https://abc.supabase.co/rest/v1/");

        let proxied = RemoteConfig::new("https://proxy.example.org/supabase", "anon").unwrap();
        assert_eq!(
            proxied.rest_url().unwrap().as_str(),
            "https://proxy.example.org/supabase/rest/v1/"
        );
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(RemoteConfig::new("not a url", "anon").is_err());
    }
}
