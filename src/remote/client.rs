// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DeCriCo Contributors

//! HTTP client for the hosted backend's REST API.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use super::query::Query;
use super::{RemoteConfig, RemoteError, RemoteResult, UNIQUE_VIOLATION};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Error body returned by PostgREST.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RemoteStoreClient {
    rest_url: Url,
    anon_key: String,
    /// Signed-in user's access token; the anon key is used otherwise
    access_token: Option<String>,
    http: Client,
}

impl RemoteStoreClient {
    pub fn from_config(config: &RemoteConfig) -> RemoteResult<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            rest_url: config.rest_url()?,
            anon_key: config.anon_key.clone(),
            access_token: None,
            http,
        })
    }

    /// Act on behalf of a signed-in user.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn endpoint(&self, table: &str) -> RemoteResult<Url> {
        Ok(self.rest_url.join(table)?)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        builder
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {bearer}"))
    }

    /// Rows matching `query`.
    pub async fn select<T: DeserializeOwned>(&self, query: &Query) -> RemoteResult<Vec<T>> {
        let url = self.endpoint(query.table_name())?;
        tracing::debug!(table = query.table_name(), "Remote select");
        let response = self
            .authorized(self.http.get(url))
            .query(&query.to_params())
            .send()
            .await?;
        read_json(response).await
    }

    /// First row matching `query`, if any.
    pub async fn select_one<T: DeserializeOwned>(&self, query: &Query) -> RemoteResult<Option<T>> {
        let rows = self.select::<T>(&query.clone().limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row (or a JSON array of rows) and return what was stored.
    pub async fn insert<T, B>(&self, table: &str, body: &B) -> RemoteResult<Vec<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(table)?;
        tracing::debug!(table, "Remote insert");
        let response = self
            .authorized(self.http.post(url))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }

    /// Patch every row matching the query's filters.
    pub async fn update<T, B>(&self, query: &Query, patch: &B) -> RemoteResult<Vec<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        if !query.has_filters() {
            return Err(RemoteError::Api {
                status: 400,
                code: None,
                message: format!("refusing unfiltered update of {}", query.table_name()),
            });
        }
        let url = self.endpoint(query.table_name())?;
        tracing::debug!(table = query.table_name(), "Remote update");
        let response = self
            .authorized(self.http.patch(url))
            .query(query.filter_params())
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await?;
        read_json(response).await
    }

    /// Delete every row matching the query's filters.
    pub async fn delete(&self, query: &Query) -> RemoteResult<()> {
        if !query.has_filters() {
            return Err(RemoteError::Api {
                status: 400,
                code: None,
                message: format!("refusing unfiltered delete of {}", query.table_name()),
            });
        }
        let url = self.endpoint(query.table_name())?;
        tracing::debug!(table = query.table_name(), "Remote delete");
        let response = self
            .authorized(self.http.delete(url))
            .query(query.filter_params())
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }
}

async fn check_status(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let err = error_from_response(status.as_u16(), &body);
    tracing::warn!(status = status.as_u16(), error = %err, "Remote request failed");
    Err(err)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> RemoteResult<T> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Map a non-2xx response to an error. Unique violations become `Conflict`.
pub(crate) fn error_from_response(status: u16, body: &str) -> RemoteError {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.details)
        .unwrap_or_else(|| body.trim().to_string());

    if status == 409 || parsed.code.as_deref() == Some(UNIQUE_VIOLATION) {
        return RemoteError::Conflict(message);
    }
    RemoteError::Api {
        status,
        code: parsed.code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_is_conflict() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint \"votes_voter_request_key\"","details":null,"hint":null}"#;
        assert!(matches!(
            error_from_response(409, body),
            RemoteError::Conflict(msg) if msg.contains("votes_voter_request_key")
        ));
        assert!(matches!(
            error_from_response(400, body),
            RemoteError::Conflict(_)
        ));
    }

    #[test]
    fn other_errors_keep_status_and_code() {
        let body = r#"{"code":"42P01","message":"relation \"public.nope\" does not exist"}"#;
        match error_from_response(404, body) {
            RemoteError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 404);
                assert_eq!(code.as_deref(), Some("42P01"));
                assert!(message.contains("does not exist"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_kept_as_message() {
        match error_from_response(502, "Bad Gateway\n") {
            RemoteError::Api { message, code, .. } => {
                assert_eq!(message, "Bad Gateway");
                assert!(code.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unfiltered_writes_are_refused_before_sending() {
        let cfg = RemoteConfig::new("http://127.0.0.1:9", "anon").unwrap();
        let client = RemoteStoreClient::from_config(&cfg).unwrap();
        let all = Query::table("votes");
        assert!(matches!(
            client.delete(&all).await,
            Err(RemoteError::Api { status: 400, .. })
        ));
        let patched: RemoteResult<Vec<serde_json::Value>> =
            client.update(&all, &serde_json::json!({"status": "x"})).await;
        assert!(patched.is_err());
    }
}
