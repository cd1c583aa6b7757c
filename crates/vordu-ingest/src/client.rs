//! HTTP client for the Vörðu API
//!
//! One attempt per call, bounded by the configured timeout. A rejected config
//! ingest stops the run before status is posted.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vordu_core::{ConfigPayload, MatrixCell};

/// Credential header checked by the API
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Default bound on outbound calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct StatusResponse {
    count: usize,
}

/// Client posting config and status payloads
#[derive(Debug, Clone)]
pub struct VorduClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl VorduClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8000`)
    ///
    /// # Errors
    /// `ClientError::Build` if the HTTP client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    /// Base URL without trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Post the system descriptor and its components
    ///
    /// # Errors
    /// Transport failures and non-success responses.
    pub async fn post_config(&self, payload: &ConfigPayload) -> Result<(), ClientError> {
        let url = format!("{}/config/ingest", self.base_url);
        self.post(&url, payload).await?;
        tracing::info!(
            system = %payload.system.name,
            components = payload.components.len(),
            "Config ingested"
        );
        Ok(())
    }

    /// Post status cells, returning the count the API reports as updated
    ///
    /// # Errors
    /// Transport failures and non-success responses.
    pub async fn post_status(&self, cells: &[MatrixCell]) -> Result<usize, ClientError> {
        let url = format!("{}/ingest", self.base_url);
        let response = self.post(&url, cells).await?;
        let body: StatusResponse = response
            .json()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        tracing::info!(count = body.count, "Status ingested");
        Ok(body.count)
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<reqwest::Response, ClientError> {
        let mut request = self.http.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%url, status = status.as_u16(), "API rejected request");
            return Err(ClientError::Rejected {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = VorduClient::new("http://localhost:8000/", None, DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn empty_api_key_is_dropped() {
        let client =
            VorduClient::new("http://localhost:8000", Some(String::new()), DEFAULT_TIMEOUT)
                .unwrap();
        assert!(client.api_key.is_none());
    }

    #[tokio::test]
    async fn unreachable_api_is_a_transport_error() {
        let client =
            VorduClient::new("http://127.0.0.1:9", None, Duration::from_millis(500)).unwrap();
        let err = client.post_status(&[]).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }));
        assert!(!err.is_unauthorized());
    }
}
