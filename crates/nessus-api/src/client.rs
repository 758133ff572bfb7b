//! HTTP client adapter for the appliance REST API.

use crate::error::{ApiError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nessus_core::{ApiConfig, ApplianceConfig, Credentials, ScanFolder, ScanStatus};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Header carrying the `accessKey=...; secretKey=...` pair (`X-ApiKeys`).
pub const API_KEYS_HEADER: &str = "x-apikeys";

/// Raw REST operations the rest of the workspace depends on.
///
/// Implementations return the appliance's answer without interpreting it
/// beyond what is needed to decode it; policy lives with the callers.
#[async_trait]
pub trait NessusApi: Send + Sync {
    /// `GET /scans`, validated for status 200 and decoded.
    async fn list_scans(&self) -> Result<ScansPayload>;

    /// `POST /scans/{id}/launch`. Returns the raw HTTP status code.
    async fn launch(&self, scan_id: i64, targets: &[String]) -> Result<u16>;

    /// Plain `GET` of a web console resource, expecting status 200.
    async fn check_resource(&self, resource: &str) -> Result<()>;

    /// Base URL of the appliance, without a trailing slash.
    fn base_url(&self) -> &str;
}

/// Body of `GET /scans`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScansPayload {
    /// All folders, including the built-in ones
    #[serde(default)]
    pub folders: Vec<ScanFolder>,
    /// All scans; the appliance sends `null` when there are none
    #[serde(default)]
    pub scans: Option<Vec<RawScan>>,
}

/// One entry of the `scans` array.
#[derive(Debug, Clone, Deserialize)]
pub struct RawScan {
    /// Scan name
    pub name: String,
    /// Scan identifier
    pub id: i64,
    /// Containing folder
    pub folder_id: i64,
    /// Current status
    pub status: ScanStatus,
    /// Unix timestamp of the last modification
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub last_modification_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct LaunchRequest<'a> {
    targets: &'a [String],
}

/// Reject a response whose status differs from the expected one.
pub fn assert_status(url: &str, expected: u16, actual: u16) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(ApiError::Protocol {
            url: url.to_string(),
            reason: format!("expected status {expected}, got {actual}"),
        })
    }
}

/// Decode a JSON body, mapping failures to a protocol error.
pub fn decode_json<T: DeserializeOwned>(url: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ApiError::Protocol {
        url: url.to_string(),
        reason: format!("unable to decode response JSON: {e}"),
    })
}

/// reqwest-backed implementation of [`NessusApi`].
pub struct HttpClient {
    client: Client,
    base_url: String,
    headers: HeaderMap,
}

impl HttpClient {
    /// Build a client for one appliance and one API key pair.
    ///
    /// # Errors
    /// Returns error if the key pair is not a valid header value or the
    /// HTTP client cannot be created.
    pub fn new(
        appliance: &ApplianceConfig,
        credentials: &Credentials,
        config: &ApiConfig,
    ) -> Result<Self> {
        let mut keys = HeaderValue::from_str(&credentials.api_keys_header())
            .map_err(|e| ApiError::Internal(format!("invalid API key header: {e}")))?;
        keys.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(API_KEYS_HEADER, keys);

        if !config.verify_tls {
            tracing::warn!("TLS certificate verification disabled for {}", appliance.base_url());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| ApiError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: appliance.base_url().to_string(),
            headers,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl NessusApi for HttpClient {
    async fn list_scans(&self) -> Result<ScansPayload> {
        let url = self.url("/scans");
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;

        assert_status(&url, 200, response.status().as_u16())?;
        let body = response.text().await?;
        decode_json(&url, &body)
    }

    async fn launch(&self, scan_id: i64, targets: &[String]) -> Result<u16> {
        let url = self.url(&format!("/scans/{scan_id}/launch"));
        tracing::debug!("POST {} ({} targets)", url, targets.len());

        let mut request = self.client.post(&url).headers(self.headers.clone());
        if !targets.is_empty() {
            request = request.json(&LaunchRequest { targets });
        }

        let response = request.send().await?;
        Ok(response.status().as_u16())
    }

    async fn check_resource(&self, resource: &str) -> Result<()> {
        let url = self.url(resource);
        tracing::debug!("Checking web resource {}", url);

        let response = self.client.get(&url).send().await?;
        assert_status(&url, StatusCode::OK.as_u16(), response.status().as_u16())
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
