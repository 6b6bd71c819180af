//! Gallery metadata client.

use std::time::{Duration, Instant};

use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::config::{Endpoints, ReaderConfig};
use crate::error::{FetchError, Result};
use crate::model::GalleryRecord;

/// Timeout for a single metadata request.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(15);

/// Check that a code is safe to use in URLs and directory names.
pub fn is_valid_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Fetches gallery metadata from the remote API.
#[derive(Debug, Clone)]
pub struct GalleryClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl GalleryClient {
    /// Build a client with its own connection pool.
    pub fn new(endpoints: Endpoints, user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self::with_http(http, endpoints))
    }

    pub fn from_config(config: &ReaderConfig) -> Result<Self> {
        Self::new(config.endpoints.clone(), &config.user_agent)
    }

    /// Reuse an existing reqwest client.
    pub fn with_http(http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// The underlying HTTP client, shared with asset downloads.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Fetch and parse the metadata of one gallery.
    ///
    /// Nothing is retried here: a 404 becomes [`FetchError::NotFound`], any
    /// other non-200 status [`FetchError::UnexpectedStatus`].
    pub async fn fetch_metadata(&self, code: &str) -> Result<GalleryRecord> {
        if !is_valid_code(code) {
            return Err(FetchError::InvalidCode(code.to_string()));
        }

        let url = self.endpoints.gallery_url(code);
        debug!(url = %url, "Fetching gallery metadata");

        let started = Instant::now();
        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .timeout(METADATA_TIMEOUT)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        info!(
            code = %code,
            status = status.as_u16(),
            response_time_ms = started.elapsed().as_millis() as u64,
            "Gallery API request"
        );

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                code: code.to_string(),
            });
        }
        if status != StatusCode::OK {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let record: GalleryRecord = serde_json::from_slice(&body)?;

        if record.pages().len() != record.num_pages {
            debug!(
                code = %code,
                pages = record.pages().len(),
                num_pages = record.num_pages,
                "Page count disagrees with page list, using page list"
            );
        }

        Ok(record.with_code(code))
    }
}
