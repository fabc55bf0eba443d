//! Unsplash API connector implementation
//!
//! Implements the `PhotoSource` trait for the Unsplash REST API.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::photos::{PhotoSource, RemotePhoto, RemoteTopic, SourceError, SourceResult};
use core_runtime::config::SourceApiConfig;
use core_runtime::logging::redact_if_sensitive;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, UnsplashError};
use crate::types::{ErrorResponse, UnsplashPhoto, UnsplashTopic};

/// API version pinned through the `Accept-Version` header
const API_VERSION: &str = "v1";

/// Largest page the API serves in one request
pub const MAX_PER_PAGE: u32 = 30;

/// Unsplash API connector
///
/// Implements `PhotoSource` over the host's `HttpClient`.
///
/// # Example
///
/// ```ignore
/// use provider_unsplash::UnsplashConnector;
/// use bridge_traits::photos::PhotoSource;
///
/// let connector = UnsplashConnector::new(http_client, SourceApiConfig::new(key));
/// let photos = connector.fetch_random_photos(30).await?;
/// ```
pub struct UnsplashConnector {
    http_client: Arc<dyn HttpClient>,
    config: SourceApiConfig,
}

impl UnsplashConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, config: SourceApiConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Builds an authenticated GET for `path` under the configured base URL.
    fn request(&self, path: &str) -> Result<HttpRequest> {
        let url = format!("{}{}", self.config.base_url, path);
        reqwest::Url::parse(&url)
            .map_err(|e| UnsplashError::InvalidRequest(format!("{}: {}", url, e)))?;

        Ok(HttpRequest::get(url)
            .authorization("Client-ID", &self.config.access_key)
            .header("Accept-Version", API_VERSION)
            .timeout(self.config.request_timeout))
    }

    /// Executes a request once and decodes a JSON body.
    ///
    /// Non-2xx responses are classified by status; retries are the caller's
    /// concern.
    async fn execute_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        debug!(
            url = %request.url,
            authorization = %redact_if_sensitive(
                "authorization",
                request.headers.get("Authorization").map(String::as_str).unwrap_or_default()
            ),
            "Sending Unsplash request"
        );

        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            let message = Self::error_message(&response);
            warn!(status = response.status, %message, "Unsplash request failed");
            return Err(UnsplashError::from_status(response.status, message));
        }

        serde_json::from_slice(&response.body)
            .map_err(|e| UnsplashError::ParseError(format!("Failed to parse response: {}", e)))
    }

    /// Extracts the API's error text, falling back to the raw body.
    fn error_message(response: &HttpResponse) -> String {
        match serde_json::from_slice::<ErrorResponse>(&response.body) {
            Ok(body) if !body.errors.is_empty() => body.errors.join("; "),
            _ => String::from_utf8_lossy(&response.body).trim().to_string(),
        }
    }

    fn check_page_size(name: &str, value: u32) -> Result<()> {
        if value == 0 || value > MAX_PER_PAGE {
            return Err(UnsplashError::InvalidRequest(format!(
                "{} must be between 1 and {}, got {}",
                name, MAX_PER_PAGE, value
            )));
        }
        Ok(())
    }

    async fn random_photos(&self, count: u32) -> Result<Vec<RemotePhoto>> {
        Self::check_page_size("count", count)?;

        let request = self.request("/photos/random")?.query_param("count", count);
        let photos: Vec<UnsplashPhoto> = self.execute_json(request).await?;

        info!("Fetched {} random photos from Unsplash", photos.len());
        Ok(photos.into_iter().map(RemotePhoto::from).collect())
    }

    async fn topics(&self, per_page: u32) -> Result<Vec<RemoteTopic>> {
        Self::check_page_size("per_page", per_page)?;

        let request = self.request("/topics")?.query_param("per_page", per_page);
        let topics: Vec<UnsplashTopic> = self.execute_json(request).await?;

        info!("Fetched {} topics from Unsplash", topics.len());
        Ok(topics.into_iter().map(RemoteTopic::from).collect())
    }

    async fn topic_photos(
        &self,
        topic_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RemotePhoto>> {
        if topic_id.trim().is_empty() {
            return Err(UnsplashError::InvalidRequest(
                "topic id cannot be empty".to_string(),
            ));
        }
        if page == 0 {
            return Err(UnsplashError::InvalidRequest(
                "pages are 1-based".to_string(),
            ));
        }
        Self::check_page_size("per_page", per_page)?;

        let path = format!("/topics/{}/photos", urlencoding::encode(topic_id));
        let request = self
            .request(&path)?
            .query_param("page", page)
            .query_param("per_page", per_page);
        let photos: Vec<UnsplashPhoto> = self.execute_json(request).await?;

        info!(
            "Fetched {} photos for topic {} page {}",
            photos.len(),
            topic_id,
            page
        );
        Ok(photos.into_iter().map(RemotePhoto::from).collect())
    }
}

#[async_trait]
impl PhotoSource for UnsplashConnector {
    #[instrument(skip(self))]
    async fn fetch_random_photos(&self, count: u32) -> SourceResult<Vec<RemotePhoto>> {
        self.random_photos(count).await.map_err(SourceError::from)
    }

    #[instrument(skip(self))]
    async fn fetch_topics(&self, per_page: u32) -> SourceResult<Vec<RemoteTopic>> {
        self.topics(per_page).await.map_err(SourceError::from)
    }

    #[instrument(skip(self))]
    async fn fetch_topic_photos(
        &self,
        topic_id: &str,
        page: u32,
        per_page: u32,
    ) -> SourceResult<Vec<RemotePhoto>> {
        self.topic_photos(topic_id, page, per_page)
            .await
            .map_err(SourceError::from)
    }
}
