//! [`HttpClient`] over reqwest.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpRequest, HttpResponse},
};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shares one connection pool across all requests.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("firstlook-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map(|client| Self { client })
            .map_err(|e| BridgeError::NotAvailable(format!("HTTP client: {}", e)))
    }

    fn prepare(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let builder = request
            .headers
            .iter()
            .fold(self.client.get(&request.url), |builder, (name, value)| {
                builder.header(name, value)
            })
            .query(&request.query);

        match request.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }
}

fn classify(e: reqwest::Error) -> BridgeError {
    if e.is_builder() {
        BridgeError::OperationFailed(format!("Invalid request: {}", e))
    } else if e.is_timeout() {
        BridgeError::Network("Request timed out".to_string())
    } else {
        BridgeError::Network(e.to_string())
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(url = %request.url, "GET");

        let response = self.prepare(request).send().await.map_err(|e| {
            warn!(error = %e, "HTTP transport failure");
            classify(e)
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(classify)?;

        debug!(status, bytes = body.len(), "HTTP response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds() {
        assert!(ReqwestHttpClient::new().is_ok());
        assert!(ReqwestHttpClient::with_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_prepare_carries_query_headers_and_timeout() {
        let client = ReqwestHttpClient::new().unwrap();
        let request = HttpRequest::get("https://api.example.com/topics")
            .query_param("per_page", 6)
            .authorization("Client-ID", "key")
            .timeout(Duration::from_secs(3));

        let built = client.prepare(request).build().unwrap();
        assert_eq!(built.method(), reqwest::Method::GET);
        assert_eq!(built.url().query(), Some("per_page=6"));
        assert_eq!(built.headers().get("Authorization").unwrap(), "Client-ID key");
        assert_eq!(built.timeout(), Some(&Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = ReqwestHttpClient::with_timeout(Duration::from_millis(500)).unwrap();
        let result = client
            .execute(HttpRequest::get("http://127.0.0.1:9/unreachable"))
            .await;

        assert!(matches!(result, Err(BridgeError::Network(_))));
    }
}
