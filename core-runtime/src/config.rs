//! # Core Configuration Module
//!
//! Builder-based configuration for the photo-sync core.
//!
//! ## Overview
//!
//! [`CoreConfig`] holds the paths, host bridges and remote source settings the
//! core needs. [`CoreConfigBuilder::build`] fails fast with an actionable
//! message when something required is missing.
//!
//! ## Bridges
//!
//! - `HttpClient` - Remote source requests (desktop default: reqwest)
//! - `FileSystemAccess` - Snapshot files (desktop default: tokio fs)
//!
//! When the `desktop-shims` feature is enabled, desktop defaults are injected
//! for any bridge that was not provided. Without it, a missing bridge is a
//! [`Error::CapabilityMissing`].
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, SourceApiConfig};
//!
//! let config = CoreConfig::builder()
//!     .database_path("/path/to/photos.db")
//!     .cache_dir("/path/to/cache")
//!     .source_api(SourceApiConfig::new("access-key"))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{FileSystemAccess, HttpClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default remote source endpoint.
pub const DEFAULT_SOURCE_BASE_URL: &str = "https://api.unsplash.com";

/// Core configuration for the photo-sync core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// Directory for snapshot files
    pub cache_dir: PathBuf,

    pub http_client: Arc<dyn HttpClient>,

    pub file_system: Arc<dyn FileSystemAccess>,

    /// Remote source endpoint and credentials
    pub source_api: SourceApiConfig,

    /// Privilege flag at startup. The host may change it later through the
    /// engine handle.
    pub privileged: bool,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("cache_dir", &self.cache_dir)
            .field("http_client", &"HttpClient { ... }")
            .field("file_system", &"FileSystemAccess { ... }")
            .field("source_api", &self.source_api)
            .field("privileged", &self.privileged)
            .finish()
    }
}

/// Remote source endpoint and credentials.
///
/// The access key is supplied by the host at runtime and never compiled in.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceApiConfig {
    /// API root, without a trailing slash
    pub base_url: String,

    /// Client access key sent as `Authorization: Client-ID <key>`
    pub access_key: String,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl std::fmt::Debug for SourceApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceApiConfig")
            .field("base_url", &self.base_url)
            .field("access_key", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl SourceApiConfig {
    pub fn new(access_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_SOURCE_BASE_URL.to_string(),
            access_key: access_key.into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the API root. A trailing slash is dropped.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.access_key.trim().is_empty() {
            return Err(Error::Config(
                "Source API access key cannot be empty. \
                 Pass the key with SourceApiConfig::new(key)."
                    .to_string(),
            ));
        }

        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(Error::Config(format!(
                "Source API base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Source API request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// This checks:
    /// - Database path is not empty
    /// - Cache directory is not empty
    /// - Source API settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.cache_dir.as_os_str().is_empty() {
            return Err(Error::Config("Cache directory cannot be empty".to_string()));
        }

        self.source_api.validate()
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(source_api: &SourceApiConfig) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(source_api.request_timeout)
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_source_api: &SourceApiConfig) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                 Desktop: enable the 'desktop-shims' feature to use ReqwestHttpClient. \
                 Mobile: inject a platform-native HTTP adapter."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Ok(Arc::new(bridge_desktop::TokioFileSystem::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Err(Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "No file system implementation provided. \
                 Desktop: enable the 'desktop-shims' feature to use TokioFileSystem. \
                 Mobile: inject an adapter rooted in the app sandbox."
            .to_string(),
    })
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    source_api: Option<SourceApiConfig>,
    privileged: bool,
}

impl CoreConfigBuilder {
    /// Sets the database path.
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder().database_path("/path/to/photos.db");
    /// ```
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the directory snapshot files are written under.
    pub fn cache_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.into());
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the reqwest-based desktop default is used when the
    /// `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the file system access implementation.
    ///
    /// If not provided, the tokio-based desktop default is used when the
    /// `desktop-shims` feature is enabled.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Sets the remote source endpoint and credentials (required).
    pub fn source_api(mut self, config: SourceApiConfig) -> Self {
        self.source_api = Some(config);
        self
    }

    /// Sets the startup privilege flag. Default: false
    pub fn privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns an error if:
    /// - Database path, cache directory or source API settings are missing
    /// - A bridge is missing and no desktop default is available
    /// - Any configured value is invalid
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let cache_dir = self.cache_dir.ok_or_else(|| {
            Error::Config("Cache directory is required. Use .cache_dir() to set it.".to_string())
        })?;

        let source_api = self.source_api.ok_or_else(|| {
            Error::Config(
                "Source API configuration is required. Use .source_api() to set it.".to_string(),
            )
        })?;
        source_api.validate()?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(&source_api)?,
        };

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system()?,
        };

        let config = CoreConfig {
            database_path,
            cache_dir,
            http_client,
            file_system,
            source_api,
            privileged: self.privileged,
        };

        config.validate()?;
        Ok(config)
    }
}
