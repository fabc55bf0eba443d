//! # Logging
//!
//! One global `tracing` subscriber for the whole core:
//!
//! ```text
//! registry
//!   ├── EnvFilter        workspace crates at `level`, h2/hyper/reqwest/sqlx at warn
//!   ├── LoggerSinkLayer  mirrors surviving events to the host LoggerSink
//!   └── fmt layer        pretty | json | compact on stdout
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_traits::time::LogLevel;
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! init_logging(
//!     LoggingConfig::default()
//!         .with_format(LogFormat::Compact)
//!         .with_level(LogLevel::Debug),
//! )?;
//! tracing::info!("Photo core started");
//! ```
//!
//! With redaction on (the default), credential-looking fields are masked
//! before they reach the sink. Library code also calls
//! [`redact_if_sensitive`] itself when it logs request headers.

use crate::error::{Error, Result};

use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Crates whose level follows [`LoggingConfig::level`].
const WORKSPACE_CRATES: &[&str] = &[
    "firstlook_workspace",
    "core_runtime",
    "core_library",
    "core_sync",
    "core_service",
    "provider_unsplash",
    "bridge_desktop",
];

/// Noisy dependencies pinned to `warn` in the default filter.
const QUIET_DEPENDENCIES: &[&str] = &["h2", "hyper", "reqwest", "sqlx"];

/// Field-name fragments whose values are never forwarded in clear.
const SENSITIVE_FIELDS: &[&str] = &[
    "token",
    "password",
    "secret",
    "key",
    "authorization",
    "client_id",
];

const REDACTED: &str = "[REDACTED]";

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, colored
    Pretty,
    /// One JSON object per event
    Json,
    /// Single line
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level for workspace crates when no custom filter is set
    pub level: LogLevel,
    /// Full `EnvFilter` directive string; replaces the default filter
    pub filter: Option<String>,
    /// Mask credential-looking fields before forwarding to the sink
    pub redact_secrets: bool,
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
    /// Log span close events with their timings
    pub span_timings: bool,
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            redact_secrets: true,
            logger_sink: None,
            span_timings: false,
            show_target: true,
        }
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("filter", &self.filter)
            .field("redact_secrets", &self.redact_secrets)
            .field("logger_sink", &self.logger_sink.is_some())
            .finish_non_exhaustive()
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_redaction(mut self, redact: bool) -> Self {
        self.redact_secrets = redact;
        self
    }

    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn with_span_timings(mut self, enabled: bool) -> Self {
        self.span_timings = enabled;
        self
    }

    pub fn with_target(mut self, show: bool) -> Self {
        self.show_target = show;
        self
    }

    /// The filter directives this config installs.
    pub fn directives(&self) -> String {
        if let Some(custom) = &self.filter {
            return custom.clone();
        }
        let level = self.level.as_str();
        WORKSPACE_CRATES
            .iter()
            .map(|krate| format!("{krate}={level}"))
            .chain(QUIET_DEPENDENCIES.iter().map(|dep| format!("{dep}=warn")))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Installs the global subscriber.
///
/// Call once at startup; a second call fails with [`Error::Config`].
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.directives())
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(LoggerSinkLayer::new(
            config.logger_sink.clone(),
            config.redact_secrets,
        ))
        .with(console_layer(&config))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn console_layer<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let span_events = if config.span_timings {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let base = tracing_subscriber::fmt::layer()
        .with_target(config.show_target)
        .with_span_events(span_events)
        .with_writer(io::stdout);

    match config.format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Json => base.json().flatten_event(true).boxed(),
        LogFormat::Compact => base.compact().boxed(),
    }
}

/// Mirrors events to a [`LoggerSink`].
struct LoggerSinkLayer {
    sink: Option<Arc<dyn LoggerSink>>,
    redact: bool,
}

impl LoggerSinkLayer {
    fn new(sink: Option<Arc<dyn LoggerSink>>, redact: bool) -> Self {
        Self { sink, redact }
    }

    fn entry_for(&self, event: &Event<'_>, level: LogLevel) -> LogEntry {
        let metadata = event.metadata();
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let message = fields
            .message
            .take()
            .unwrap_or_else(|| metadata.name().to_string());
        let mut entry = LogEntry::new(level, metadata.target(), message);

        for (name, value) in fields.values {
            let value = if self.redact {
                redact_if_sensitive(&name, &value)
            } else {
                value
            };
            entry = entry.with_field(name, value);
        }
        entry
    }
}

impl<S> Layer<S> for LoggerSinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };

        let level = to_log_level(*event.metadata().level());
        if level < sink.min_level() {
            return;
        }

        let mut entry = self.entry_for(event, level);
        if let Some(span) = ctx.lookup_current() {
            entry = entry.with_field("span", span.name());
        }

        let sink = Arc::clone(sink);
        match tokio::runtime::Handle::try_current() {
            // Never block a runtime worker on the host sink.
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = sink.log(entry).await {
                        eprintln!("LoggerSink error: {}", e);
                    }
                });
            }
            Err(_) => {
                if let Err(e) = futures::executor::block_on(sink.log(entry)) {
                    eprintln!("LoggerSink error: {}", e);
                }
            }
        }
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    values: HashMap<String, String>,
}

impl FieldCollector {
    fn put(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            name => {
                self.values.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, format!("{:?}", value));
    }
}

fn to_log_level(level: tracing::Level) -> LogLevel {
    match level {
        tracing::Level::TRACE => LogLevel::Trace,
        tracing::Level::DEBUG => LogLevel::Debug,
        tracing::Level::INFO => LogLevel::Info,
        tracing::Level::WARN => LogLevel::Warn,
        tracing::Level::ERROR => LogLevel::Error,
    }
}

/// Masks a value when its field name marks it as a credential, or when the
/// value itself is a `Client-ID` authorization header.
///
/// ```
/// use core_runtime::logging::redact_if_sensitive;
///
/// assert_eq!(redact_if_sensitive("access_key", "abc123"), "[REDACTED]");
/// assert_eq!(redact_if_sensitive("header", "Client-ID abc123"), "Client-ID [REDACTED]");
/// assert_eq!(redact_if_sensitive("topic_id", "nature"), "nature");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    let name = field_name.to_lowercase();
    if SENSITIVE_FIELDS.iter().any(|fragment| name.contains(fragment)) {
        return REDACTED.to_string();
    }

    match value.strip_prefix("Client-ID ") {
        Some(credential) if !credential.is_empty() => format!("Client-ID {}", REDACTED),
        _ => value.to_string(),
    }
}

/// Basename of a path, for logging file locations without the user's
/// directory layout.
pub fn strip_path(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as SinkResult;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        entries: Mutex<Vec<LogEntry>>,
    }

    #[async_trait]
    impl LoggerSink for RecordingSink {
        async fn log(&self, entry: LogEntry) -> SinkResult<()> {
            self.entries.lock().unwrap().push(entry);
            Ok(())
        }

        fn min_level(&self) -> LogLevel {
            LogLevel::Debug
        }
    }

    fn with_sink(redact: bool, emit: impl FnOnce()) -> Vec<LogEntry> {
        let sink = Arc::new(RecordingSink::default());
        let shared: Arc<dyn LoggerSink> = sink.clone();
        let subscriber =
            tracing_subscriber::registry().with(LoggerSinkLayer::new(Some(shared), redact));
        tracing::subscriber::with_default(subscriber, emit);
        let entries = sink.entries.lock().unwrap().clone();
        entries
    }

    #[test]
    fn test_default_directives() {
        let directives = LoggingConfig::default()
            .with_level(LogLevel::Debug)
            .directives();

        assert!(directives.contains("core_sync=debug"));
        assert!(directives.contains("provider_unsplash=debug"));
        assert!(directives.contains("sqlx=warn"));
        assert!(!directives.contains("core_sync=warn"));
    }

    #[test]
    fn test_custom_filter_replaces_defaults() {
        let config = LoggingConfig::default().with_filter("core_library=trace");
        assert_eq!(config.directives(), "core_library=trace");
    }

    #[test]
    fn test_invalid_filter_is_config_error() {
        let result = init_logging(LoggingConfig::default().with_filter("core_sync=verbose"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_default_format_follows_build_profile() {
        let expected = if cfg!(debug_assertions) {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        };
        assert_eq!(LogFormat::default(), expected);
    }

    #[test]
    fn test_redact_if_sensitive() {
        assert_eq!(redact_if_sensitive("access_key", "abc"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("Authorization", "x"), "[REDACTED]");
        assert_eq!(
            redact_if_sensitive("header", "Client-ID abc123"),
            "Client-ID [REDACTED]"
        );
        assert_eq!(redact_if_sensitive("header", "Client-ID "), "Client-ID ");
        assert_eq!(redact_if_sensitive("photo_id", "12345"), "12345");
    }

    #[test]
    fn test_strip_path() {
        assert_eq!(strip_path("/home/ann/.cache/snapshots/feed.json"), "feed.json");
        assert_eq!(strip_path("C:\\Users\\Ann\\library.db"), "library.db");
        assert_eq!(strip_path("topics.json"), "topics.json");
        assert_eq!(strip_path("/var/log/"), "");
    }

    #[test]
    fn test_sink_receives_message_and_fields() {
        let entries = with_sink(false, || {
            tracing::info!(target: "core_sync::engine", topic_id = "nature", page = 2, "Topic page loaded");
        });

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].target, "core_sync::engine");
        assert_eq!(entries[0].message, "Topic page loaded");
        assert_eq!(entries[0].fields.get("topic_id"), Some(&"nature".to_string()));
        assert_eq!(entries[0].fields.get("page"), Some(&"2".to_string()));
    }

    #[test]
    fn test_sink_respects_min_level() {
        let entries = with_sink(false, || {
            tracing::trace!("too verbose");
            tracing::debug!("kept");
        });

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "kept");
    }

    #[test]
    fn test_sink_fields_are_redacted() {
        let entries = with_sink(true, || {
            tracing::warn!(access_key = "abc123", status = 401, "Request rejected");
        });

        assert_eq!(
            entries[0].fields.get("access_key"),
            Some(&"[REDACTED]".to_string())
        );
        assert_eq!(entries[0].fields.get("status"), Some(&"401".to_string()));
    }
}
