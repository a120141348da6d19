//! Persistent settings.
//!
//! Read from `<config dir>/ticketroute/config.json`. Every field is optional;
//! command-line flags take precedence over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use ticketroute_core::TicketService;
use ticketroute_graph::{GraphConfig, RetryPolicy};

/// Settings loaded from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Graph API root.
    pub graph_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Attempts for idempotent `GET`s, the first one included.
    pub max_attempts: Option<u32>,
    /// Deadline for a whole lifecycle operation in seconds.
    pub operation_timeout_secs: Option<u64>,
}

impl Settings {
    /// Default location of the config file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ticketroute")
            .join("config.json")
    }

    /// Loads settings.
    ///
    /// An explicit `path` must exist. The default file is optional and a
    /// missing one yields default settings.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        if !required && !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let settings = serde_json::from_str(&contents)
            .with_context(|| format!("invalid settings in {}", path.display()))?;
        tracing::debug!("Settings loaded from {:?}", path);
        Ok(settings)
    }

    /// Overrides file values with the ones given on the command line.
    #[must_use]
    pub fn with_overrides(
        mut self,
        graph_url: Option<String>,
        timeout_secs: Option<u64>,
        operation_timeout_secs: Option<u64>,
    ) -> Self {
        if graph_url.is_some() {
            self.graph_url = graph_url;
        }
        if timeout_secs.is_some() {
            self.timeout_secs = timeout_secs;
        }
        if operation_timeout_secs.is_some() {
            self.operation_timeout_secs = operation_timeout_secs;
        }
        self
    }

    /// Builds the Graph client configuration.
    pub fn graph_config(&self) -> ticketroute_graph::Result<GraphConfig> {
        let mut builder = GraphConfig::builder();
        if let Some(url) = &self.graph_url {
            builder = builder.base_url(url);
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(max_attempts) = self.max_attempts {
            builder = builder.retry(RetryPolicy {
                max_attempts,
                ..RetryPolicy::default()
            });
        }
        builder.build()
    }

    /// Builds the lifecycle service.
    pub fn service(&self) -> TicketService {
        let service = TicketService::new();
        match self.operation_timeout_secs {
            Some(secs) => service.with_operation_timeout(Duration::from_secs(secs)),
            None => service,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "ticketroute-{}-{name}.json",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_parse_camel_case() {
        let settings: Settings = serde_json::from_str(
            r#"{"graphUrl": "https://graph.microsoft.us/v1.0", "timeoutSecs": 5, "maxAttempts": 1}"#,
        )
        .unwrap();
        assert_eq!(
            settings.graph_url.as_deref(),
            Some("https://graph.microsoft.us/v1.0")
        );
        assert_eq!(settings.timeout_secs, Some(5));
        assert_eq!(settings.max_attempts, Some(1));
        assert!(settings.operation_timeout_secs.is_none());
    }

    #[test]
    fn test_flags_override_file() {
        let file = Settings {
            graph_url: Some("https://file.example/v1.0".into()),
            timeout_secs: Some(10),
            ..Settings::default()
        };
        let merged = file.with_overrides(None, Some(3), Some(60));
        assert_eq!(merged.graph_url.as_deref(), Some("https://file.example/v1.0"));
        assert_eq!(merged.timeout_secs, Some(3));
        assert_eq!(merged.operation_timeout_secs, Some(60));
    }

    #[test]
    fn test_graph_config_from_settings() {
        let settings = Settings {
            graph_url: Some("http://127.0.0.1:9000/v1.0".into()),
            timeout_secs: Some(7),
            max_attempts: Some(1),
            ..Settings::default()
        };
        let config = settings.graph_config().unwrap();
        assert_eq!(config.base_url.port(), Some(9000));
        assert_eq!(config.request_timeout, Duration::from_secs(7));
        assert_eq!(config.retry.max_attempts, 1);
    }

    #[test]
    fn test_graph_config_rejects_zero_timeout() {
        let settings = Settings {
            timeout_secs: Some(0),
            ..Settings::default()
        };
        assert!(settings.graph_config().is_err());
    }

    #[tokio::test]
    async fn test_load_explicit_file() {
        let path = scratch_file("explicit", r#"{"operationTimeoutSecs": 90}"#);
        let settings = Settings::load(Some(&path)).await.unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(settings.operation_timeout_secs, Some(90));
    }

    #[tokio::test]
    async fn test_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("ticketroute-does-not-exist.json");
        assert!(Settings::load(Some(&path)).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let path = scratch_file("malformed", "{not json");
        let result = Settings::load(Some(&path)).await;
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }
}
