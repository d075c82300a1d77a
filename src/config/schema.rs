//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Wildcard entry accepted by every CORS list.
pub const WILDCARD: &str = "*";

/// Root configuration for the serving front-end.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServeConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Cross-origin policy applied to every route.
    pub cors: CorsConfig,

    /// Engine startup/shutdown settings.
    pub lifecycle: LifecycleConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Settings for the bundled reference engine.
    pub engine: EngineConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Total time allowed for a single request/response, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            request_timeout_secs: 300,
        }
    }
}

/// Cross-origin resource sharing policy.
///
/// Each list accepts `"*"` to mean "anything". When credentials are allowed a
/// literal `*` is not a legal response value, so wildcards mirror the request
/// instead.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to make cross-origin requests.
    pub allowed_origins: Vec<String>,

    /// Whether browsers may send cookies and authorization headers.
    pub allow_credentials: bool,

    /// HTTP methods allowed in cross-origin requests.
    pub allowed_methods: Vec<String>,

    /// Request headers allowed in cross-origin requests.
    pub allowed_headers: Vec<String>,
}

impl CorsConfig {
    /// Policy that grants every origin, method and header, with credentials.
    pub fn permissive() -> Self {
        Self {
            allowed_origins: vec![WILDCARD.to_string()],
            allow_credentials: true,
            allowed_methods: vec![WILDCARD.to_string()],
            allowed_headers: vec![WILDCARD.to_string()],
        }
    }

    /// True when any origin may send credentialed requests.
    pub fn is_wide_open(&self) -> bool {
        self.allow_credentials && self.allowed_origins.iter().any(|o| o == WILDCARD)
    }
}

impl Default for CorsConfig {
    // WARNING: matches the historical behaviour of the server. Restrict this in production.
    fn default() -> Self {
        Self::permissive()
    }
}

/// Engine lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Deadline for the engine to stop once serving has ended, in seconds.
    /// Zero disables the deadline.
    pub shutdown_timeout_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Reference engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Model identifier reported by `/v1/models` and required in requests.
    pub model_id: String,

    /// Context window in tokens (prompt plus completion).
    pub max_context_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_id: "echo-1".to_string(),
            max_context_length: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_permissive_cors() {
        let config = ServeConfig::default();
        assert_eq!(config.cors, CorsConfig::permissive());
        assert!(config.cors.is_wide_open());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ServeConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "0.0.0.0:9000"

            [cors]
            allowed_origins = ["https://app.example.com"]
            allow_credentials = false

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
        assert_eq!(config.listener.request_timeout_secs, 300);
        assert_eq!(config.cors.allowed_origins, vec!["https://app.example.com"]);
        assert_eq!(config.cors.allowed_methods, vec!["*"]);
        assert!(!config.cors.is_wide_open());
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.lifecycle.shutdown_timeout_secs, 30);
        assert_eq!(config.engine.model_id, "echo-1");
    }
}
