//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! transport. All types derive Serde traits for deserialization from config
//! files.

use serde::{Deserialize, Serialize};

/// Root configuration for the instrumented GCS transport.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TransportConfig {
    /// GCS client settings (scope, credentials, HTTP knobs).
    pub gcs: GcsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// GCS client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GcsConfig {
    /// Default authorization scope requested for the transport.
    pub scope: String,

    /// Environment variable holding the bearer token.
    pub token_env: String,

    /// User-Agent header sent on outbound requests.
    pub user_agent: String,

    /// Connection establishment timeout in seconds. No total-request
    /// timeout is applied; deadlines belong to the caller's request.
    pub connect_timeout_secs: u64,
}

impl Default for GcsConfig {
    fn default() -> Self {
        Self {
            scope: "https://www.googleapis.com/auth/devstorage.read_write".to_string(),
            token_env: "GCS_BEARER_TOKEN".to_string(),
            user_agent: concat!("gcs-transport/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub log_json: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// OTLP collector endpoint for span export (optional).
    pub otlp_endpoint: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
            otlp_endpoint: None,
        }
    }
}
