//! Transport factory.
//!
//! Composes the authenticated inner transport with the instrumentation
//! decorator and packages the result as a [`ClientOptions`] value.

use std::sync::Arc;
use std::time::Duration;

use prometheus::HistogramVec;
use url::Url;

use crate::config::GcsConfig;
use crate::observability::tracing::Tracer;
use crate::transport::auth::{AuthError, TokenProvider};
use crate::transport::http::GcsTransport;
use crate::transport::instrumented::InstrumentedTransport;
use crate::transport::ClientOptions;

/// Fatal failure to construct a transport; no client value is produced.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("invalid authorization scope {scope:?}: {reason}")]
    InvalidScope { scope: String, reason: String },

    #[error("credential source unavailable: {0}")]
    Credentials(#[from] AuthError),

    #[error("http client construction failed: {0}")]
    Client(#[from] reqwest::Error),
}

/// Builds instrumented, authenticated transports.
///
/// The histogram, tracer, and credential source are injected once and
/// shared by reference with every transport the factory produces.
pub struct TransportFactory {
    duration: HistogramVec,
    tracer: Arc<dyn Tracer>,
    tokens: Arc<dyn TokenProvider>,
    config: GcsConfig,
}

impl TransportFactory {
    pub fn new(
        duration: HistogramVec,
        tracer: Arc<dyn Tracer>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            duration,
            tracer,
            tokens,
            config: GcsConfig::default(),
        }
    }

    /// Apply client settings (user agent, connect timeout).
    pub fn with_config(mut self, config: GcsConfig) -> Self {
        self.config = config;
        self
    }

    /// Build a client configuration value for the given authorization
    /// scope.
    ///
    /// Fails with [`ConfigurationError`] when the scope is malformed, the
    /// credential source cannot produce a token, or the HTTP client cannot
    /// be constructed.
    pub fn build(&self, scope: &str) -> Result<ClientOptions, ConfigurationError> {
        validate_scope(scope)?;

        // Probe the credential source once so a dead source fails the
        // build instead of every request.
        self.tokens.token(scope)?;

        let client = reqwest::Client::builder()
            .user_agent(&self.config.user_agent)
            .connect_timeout(Duration::from_secs(self.config.connect_timeout_secs))
            .build()?;

        let inner = GcsTransport::new(client, scope, Arc::clone(&self.tokens));
        let transport =
            InstrumentedTransport::new(inner, self.duration.clone(), Arc::clone(&self.tracer));

        tracing::info!(scope = %scope, "GCS transport ready");

        Ok(ClientOptions::with_transport(Arc::new(transport)))
    }
}

fn validate_scope(scope: &str) -> Result<(), ConfigurationError> {
    if scope.trim().is_empty() {
        return Err(ConfigurationError::InvalidScope {
            scope: scope.to_string(),
            reason: "scope is empty".to_string(),
        });
    }

    let url = Url::parse(scope).map_err(|e| ConfigurationError::InvalidScope {
        scope: scope.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "https" {
        return Err(ConfigurationError::InvalidScope {
            scope: scope.to_string(),
            reason: format!("expected https scheme, got {:?}", url.scheme()),
        });
    }

    Ok(())
}
