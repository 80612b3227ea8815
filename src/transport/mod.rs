//! Outbound transport subsystem.
//!
//! # Data Flow
//! ```text
//! TransportFactory::build(scope)
//!     → GcsTransport (reqwest client + bearer token injection)
//!     → InstrumentedTransport (latency histogram + trace span per call)
//!     → ClientOptions (handed to the storage client builder)
//! ```
//!
//! The decorator is a pure pass-through: callers see exactly the
//! success/failure contract of the inner transport, plus emitted metrics
//! and trace data.

pub mod auth;
pub mod factory;
pub mod http;
pub mod instrumented;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Request, Response};

use crate::transport::auth::AuthError;

pub use factory::{ConfigurationError, TransportFactory};
pub use http::GcsTransport;
pub use instrumented::InstrumentedTransport;

/// Error returned by a transport call.
///
/// Delegate failures are passed through verbatim; this layer never wraps,
/// converts, or classifies them further.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The underlying HTTP call failed.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Credential material could not be obtained or encoded.
    #[error("authorization failed: {0}")]
    Auth(#[from] AuthError),
}

/// Capability for issuing one HTTP request and receiving one
/// response-or-error, composable via decoration.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a single request. Implementations must not retry and must
    /// not inject deadlines; any timeout belongs to the caller's request.
    async fn execute(&self, request: Request) -> Result<Response, TransportError>;
}

/// Client configuration value embedding a ready-to-use transport,
/// installable into any HTTP client builder.
#[derive(Clone)]
pub struct ClientOptions {
    transport: Arc<dyn Transport>,
}

impl ClientOptions {
    /// Package a transport as a client configuration value.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// The transport to install.
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions").finish_non_exhaustive()
    }
}
