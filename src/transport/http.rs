//! Authenticated inner transport for GCS.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Request, Response};

use crate::transport::auth::{AuthError, TokenProvider};
use crate::transport::{Transport, TransportError};

/// Inner transport: a reqwest client that injects a bearer token for the
/// configured scope and sends the request as-is otherwise.
pub struct GcsTransport {
    client: Client,
    scope: String,
    tokens: Arc<dyn TokenProvider>,
}

impl GcsTransport {
    pub fn new(client: Client, scope: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            scope: scope.into(),
            tokens,
        }
    }

    /// The authorization scope this transport was built for.
    pub fn scope(&self) -> &str {
        &self.scope
    }
}

#[async_trait]
impl Transport for GcsTransport {
    async fn execute(&self, mut request: Request) -> Result<Response, TransportError> {
        let token = self.tokens.token(&self.scope)?;
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        // keep the credential out of logs and debug output
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);

        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            "Sending GCS request"
        );

        Ok(self.client.execute(request).await?)
    }
}
