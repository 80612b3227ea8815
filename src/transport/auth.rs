//! Bearer-token credential sources.

use std::env;

/// Failure to produce usable credential material.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The credential source exists but holds nothing usable.
    #[error("credential source {0:?} is not set or empty")]
    MissingCredentials(String),

    /// The token cannot be carried in an Authorization header.
    #[error("credential material is not valid header text: {0}")]
    InvalidToken(String),
}

/// Source of bearer tokens authorized for a scope.
///
/// Implementations are consulted on every request so rotated credentials
/// are picked up without rebuilding the transport.
pub trait TokenProvider: Send + Sync {
    fn token(&self, scope: &str) -> Result<String, AuthError>;
}

/// Fixed token, for tests and short-lived tooling.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn token(&self, _scope: &str) -> Result<String, AuthError> {
        Ok(self.token.clone())
    }
}

/// Reads the token from an environment variable on every call.
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl TokenProvider for EnvTokenProvider {
    fn token(&self, _scope: &str) -> Result<String, AuthError> {
        let token =
            env::var(&self.var).map_err(|_| AuthError::MissingCredentials(self.var.clone()))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingCredentials(self.var.clone()));
        }
        Ok(token.to_string())
    }
}
