//! Error types for the APM injector

use thiserror::Error;

/// Main error type for injector operations
///
/// Patch generation itself cannot fail; these errors come from loading
/// configuration and running the webhook server.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid or unreadable configuration (agent config or TLS material)
    #[error("configuration error: {0}")]
    Config(String),

    /// Webhook server error
    #[error("server error: {0}")]
    Server(String),
}

impl Error {
    /// Create a configuration error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a server error with the given message
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }
}
