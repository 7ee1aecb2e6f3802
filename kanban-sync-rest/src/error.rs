//! Errors raised while building a REST gateway

use thiserror::Error;

/// Construction errors. Failures of individual calls are reported as
/// [`kanban_sync::RemoteFailure`].
#[derive(Debug, Error)]
pub enum RestError {
    #[error("invalid API base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}
