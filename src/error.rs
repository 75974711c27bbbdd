//! Catalog error taxonomy.
//!
//! Every gateway operation fails with one of the variants below. The engine
//! never retries internally; transient failures are propagated so the caller
//! (or the gateway implementation itself) can decide on backoff. Empty
//! results are not errors anywhere in the engine.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Credential invalid or expired. The operation aborts before any write.
    #[error("catalog authentication failed: {0}")]
    Auth(String),

    /// Rate limit or network trouble. Safe to retry the whole operation;
    /// reconciliation is idempotent so a re-run only adds what is missing.
    #[error("transient catalog failure: {0}")]
    Transient(String),

    /// A referenced entity (seed track, playlist) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed payloads and anything else outside the taxonomy.
    #[error("unexpected catalog response: {0}")]
    Unexpected(String),
}

impl CatalogError {
    /// Classifies an HTTP status from the catalog into the taxonomy.
    ///
    /// 401/403 map to [`CatalogError::Auth`], 404 to
    /// [`CatalogError::NotFound`], 429 and all server errors to
    /// [`CatalogError::Transient`]. Anything else is unexpected: the request
    /// itself was malformed, which no retry will fix.
    pub fn from_status(status: StatusCode, context: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                CatalogError::Auth(format!("{} ({})", context, status))
            }
            StatusCode::NOT_FOUND => CatalogError::NotFound(context.to_string()),
            StatusCode::TOO_MANY_REQUESTS => {
                CatalogError::Transient(format!("rate limited: {}", context))
            }
            s if s.is_server_error() => CatalogError::Transient(format!("{} ({})", context, s)),
            s => CatalogError::Unexpected(format!("{} ({})", context, s)),
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => CatalogError::from_status(status, &err.to_string()),
            // No status means the request never completed: connect errors,
            // timeouts, or a body that stopped mid-stream.
            None if err.is_decode() => CatalogError::Unexpected(err.to_string()),
            None => CatalogError::Transient(err.to_string()),
        }
    }
}
