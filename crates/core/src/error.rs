//! Unified error types for relme.
//!
//! Display strings carry a stable upper-case code prefix so log lines and
//! HTTP handlers can classify failures without matching on variants.

use tokio_rusqlite::rusqlite;

/// Unified error types shared by the resolver, the profile cache and the server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., missing query parameter).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid or unsupported URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// SSRF blocked - private/internal address not allowed.
    #[error("SSRF_BLOCKED: {0}")]
    SsrfBlocked(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Transport-level failure (connect, TLS, reset).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Non-success HTTP status.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// WebFinger document missing or malformed.
    #[error("INVALID_WEBFINGER: {0}")]
    InvalidWebfinger(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored profile data could not be (de)serialized.
    #[error("CACHE_ERROR: serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row holds values that cannot be decoded.
    #[error("CACHE_ERROR: corrupt record: {0}")]
    CorruptRecord(String),

    /// The store dropped a transform without running it.
    #[error("CACHE_ERROR: store unavailable: {0}")]
    StoreUnavailable(String),
}

impl Error {
    /// The stable code prefix of this error, e.g. `"HTTP_ERROR"`.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::SsrfBlocked(_) => "SSRF_BLOCKED",
            Error::FetchTimeout(_) => "FETCH_TIMEOUT",
            Error::FetchTooLarge(_) => "FETCH_TOO_LARGE",
            Error::Network(_) => "NETWORK_ERROR",
            Error::HttpError(_) => "HTTP_ERROR",
            Error::InvalidWebfinger(_) => "INVALID_WEBFINGER",
            Error::Database(_)
            | Error::MigrationFailed(_)
            | Error::Serialization(_)
            | Error::CorruptRecord(_)
            | Error::StoreUnavailable(_) => "CACHE_ERROR",
        }
    }

    /// Whether the failure says nothing about the remote document itself.
    ///
    /// Transient failures (timeouts, dropped connections) are worth retrying
    /// later; everything else describes the target and is final for now.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::FetchTimeout(_) | Error::Network(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
