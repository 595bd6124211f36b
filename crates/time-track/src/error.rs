use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for the time-tracking client.
pub type Result<T> = StdResult<T, Error>;

/// Errors returned by the time-tracking client.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured base URL could not be parsed.
    #[error("Invalid base URL {url}: {message}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        message: String,
    },

    /// Transport-level failure (connection, TLS, body decoding).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{method} {url}: {status} {message}")]
    Api {
        /// Request method.
        method: String,
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Flattened error message from the response body.
        message: String,
    },
}
