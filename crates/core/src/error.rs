//! Error types for catalog requests.

/// Failure of a single catalog request.
///
/// The store only keeps the rendered message, so every variant reads as a
/// complete sentence on its own.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, TLS or timeout failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("server returned HTTP {status}: {message}")]
    Status {
        /// Numeric HTTP status code.
        status: u16,
        /// Leading part of the response body.
        message: String,
    },

    /// Body was not the JSON shape we expected.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Base URL and path could not be combined.
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}
