//! Errors surfaced by the proxy boundary.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Timeout or connection failure.
    #[error("Network error: {0}")]
    Network(String),
    /// The proxy answered with a non-success status.
    #[error("Request failed ({status}): {message}")]
    Upstream { status: u16, message: String },
    /// The body did not have the expected shape.
    #[error("{0}")]
    Shape(String),
    /// The body carried `error: true`.
    #[error("Game reported an error: {0}")]
    Rejected(String),
}
