use thiserror::Error;

/// Errors surfaced by embedding backends.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Configuration is inconsistent (e.g. empty endpoint URL).
    #[error("invalid embed config: {0}")]
    InvalidConfig(String),

    /// Transport-level failure talking to the inference endpoint.
    #[error("embedding request failed: {0}")]
    Http(String),

    /// The endpoint answered but the body could not be interpreted as
    /// embeddings (wrong shape, non-numeric entries, count mismatch).
    #[error("bad embedding response: {0}")]
    BadResponse(String),
}
