use thiserror::Error;

/// Errors surfaced by the tenant vector store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Search or list against a tenant with no persisted store.
    #[error("no vector store found for tenant '{0}'; ingest documents first")]
    TenantNotFound(String),

    /// Tenant ids become directory names; reject anything unsafe for that.
    #[error("invalid tenant id '{0}'")]
    InvalidTenantId(String),

    /// Embedding or storage I/O failure during a mutating call. No partial
    /// tenant state is published when this is returned.
    #[error("ingestion failed: {0}")]
    Ingestion(String),

    /// Embedding failure on the read path (query embedding).
    #[error("embedding failure: {0}")]
    Embed(String),

    /// Persisted artifacts are unreadable or mutually inconsistent.
    #[error("artifact error: {0}")]
    Artifact(String),

    /// Query vector dimension differs from the indexed dimension.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Artifact(err.to_string())
    }
}
