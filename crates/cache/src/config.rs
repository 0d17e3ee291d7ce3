use std::time::Duration;

/// Cache behavior knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum entry age before it is treated as absent.
    pub ttl: Duration,
    /// Minimum cosine similarity for a lookup to count as a hit.
    pub similarity_threshold: f32,
    /// Optional hard bound on live entries per tenant; `None` keeps
    /// eviction TTL-only.
    pub max_entries_per_tenant: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(1800),
            similarity_threshold: 0.92,
            max_entries_per_tenant: None,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_max_entries_per_tenant(mut self, cap: usize) -> Self {
        self.max_entries_per_tenant = Some(cap);
        self
    }
}
