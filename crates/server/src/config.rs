use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Deadline for one pipeline call (embed + search + generate) in seconds
    #[serde(default = "default_query_deadline_secs")]
    pub query_deadline_secs: u64,

    /// Directory holding per-tenant vector store artifacts
    #[serde(default = "default_store_root")]
    pub store_root: PathBuf,

    /// Cache entry TTL in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Cosine similarity threshold for cache hits
    #[serde(default = "default_cache_similarity")]
    pub cache_similarity_threshold: f32,

    /// Optional cap on cache entries per tenant (unbounded when absent)
    #[serde(default)]
    pub cache_max_entries_per_tenant: Option<usize>,

    /// Results retrieved when a query does not specify top_k
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Embedding endpoint URL; the deterministic stub is used when absent
    #[serde(default)]
    pub embed_api_url: Option<String>,

    /// Authorization header for the embedding endpoint
    #[serde(default)]
    pub embed_api_auth_header: Option<String>,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            query_deadline_secs: default_query_deadline_secs(),
            store_root: default_store_root(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_similarity_threshold: default_cache_similarity(),
            cache_max_entries_per_tenant: None,
            default_top_k: default_top_k(),
            embed_api_url: None,
            embed_api_auth_header: None,
            enable_cors: default_true(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config files
    pub fn load() -> anyhow::Result<Self> {
        // Pick up a local .env before the environment source reads it
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .add_source(config::File::with_name("ragcore").required(false))
            .add_source(config::Environment::with_prefix("RAGCORE").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Whole-request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pipeline call deadline as Duration
    pub fn query_deadline(&self) -> Duration {
        Duration::from_secs(self.query_deadline_secs)
    }

    /// Cache TTL as Duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_query_deadline_secs() -> u64 {
    20
}

fn default_store_root() -> PathBuf {
    PathBuf::from("vectorstores")
}

fn default_cache_ttl_secs() -> u64 {
    1800
}

fn default_cache_similarity() -> f32 {
    0.92
}

fn default_top_k() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
