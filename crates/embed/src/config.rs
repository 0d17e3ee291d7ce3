use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Remote provider hint controlling the request payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiProvider {
    /// HuggingFace inference API: `{"inputs": ...}`.
    HuggingFace,
    /// OpenAI-compatible embeddings API: `{"input": ..., "model": ...}`.
    OpenAi,
    /// Custom endpoint: `{"text": ...}` / `{"texts": [...]}`.
    Custom,
}

/// Runtime configuration for the HTTP embedding backend.
///
/// # Example
/// ```no_run
/// use embed::{ApiEmbedder, EmbedConfig, ApiProvider};
///
/// let cfg = EmbedConfig::new("https://api.example.com/embed")
///     .with_provider(ApiProvider::HuggingFace)
///     .with_auth_header("Bearer hf_xxx");
/// let _embedder = ApiEmbedder::new(cfg);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedConfig {
    /// Inference endpoint URL.
    pub api_url: String,
    /// Authorization header value (e.g. `"Bearer hf_xxx"`).
    pub api_auth_header: Option<String>,
    /// Payload shape for the remote provider.
    pub provider: ApiProvider,
    /// Model name forwarded to providers that require one in the payload.
    pub model_name: String,
    /// Overall request timeout in seconds.
    pub timeout_secs: u64,
}

impl EmbedConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_auth_header: None,
            provider: ApiProvider::Custom,
            model_name: "all-MiniLM-L6-v2".into(),
            timeout_secs: 30,
        }
    }

    pub fn with_auth_header(mut self, header: impl Into<String>) -> Self {
        self.api_auth_header = Some(header.into());
        self
    }

    pub fn with_provider(mut self, provider: ApiProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let cfg = EmbedConfig::new("http://localhost:9000/embed")
            .with_provider(ApiProvider::OpenAi)
            .with_model_name("text-embedding-3-small")
            .with_timeout_secs(5);
        assert_eq!(cfg.provider, ApiProvider::OpenAi);
        assert_eq!(cfg.model_name, "text-embedding-3-small");
        assert_eq!(cfg.timeout_secs, 5);
        assert!(cfg.api_auth_header.is_none());
    }
}
