use serde_json::{json, Value};

use crate::config::{ApiProvider, EmbedConfig};
use crate::{EmbedError, Embedder};

/// Blocking HTTP embedding backend.
///
/// Posts texts to a remote inference endpoint and parses the response
/// tolerantly: `{"embeddings": [...]}` wrappers, OpenAI-style
/// `{"data": [{"embedding": [...]}]}`, and bare arrays are all accepted.
pub struct ApiEmbedder {
    cfg: EmbedConfig,
    agent: ureq::Agent,
}

impl ApiEmbedder {
    pub fn new(cfg: EmbedConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(cfg.timeout()).build();
        Self { cfg, agent }
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.cfg
    }

    fn request(&self, payload: Value) -> Result<Value, EmbedError> {
        if self.cfg.api_url.is_empty() {
            return Err(EmbedError::InvalidConfig("api_url must not be empty".into()));
        }

        let mut request = self
            .agent
            .post(&self.cfg.api_url)
            .set("Content-Type", "application/json");
        if let Some(header) = self.cfg.api_auth_header.as_deref() {
            request = request.set("Authorization", header);
        }

        tracing::debug!(url = %self.cfg.api_url, "sending embedding request");
        let response = request
            .send_string(&payload.to_string())
            .map_err(|e| EmbedError::Http(e.to_string()))?;
        let body = response
            .into_string()
            .map_err(|e| EmbedError::Http(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| EmbedError::BadResponse(e.to_string()))
    }

    fn payload_single(&self, text: &str) -> Value {
        match self.cfg.provider {
            ApiProvider::HuggingFace => json!({ "inputs": text }),
            ApiProvider::OpenAi => json!({ "input": text, "model": self.cfg.model_name }),
            ApiProvider::Custom => json!({ "text": text }),
        }
    }

    fn payload_batch(&self, texts: &[String]) -> Value {
        match self.cfg.provider {
            ApiProvider::HuggingFace => json!({ "inputs": texts }),
            ApiProvider::OpenAi => json!({ "input": texts, "model": self.cfg.model_name }),
            ApiProvider::Custom => json!({ "texts": texts }),
        }
    }
}

impl Embedder for ApiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let response = self.request(self.payload_single(text))?;
        let mut vectors = parse_embeddings(response)?;
        vectors
            .pop()
            .ok_or_else(|| EmbedError::BadResponse("response did not contain embeddings".into()))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = parse_embeddings(self.request(self.payload_batch(texts))?)?;
        if vectors.len() != texts.len() {
            return Err(EmbedError::BadResponse(format!(
                "endpoint returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }
}

/// Extracts one or more embedding vectors from a provider response.
fn parse_embeddings(value: Value) -> Result<Vec<Vec<f32>>, EmbedError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_collection(embeddings);
            }
            if let Some(Value::Array(items)) = map.remove("data") {
                let mut vectors = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Object(mut obj) => match obj.remove("embedding") {
                            Some(embedding) => vectors.push(parse_vector(embedding)?),
                            None => {
                                return Err(EmbedError::BadResponse(
                                    "missing `embedding` field in data item".into(),
                                ))
                            }
                        },
                        _ => {
                            return Err(EmbedError::BadResponse(
                                "unexpected entry inside `data` array".into(),
                            ))
                        }
                    }
                }
                return Ok(vectors);
            }
            Err(EmbedError::BadResponse("unsupported response shape".into()))
        }
        other => parse_collection(other),
    }
}

fn parse_collection(value: Value) -> Result<Vec<Vec<f32>>, EmbedError> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                Ok(Vec::new())
            } else if items.iter().all(|item| matches!(item, Value::Array(_))) {
                items.into_iter().map(parse_vector).collect()
            } else {
                parse_vector(Value::Array(items)).map(|v| vec![v])
            }
        }
        other => parse_vector(other).map(|v| vec![v]),
    }
}

fn parse_vector(value: Value) -> Result<Vec<f32>, EmbedError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| EmbedError::BadResponse("non-finite embedding value".into())),
                other => Err(EmbedError::BadResponse(format!(
                    "embedding entries must be numbers, got {other:?}"
                ))),
            })
            .collect(),
        other => Err(EmbedError::BadResponse(format!(
            "embedding vector must be an array, got {other:?}"
        ))),
    }
}
