//! Document data model and per-shape embedding text rendering.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A short document as supplied at ingest time and stored in the registry.
///
/// Immutable except via re-upsert under the same id. FAQ-shaped documents
/// carry a question/answer pair; product-like documents carry an attribute
/// map. Everything else is optional display metadata that rides along into
/// search hits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique id within one tenant.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<serde_json::Map<String, Value>>,
    /// Opaque payload; never inspected by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Document {
    /// Render the canonical text this document is embedded under.
    pub fn embedding_text(&self) -> String {
        DocumentShape::of(self).render(self)
    }
}

/// Embedding-text dispatch, decided once per document at ingestion.
///
/// A document with a non-empty question or answer renders as FAQ text; every
/// other document renders as title plus flattened attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    Faq,
    Attribute,
}

impl DocumentShape {
    /// One-time shape check for an incoming document.
    pub fn of(doc: &Document) -> Self {
        let non_empty = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.is_empty());
        if non_empty(&doc.question) || non_empty(&doc.answer) {
            DocumentShape::Faq
        } else {
            DocumentShape::Attribute
        }
    }

    /// Render the canonical embedding text for `doc` under this shape.
    ///
    /// Missing fields render as empty strings so the layout stays stable.
    pub fn render(&self, doc: &Document) -> String {
        let field = |f: &Option<String>| f.clone().unwrap_or_default();
        match self {
            DocumentShape::Faq => {
                let tags = doc
                    .tags
                    .as_deref()
                    .map(|t| t.join(", "))
                    .unwrap_or_default();
                format!(
                    "Q: {}\nA: {}\nTitle: {}\nURL: {}\nTags: {}",
                    field(&doc.question),
                    field(&doc.answer),
                    field(&doc.title),
                    field(&doc.url),
                    tags
                )
            }
            DocumentShape::Attribute => {
                let attrs = doc
                    .attributes
                    .as_ref()
                    .map(|map| {
                        map.iter()
                            .map(|(k, v)| format!("{k}: {}", attribute_value_text(v)))
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .unwrap_or_default();
                format!(
                    "Title: {}\n{}\nURL: {}",
                    field(&doc.title),
                    attrs,
                    field(&doc.url)
                )
            }
        }
    }
}

/// Flatten an attribute value without JSON string quoting.
fn attribute_value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
