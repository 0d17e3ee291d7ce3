//! Grounded prompt assembly.
//!
//! Renders retrieved context into a readable block and wraps it, together
//! with the user question, in the strict answer-only-from-context chat
//! template the answering model is trained against.

use serde_json::Value;

use crate::SearchHit;

/// System instruction shared by every generated answer.
pub const SYSTEM_MESSAGE: &str = "You are a helpful SaaS support assistant.\n\
You must ONLY answer using the provided context snippets.\n\
If the answer is not in the context, reply exactly: \"I don't know.\".\n\
Always finish with a 'Sources:' list showing titles or URLs.";

/// Convert retrieved hits into a readable context block.
///
/// Each hit renders as `[label] (score=…)` followed by its Q/A pair or its
/// flattened attributes; the label falls back from title to URL to id.
pub fn format_context(context: &[SearchHit]) -> String {
    context
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            let label = hit
                .title
                .clone()
                .or_else(|| hit.url.clone())
                .unwrap_or_else(|| {
                    if hit.id.is_empty() {
                        format!("Doc{}", i + 1)
                    } else {
                        hit.id.clone()
                    }
                });
            let snippet = render_snippet(hit);
            format!("[{label}] (score={:.3})\n{snippet}", hit.score)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the full chat prompt for one query.
pub fn build_prompt(query: &str, context: &[SearchHit]) -> String {
    let ctx_block = if context.is_empty() {
        "No relevant context retrieved.".to_string()
    } else {
        format_context(context)
    };
    format!(
        "<|system|>\n{SYSTEM_MESSAGE}\n<|end|>\n\
         <|user|>\nQuestion: {query}\n\nContext:\n{ctx_block}\n<|end|>\n\
         <|assistant|>\n"
    )
}

fn render_snippet(hit: &SearchHit) -> String {
    let has = |f: &Option<String>| f.as_deref().is_some_and(|s| !s.is_empty());
    if has(&hit.question) || has(&hit.answer) {
        format!(
            "Q: {}\nA: {}",
            hit.question.as_deref().unwrap_or(""),
            hit.answer.as_deref().unwrap_or("")
        )
    } else if !hit.attributes.is_empty() {
        hit.attributes
            .iter()
            .map(|(k, v)| format!("{k}: {}", attribute_text(v)))
            .collect::<Vec<_>>()
            .join("; ")
    } else {
        serde_json::to_string(&hit.document).unwrap_or_default()
    }
}

/// Flatten an attribute value without JSON string quoting.
pub fn attribute_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    fn hit(id: &str, score: f32, question: Option<&str>, answer: Option<&str>) -> SearchHit {
        let document = Document {
            id: id.into(),
            title: Some(format!("Title {id}")),
            question: question.map(Into::into),
            answer: answer.map(Into::into),
            url: None,
            tags: None,
            attributes: None,
            metadata: None,
        };
        SearchHit {
            id: id.into(),
            title: document.title.clone(),
            url: None,
            score,
            tags: Vec::new(),
            attributes: serde_json::Map::new(),
            question: document.question.clone(),
            answer: document.answer.clone(),
            metadata: None,
            document,
        }
    }

    #[test]
    fn faq_hits_render_qa_snippets() {
        let block = format_context(&[hit("f1", 0.91, Some("Return window?"), Some("30 days"))]);
        assert!(block.starts_with("[Title f1] (score=0.910)"));
        assert!(block.contains("Q: Return window?\nA: 30 days"));
    }

    #[test]
    fn empty_context_has_explicit_placeholder() {
        let prompt = build_prompt("Any question?", &[]);
        assert!(prompt.contains("No relevant context retrieved."));
        assert!(prompt.contains("Question: Any question?"));
        assert!(prompt.starts_with("<|system|>"));
        assert!(prompt.ends_with("<|assistant|>\n"));
    }

    #[test]
    fn hits_are_separated_by_blank_lines() {
        let block = format_context(&[
            hit("f1", 0.9, Some("A?"), Some("1")),
            hit("f2", 0.8, Some("B?"), Some("2")),
        ]);
        assert_eq!(block.matches("\n\n").count(), 1);
    }
}
