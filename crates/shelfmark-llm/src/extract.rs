//! JSON extraction from model output
//!
//! Chat models asked for strict JSON still wrap it in Markdown code fences
//! often enough that parsing must tolerate them. Anything that does not
//! parse after fence stripping is an [`LlmError::InvalidResponse`]; consumers
//! treat that as "no suggestion produced", not as a failure of the whole
//! request.

use serde_json::Value;

use crate::provider::LlmError;

/// Parse model output as JSON, stripping a surrounding code fence first.
pub fn extract_json(content: &str) -> Result<Value, LlmError> {
    let trimmed = content.trim();
    let candidate = strip_code_fence(trimmed).unwrap_or(trimmed);

    serde_json::from_str(candidate.trim())
        .map_err(|e| LlmError::InvalidResponse(format!("not valid JSON: {}", e)))
}

/// Parse model output into a typed value.
pub fn extract_typed<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, LlmError> {
    let value = extract_json(content)?;
    serde_json::from_value(value)
        .map_err(|e| LlmError::InvalidResponse(format!("unexpected shape: {}", e)))
}

/// Return the inside of a ``` fence, tolerating a language tag on the
/// opening line. `None` when the text is not fenced.
fn strip_code_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    let end = rest.rfind("```")?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct TagsPayload {
        tags: Vec<String>,
    }

    #[test]
    fn test_plain_json() {
        let value = extract_json(r#"{"tags": ["rust", "async"]}"#).unwrap();
        assert_eq!(value, json!({"tags": ["rust", "async"]}));
    }

    #[test]
    fn test_fenced_json_with_language_tag() {
        let content = "```json\n{\"tags\": [\"rust\"]}\n```";
        let value = extract_json(content).unwrap();
        assert_eq!(value["tags"][0], "rust");
    }

    #[test]
    fn test_fenced_json_without_language_tag() {
        let content = "```\n{\"category\": \"Technology\"}\n```";
        let value = extract_json(content).unwrap();
        assert_eq!(value["category"], "Technology");
    }

    #[test]
    fn test_surrounding_whitespace() {
        let content = "  \n```json\n{\"summary\": \"short\"}\n```  \n";
        let value = extract_json(content).unwrap();
        assert_eq!(value["summary"], "short");
    }

    #[test]
    fn test_prose_is_invalid_response() {
        let err = extract_json("Sure! Here are some tags you could use.").unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn test_truncated_json_is_invalid_response() {
        let err = extract_json(r#"{"tags": ["rust""#).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn test_typed_extraction() {
        let payload: TagsPayload = extract_typed("```json\n{\"tags\": [\"web\"]}\n```").unwrap();
        assert_eq!(payload.tags, vec!["web"]);
    }

    #[test]
    fn test_typed_extraction_wrong_shape() {
        let err = extract_typed::<TagsPayload>(r#"{"tags": "not-a-list"}"#).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }
}
