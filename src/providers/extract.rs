//! Pull the model's text out of a decoded provider payload.

use serde_json::Value;

use super::profile::ResponsePath;
use crate::{HuginnError, Result};

/// Extract the model text from `payload` following `path`.
///
/// A missing path (empty `choices`, no text block, null content) is a
/// malformed response and fails with [`HuginnError::Extraction`]; it is never
/// defaulted and never retried.
pub fn extract_text(payload: &Value, path: &ResponsePath) -> Result<String> {
    let text = match path {
        ResponsePath::ChatChoices => payload
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.pointer("/message/content"))
            .and_then(Value::as_str)
            .ok_or_else(|| missing("choices[0].message.content", payload))?,
        ResponsePath::ContentBlocks => {
            let blocks = payload
                .get("content")
                .and_then(Value::as_array)
                .filter(|blocks| !blocks.is_empty())
                .ok_or_else(|| missing("content[]", payload))?;
            blocks
                .iter()
                .find(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                .or_else(|| blocks.first())
                .and_then(|b| b.get("text"))
                .and_then(Value::as_str)
                .ok_or_else(|| missing("content[].text", payload))?
        }
        ResponsePath::Pointer(pointer) => payload
            .pointer(pointer)
            .and_then(Value::as_str)
            .ok_or_else(|| missing(pointer, payload))?,
    };
    Ok(text.to_string())
}

fn missing(path: &str, payload: &Value) -> HuginnError {
    let kind = match payload {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("object with keys [{}]", keys.join(", "))
        }
        Value::Array(_) => "array".to_string(),
        Value::Null => "null".to_string(),
        _ => "scalar".to_string(),
    };
    HuginnError::Extraction(format!("expected text at {path}, got {kind}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_choices() {
        let payload = json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"a\":1}"}}]
        });
        assert_eq!(
            extract_text(&payload, &ResponsePath::ChatChoices).unwrap(),
            "{\"a\":1}"
        );
    }

    #[test]
    fn empty_choices_is_extraction_error() {
        let payload = json!({"choices": []});
        let err = extract_text(&payload, &ResponsePath::ChatChoices).unwrap_err();
        assert!(matches!(err, HuginnError::Extraction(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn null_content_is_extraction_error() {
        let payload = json!({"choices": [{"message": {"content": null}}]});
        assert!(extract_text(&payload, &ResponsePath::ChatChoices).is_err());
    }

    #[test]
    fn content_blocks_skip_non_text() {
        let payload = json!({
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "answer"}
            ]
        });
        assert_eq!(
            extract_text(&payload, &ResponsePath::ContentBlocks).unwrap(),
            "answer"
        );
    }

    #[test]
    fn content_blocks_untyped_first_block() {
        let payload = json!({"content": [{"text": "plain"}]});
        assert_eq!(
            extract_text(&payload, &ResponsePath::ContentBlocks).unwrap(),
            "plain"
        );
    }

    #[test]
    fn empty_content_blocks_fail() {
        let payload = json!({"content": []});
        assert!(extract_text(&payload, &ResponsePath::ContentBlocks).is_err());
    }

    #[test]
    fn pointer_path() {
        let payload = json!({"message": {"content": "hi"}});
        let path = ResponsePath::Pointer("/message/content".into());
        assert_eq!(extract_text(&payload, &path).unwrap(), "hi");

        let err = extract_text(&json!({"other": 1}), &path).unwrap_err();
        assert!(err.to_string().contains("/message/content"));
        assert!(err.to_string().contains("other"));
    }
}
