//! Recover a JSON object from free-form model output.
//!
//! Models wrap JSON in markdown fences, prepend explanations, or trail off
//! with commentary. [`parse_structured`] peels those layers deterministically:
//!
//! 1. trim whitespace
//! 2. strip a leading/trailing code fence (with optional language tag)
//! 3. parse the remainder directly
//! 4. otherwise try the balanced `{...}` spans, left to right, starting from at
//!    most the first 64 opening braces
//!
//! Only JSON objects count as success.

use serde_json::{Map, Value};

use crate::{HuginnError, Result};

const FENCE: &str = "```";

/// Opening braces examined during salvage. Each examination scans to the
/// matching brace (or the end of input), so this bounds the work per input
/// to `MAX_SALVAGE_STARTS * len`.
const MAX_SALVAGE_STARTS: usize = 64;

/// Result of [`parse_structured`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(Map<String, Value>),
    /// Nothing but whitespace (or an empty fence).
    Empty,
    /// Text present, but no JSON object could be recovered.
    Unparseable(String),
}

impl ParseOutcome {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseOutcome::Parsed(_))
    }

    /// Convert into a `Result`, mapping failures to [`HuginnError::Parse`].
    pub fn into_result(self) -> Result<Map<String, Value>> {
        match self {
            ParseOutcome::Parsed(map) => Ok(map),
            ParseOutcome::Empty => Err(HuginnError::Parse("empty model output".to_string())),
            ParseOutcome::Unparseable(reason) => Err(HuginnError::Parse(reason)),
        }
    }
}

/// Recover the first JSON object from `text`. Pure and deterministic.
pub fn parse_structured(text: &str) -> ParseOutcome {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return ParseOutcome::Empty;
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        return ParseOutcome::Parsed(map);
    }

    let mut candidates = 0usize;
    let starts = body
        .char_indices()
        .filter(|&(_, ch)| ch == '{')
        .map(|(idx, _)| idx)
        .take(MAX_SALVAGE_STARTS);
    for idx in starts {
        if let Some(span) = balanced_object_at(body, idx) {
            candidates += 1;
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(span) {
                return ParseOutcome::Parsed(map);
            }
        }
    }

    let reason = if candidates == 0 {
        "no JSON object found".to_string()
    } else {
        format!("{candidates} brace-delimited candidate(s) found, none valid JSON")
    };
    ParseOutcome::Unparseable(reason)
}

/// Trim `text` and remove a surrounding markdown code fence, if any.
///
/// The opening fence may carry a language tag (` ```json `). A missing
/// closing fence is tolerated since truncated output often loses it.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+')))
        .unwrap_or(rest.len());
    let rest = &rest[tag_len..];
    let rest = rest.strip_suffix(FENCE).unwrap_or(rest);
    rest.trim()
}

/// The balanced `{...}` span starting at byte `start`, skipping braces inside
/// string literals. `None` if the braces never balance.
fn balanced_object_at(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parsed(text: &str) -> Value {
        match parse_structured(text) {
            ParseOutcome::Parsed(map) => Value::Object(map),
            other => panic!("expected parse success, got {other:?}"),
        }
    }

    #[test]
    fn unbalanced_brace_run_is_bounded() {
        let text = format!("Here you go: {} done", "{".repeat(40_000));
        let start = std::time::Instant::now();
        assert!(matches!(
            parse_structured(&text),
            ParseOutcome::Unparseable(_)
        ));
        assert!(start.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn nested_invalid_candidates_are_bounded() {
        let n = 20_000;
        let text = format!("x {}1{} y", "{".repeat(n), "}".repeat(n));
        let start = std::time::Instant::now();
        match parse_structured(&text) {
            ParseOutcome::Unparseable(reason) => assert!(reason.starts_with("64 ")),
            other => panic!("expected Unparseable, got {other:?}"),
        }
        assert!(start.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn object_after_a_few_stray_braces_is_found() {
        assert_eq!(parsed(r#"{ {{ oops {"a": 1}"#), json!({"a": 1}));
    }

    #[test]
    fn direct_object() {
        assert_eq!(parsed(r#"  {"a": 1}  "#), json!({"a": 1}));
    }

    #[test]
    fn fenced_with_language_tag() {
        assert_eq!(parsed("```json\n{\"a\": 1}\n```"), json!({"a": 1}));
    }

    #[test]
    fn fenced_without_tag() {
        assert_eq!(parsed("```\n{\"a\": 1}\n```"), json!({"a": 1}));
    }

    #[test]
    fn fence_missing_close() {
        assert_eq!(parsed("```json\n{\"a\": 1}"), json!({"a": 1}));
    }

    #[test]
    fn single_line_fence() {
        assert_eq!(parsed("```json {\"a\": 1}```"), json!({"a": 1}));
    }

    #[test]
    fn prose_around_object() {
        let text = "Sure! Here is the analysis:\n{\"a\": {\"b\": [1, 2]}}\nLet me know.";
        assert_eq!(parsed(text), json!({"a": {"b": [1, 2]}}));
    }

    #[test]
    fn prose_around_fenced_object() {
        let text = "Result:\n```json\n{\"a\": 1}\n```\nHope that helps";
        assert_eq!(parsed(text), json!({"a": 1}));
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let text = r#"note {"msg": "a } tricky { string", "n": 2} end"#;
        assert_eq!(parsed(text), json!({"msg": "a } tricky { string", "n": 2}));
    }

    #[test]
    fn escaped_quotes_inside_strings() {
        let text = r#"x {"msg": "say \"hi\" }", "n": 1} y"#;
        assert_eq!(parsed(text), json!({"msg": "say \"hi\" }", "n": 1}));
    }

    #[test]
    fn skips_invalid_candidate_for_later_valid_one() {
        let text = r#"{not json} then {"ok": true}"#;
        assert_eq!(parsed(text), json!({"ok": true}));
    }

    #[test]
    fn empty_and_whitespace() {
        assert_eq!(parse_structured(""), ParseOutcome::Empty);
        assert_eq!(parse_structured("   \n\t"), ParseOutcome::Empty);
        assert_eq!(parse_structured("```json\n```"), ParseOutcome::Empty);
    }

    #[test]
    fn prose_only_is_unparseable() {
        match parse_structured("I cannot classify this post.") {
            ParseOutcome::Unparseable(reason) => assert!(reason.contains("no JSON")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unbalanced_is_unparseable() {
        assert!(!parse_structured(r#"{"a": 1"#).is_parsed());
    }

    #[test]
    fn arrays_do_not_count() {
        assert!(!parse_structured("[1, 2, 3]").is_parsed());
    }

    #[test]
    fn into_result_maps_to_parse_error() {
        let err = parse_structured("").into_result().unwrap_err();
        assert!(matches!(err, HuginnError::Parse(_)));
    }
}
