use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```json\s*(.*?)```").expect("fenced-json regex must compile")
});

// Matches `{key:` or `, key:` where the key is unquoted.
static UNQUOTED_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*:)"#).expect("key regex must compile")
});

/// Pull a JSON object out of free-form model text.
///
/// Models asked for "ONLY a JSON object" return prose around it, fenced
/// code blocks, or almost-JSON often enough that each shape gets its own
/// attempt: direct parse, fenced block, outermost brace span, and finally
/// a repair pass that quotes bare object keys.
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() || value.is_array() {
            return Some(value);
        }
    }

    if let Some(captures) = FENCED_JSON.captures(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(captures[1].trim()) {
            return Some(value);
        }
    }

    let span = brace_span(trimmed)?;
    if let Ok(value) = serde_json::from_str::<Value>(span) {
        return Some(value);
    }

    // Last resort: quote unquoted keys and retry the same span.
    let repaired = UNQUOTED_KEY.replace_all(span, "$1\"$2\"$3");
    serde_json::from_str::<Value>(&repaired).ok()
}

/// Extract a JSON array from model text, unwrapping common envelope keys.
pub fn extract_json_array(text: &str, envelope_keys: &[&str]) -> Option<Vec<Value>> {
    match extract_json(text) {
        Some(Value::Array(items)) => return Some(items),
        Some(Value::Object(map)) => {
            if let Some(items) = envelope_keys.iter().find_map(|key| {
                map.get(*key)
                    .and_then(|v| v.as_array())
                    .map(|a| a.to_vec())
            }) {
                return Some(items);
            }
        }
        _ => {}
    }

    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct_parse() {
        let parsed = extract_json(r#"{"assistant": "hi", "updates": {}}"#).unwrap();
        assert_eq!(parsed["assistant"], "hi");
    }

    #[test]
    fn test_fenced_block() {
        let text = "Here you go:\n```json\n{\"assistant\": \"hello\"}\n```\nanything else?";
        let parsed = extract_json(text).unwrap();
        assert_eq!(parsed["assistant"], "hello");
    }

    #[test]
    fn test_brace_span_with_surrounding_prose() {
        let text = "Sure! {\"assistant\": \"done\", \"updates\": {\"size\": \"M\"}} Hope that helps.";
        let parsed = extract_json(text).unwrap();
        assert_eq!(parsed["updates"]["size"], "M");
    }

    #[test]
    fn test_unquoted_key_repair() {
        let text = r#"{assistant: "ok", updates: {quantity: 2}}"#;
        let parsed = extract_json(text).unwrap();
        assert_eq!(parsed["assistant"], "ok");
        assert_eq!(parsed["updates"]["quantity"], 2);
    }

    #[test]
    fn test_plain_prose_yields_none() {
        assert!(extract_json("I think the answer is nice!").is_none());
        assert!(extract_json("").is_none());
        assert!(extract_json("   ").is_none());
    }

    #[test]
    fn test_scalar_json_is_not_an_object() {
        // A bare string parses as JSON but is useless as an update payload.
        assert!(extract_json("\"hello\"").is_none());
    }

    #[test]
    fn test_array_direct() {
        let items = extract_json_array(r#"[{"name": "A"}, {"name": "B"}]"#, &[]).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_array_in_envelope() {
        let text = r#"{"designs": [{"name": "A"}]}"#;
        let items = extract_json_array(text, &["designs", "layouts"]).unwrap();
        assert_eq!(items[0], json!({"name": "A"}));
    }

    #[test]
    fn test_array_in_prose() {
        let text = "Designs below\n[{\"name\": \"A\"}]\ndone";
        let items = extract_json_array(text, &[]).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_array_absent() {
        assert!(extract_json_array("no structured data here", &["designs"]).is_none());
    }
}
