//! Shared utility functions.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Truncate a string to approximately `max_bytes` without splitting a UTF-8
/// character boundary.
///
/// Returns a sub-slice of the original string. If the string is shorter than
/// `max_bytes`, the entire string is returned unchanged.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Extract a JSON value from free-form model output.
///
/// Tries, in order: the whole trimmed text, a ```` ```json ```` fence, any
/// ```` ``` ```` fence, and finally the outermost `{...}` span.
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    for marker in ["```json", "```"] {
        if let Some(start) = trimmed.find(marker) {
            let body = &trimmed[start + marker.len()..];
            let body = body.split("```").next().unwrap_or(body);
            if let Ok(value) = serde_json::from_str::<Value>(body.trim()) {
                return Some(value);
            }
        }
    }

    if let Some(start) = trimmed.find('{')
        && let Some(end) = trimmed.rfind('}')
        && end > start
    {
        return serde_json::from_str::<Value>(&trimmed[start..=end]).ok();
    }

    None
}

/// Extract a JSON object from free-form model output.
pub fn extract_json_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    match extract_json(text)? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Interpret a model-supplied percentage (`85`, `85.5`, `"85%"`) as 0-100.
pub fn value_as_percent(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }?;
    raw.is_finite().then(|| raw.clamp(0.0, 100.0))
}

/// Serde helper: accept a string (or number) field, treat anything else as absent.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Render a list-like JSON value as plain strings.
///
/// Objects are reduced to their `step` / `action` / `description` field when
/// present; anything else is rendered as compact JSON.
pub fn value_as_string_list(value: &Value) -> Vec<String> {
    fn item_text(item: &Value) -> String {
        match item {
            Value::String(s) => s.clone(),
            Value::Object(map) => ["step", "action", "description", "text"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| item.to_string()),
            other => other.to_string(),
        }
    }

    match value {
        Value::Array(items) => items.iter().map(item_text).collect(),
        Value::Null => Vec::new(),
        other => vec![item_text(other)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truncate_ascii() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn truncate_no_op_when_short() {
        assert_eq!(truncate_str("hi", 10), "hi");
    }

    #[test]
    fn truncate_multibyte_boundary() {
        // '€' is 3 bytes
        let s = "€€€";
        assert_eq!(truncate_str(s, 4), "€");
        assert_eq!(truncate_str(s, 6), "€€");
    }

    #[test]
    fn extract_plain_json() {
        let value = extract_json(r#"{"score": 8}"#).unwrap();
        assert_eq!(value["score"], 8);
    }

    #[test]
    fn extract_fenced_json() {
        let text = "Here is my analysis:\n```json\n{\"recommendation\": \"GO\"}\n```\nThanks";
        let value = extract_json(text).unwrap();
        assert_eq!(value["recommendation"], "GO");
    }

    #[test]
    fn extract_embedded_braces() {
        let text = "Sure. {\"a\": {\"b\": 1}} hope that helps";
        let value = extract_json(text).unwrap();
        assert_eq!(value["a"]["b"], 1);
    }

    #[test]
    fn extract_rejects_prose() {
        assert!(extract_json("I think we should proceed.").is_none());
        assert!(extract_json_object("[1, 2, 3]").is_none());
    }

    #[test]
    fn percent_parsing() {
        assert_eq!(value_as_percent(&json!(85)), Some(85.0));
        assert_eq!(value_as_percent(&json!("72%")), Some(72.0));
        assert_eq!(value_as_percent(&json!(140)), Some(100.0));
        assert_eq!(value_as_percent(&json!("high")), None);
    }

    #[test]
    fn string_list_from_mixed_items() {
        let value = json!(["Hire PM", {"step": "Run pilot", "priority": 1}, 3]);
        assert_eq!(
            value_as_string_list(&value),
            vec!["Hire PM".to_string(), "Run pilot".to_string(), "3".to_string()]
        );
    }
}
