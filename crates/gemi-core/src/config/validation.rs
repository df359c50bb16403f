//! Settings validation - warns about unknown keys

use serde_json::{Map, Value};
use tracing::warn;

use super::settings::KNOWN_KEYS;

/// Warn about every key in the settings object the plugin does not recognize.
pub fn warn_unknown_fields(values: &Map<String, Value>, config_name: &str) {
    for key in find_unknown_keys(values) {
        warn!("Unknown setting in {config_name}: {key}");
    }
}

/// Keys present in `values` that are not recognized settings, in file order.
#[must_use]
pub fn find_unknown_keys(values: &Map<String, Value>) -> Vec<String> {
    values
        .keys()
        .filter(|key| !KNOWN_KEYS.contains(&key.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_known_keys_pass() {
        let values = object(json!({
            "api_key": "k",
            "model": "gemini-pro",
            "save_conversation": "true"
        }));
        assert!(find_unknown_keys(&values).is_empty());
    }

    #[test]
    fn test_unknown_keys_reported() {
        let values = object(json!({
            "api_key": "k",
            "apiKey": "typo",
            "stop": "||"
        }));
        let unknown = find_unknown_keys(&values);
        assert_eq!(unknown.len(), 2);
        assert!(unknown.contains(&"apiKey".to_string()));
        assert!(unknown.contains(&"stop".to_string()));
    }
}
