//! Small helpers shared by the schema layer and tool handlers

use serde_json::Value;
use url::Url;

/// Keys whose values never reach the logs
const REDACTED_KEYS: &[&str] = &["secret", "password", "token", "apikey", "api_key"];

/// Strip everything but `[A-Za-z0-9_-]` from a session id before it is placed in a path
pub fn sanitize_session_id(session_id: &str) -> String {
    session_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Whether `input` parses as an absolute URL (scheme required, no base)
pub fn is_valid_url(input: &str) -> bool {
    Url::parse(input).is_ok()
}

/// Loose address check: one `@`, non-empty local part, dotted domain, no whitespace
pub fn is_valid_email(input: &str) -> bool {
    if input.chars().any(char::is_whitespace) {
        return false;
    }
    match input.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split('.')
                    .filter(|label| !label.is_empty())
                    .count()
                    >= 2
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Copy of `args` with sensitive values replaced, for logging
pub fn redact_arguments(args: &Value) -> Value {
    match args {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let lowered = key.to_ascii_lowercase();
                    if REDACTED_KEYS.iter().any(|k| lowered.contains(k)) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redact_arguments(value))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_arguments).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_session_id() {
        assert_eq!(sanitize_session_id("abc-123_XYZ"), "abc-123_XYZ");
        assert_eq!(sanitize_session_id("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_session_id("a b;c"), "abc");
    }

    #[test]
    fn test_url_validation() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://localhost:3000/path?q=1"));
        assert!(!is_valid_url("not-a-url"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("jane@example.com"));
        assert!(!is_valid_email("jane.example.com"));
        assert!(!is_valid_email("jane@localhost"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jane doe@example.com"));
    }

    #[test]
    fn test_redaction() {
        let args = json!({
            "sessionId": "abc",
            "apiKey": "k",
            "nested": { "password": "p", "name": "n" }
        });
        let redacted = redact_arguments(&args);
        assert_eq!(redacted["sessionId"], "abc");
        assert_eq!(redacted["apiKey"], "[REDACTED]");
        assert_eq!(redacted["nested"]["password"], "[REDACTED]");
        assert_eq!(redacted["nested"]["name"], "n");
    }
}
