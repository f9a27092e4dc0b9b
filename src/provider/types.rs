//! Provider error taxonomy and response classification

use serde_json::Value;
use thiserror::Error;

/// Errors raised by provider access
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Network failure, timeout or unreadable body
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
    /// Non-success HTTP status
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    /// HTTP success carrying a populated `errors` field
    #[error("provider errors (HTTP {status}) from {url}: {errors}")]
    Embedded {
        status: u16,
        url: String,
        errors: Value,
    },
    /// Body that is not the JSON envelope we expect
    #[error("malformed payload from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

impl ProviderError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Transport { .. } | ProviderError::Embedded { .. } => true,
            ProviderError::Status { status, .. } => is_retriable_status(*status),
            ProviderError::Malformed { .. } => false,
        }
    }

    /// HTTP status attached to the error, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Status { status, .. } | ProviderError::Embedded { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// URL of the failing request
    pub fn url(&self) -> &str {
        match self {
            ProviderError::Transport { url, .. }
            | ProviderError::Status { url, .. }
            | ProviderError::Embedded { url, .. }
            | ProviderError::Malformed { url, .. } => url,
        }
    }
}

/// Outcome of a single request attempt
#[derive(Debug, Clone)]
pub enum Attempt {
    /// Valid JSON envelope without provider errors
    Success(Value),
    /// Failure worth retrying (429, 5xx, transport, embedded errors)
    Retriable(ProviderError),
    /// Failure that retrying will not fix
    Fatal(ProviderError),
}

/// 429 and every 5xx are retried
pub fn is_retriable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Classify an HTTP response into an [`Attempt`]
///
/// Transport status is checked first, then the payload: a 2xx body must be
/// JSON and must not carry a non-empty `errors` field.
pub fn classify_response(url: &str, status: u16, body: &str) -> Attempt {
    if is_retriable_status(status) {
        return Attempt::Retriable(ProviderError::Status {
            status,
            url: url.to_string(),
            body: truncate(body, 512),
        });
    }
    if !(200..300).contains(&status) {
        return Attempt::Fatal(ProviderError::Status {
            status,
            url: url.to_string(),
            body: truncate(body, 512),
        });
    }

    let value: Value = match serde_json::from_str(body.trim()) {
        Ok(v) => v,
        Err(e) => {
            return Attempt::Fatal(ProviderError::Malformed {
                url: url.to_string(),
                reason: e.to_string(),
            })
        }
    };

    if has_embedded_errors(&value) {
        let errors = value.get("errors").cloned().unwrap_or(Value::Null);
        return Attempt::Retriable(ProviderError::Embedded {
            status,
            url: url.to_string(),
            errors,
        });
    }

    Attempt::Success(value)
}

/// Whether the envelope's `errors` field is populated
///
/// The provider sends `[]` or `{}` when everything is fine and either an array
/// of messages or an object keyed by parameter on failure.
pub fn has_embedded_errors(value: &Value) -> bool {
    match value.get("errors") {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(_)) => true,
    }
}

/// Items of the envelope's `response` array (empty when absent)
pub fn response_items(value: &Value) -> &[Value] {
    value
        .get("response")
        .and_then(|r| r.as_array())
        .map(|a| a.as_slice())
        .unwrap_or(&[])
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://provider.test/fixtures";

    #[test]
    fn test_success_envelope() {
        let body = r#"{"errors":[],"results":1,"response":[{"id":1}]}"#;
        match classify_response(URL, 200, body) {
            Attempt::Success(v) => assert_eq!(response_items(&v).len(), 1),
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_errors_object_is_success() {
        let body = r#"{"errors":{},"response":[]}"#;
        assert!(matches!(classify_response(URL, 200, body), Attempt::Success(_)));
    }

    #[test]
    fn test_200_with_errors_array_is_retriable() {
        let body = r#"{"errors":["Too many requests"],"response":[]}"#;
        match classify_response(URL, 200, body) {
            Attempt::Retriable(ProviderError::Embedded { status, errors, .. }) => {
                assert_eq!(status, 200);
                assert_eq!(errors, json!(["Too many requests"]));
            }
            other => panic!("expected embedded error, got {:?}", other),
        }
    }

    #[test]
    fn test_200_with_errors_object_is_retriable() {
        let body = r#"{"errors":{"token":"Error/Missing application key"},"response":[]}"#;
        let attempt = classify_response(URL, 200, body);
        assert!(matches!(attempt, Attempt::Retriable(ProviderError::Embedded { .. })));
    }

    #[test]
    fn test_retriable_statuses() {
        for status in [429, 500, 502, 503, 599] {
            assert!(
                matches!(classify_response(URL, status, ""), Attempt::Retriable(_)),
                "status {} should be retriable",
                status
            );
        }
    }

    #[test]
    fn test_client_errors_are_fatal() {
        for status in [400, 401, 403, 404] {
            match classify_response(URL, status, "nope") {
                Attempt::Fatal(err) => {
                    assert_eq!(err.status(), Some(status));
                    assert!(!err.is_transient());
                }
                other => panic!("status {} should be fatal, got {:?}", status, other),
            }
        }
    }

    #[test]
    fn test_malformed_json_is_fatal() {
        let attempt = classify_response(URL, 200, "<html>maintenance</html>");
        assert!(matches!(attempt, Attempt::Fatal(ProviderError::Malformed { .. })));
    }

    #[test]
    fn test_error_carries_url_and_status() {
        let err = ProviderError::Status {
            status: 503,
            url: URL.to_string(),
            body: "down".to_string(),
        };
        assert_eq!(err.url(), URL);
        assert!(err.is_transient());
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_response_items_missing() {
        assert!(response_items(&json!({"errors": []})).is_empty());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "é".repeat(400);
        let t = truncate(&s, 513);
        assert!(t.ends_with('…'));
    }
}
