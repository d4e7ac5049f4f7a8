use serde_json::Value;

fn banner() -> String {
    "#".repeat(100)
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Pretty-print an incoming event to the log.
pub fn log_event(event: &Value) {
    tracing::info!("{}", banner());
    tracing::info!("#---- event: {}", pretty(event));
    tracing::info!("{}", banner());
}

/// Pretty-print the JSON-encoded `body` field of an event to the log.
pub fn log_event_body(event: &Value) {
    let Some(raw) = event.get("body").and_then(Value::as_str) else {
        tracing::warn!("event has no string body");
        return;
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(body) => {
            tracing::info!("{}", banner());
            tracing::info!("#---- event-body: {}", pretty(&body));
            tracing::info!("{}", banner());
        }
        Err(e) => tracing::warn!("event body is not valid JSON: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pretty_is_indented() {
        let s = pretty(&json!({"a": 1}));
        assert!(s.contains('\n'));
        assert!(s.contains("  \"a\": 1"));
    }

    #[test]
    fn test_log_event_body_tolerates_bad_input() {
        log_event(&json!({"path": "/users"}));
        log_event_body(&json!({"body": "{\"name\": \"Ada\"}"}));
        log_event_body(&json!({"body": "not json"}));
        log_event_body(&json!({}));
    }
}
