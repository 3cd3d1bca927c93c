//! Config redaction: produce safe-to-log config snapshots by masking secrets.

use serde_json::Value;

use crate::schema::ChatRelayConfig;

const SENSITIVE_KEYS: &[&str] = &["api_key", "secret_key"];

/// Render the config as JSON with secrets masked.
pub fn redact(config: &ChatRelayConfig) -> Value {
    let value = serde_json::to_value(config).unwrap_or(Value::Null);
    redact_value(value)
}

fn redact_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, v)| {
                    let v = if SENSITIVE_KEYS.contains(&key.as_str()) {
                        mask(v)
                    } else {
                        redact_value(v)
                    };
                    (key, v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact_value).collect()),
        other => other,
    }
}

fn mask(value: Value) -> Value {
    match value {
        // Preserve a short hint so operators can tell keys apart.
        Value::String(s) if s.chars().count() > 8 => {
            let hint: String = s.chars().take(4).collect();
            Value::String(format!("{hint}***"))
        }
        Value::String(_) => Value::String("***".to_string()),
        other => other,
    }
}
