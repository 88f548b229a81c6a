use chrono::NaiveDateTime;
use serde_json::Value;
use tracing::debug;

/// Reads a string field, tolerating a missing key by returning an empty
/// string rather than panicking — the opaque-payload tolerance rule
/// applies to every template builder.
pub fn field(value: &Value, key: &str) -> String {
    value.get(key).and_then(Value::as_str).unwrap_or("").to_string()
}

pub fn nested_field(value: &Value, path: &[&str]) -> String {
    let mut current = value;
    for key in path {
        match current.get(key) {
            Some(next) => current = next,
            None => return String::new(),
        }
    }
    current.as_str().unwrap_or("").to_string()
}

/// Parses `YYYY-MM-DDTHH:MM:SS.ffffZ` and renders `DD Month YYYY
/// HH:MM:SS GMT`. Falls through to the raw string if parsing fails,
/// rather than panicking on an unexpected format.
pub fn format_created_at(raw: &str) -> String {
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.fZ") {
        Ok(dt) => format!("{} GMT", dt.format("%d %B %Y %H:%M:%S")),
        Err(_) => {
            debug!(raw, "created_at did not match the expected format, passing through");
            raw.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_the_gitlab_timestamp_shape() {
        let rendered = format_created_at("2024-03-05T12:30:00.000000Z");
        assert_eq!(rendered, "05 March 2024 12:30:00 GMT");
    }

    #[test]
    fn unparseable_timestamp_passes_through_unchanged() {
        assert_eq!(format_created_at("not-a-date"), "not-a-date");
    }

    #[test]
    fn missing_field_renders_empty_string() {
        let v = serde_json::json!({});
        assert_eq!(field(&v, "name"), "");
    }
}
