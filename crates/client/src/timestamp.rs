//! Lenient timestamp parsing for engine payloads.
//!
//! Engines disagree on how they render dates: RFC 3339 strings on one
//! platform, RFC 2822 on another, raw epoch milliseconds from older
//! bridges. Anything that parses becomes a UTC timestamp; anything else is
//! treated as absent rather than an error.

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Deserializer},
    serde_json::Value,
};

/// Parse one payload value into a UTC timestamp, if it holds one.
#[must_use]
pub fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_text(text),
        Value::Number(number) => number.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Serde adapter for timestamp fields: unparseable shapes become `None`.
pub fn lenient<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(timestamp_from_value))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn parses_rfc3339() {
        let parsed = timestamp_from_value(&json!("2016-03-04T10:25:00Z")).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2016-03-04T10:25:00+00:00");
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let parsed = timestamp_from_value(&json!("2016-03-04T10:25:00+02:00")).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2016-03-04T08:25:00+00:00");
    }

    #[test]
    fn parses_rfc2822() {
        let parsed = timestamp_from_value(&json!("Fri, 04 Mar 2016 10:25:00 +0000")).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2016-03-04T10:25:00+00:00");
    }

    #[test]
    fn parses_epoch_milliseconds() {
        let parsed = timestamp_from_value(&json!(1_457_087_100_000_u64)).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2016-03-04T10:25:00+00:00");
    }

    #[test]
    fn garbage_is_absent() {
        assert!(timestamp_from_value(&json!("not a date")).is_none());
        assert!(timestamp_from_value(&json!(null)).is_none());
        assert!(timestamp_from_value(&json!(true)).is_none());
        assert!(timestamp_from_value(&json!({"nested": 1})).is_none());
    }
}
