//! Message snapshots.

use {
    chrono::{DateTime, Utc},
    serde::Deserialize,
    serde_json::Value,
};

use crate::timestamp;

/// One message as last reported by the engine.
///
/// A passive snapshot built from a payload; it never refreshes.
/// `channel_sid` is not part of the payload: the channel that constructs
/// the snapshot attaches its own sid, except for toast notifications,
/// which are delivered without one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    pub sid: Option<String>,
    pub index: Option<u64>,
    pub author: Option<String>,
    pub body: Option<String>,
    #[serde(deserialize_with = "timestamp::lenient")]
    pub timestamp: Option<DateTime<Utc>>,
    pub attributes: Option<Value>,
    #[serde(skip)]
    pub channel_sid: Option<String>,
}

impl Message {
    /// Best-effort construction from a raw payload; shapes that do not
    /// deserialize yield an empty snapshot.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Attach the sid of the channel this message belongs to.
    #[must_use]
    pub fn with_channel_sid(mut self, sid: impl Into<String>) -> Self {
        self.channel_sid = Some(sid.into());
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn reads_camel_case_fields() {
        let message = Message::from_value(&json!({
            "sid": "IM9",
            "index": 12,
            "author": "ada",
            "body": "hello there",
            "timestamp": 1_457_087_100_000_u64,
            "attributes": {"pinned": true},
        }));

        assert_eq!(message.sid.as_deref(), Some("IM9"));
        assert_eq!(message.index, Some(12));
        assert_eq!(message.author.as_deref(), Some("ada"));
        assert_eq!(message.body.as_deref(), Some("hello there"));
        assert_eq!(
            message.timestamp.unwrap().to_rfc3339(),
            "2016-03-04T10:25:00+00:00"
        );
        assert!(message.channel_sid.is_none());
    }

    #[test]
    fn channel_sid_comes_from_the_builder_not_the_payload() {
        let message = Message::from_value(&json!({"sid": "IM9", "channelSid": "CHx"}));
        assert!(message.channel_sid.is_none());

        let message = message.with_channel_sid("CH1");
        assert_eq!(message.channel_sid.as_deref(), Some("CH1"));
    }

    #[test]
    fn non_object_payload_yields_empty_snapshot() {
        let message = Message::from_value(&json!(["not", "a", "message"]));

        assert!(message.sid.is_none());
        assert!(message.body.is_none());
    }
}
