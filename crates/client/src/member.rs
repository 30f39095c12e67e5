//! Member snapshots.

use {
    chrono::{DateTime, Utc},
    serde::Deserialize,
    serde_json::Value,
};

use crate::{timestamp, user_info::UserInfo};

/// One channel member as last reported by the engine.
///
/// A passive snapshot built from a payload; it never refreshes. Consumption
/// fields describe how far this member has read the channel.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Member {
    pub sid: Option<String>,
    pub identity: Option<String>,
    pub last_consumed_message_index: Option<u64>,
    #[serde(deserialize_with = "timestamp::lenient")]
    pub last_consumption_timestamp: Option<DateTime<Utc>>,
    pub user_info: Option<UserInfo>,
}

impl Member {
    /// Best-effort construction from a raw payload; shapes that do not
    /// deserialize yield an empty snapshot.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn reads_camel_case_fields() {
        let member = Member::from_value(&json!({
            "sid": "MB7",
            "identity": "grace",
            "lastConsumedMessageIndex": 41,
            "lastConsumptionTimestamp": "2016-03-04T10:25:00Z",
            "userInfo": {"identity": "grace", "online": true},
        }));

        assert_eq!(member.sid.as_deref(), Some("MB7"));
        assert_eq!(member.identity.as_deref(), Some("grace"));
        assert_eq!(member.last_consumed_message_index, Some(41));
        assert_eq!(
            member.last_consumption_timestamp.unwrap().to_rfc3339(),
            "2016-03-04T10:25:00+00:00"
        );
        assert_eq!(member.user_info.unwrap().online, Some(true));
    }

    #[test]
    fn unparseable_consumption_timestamp_is_absent() {
        let member = Member::from_value(&json!({
            "identity": "grace",
            "lastConsumptionTimestamp": "whenever",
        }));

        assert_eq!(member.identity.as_deref(), Some("grace"));
        assert!(member.last_consumption_timestamp.is_none());
    }

    #[test]
    fn non_object_payload_yields_empty_snapshot() {
        let member = Member::from_value(&json!(17));

        assert!(member.sid.is_none());
        assert!(member.identity.is_none());
    }
}
