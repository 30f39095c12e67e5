//! Channel event contract between an engine bridge and channel objects.
//!
//! Every channel-scoped event the engine emits carries a correlation id
//! (`channelSid`) plus a kind-specific payload. The field names in this
//! module are an external contract with the engine bridge and must be
//! preserved bit-for-bit.
//!
//! Payload shapes:
//! - `SyncStatusEvent`: synchronization status transition
//! - `ChannelSnapshot`: full channel state (also the `changed` payload)
//! - `MemberEvent`: member joined/changed/left, typing start/end
//! - `MessageEvent`: message added/changed/deleted, toast
//! - `UserInfoEvent`: member user-info update

use std::fmt;

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

// ── Event kinds ──────────────────────────────────────────────────────────────

/// Channel-scoped events an engine bridge can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SyncStatusChanged,
    Changed,
    Deleted,
    MemberJoined,
    MemberChanged,
    MemberLeft,
    MemberUserInfoUpdated,
    MessageAdded,
    MessageChanged,
    MessageDeleted,
    TypingStarted,
    TypingEnded,
    ToastReceived,
}

impl EventKind {
    /// All variants, for iteration. A channel subscribes to every one of
    /// these exactly once.
    pub const ALL: &'static [EventKind] = &[
        Self::SyncStatusChanged,
        Self::Changed,
        Self::Deleted,
        Self::MemberJoined,
        Self::MemberChanged,
        Self::MemberLeft,
        Self::MemberUserInfoUpdated,
        Self::MessageAdded,
        Self::MessageChanged,
        Self::MessageDeleted,
        Self::TypingStarted,
        Self::TypingEnded,
        Self::ToastReceived,
    ];

    /// Canonical wire name of this event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SyncStatusChanged => "channel.sync_status.changed",
            Self::Changed => "channel.changed",
            Self::Deleted => "channel.deleted",
            Self::MemberJoined => "channel.member.joined",
            Self::MemberChanged => "channel.member.changed",
            Self::MemberLeft => "channel.member.left",
            Self::MemberUserInfoUpdated => "channel.member.user_info.updated",
            Self::MessageAdded => "channel.message.added",
            Self::MessageChanged => "channel.message.changed",
            Self::MessageDeleted => "channel.message.deleted",
            Self::TypingStarted => "channel.typing.started",
            Self::TypingEnded => "channel.typing.ended",
            Self::ToastReceived => "channel.toast.received",
        }
    }

    /// Look up a kind by its wire name.
    pub fn from_name(name: &str) -> Option<EventKind> {
        Self::ALL.iter().copied().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Payload envelopes ────────────────────────────────────────────────────────

/// Payload of `channel.sync_status.changed`.
///
/// `status` is delivered exactly as the engine sent it; engines differ on
/// whether it is a string or a numeric code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusEvent {
    pub channel_sid: String,
    #[serde(default)]
    pub status: Value,
}

/// Full channel state as the engine reports it.
///
/// Carried by `channel.changed` and `channel.deleted`, and also the shape a
/// channel object is constructed from. Only `sid` is required; engines omit
/// fields they have not synchronized yet. `dateCreated`/`dateUpdated` stay
/// raw here (string or epoch milliseconds); consumers parse them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnapshot {
    pub sid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synchronization_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<Value>,
}

impl ChannelSnapshot {
    pub fn new(sid: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            ..Default::default()
        }
    }
}

/// Payload of the member lifecycle and typing events. The inner `member`
/// value is handed untouched to the `Member` constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberEvent {
    pub channel_sid: String,
    #[serde(default)]
    pub member: Value,
}

/// Payload of the message lifecycle events and toasts. The inner `message`
/// value is handed untouched to the `Message` constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    pub channel_sid: String,
    #[serde(default)]
    pub message: Value,
}

/// Payload of `channel.member.user_info.updated`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoEvent {
    pub channel_sid: String,
    #[serde(default)]
    pub updated: bool,
    #[serde(default)]
    pub user_info: Value,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_kinds_are_distinct_and_complete() {
        let mut names: Vec<&str> = EventKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), 13);
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 13, "wire names must be unique");
    }

    #[test]
    fn from_name_round_trips_every_kind() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_name(kind.as_str()), Some(*kind));
        }
        assert_eq!(EventKind::from_name("channel.unknown"), None);
    }

    #[test]
    fn sync_status_event_uses_wire_field_names() {
        let event: SyncStatusEvent = serde_json::from_value(serde_json::json!({
            "channelSid": "CH1",
            "status": 3
        }))
        .unwrap();
        assert_eq!(event.channel_sid, "CH1");
        assert_eq!(event.status, serde_json::json!(3));

        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("channelSid").is_some());
        assert!(json.get("channel_sid").is_none());
    }

    #[test]
    fn channel_snapshot_uses_wire_field_names() {
        let snapshot = ChannelSnapshot {
            sid: "CH1".into(),
            friendly_name: Some("general".into()),
            unique_name: Some("gen".into()),
            synchronization_status: Some("all".into()),
            status: Some("joined".into()),
            channel_type: Some("public".into()),
            attributes: Some(serde_json::json!({"topic": "rust"})),
            date_created: Some(serde_json::json!("2016-03-01T10:00:00Z")),
            date_updated: Some(serde_json::json!("2016-03-02T10:00:00Z")),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["sid"], "CH1");
        assert_eq!(json["friendlyName"], "general");
        assert_eq!(json["uniqueName"], "gen");
        assert_eq!(json["synchronizationStatus"], "all");
        assert_eq!(json["status"], "joined");
        assert_eq!(json["type"], "public");
        assert_eq!(json["attributes"]["topic"], "rust");
        assert_eq!(json["dateCreated"], "2016-03-01T10:00:00Z");
        assert_eq!(json["dateUpdated"], "2016-03-02T10:00:00Z");
    }

    #[test]
    fn channel_snapshot_tolerates_sparse_payloads() {
        let snapshot: ChannelSnapshot =
            serde_json::from_value(serde_json::json!({"sid": "CH9"})).unwrap();
        assert_eq!(snapshot.sid, "CH9");
        assert!(snapshot.friendly_name.is_none());
        assert!(snapshot.attributes.is_none());
        assert!(snapshot.date_created.is_none());
    }

    #[test]
    fn channel_snapshot_without_sid_is_rejected() {
        let result: Result<ChannelSnapshot, _> =
            serde_json::from_value(serde_json::json!({"friendlyName": "x"}));
        assert!(result.is_err(), "an unroutable snapshot must not parse");
    }

    #[test]
    fn user_info_event_uses_wire_field_names() {
        let event: UserInfoEvent = serde_json::from_value(serde_json::json!({
            "channelSid": "CH1",
            "updated": true,
            "userInfo": {"identity": "alice"}
        }))
        .unwrap();
        assert_eq!(event.channel_sid, "CH1");
        assert!(event.updated);
        assert_eq!(event.user_info["identity"], "alice");
    }

    #[test]
    fn member_event_defaults_missing_member_to_null() {
        let event: MemberEvent =
            serde_json::from_value(serde_json::json!({"channelSid": "CH1"})).unwrap();
        assert!(event.member.is_null());
    }
}
