//! User info snapshots.

use {serde::Deserialize, serde_json::Value};

/// Profile data the engine tracks for one identity.
///
/// A passive snapshot built from a payload; it never refreshes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfo {
    pub identity: Option<String>,
    pub friendly_name: Option<String>,
    pub attributes: Option<Value>,
    pub online: Option<bool>,
    pub notifiable: Option<bool>,
}

impl UserInfo {
    /// Best-effort construction from a raw payload; shapes that do not
    /// deserialize yield an empty snapshot.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

/// Argument handed to the member-user-info-updated callback: the engine's
/// update flag plus the refreshed profile.
#[derive(Debug, Clone)]
pub struct UserInfoUpdate {
    pub updated: bool,
    pub user_info: UserInfo,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn reads_camel_case_fields() {
        let info = UserInfo::from_value(&json!({
            "identity": "ada",
            "friendlyName": "Ada",
            "attributes": {"tz": "UTC"},
            "online": true,
            "notifiable": false,
        }));

        assert_eq!(info.identity.as_deref(), Some("ada"));
        assert_eq!(info.friendly_name.as_deref(), Some("Ada"));
        assert_eq!(info.attributes.unwrap()["tz"], "UTC");
        assert_eq!(info.online, Some(true));
        assert_eq!(info.notifiable, Some(false));
    }

    #[test]
    fn sparse_payload_leaves_fields_absent() {
        let info = UserInfo::from_value(&json!({"identity": "ada"}));

        assert_eq!(info.identity.as_deref(), Some("ada"));
        assert!(info.friendly_name.is_none());
        assert!(info.online.is_none());
    }

    #[test]
    fn non_object_payload_yields_empty_snapshot() {
        let info = UserInfo::from_value(&json!("nonsense"));

        assert!(info.identity.is_none());
        assert!(info.attributes.is_none());
    }
}
