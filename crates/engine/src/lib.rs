//! Engine service interfaces for the channel object model.
//!
//! All real messaging work (connection management, persistence,
//! synchronization, delivery retry) lives behind these traits in an opaque
//! engine, addressed per call by channel `sid`. Each trait has a `Noop`
//! implementation that answers "not configured", allowing the object model
//! to run standalone before an engine bridge is wired in.
//!
//! Deferred operations are `async fn`s resolving exactly once.
//! Fire-and-forget operations are plain `fn`s: implementations queue the
//! signal and nothing about its outcome is observable at this layer.

use std::{fmt, sync::Arc};

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tracing::warn,
};

// ── Errors ──────────────────────────────────────────────────────────────────

/// Error type surfaced by engine operations.
///
/// The object model adds no taxonomy of its own: whatever the engine
/// reports is passed through unmodified. `Serde` covers the one failure
/// this layer can produce itself, mapping a response payload into a typed
/// object.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{message}")]
    Message { message: String },
    #[error("{0}")]
    Serde(#[from] serde_json::Error),
}

impl EngineError {
    #[must_use]
    pub fn message(message: impl fmt::Display) -> Self {
        Self::Message {
            message: message.to_string(),
        }
    }
}

impl From<String> for EngineError {
    fn from(value: String) -> Self {
        Self::message(value)
    }
}

impl From<&str> for EngineError {
    fn from(value: &str) -> Self {
        Self::message(value)
    }
}

pub type EngineResult<T = Value> = Result<T, EngineError>;

// ── Platform ────────────────────────────────────────────────────────────────

/// Host platform the binding runs on.
///
/// A couple of operations behave differently per platform: Android engines
/// require a synchronize before sending, and only iOS engines support
/// consumption-horizon message lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Channel operations ──────────────────────────────────────────────────────

#[async_trait]
pub trait ChannelService: Send + Sync {
    /// Trigger engine-side synchronization of this channel.
    async fn synchronize(&self, sid: &str) -> EngineResult;
    async fn set_attributes(&self, sid: &str, attributes: Value) -> EngineResult;
    async fn set_friendly_name(&self, sid: &str, name: &str) -> EngineResult;
    async fn set_unique_name(&self, sid: &str, name: &str) -> EngineResult;
    async fn join(&self, sid: &str) -> EngineResult;
    async fn decline_invitation(&self, sid: &str) -> EngineResult;
    async fn leave(&self, sid: &str) -> EngineResult;
    async fn destroy(&self, sid: &str) -> EngineResult;
    /// Fetch one member of this channel by identity.
    async fn member(&self, sid: &str, identity: &str) -> EngineResult;
    /// Fire-and-forget typing notification.
    fn typing(&self, sid: &str);
}

pub struct NoopChannelService;

#[async_trait]
impl ChannelService for NoopChannelService {
    async fn synchronize(&self, _sid: &str) -> EngineResult {
        Err("channel engine not configured".into())
    }

    async fn set_attributes(&self, _sid: &str, _attributes: Value) -> EngineResult {
        Err("channel engine not configured".into())
    }

    async fn set_friendly_name(&self, _sid: &str, _name: &str) -> EngineResult {
        Err("channel engine not configured".into())
    }

    async fn set_unique_name(&self, _sid: &str, _name: &str) -> EngineResult {
        Err("channel engine not configured".into())
    }

    async fn join(&self, _sid: &str) -> EngineResult {
        Err("channel engine not configured".into())
    }

    async fn decline_invitation(&self, _sid: &str) -> EngineResult {
        Err("channel engine not configured".into())
    }

    async fn leave(&self, _sid: &str) -> EngineResult {
        Err("channel engine not configured".into())
    }

    async fn destroy(&self, _sid: &str) -> EngineResult {
        Err("channel engine not configured".into())
    }

    async fn member(&self, _sid: &str, _identity: &str) -> EngineResult {
        Err("channel engine not configured".into())
    }

    fn typing(&self, sid: &str) {
        warn!(sid, "typing notification dropped: channel engine not configured");
    }
}

// ── Message operations ──────────────────────────────────────────────────────

#[async_trait]
pub trait MessageService: Send + Sync {
    /// Send a message body to this channel; resolves to the stored message
    /// payload.
    async fn send(&self, sid: &str, body: &str) -> EngineResult;
    async fn remove(&self, sid: &str, index: u64) -> EngineResult;
    /// Fetch the most recent `count` messages, oldest first.
    async fn last_messages(&self, sid: &str, count: u32) -> EngineResult;
    async fn messages_before(&self, sid: &str, index: u64, count: u32) -> EngineResult;
    async fn messages_after(&self, sid: &str, index: u64, count: u32) -> EngineResult;
    async fn message(&self, sid: &str, index: u64) -> EngineResult;
    /// Fetch the message at the consumption horizon. Only iOS engines
    /// implement this lookup.
    async fn message_for_consumption(&self, sid: &str, index: u64) -> EngineResult;
    async fn last_consumed_index(&self, sid: &str) -> EngineResult;
    /// Fire-and-forget consumption-horizon updates.
    fn set_last_consumed_index(&self, sid: &str, index: u64);
    fn advance_last_consumed_index(&self, sid: &str, index: u64);
    fn set_all_consumed(&self, sid: &str);
}

pub struct NoopMessageService;

#[async_trait]
impl MessageService for NoopMessageService {
    async fn send(&self, _sid: &str, _body: &str) -> EngineResult {
        Err("message engine not configured".into())
    }

    async fn remove(&self, _sid: &str, _index: u64) -> EngineResult {
        Err("message engine not configured".into())
    }

    async fn last_messages(&self, _sid: &str, _count: u32) -> EngineResult {
        Ok(serde_json::json!([]))
    }

    async fn messages_before(&self, _sid: &str, _index: u64, _count: u32) -> EngineResult {
        Ok(serde_json::json!([]))
    }

    async fn messages_after(&self, _sid: &str, _index: u64, _count: u32) -> EngineResult {
        Ok(serde_json::json!([]))
    }

    async fn message(&self, _sid: &str, _index: u64) -> EngineResult {
        Err("message engine not configured".into())
    }

    async fn message_for_consumption(&self, _sid: &str, _index: u64) -> EngineResult {
        Err("message engine not configured".into())
    }

    async fn last_consumed_index(&self, _sid: &str) -> EngineResult {
        Ok(Value::Null)
    }

    fn set_last_consumed_index(&self, sid: &str, index: u64) {
        warn!(sid, index, "consumption update dropped: message engine not configured");
    }

    fn advance_last_consumed_index(&self, sid: &str, index: u64) {
        warn!(sid, index, "consumption update dropped: message engine not configured");
    }

    fn set_all_consumed(&self, sid: &str) {
        warn!(sid, "consumption update dropped: message engine not configured");
    }
}

// ── Member operations ───────────────────────────────────────────────────────

#[async_trait]
pub trait MemberService: Send + Sync {
    /// List the channel's members; resolves to an array of member payloads
    /// in engine order.
    async fn members(&self, sid: &str) -> EngineResult;
    async fn add(&self, sid: &str, identity: &str) -> EngineResult;
    async fn invite(&self, sid: &str, identity: &str) -> EngineResult;
    async fn remove(&self, sid: &str, identity: &str) -> EngineResult;
}

pub struct NoopMemberService;

#[async_trait]
impl MemberService for NoopMemberService {
    async fn members(&self, _sid: &str) -> EngineResult {
        Ok(serde_json::json!([]))
    }

    async fn add(&self, _sid: &str, _identity: &str) -> EngineResult {
        Err("member engine not configured".into())
    }

    async fn invite(&self, _sid: &str, _identity: &str) -> EngineResult {
        Err("member engine not configured".into())
    }

    async fn remove(&self, _sid: &str, _identity: &str) -> EngineResult {
        Err("member engine not configured".into())
    }
}

// ── Engine handle ───────────────────────────────────────────────────────────

/// The bundle of engine services a channel object delegates to, plus the
/// host platform. Cheap to clone; every channel created from the same
/// handle shares the same engine.
#[derive(Clone)]
pub struct EngineHandle {
    pub channels: Arc<dyn ChannelService>,
    pub messages: Arc<dyn MessageService>,
    pub members: Arc<dyn MemberService>,
    pub platform: Platform,
}

impl EngineHandle {
    pub fn new(
        channels: Arc<dyn ChannelService>,
        messages: Arc<dyn MessageService>,
        members: Arc<dyn MemberService>,
        platform: Platform,
    ) -> Self {
        Self {
            channels,
            messages,
            members,
            platform,
        }
    }

    /// Handle backed entirely by `Noop` services.
    pub fn noop(platform: Platform) -> Self {
        Self::new(
            Arc::new(NoopChannelService),
            Arc::new(NoopMessageService),
            Arc::new(NoopMemberService),
            platform,
        )
    }

    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn noop_channel_service_rejects_deferred_calls() {
        let svc = NoopChannelService;
        let err = svc.join("CH1").await.unwrap_err();
        assert_eq!(err.to_string(), "channel engine not configured");
        // Fire-and-forget path must not panic.
        svc.typing("CH1");
    }

    #[tokio::test]
    async fn noop_message_service_defaults() {
        let svc = NoopMessageService;
        assert!(svc.send("CH1", "hello").await.is_err());
        assert_eq!(svc.last_messages("CH1", 10).await.unwrap(), serde_json::json!([]));
        assert!(svc.last_consumed_index("CH1").await.unwrap().is_null());
        svc.set_all_consumed("CH1");
    }

    #[tokio::test]
    async fn noop_member_service_lists_empty() {
        let svc = NoopMemberService;
        assert_eq!(svc.members("CH1").await.unwrap(), serde_json::json!([]));
        assert!(svc.add("CH1", "alice").await.is_err());
    }

    #[test]
    fn engine_error_from_str_and_string() {
        let from_str: EngineError = "boom".into();
        let from_string: EngineError = String::from("boom").into();
        assert_eq!(from_str.to_string(), "boom");
        assert_eq!(from_string.to_string(), "boom");
    }

    #[test]
    fn platform_wire_names() {
        assert_eq!(Platform::Ios.as_str(), "ios");
        assert_eq!(Platform::Android.to_string(), "android");
        let parsed: Platform = serde_json::from_value(serde_json::json!("android")).unwrap();
        assert_eq!(parsed, Platform::Android);
    }

    #[test]
    fn noop_handle_swaps_platform() {
        let handle = EngineHandle::noop(Platform::Ios).with_platform(Platform::Android);
        assert_eq!(handle.platform, Platform::Android);
    }
}
