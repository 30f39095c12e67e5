//! The channel proxy.
//!
//! A [`Channel`] fronts one engine-side channel: it caches the channel's
//! metadata, forwards operations to the injected engine services, and turns
//! the engine's global event stream into per-instance callbacks. Filtering
//! is by value: every payload carries the sid of the channel it concerns,
//! and a proxy reacts only to payloads carrying its own sid.

use std::sync::{Arc, Mutex, RwLock};

use {
    chrono::{DateTime, Utc},
    serde::de::DeserializeOwned,
    serde_json::Value,
    tracing::warn,
};

use {
    chatter_engine::{EngineHandle, EngineResult, Platform},
    chatter_events::{EventFeed, Subscription},
    chatter_protocol::{
        ChannelSnapshot, EventKind, MemberEvent, MessageEvent, SyncStatusEvent, UserInfoEvent,
    },
};

use crate::{
    member::Member,
    message::Message,
    timestamp::timestamp_from_value,
    user_info::{UserInfo, UserInfoUpdate},
};

/// Messages fetched by [`Channel::get_messages`] when no count is given.
pub const DEFAULT_MESSAGE_COUNT: u32 = 10;

// ── Callback slots ───────────────────────────────────────────────────────────

type SyncStatusCallback = Arc<dyn Fn(&Value) + Send + Sync>;
type PlainCallback = Arc<dyn Fn() + Send + Sync>;
type MemberCallback = Arc<dyn Fn(&Member) + Send + Sync>;
type MessageCallback = Arc<dyn Fn(&Message) + Send + Sync>;
type UserInfoCallback = Arc<dyn Fn(&UserInfoUpdate) + Send + Sync>;

/// One slot per event kind. A slot holds at most one callback; setting a new
/// one discards the previous one.
#[derive(Default)]
struct Callbacks {
    sync_status_changed: Option<SyncStatusCallback>,
    changed: Option<PlainCallback>,
    deleted: Option<PlainCallback>,
    member_joined: Option<MemberCallback>,
    member_changed: Option<MemberCallback>,
    member_left: Option<MemberCallback>,
    member_user_info_updated: Option<UserInfoCallback>,
    message_added: Option<MessageCallback>,
    message_changed: Option<MessageCallback>,
    message_deleted: Option<MessageCallback>,
    typing_started: Option<MemberCallback>,
    typing_ended: Option<MemberCallback>,
    toast_received: Option<MessageCallback>,
}

// ── Metadata cache ───────────────────────────────────────────────────────────

/// Locally cached channel metadata.
///
/// A cache of engine state, not the authority: operations overwrite fields
/// optimistically before the engine acknowledges, and a matching
/// `channel.changed` snapshot overwrites every field wholesale. A failed
/// engine call does not roll the cache back.
#[derive(Debug, Clone, Default)]
pub struct ChannelMeta {
    pub friendly_name: Option<String>,
    pub unique_name: Option<String>,
    pub synchronization_status: Option<String>,
    pub status: Option<String>,
    pub channel_type: Option<String>,
    pub attributes: Option<Value>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_updated: Option<DateTime<Utc>>,
}

impl ChannelMeta {
    /// Build the cache from an engine snapshot, parsing its timestamps.
    #[must_use]
    pub fn from_snapshot(snapshot: &ChannelSnapshot) -> Self {
        Self {
            friendly_name: snapshot.friendly_name.clone(),
            unique_name: snapshot.unique_name.clone(),
            synchronization_status: snapshot.synchronization_status.clone(),
            status: snapshot.status.clone(),
            channel_type: snapshot.channel_type.clone(),
            attributes: snapshot.attributes.clone(),
            date_created: snapshot.date_created.as_ref().and_then(timestamp_from_value),
            date_updated: snapshot.date_updated.as_ref().and_then(timestamp_from_value),
        }
    }
}

// ── Shared state and event handling ──────────────────────────────────────────

struct ChannelState {
    sid: String,
    meta: RwLock<ChannelMeta>,
    callbacks: Mutex<Callbacks>,
}

impl ChannelState {
    /// Clone a callback out of its slot. The lock is released before the
    /// caller invokes it, so a callback may set or clear slots itself.
    fn slot<T>(&self, select: impl FnOnce(&Callbacks) -> Option<T>) -> Option<T> {
        let callbacks = self.callbacks.lock().unwrap_or_else(|e| e.into_inner());
        select(&callbacks)
    }

    fn set_slot(&self, mutate: impl FnOnce(&mut Callbacks)) {
        mutate(&mut self.callbacks.lock().unwrap_or_else(|e| e.into_inner()));
    }

    fn update_meta(&self, mutate: impl FnOnce(&mut ChannelMeta)) {
        mutate(&mut self.meta.write().unwrap_or_else(|e| e.into_inner()));
    }

    fn envelope<T: DeserializeOwned>(&self, kind: EventKind, payload: &Value) -> Option<T> {
        match serde_json::from_value(payload.clone()) {
            Ok(event) => Some(event),
            Err(error) => {
                warn!(kind = %kind, sid = %self.sid, %error, "dropping malformed channel event");
                None
            },
        }
    }

    fn handle(&self, kind: EventKind, payload: &Value) {
        match kind {
            EventKind::SyncStatusChanged => self.sync_status_changed(payload),
            EventKind::Changed => self.changed(payload),
            EventKind::Deleted => self.deleted(payload),
            EventKind::MemberJoined => {
                self.member_event(kind, payload, |cb| cb.member_joined.clone());
            },
            EventKind::MemberChanged => {
                self.member_event(kind, payload, |cb| cb.member_changed.clone());
            },
            EventKind::MemberLeft => {
                self.member_event(kind, payload, |cb| cb.member_left.clone());
            },
            EventKind::MemberUserInfoUpdated => self.user_info_updated(payload),
            EventKind::MessageAdded => {
                self.message_event(kind, payload, |cb| cb.message_added.clone());
            },
            EventKind::MessageChanged => {
                self.message_event(kind, payload, |cb| cb.message_changed.clone());
            },
            EventKind::MessageDeleted => {
                self.message_event(kind, payload, |cb| cb.message_deleted.clone());
            },
            EventKind::TypingStarted => {
                self.member_event(kind, payload, |cb| cb.typing_started.clone());
            },
            EventKind::TypingEnded => {
                self.member_event(kind, payload, |cb| cb.typing_ended.clone());
            },
            EventKind::ToastReceived => self.toast_received(payload),
        }
    }

    fn sync_status_changed(&self, payload: &Value) {
        let Some(event) = self.envelope::<SyncStatusEvent>(EventKind::SyncStatusChanged, payload)
        else {
            return;
        };
        if event.channel_sid != self.sid {
            return;
        }
        let Some(callback) = self.slot(|cb| cb.sync_status_changed.clone()) else {
            return;
        };
        callback(&event.status);
    }

    fn changed(&self, payload: &Value) {
        let Some(snapshot) = self.envelope::<ChannelSnapshot>(EventKind::Changed, payload) else {
            return;
        };
        if snapshot.sid != self.sid {
            return;
        }
        // The metadata refresh is tied to the callback being set: without
        // one the snapshot is discarded. Existing bindings rely on this.
        let Some(callback) = self.slot(|cb| cb.changed.clone()) else {
            return;
        };
        *self.meta.write().unwrap_or_else(|e| e.into_inner()) =
            ChannelMeta::from_snapshot(&snapshot);
        callback();
    }

    fn deleted(&self, payload: &Value) {
        let Some(snapshot) = self.envelope::<ChannelSnapshot>(EventKind::Deleted, payload) else {
            return;
        };
        if snapshot.sid != self.sid {
            return;
        }
        let Some(callback) = self.slot(|cb| cb.deleted.clone()) else {
            return;
        };
        callback();
    }

    fn member_event(
        &self,
        kind: EventKind,
        payload: &Value,
        select: impl FnOnce(&Callbacks) -> Option<MemberCallback>,
    ) {
        let Some(event) = self.envelope::<MemberEvent>(kind, payload) else {
            return;
        };
        if event.channel_sid != self.sid {
            return;
        }
        let Some(callback) = self.slot(select) else {
            return;
        };
        callback(&Member::from_value(&event.member));
    }

    fn user_info_updated(&self, payload: &Value) {
        let Some(event) = self.envelope::<UserInfoEvent>(EventKind::MemberUserInfoUpdated, payload)
        else {
            return;
        };
        if event.channel_sid != self.sid {
            return;
        }
        let Some(callback) = self.slot(|cb| cb.member_user_info_updated.clone()) else {
            return;
        };
        callback(&UserInfoUpdate {
            updated: event.updated,
            user_info: UserInfo::from_value(&event.user_info),
        });
    }

    fn message_event(
        &self,
        kind: EventKind,
        payload: &Value,
        select: impl FnOnce(&Callbacks) -> Option<MessageCallback>,
    ) {
        let Some(event) = self.envelope::<MessageEvent>(kind, payload) else {
            return;
        };
        if event.channel_sid != self.sid {
            return;
        }
        let Some(callback) = self.slot(select) else {
            return;
        };
        callback(&Message::from_value(&event.message).with_channel_sid(&self.sid));
    }

    fn toast_received(&self, payload: &Value) {
        let Some(event) = self.envelope::<MessageEvent>(EventKind::ToastReceived, payload) else {
            return;
        };
        if event.channel_sid != self.sid {
            return;
        }
        let Some(callback) = self.slot(|cb| cb.toast_received.clone()) else {
            return;
        };
        // Toast payloads are delivered without a channel sid attached.
        callback(&Message::from_value(&event.message));
    }
}

// ── The proxy ────────────────────────────────────────────────────────────────

/// Client-side proxy for one engine channel.
///
/// Registers one feed handler per event kind at construction and holds them
/// until [`close`](Channel::close) releases them. Dropping the proxy without
/// closing leaves the handlers registered; they keep the shared state alive
/// and go on filtering events.
pub struct Channel {
    state: Arc<ChannelState>,
    engine: EngineHandle,
    feed: Arc<dyn EventFeed>,
    subscriptions: Vec<Subscription>,
}

impl Channel {
    /// Build a proxy from an engine snapshot and wire it onto the feed.
    #[must_use]
    pub fn new(snapshot: &ChannelSnapshot, engine: EngineHandle, feed: Arc<dyn EventFeed>) -> Self {
        let state = Arc::new(ChannelState {
            sid: snapshot.sid.clone(),
            meta: RwLock::new(ChannelMeta::from_snapshot(snapshot)),
            callbacks: Mutex::new(Callbacks::default()),
        });

        let subscriptions = EventKind::ALL
            .iter()
            .map(|&kind| {
                let state = Arc::clone(&state);
                feed.subscribe(kind, Arc::new(move |payload| state.handle(kind, payload)))
            })
            .collect();

        Self {
            state,
            engine,
            feed,
            subscriptions,
        }
    }

    /// The immutable identity of this channel, used to filter feed events.
    #[must_use]
    pub fn sid(&self) -> &str {
        &self.state.sid
    }

    /// Point-in-time copy of the cached metadata.
    #[must_use]
    pub fn meta(&self) -> ChannelMeta {
        self.state.meta.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    #[must_use]
    pub fn friendly_name(&self) -> Option<String> {
        self.state
            .meta
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .friendly_name
            .clone()
    }

    #[must_use]
    pub fn unique_name(&self) -> Option<String> {
        self.state
            .meta
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .unique_name
            .clone()
    }

    #[must_use]
    pub fn attributes(&self) -> Option<Value> {
        self.state
            .meta
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .attributes
            .clone()
    }

    // ── Callback slots ───────────────────────────────────────────────────────

    /// Set the callback for synchronization-status changes. It receives the
    /// raw status value, whose rendering differs per engine.
    pub fn on_sync_status_changed(&self, callback: impl Fn(&Value) + Send + Sync + 'static) {
        self.state
            .set_slot(|cb| cb.sync_status_changed = Some(Arc::new(callback)));
    }

    pub fn clear_on_sync_status_changed(&self) {
        self.state.set_slot(|cb| cb.sync_status_changed = None);
    }

    /// Set the callback for metadata changes. While this slot is empty,
    /// `channel.changed` snapshots are discarded and the cache keeps its
    /// old values.
    pub fn on_changed(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.state.set_slot(|cb| cb.changed = Some(Arc::new(callback)));
    }

    pub fn clear_on_changed(&self) {
        self.state.set_slot(|cb| cb.changed = None);
    }

    /// Set the callback for engine-side deletion of this channel. The proxy
    /// itself stays alive and registered.
    pub fn on_deleted(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.state.set_slot(|cb| cb.deleted = Some(Arc::new(callback)));
    }

    pub fn clear_on_deleted(&self) {
        self.state.set_slot(|cb| cb.deleted = None);
    }

    pub fn on_member_joined(&self, callback: impl Fn(&Member) + Send + Sync + 'static) {
        self.state
            .set_slot(|cb| cb.member_joined = Some(Arc::new(callback)));
    }

    pub fn clear_on_member_joined(&self) {
        self.state.set_slot(|cb| cb.member_joined = None);
    }

    pub fn on_member_changed(&self, callback: impl Fn(&Member) + Send + Sync + 'static) {
        self.state
            .set_slot(|cb| cb.member_changed = Some(Arc::new(callback)));
    }

    pub fn clear_on_member_changed(&self) {
        self.state.set_slot(|cb| cb.member_changed = None);
    }

    pub fn on_member_left(&self, callback: impl Fn(&Member) + Send + Sync + 'static) {
        self.state
            .set_slot(|cb| cb.member_left = Some(Arc::new(callback)));
    }

    pub fn clear_on_member_left(&self) {
        self.state.set_slot(|cb| cb.member_left = None);
    }

    pub fn on_member_user_info_updated(
        &self,
        callback: impl Fn(&UserInfoUpdate) + Send + Sync + 'static,
    ) {
        self.state
            .set_slot(|cb| cb.member_user_info_updated = Some(Arc::new(callback)));
    }

    pub fn clear_on_member_user_info_updated(&self) {
        self.state.set_slot(|cb| cb.member_user_info_updated = None);
    }

    /// Set the callback for new messages. Messages arrive with this
    /// channel's sid attached.
    pub fn on_message_added(&self, callback: impl Fn(&Message) + Send + Sync + 'static) {
        self.state
            .set_slot(|cb| cb.message_added = Some(Arc::new(callback)));
    }

    pub fn clear_on_message_added(&self) {
        self.state.set_slot(|cb| cb.message_added = None);
    }

    pub fn on_message_changed(&self, callback: impl Fn(&Message) + Send + Sync + 'static) {
        self.state
            .set_slot(|cb| cb.message_changed = Some(Arc::new(callback)));
    }

    pub fn clear_on_message_changed(&self) {
        self.state.set_slot(|cb| cb.message_changed = None);
    }

    pub fn on_message_deleted(&self, callback: impl Fn(&Message) + Send + Sync + 'static) {
        self.state
            .set_slot(|cb| cb.message_deleted = Some(Arc::new(callback)));
    }

    pub fn clear_on_message_deleted(&self) {
        self.state.set_slot(|cb| cb.message_deleted = None);
    }

    pub fn on_typing_started(&self, callback: impl Fn(&Member) + Send + Sync + 'static) {
        self.state
            .set_slot(|cb| cb.typing_started = Some(Arc::new(callback)));
    }

    pub fn clear_on_typing_started(&self) {
        self.state.set_slot(|cb| cb.typing_started = None);
    }

    pub fn on_typing_ended(&self, callback: impl Fn(&Member) + Send + Sync + 'static) {
        self.state
            .set_slot(|cb| cb.typing_ended = Some(Arc::new(callback)));
    }

    pub fn clear_on_typing_ended(&self) {
        self.state.set_slot(|cb| cb.typing_ended = None);
    }

    /// Set the callback for toast notifications. Toast messages carry no
    /// channel sid.
    pub fn on_toast_received(&self, callback: impl Fn(&Message) + Send + Sync + 'static) {
        self.state
            .set_slot(|cb| cb.toast_received = Some(Arc::new(callback)));
    }

    pub fn clear_on_toast_received(&self) {
        self.state.set_slot(|cb| cb.toast_received = None);
    }

    // ── Channel operations ───────────────────────────────────────────────────

    /// Ask the engine to synchronize this channel's state.
    pub async fn initialize(&self) -> EngineResult {
        self.engine.channels.synchronize(self.sid()).await
    }

    /// Overwrite the channel attributes.
    ///
    /// The cache is updated before the engine acknowledges; a failed call
    /// leaves the cache ahead of the engine until the next authoritative
    /// `channel.changed` snapshot.
    pub async fn set_attributes(&self, attributes: Value) -> EngineResult {
        self.state
            .update_meta(|meta| meta.attributes = Some(attributes.clone()));
        self.engine.channels.set_attributes(self.sid(), attributes).await
    }

    /// Rename the channel. Optimistic, like [`set_attributes`](Channel::set_attributes).
    pub async fn set_friendly_name(&self, name: impl Into<String>) -> EngineResult {
        let name = name.into();
        self.state
            .update_meta(|meta| meta.friendly_name = Some(name.clone()));
        self.engine.channels.set_friendly_name(self.sid(), &name).await
    }

    /// Change the unique name. Optimistic, like [`set_attributes`](Channel::set_attributes).
    pub async fn set_unique_name(&self, name: impl Into<String>) -> EngineResult {
        let name = name.into();
        self.state
            .update_meta(|meta| meta.unique_name = Some(name.clone()));
        self.engine.channels.set_unique_name(self.sid(), &name).await
    }

    /// Join this channel as the local user.
    pub async fn join(&self) -> EngineResult {
        self.engine.channels.join(self.sid()).await
    }

    pub async fn decline_invitation(&self) -> EngineResult {
        self.engine.channels.decline_invitation(self.sid()).await
    }

    pub async fn leave(&self) -> EngineResult {
        self.engine.channels.leave(self.sid()).await
    }

    /// Delete this channel engine-side. The proxy stays alive until
    /// [`close`](Channel::close).
    pub async fn destroy(&self) -> EngineResult {
        self.engine.channels.destroy(self.sid()).await
    }

    /// Queue a typing notification for the local user. Nothing is awaited
    /// and nothing is surfaced.
    pub fn typing(&self) {
        self.engine.channels.typing(self.sid());
    }

    // ── Members ──────────────────────────────────────────────────────────────

    /// Fetch one member by identity.
    pub async fn get_member(&self, identity: &str) -> EngineResult<Member> {
        let value = self.engine.channels.member(self.sid(), identity).await?;
        Ok(Member::from_value(&value))
    }

    /// List the channel's members in engine order.
    pub async fn get_members(&self) -> EngineResult<Vec<Member>> {
        let value = self.engine.members.members(self.sid()).await?;
        let items: Vec<Value> = serde_json::from_value(value)?;
        Ok(items.iter().map(Member::from_value).collect())
    }

    pub async fn add(&self, identity: &str) -> EngineResult {
        self.engine.members.add(self.sid(), identity).await
    }

    pub async fn invite(&self, identity: &str) -> EngineResult {
        self.engine.members.invite(self.sid(), identity).await
    }

    pub async fn remove(&self, identity: &str) -> EngineResult {
        self.engine.members.remove(self.sid(), identity).await
    }

    // ── Messages ─────────────────────────────────────────────────────────────

    /// Send `body` to this channel, resolving to the stored message with
    /// this channel's sid attached.
    ///
    /// Android engines require a synchronize before sending, so that call
    /// runs first there; its failure aborts the send.
    pub async fn send_message(&self, body: impl Into<String>) -> EngineResult<Message> {
        let body = body.into();
        if self.engine.platform == Platform::Android {
            self.engine.channels.synchronize(self.sid()).await?;
        }
        let stored = self.engine.messages.send(self.sid(), &body).await?;
        Ok(Message::from_value(&stored).with_channel_sid(self.sid()))
    }

    pub async fn remove_message(&self, index: u64) -> EngineResult {
        self.engine.messages.remove(self.sid(), index).await
    }

    /// Fetch the most recent messages, oldest first.
    /// `None` asks for [`DEFAULT_MESSAGE_COUNT`].
    pub async fn get_messages(&self, count: Option<u32>) -> EngineResult<Vec<Message>> {
        let count = count.unwrap_or(DEFAULT_MESSAGE_COUNT);
        let value = self.engine.messages.last_messages(self.sid(), count).await?;
        self.map_messages(value)
    }

    pub async fn get_messages_before(&self, index: u64, count: u32) -> EngineResult<Vec<Message>> {
        let value = self
            .engine
            .messages
            .messages_before(self.sid(), index, count)
            .await?;
        self.map_messages(value)
    }

    pub async fn get_messages_after(&self, index: u64, count: u32) -> EngineResult<Vec<Message>> {
        let value = self
            .engine
            .messages
            .messages_after(self.sid(), index, count)
            .await?;
        self.map_messages(value)
    }

    /// Fetch one message by index.
    pub async fn get_message(&self, index: u64) -> EngineResult<Message> {
        let value = self.engine.messages.message(self.sid(), index).await?;
        Ok(Message::from_value(&value).with_channel_sid(self.sid()))
    }

    /// Fetch the message at consumption `index`.
    ///
    /// Android engines do not expose this lookup; there the call resolves
    /// to `None` without reaching the engine.
    pub async fn get_message_for_consumption(&self, index: u64) -> EngineResult<Option<Message>> {
        if self.engine.platform == Platform::Android {
            warn!(
                sid = %self.state.sid,
                index,
                "message-for-consumption lookup unavailable on android"
            );
            return Ok(None);
        }
        let value = self
            .engine
            .messages
            .message_for_consumption(self.sid(), index)
            .await?;
        Ok(Some(Message::from_value(&value).with_channel_sid(self.sid())))
    }

    /// The local user's consumption horizon, if one is set.
    pub async fn get_last_consumed_message_index(&self) -> EngineResult<Option<u64>> {
        let value = self.engine.messages.last_consumed_index(self.sid()).await?;
        Ok(serde_json::from_value(value)?)
    }

    #[deprecated(note = "renamed to `get_last_consumed_message_index`")]
    pub async fn last_consumed_message_index(&self) -> EngineResult<Option<u64>> {
        warn!(
            sid = %self.state.sid,
            "last_consumed_message_index is deprecated, use get_last_consumed_message_index"
        );
        self.get_last_consumed_message_index().await
    }

    /// Move the consumption horizon to `index`. Queued on the engine;
    /// nothing is surfaced.
    pub fn set_last_consumed_message_index(&self, index: u64) {
        self.engine.messages.set_last_consumed_index(self.sid(), index);
    }

    /// Advance the consumption horizon to `index` if it is further along.
    pub fn advance_last_consumed_message_index(&self, index: u64) {
        self.engine
            .messages
            .advance_last_consumed_index(self.sid(), index);
    }

    /// Mark every message in the channel consumed.
    pub fn set_all_messages_consumed(&self) {
        self.engine.messages.set_all_consumed(self.sid());
    }

    fn map_messages(&self, value: Value) -> EngineResult<Vec<Message>> {
        let items: Vec<Value> = serde_json::from_value(value)?;
        Ok(items
            .iter()
            .map(|item| Message::from_value(item).with_channel_sid(self.sid()))
            .collect())
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Release this channel's feed subscriptions.
    ///
    /// Not idempotent: a second call releases the same handles again, which
    /// the feed treats as unknown. Call exactly once, when the proxy is no
    /// longer needed.
    pub fn close(&self) {
        for subscription in &self.subscriptions {
            self.feed.unsubscribe(*subscription);
        }
    }
}
