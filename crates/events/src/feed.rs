//! Feed traits: the subscribing side and the emitting side.

use std::sync::Arc;

use serde_json::Value;

use chatter_protocol::EventKind;

/// Handler invoked with the raw payload of every event of the subscribed
/// kind. Held by the feed until its subscription is released.
pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Handle for one registered handler, returned by [`EventFeed::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    kind: EventKind,
    id: u64,
}

impl Subscription {
    #[must_use]
    pub fn new(kind: EventKind, id: u64) -> Self {
        Self { kind, id }
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Subscribing side of the event feed.
///
/// Registration order is delivery order for handlers of the same kind.
/// Releasing a handle twice (or a handle from another feed) is a caller
/// bug; implementations may ignore it or log it, but must not panic and
/// must not disturb other registrations.
pub trait EventFeed: Send + Sync {
    /// Register `handler` for every future event of `kind`.
    fn subscribe(&self, kind: EventKind, handler: EventHandler) -> Subscription;

    /// Release a previously registered handler.
    fn unsubscribe(&self, subscription: Subscription);
}

/// Emitting side of the event feed, implemented by engine bridges.
pub trait EventSink: Send + Sync {
    /// Deliver `payload` to every handler registered for `kind`.
    fn emit(&self, kind: EventKind, payload: &Value);
}
