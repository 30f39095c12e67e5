//! In-process feed implementation.

use std::{
    collections::HashMap,
    sync::{
        Arc, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use {serde_json::Value, tracing::debug};

use {
    crate::feed::{EventFeed, EventHandler, EventSink, Subscription},
    chatter_protocol::EventKind,
};

/// Handler registry keyed by event kind, dispatching inline on the emitting
/// thread.
///
/// Handlers are cloned out of the registry before they run, so a handler may
/// subscribe or unsubscribe (including releasing itself) without deadlocking
/// the feed.
#[derive(Default)]
pub struct LocalEventFeed {
    next_id: AtomicU64,
    handlers: RwLock<HashMap<EventKind, Vec<(u64, EventHandler)>>>,
}

impl LocalEventFeed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live handler count for one kind.
    #[must_use]
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Live handler count across all kinds.
    #[must_use]
    pub fn total_handlers(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(Vec::len)
            .sum()
    }
}

impl EventFeed for LocalEventFeed {
    fn subscribe(&self, kind: EventKind, handler: EventHandler) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(kind)
            .or_default()
            .push((id, handler));
        Subscription::new(kind, id)
    }

    fn unsubscribe(&self, subscription: Subscription) {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        let removed = handlers.get_mut(&subscription.kind()).is_some_and(|entries| {
            let before = entries.len();
            entries.retain(|(id, _)| *id != subscription.id());
            entries.len() != before
        });
        if !removed {
            debug!(
                kind = %subscription.kind(),
                id = subscription.id(),
                "released unknown subscription"
            );
        }
    }
}

impl EventSink for LocalEventFeed {
    fn emit(&self, kind: EventKind, payload: &Value) {
        let snapshot: Vec<EventHandler> = self
            .handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .map(|entries| entries.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();
        debug!(kind = %kind, handlers = snapshot.len(), "dispatching channel event");
        for handler in snapshot {
            handler(payload);
        }
    }
}
