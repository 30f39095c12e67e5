//! Channel event feed.
//!
//! The engine publishes one global stream of channel-scoped events. Every
//! channel object registers a handler per event kind on a shared [`EventFeed`]
//! and filters deliveries by the channel sid embedded in each payload. The
//! feed is never exclusively owned: any number of channels and unrelated
//! listeners register independently and release only their own handles.

pub mod feed;
pub mod local;

pub use feed::{EventFeed, EventHandler, EventSink, Subscription};
pub use local::LocalEventFeed;
