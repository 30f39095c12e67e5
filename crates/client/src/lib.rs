//! Client-side channel object model.
//!
//! The proxy layer of the chatter binding: [`Channel`] mirrors one
//! engine-side channel, delegates operations to the injected engine
//! services, and re-emits the engine's global event stream as per-instance
//! callbacks filtered by channel sid. [`Message`], [`Member`] and
//! [`UserInfo`] are passive snapshots built from engine payloads.
//!
//! Nothing in this crate talks to a network or owns a runtime; everything
//! real happens behind the `chatter-engine` traits.

pub mod channel;
pub mod member;
pub mod message;
pub mod timestamp;
pub mod user_info;

pub use channel::{Channel, ChannelMeta, DEFAULT_MESSAGE_COUNT};
pub use member::Member;
pub use message::Message;
pub use user_info::{UserInfo, UserInfoUpdate};
