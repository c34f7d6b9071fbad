//! Realtime fan-out.
//!
//! ```text
//!  handler ──publish──► RedisPublisher ──PUBLISH {prefix}:{topic}──► Redis
//!                                                                     │
//!  every instance: RedisRelay ◄──PSUBSCRIBE {prefix}:*────────────────┘
//!                      │
//!                      └──► TopicBroadcaster ──► WebSocket connections
//! ```
//!
//! [`LocalPublisher`] skips Redis and publishes straight into the
//! broadcaster, for single-node runs and tests.

mod local;
mod pubsub;

pub use self::local::LocalPublisher;
pub use self::pubsub::{RedisPublisher, RedisRelay};
