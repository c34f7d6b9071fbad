//! Authentication: password hashing, Redis-backed sessions, extractors and
//! the account endpoints.

pub mod handlers;
pub mod middleware;
pub mod password;
pub mod session_redis;

pub use middleware::{BearerToken, SessionUser};
pub use session_redis::{RedisHealth, RedisSessionStore};
