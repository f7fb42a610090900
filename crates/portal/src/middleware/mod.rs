//! Middleware for sessions, login guarding and the Redis connection.

mod auth;
mod cache;
mod session;
mod session_store;

pub use auth::{require_login, CurrentUser};
pub use cache::Cache;
pub use session::{session_middleware, Flash, FlashLevel, SessionData, SessionHandle};
pub use session_store::{MemorySessionStore, RedisSessionStore, SessionStore};
