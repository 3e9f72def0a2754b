//! Session store implementations

mod memory;
mod traits;

pub use memory::MemoryStore;
pub use traits::SessionStore;

#[cfg(feature = "redis-store")]
mod redis_store;

#[cfg(feature = "redis-store")]
pub use redis_store::RedisStore;

#[cfg(feature = "redis-cluster")]
pub use redis_store::RedisClusterStore;

#[cfg(feature = "sqlite-store")]
mod sqlite_store;

#[cfg(feature = "sqlite-store")]
pub use sqlite_store::SqliteStore;
