//! Redis session stores
//!
//! - Key: `prefix + session_id` (default prefix: "session:")
//! - Value: JSON serialized session
//! - TTL: the session's `max_age`, maintained by Redis itself
//!
//! Writes use `SET .. EX` and reads use `GETEX .. EX`, so a key can never
//! expire between being read and having its TTL refreshed. `GETEX` needs
//! Redis 6.2 or newer.

use async_trait::async_trait;
use redis::aio::{ConnectionLike, ConnectionManager};
use redis::AsyncCommands;
use serde_json::Value;

use super::SessionStore;
use crate::config::SessionConfig;
use crate::error::SessionError;

/// Default key prefix
pub const DEFAULT_PREFIX: &str = "session:";

/// Redis session store, generic over the connection type
///
/// Use [`RedisStore`] against a single node and [`RedisClusterStore`] against
/// a Redis Cluster deployment.
///
/// `delete` reports `true` whether or not the key existed, unless strict
/// deletes are enabled with [`with_strict_delete`](Self::with_strict_delete).
///
/// # Example
///
/// ```rust,ignore
/// use sealed_session::{RedisStore, SessionConfig};
///
/// let store = RedisStore::from_url("redis://127.0.0.1/", SessionConfig::default()).await?;
/// ```
pub struct RedisStore<C = ConnectionManager> {
    conn: C,
    config: SessionConfig,
    prefix: String,
    strict_delete: bool,
}

/// Redis Cluster session store
#[cfg(feature = "redis-cluster")]
pub type RedisClusterStore = RedisStore<redis::cluster_async::ClusterConnection>;

impl RedisStore<ConnectionManager> {
    /// Create a single-node store from a client
    pub async fn new(client: redis::Client, config: SessionConfig) -> Result<Self, SessionError> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::from_connection(conn, config))
    }

    /// Create a single-node store from a connection string
    pub async fn from_url(url: &str, config: SessionConfig) -> Result<Self, SessionError> {
        let client = redis::Client::open(url)
            .map_err(|e| SessionError::Store(format!("Failed to create Redis client: {}", e)))?;
        Self::new(client, config).await
    }
}

#[cfg(feature = "redis-cluster")]
impl RedisStore<redis::cluster_async::ClusterConnection> {
    /// Create a cluster store from the given seed nodes
    pub async fn cluster<I, T>(nodes: I, config: SessionConfig) -> Result<Self, SessionError>
    where
        I: IntoIterator<Item = T>,
        T: redis::IntoConnectionInfo,
    {
        let client = redis::cluster::ClusterClient::new(nodes)?;
        let conn = client.get_async_connection().await?;
        Ok(Self::from_connection(conn, config))
    }
}

impl<C> RedisStore<C>
where
    C: ConnectionLike + Clone + Send + Sync + 'static,
{
    /// Wrap an existing connection
    pub fn from_connection(conn: C, config: SessionConfig) -> Self {
        Self {
            conn,
            config,
            prefix: DEFAULT_PREFIX.to_string(),
            strict_delete: false,
        }
    }

    /// Build with custom key prefix
    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Report the `DEL` reply from `delete` instead of always `true`
    pub fn with_strict_delete(mut self, strict: bool) -> Self {
        self.strict_delete = strict;
        self
    }

    /// Make a storage key from session ID
    fn make_key(&self, sid: &str) -> String {
        format!("{}{}", self.prefix, sid)
    }
}

impl<C: Clone> Clone for RedisStore<C> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            config: self.config.clone(),
            prefix: self.prefix.clone(),
            strict_delete: self.strict_delete,
        }
    }
}

#[async_trait]
impl<C> SessionStore for RedisStore<C>
where
    C: ConnectionLike + Clone + Send + Sync + 'static,
{
    async fn get(&self, sid: &str) -> Result<Option<Value>, SessionError> {
        let key = self.make_key(sid);
        let mut conn = self.conn.clone();

        let data: Option<String> = redis::cmd("GETEX")
            .arg(&key)
            .arg("EX")
            .arg(self.config.ttl_secs())
            .query_async(&mut conn)
            .await?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, sid: &str, session: &Value) -> Result<(), SessionError> {
        let key = self.make_key(sid);
        let mut conn = self.conn.clone();

        let json = serde_json::to_string(session)?;
        conn.set_ex::<_, _, ()>(&key, &json, self.config.ttl_secs())
            .await?;
        Ok(())
    }

    async fn delete(&self, sid: &str) -> Result<bool, SessionError> {
        let key = self.make_key(sid);
        let mut conn = self.conn.clone();

        let removed: u64 = conn.del(&key).await?;
        Ok(!self.strict_delete || removed > 0)
    }

    fn config(&self) -> &SessionConfig {
        &self.config
    }
}
