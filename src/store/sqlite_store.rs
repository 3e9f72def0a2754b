//! SQLite session store
//!
//! One row per session in a `sessions` table:
//! - `session_id`: plaintext session id (primary key)
//! - `session`: JSON serialized session
//! - `expires_at`: Unix time in milliseconds
//!
//! Expiry is checked by the client on every read, so stale rows only go away
//! when they are read or when [`SqliteStore::prune_expired`] runs.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;

use super::SessionStore;
use crate::config::SessionConfig;
use crate::error::SessionError;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY,
    session TEXT NOT NULL,
    expires_at INTEGER NOT NULL
)";

/// SQLite session store
///
/// # Example
///
/// ```rust,ignore
/// use sealed_session::{SessionConfig, SqliteStore};
///
/// let pool = sqlx::SqlitePool::connect("sqlite://sessions.db").await?;
/// let store = SqliteStore::new(pool, SessionConfig::default());
/// store.migrate().await?;
/// ```
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    config: SessionConfig,
}

impl SqliteStore {
    /// Create a store on an existing pool
    pub fn new(pool: SqlitePool, config: SessionConfig) -> Self {
        Self { pool, config }
    }

    /// Connect to `url` (e.g. `sqlite::memory:` or `sqlite://sessions.db?mode=rwc`)
    /// and create the sessions table
    pub async fn connect(url: &str, config: SessionConfig) -> Result<Self, SessionError> {
        let pool = SqlitePool::connect(url).await?;
        let store = Self::new(pool, config);
        store.migrate().await?;
        Ok(store)
    }

    /// Create the sessions table if it does not exist
    pub async fn migrate(&self) -> Result<(), SessionError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Delete every expired row, returning how many were removed
    pub async fn prune_expired(&self) -> Result<u64, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(now_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// The underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn next_expiry(&self) -> i64 {
        now_millis() + self.config.ttl_millis()
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn get(&self, sid: &str) -> Result<Option<Value>, SessionError> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT session, expires_at FROM sessions WHERE session_id = ?")
                .bind(sid)
                .fetch_optional(&self.pool)
                .await?;

        let Some((session, expires_at)) = row else {
            return Ok(None);
        };

        if expires_at <= now_millis() {
            tracing::debug!(sid, "dropping expired session");
            sqlx::query("DELETE FROM sessions WHERE session_id = ?")
                .bind(sid)
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }

        let session: Value = serde_json::from_str(&session)?;
        sqlx::query("UPDATE sessions SET expires_at = ? WHERE session_id = ?")
            .bind(self.next_expiry())
            .bind(sid)
            .execute(&self.pool)
            .await?;

        Ok(Some(session))
    }

    async fn set(&self, sid: &str, session: &Value) -> Result<(), SessionError> {
        let json = serde_json::to_string(session)?;
        sqlx::query(
            "INSERT OR REPLACE INTO sessions (session_id, session, expires_at) VALUES (?, ?, ?)",
        )
        .bind(sid)
        .bind(json)
        .bind(self.next_expiry())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, sid: &str) -> Result<bool, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE session_id = ?")
            .bind(sid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn config(&self) -> &SessionConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::time::Duration as StdDuration;

    async fn setup_store(config: SessionConfig) -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory SQLite database");
        let store = SqliteStore::new(pool, config);
        store.migrate().await.expect("Failed to create sessions table");
        store
    }

    async fn stored_expiry(store: &SqliteStore, sid: &str) -> Option<i64> {
        sqlx::query_as::<_, (i64,)>("SELECT expires_at FROM sessions WHERE session_id = ?")
            .bind(sid)
            .fetch_optional(store.pool())
            .await
            .unwrap()
            .map(|(expires_at,)| expires_at)
    }

    #[tokio::test]
    async fn test_sqlite_store_basic() {
        let store = setup_store(SessionConfig::default()).await;

        store.set("test-id", &json!({"user": "alice"})).await.unwrap();
        assert_eq!(
            store.get("test-id").await.unwrap(),
            Some(json!({"user": "alice"}))
        );

        store.set("test-id", &json!({"user": "bob"})).await.unwrap();
        assert_eq!(
            store.get("test-id").await.unwrap(),
            Some(json!({"user": "bob"}))
        );
    }

    #[tokio::test]
    async fn test_sqlite_delete_reports_existence() {
        let store = setup_store(SessionConfig::default()).await;
        store.set("id", &json!({"n": 1})).await.unwrap();

        assert!(store.delete("id").await.unwrap());
        assert!(!store.delete("id").await.unwrap());
        assert!(store.get("id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_get_refreshes_expiry() {
        let store = setup_store(SessionConfig::default().with_max_age(Duration::hours(1))).await;
        store.set("id", &json!({})).await.unwrap();
        let first = stored_expiry(&store, "id").await.unwrap();

        tokio::time::sleep(StdDuration::from_millis(20)).await;
        store.get("id").await.unwrap();
        let second = stored_expiry(&store, "id").await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_sqlite_sliding_expiration() {
        let store = setup_store(
            SessionConfig::default().with_max_age(Duration::milliseconds(400)),
        )
        .await;
        store.set("id", &json!({"v": 1})).await.unwrap();

        tokio::time::sleep(StdDuration::from_millis(250)).await;
        assert_eq!(store.get("id").await.unwrap(), Some(json!({"v": 1})));

        // past the original expiry, inside the refreshed one
        tokio::time::sleep(StdDuration::from_millis(250)).await;
        assert_eq!(store.get("id").await.unwrap(), Some(json!({"v": 1})));

        tokio::time::sleep(StdDuration::from_millis(600)).await;
        assert!(store.get("id").await.unwrap().is_none());
        // the stale row was removed by the read
        assert!(stored_expiry(&store, "id").await.is_none());
    }

    #[tokio::test]
    async fn test_sqlite_flash() {
        let store = setup_store(SessionConfig::default()).await;
        store.set("id", &json!({"user": "bob"})).await.unwrap();

        store.set_flash("id", "hello").await.unwrap();
        // a plain read leaves the flash in place
        assert_eq!(
            store.get("id").await.unwrap(),
            Some(json!({"user": "bob", "flash": "hello"}))
        );
        assert_eq!(store.get_flash("id").await.unwrap(), Some("hello".to_string()));
        assert_eq!(store.get_flash("id").await.unwrap(), None);
        assert_eq!(store.get("id").await.unwrap(), Some(json!({"user": "bob"})));
    }

    #[tokio::test]
    async fn test_sqlite_prune_expired() {
        let store = setup_store(SessionConfig::default().with_max_age(Duration::zero())).await;
        store.set("a", &json!({})).await.unwrap();
        store.set("b", &json!({})).await.unwrap();

        tokio::time::sleep(StdDuration::from_millis(5)).await;
        assert_eq!(store.prune_expired().await.unwrap(), 2);
        assert_eq!(store.prune_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sqlite_connect() {
        let store = SqliteStore::connect("sqlite::memory:", SessionConfig::default())
            .await
            .unwrap();
        assert!(store.get("nothing").await.unwrap().is_none());
    }
}
