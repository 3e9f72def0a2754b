//! In-memory session store
//!
//! This is primarily for development and testing.
//! For production, use SqliteStore, RedisStore or RedisClusterStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::SessionStore;
use crate::config::SessionConfig;
use crate::error::SessionError;

struct StoredSession {
    data: Value,
    expires_at: DateTime<Utc>,
}

/// In-memory session store
///
/// Warning: This store is not suitable for production use because:
/// - Sessions are lost on server restart
/// - Sessions are not shared across multiple server instances
/// - Expired sessions are only evicted when read or on `cleanup_expired`
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
    config: SessionConfig,
}

impl MemoryStore {
    /// Create a new memory store
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    fn next_expiry(&self) -> DateTime<Utc> {
        Utc::now() + self.config.max_age
    }

    /// Clean up expired sessions
    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        self.sessions.write().retain(|_, stored| stored.expires_at > now);
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.cleanup_expired();
        self.sessions.read().len()
    }

    /// Whether no live sessions are held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            config: self.config.clone(),
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, sid: &str) -> Result<Option<Value>, SessionError> {
        let mut sessions = self.sessions.write();
        let now = Utc::now();

        let Some(stored) = sessions.get_mut(sid) else {
            return Ok(None);
        };
        if stored.expires_at > now {
            stored.expires_at = now + self.config.max_age;
            return Ok(Some(stored.data.clone()));
        }

        sessions.remove(sid);
        Ok(None)
    }

    async fn set(&self, sid: &str, session: &Value) -> Result<(), SessionError> {
        let stored = StoredSession {
            data: session.clone(),
            expires_at: self.next_expiry(),
        };
        self.sessions.write().insert(sid.to_string(), stored);
        Ok(())
    }

    async fn delete(&self, sid: &str) -> Result<bool, SessionError> {
        Ok(self.sessions.write().remove(sid).is_some())
    }

    fn config(&self) -> &SessionConfig {
        &self.config
    }
}
