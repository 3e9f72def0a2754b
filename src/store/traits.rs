//! Session store trait

use async_trait::async_trait;
use serde_json::Value;

use crate::config::SessionConfig;
use crate::cookie;
use crate::error::SessionError;
use crate::session::{put_flash, take_flash};

/// Trait for session storage backends
///
/// Records are keyed by the plaintext session id and hold the session in its
/// self-describing JSON form. Every backend follows the same expiry rules:
///
/// - `set` replaces the whole record and writes a fresh expiry of
///   `now + max_age`
/// - `get` on a live record slides its expiry to `now + max_age`
/// - `get` on an expired record deletes it and returns `None`
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Get a session by ID, refreshing its expiry
    ///
    /// Returns None if session doesn't exist or has expired
    async fn get(&self, sid: &str) -> Result<Option<Value>, SessionError>;

    /// Create or fully overwrite a session
    async fn set(&self, sid: &str, session: &Value) -> Result<(), SessionError>;

    /// Delete a session
    ///
    /// Returns whether a record was removed. Backends that cannot tell
    /// document what they report instead.
    async fn delete(&self, sid: &str) -> Result<bool, SessionError>;

    /// Cookie and expiry settings for this store
    fn config(&self) -> &SessionConfig;

    /// Read and remove the flash message
    ///
    /// The default costs one read and one write, and resets the record's TTL.
    async fn get_flash(&self, sid: &str) -> Result<Option<String>, SessionError> {
        let Some(mut session) = self.get(sid).await? else {
            return Ok(None);
        };
        let flash = take_flash(&mut session);
        self.set(sid, &session).await?;
        Ok(flash)
    }

    /// Attach a flash message, creating an empty session if none exists
    async fn set_flash(&self, sid: &str, flash: &str) -> Result<(), SessionError> {
        let mut session = self.get(sid).await?.unwrap_or(Value::Null);
        put_flash(&mut session, flash)?;
        self.set(sid, &session).await
    }

    /// Name of the session cookie
    fn cookie_name(&self) -> &str {
        &self.config().cookie_name
    }

    /// Set-Cookie value carrying an encrypted session id
    fn create_cookie_string(&self, token: &str) -> String {
        cookie::session_cookie(self.config(), token)
    }

    /// Set-Cookie value that makes the client drop the session cookie
    fn reset_cookie(&self) -> String {
        cookie::reset_cookie(self.config())
    }
}
