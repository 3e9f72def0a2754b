//! Session coordinator
//!
//! Ties id generation, token encryption and storage together. The plaintext
//! session id only ever leaves this module inside an encrypted token.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

use crate::cookie::CookieJar;
use crate::encryption::{Algorithm, Encryption, TokenCipher};
use crate::error::SessionError;
use crate::session::ResolvedSession;
use crate::store::SessionStore;

/// Creates, resolves and destroys sessions of type `T` kept in store `S`.
///
/// Cloning is cheap; clones share the store and the cipher.
pub struct SessionManager<T, S, C = Encryption> {
    store: Arc<S>,
    cipher: Arc<C>,
    _session: PhantomData<fn() -> T>,
}

impl<T, S, C> SessionManager<T, S, C>
where
    T: Serialize + DeserializeOwned + Send + Sync,
    S: SessionStore,
    C: TokenCipher,
{
    /// Create a manager from a store and any token cipher
    pub fn new(store: S, cipher: C) -> Self {
        Self {
            store: Arc::new(store),
            cipher: Arc::new(cipher),
            _session: PhantomData,
        }
    }

    /// Generate a new session ID
    fn generate_session_id() -> String {
        // Time-ordered ids keep SQLite primary-key inserts local
        Uuid::now_v7().to_string()
    }

    /// The backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The token cipher
    pub fn cipher(&self) -> &C {
        &self.cipher
    }

    /// Name of the session cookie
    pub fn cookie_name(&self) -> &str {
        self.store.cookie_name()
    }

    /// Persist `session` under a fresh id and return the encrypted token
    pub async fn create_session(&self, session: &T) -> Result<String, SessionError> {
        let sid = Self::generate_session_id();
        self.set_session(&sid, session).await?;
        self.cipher.encrypt(&sid).await
    }

    /// Decrypt a token back into a session id.
    ///
    /// Does not consult the store: a well-formed token for an id that was never
    /// issued still decrypts, and simply misses on lookup.
    pub async fn get_session_id(&self, token: &str) -> Option<String> {
        self.cipher.decrypt(token).await
    }

    /// Load a session, sliding its expiry forward
    pub async fn get_session(&self, sid: &str) -> Result<Option<T>, SessionError> {
        match self.store.get(sid).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Overwrite a session
    pub async fn set_session(&self, sid: &str, session: &T) -> Result<(), SessionError> {
        let value = serde_json::to_value(session)?;
        self.store.set(sid, &value).await
    }

    /// Delete a session; see the store for what the result means
    pub async fn delete_session(&self, sid: &str) -> Result<bool, SessionError> {
        self.store.delete(sid).await
    }

    /// Read and remove the session's flash message
    pub async fn get_flash(&self, sid: &str) -> Result<Option<String>, SessionError> {
        self.store.get_flash(sid).await
    }

    /// Attach a flash message to the session
    pub async fn set_flash(&self, sid: &str, flash: &str) -> Result<(), SessionError> {
        self.store.set_flash(sid, flash).await
    }

    /// Delete a session and return the Set-Cookie value that clears it.
    ///
    /// When a cookie jar is given, the session cookie is removed from it too.
    pub async fn delete_session_and_clear_cookie(
        &self,
        sid: &str,
        jar: Option<&mut (dyn CookieJar + Send)>,
    ) -> Result<String, SessionError> {
        self.delete_session(sid).await?;
        if let Some(jar) = jar {
            jar.remove(self.cookie_name(), &self.store.config().cookie_path);
        }
        Ok(self.store.reset_cookie())
    }

    /// Resolve an incoming cookie value into a session id and session.
    ///
    /// Never fails: a missing, malformed, tampered or unknown token, as well as
    /// a store error, all produce an empty result.
    pub async fn session_from_cookie_value(&self, value: Option<&str>) -> ResolvedSession<T> {
        let Some(token) = value.filter(|v| !v.is_empty()) else {
            return ResolvedSession::empty();
        };
        let Some(sid) = self.get_session_id(token).await else {
            return ResolvedSession::empty();
        };

        match self.get_session(&sid).await {
            Ok(Some(session)) => ResolvedSession {
                session_id: Some(sid),
                session: Some(session),
            },
            Ok(None) => {
                tracing::debug!("session token decrypted but no live session is stored");
                ResolvedSession::empty()
            }
            Err(e) => {
                tracing::warn!("Failed to load session: {}", e);
                ResolvedSession::empty()
            }
        }
    }

    /// Set-Cookie value carrying the encrypted form of `sid`
    pub async fn create_cookie_string(&self, sid: &str) -> Result<String, SessionError> {
        let token = self.cipher.encrypt(sid).await?;
        Ok(self.store.create_cookie_string(&token))
    }

    /// Create a session when `sid` is `None`, otherwise overwrite it.
    ///
    /// Returns the Set-Cookie value for a newly created session, `None` after
    /// an update.
    pub async fn create_or_update_session(
        &self,
        sid: Option<&str>,
        session: &T,
    ) -> Result<Option<String>, SessionError> {
        match sid {
            Some(sid) => {
                self.set_session(sid, session).await?;
                Ok(None)
            }
            None => {
                let token = self.create_session(session).await?;
                Ok(Some(self.store.create_cookie_string(&token)))
            }
        }
    }
}

impl<T, S> SessionManager<T, S, Encryption>
where
    T: Serialize + DeserializeOwned + Send + Sync,
    S: SessionStore,
{
    /// Create a manager using AES-256-GCM with a hex-encoded 32-byte key
    pub fn with_key(store: S, key_hex: &str) -> Result<Self, SessionError> {
        let cipher = Encryption::from_hex(key_hex, Algorithm::Aes256Gcm)?;
        Ok(Self::new(store, cipher))
    }
}

impl<T, S, C> Clone for SessionManager<T, S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cipher: Arc::clone(&self.cipher),
            _session: PhantomData,
        }
    }
}
