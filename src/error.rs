//! Session error types

use std::fmt;

/// Errors that can occur during session operations
#[derive(Debug)]
pub enum SessionError {
    /// Invalid or missing key, or a key that does not fit the cipher
    Configuration(String),
    /// The AEAD cipher refused to seal a value
    Encryption(String),
    /// Error during serialization/deserialization
    Serialization(String),
    /// Error from the session store
    Store(String),
    /// Redis error (when redis-store feature is enabled)
    #[cfg(feature = "redis-store")]
    Redis(redis::RedisError),
    /// SQLite error (when sqlite-store feature is enabled)
    #[cfg(feature = "sqlite-store")]
    Database(sqlx::Error),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Configuration(msg) => write!(f, "Session configuration error: {}", msg),
            SessionError::Encryption(msg) => write!(f, "Encryption error: {}", msg),
            SessionError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            SessionError::Store(msg) => write!(f, "Session store error: {}", msg),
            #[cfg(feature = "redis-store")]
            SessionError::Redis(e) => write!(f, "Redis error: {}", e),
            #[cfg(feature = "sqlite-store")]
            SessionError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "redis-store")]
            SessionError::Redis(e) => Some(e),
            #[cfg(feature = "sqlite-store")]
            SessionError::Database(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "redis-store")]
impl From<redis::RedisError> for SessionError {
    fn from(err: redis::RedisError) -> Self {
        SessionError::Redis(err)
    }
}

#[cfg(feature = "sqlite-store")]
impl From<sqlx::Error> for SessionError {
    fn from(err: sqlx::Error) -> Self {
        SessionError::Database(err)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization(err.to_string())
    }
}

impl From<hex::FromHexError> for SessionError {
    fn from(err: hex::FromHexError) -> Self {
        SessionError::Configuration(format!("key is not valid hex: {}", err))
    }
}
