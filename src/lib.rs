//! # sealed-session
//!
//! Server-side sessions addressed by encrypted, tamper-evident tokens.
//!
//! The client only ever sees an AES-GCM sealed copy of the session id. The id
//! itself is the key into a pluggable store, and every successful read slides
//! the session's expiry forward.
//!
//! ## Features
//!
//! - **AEAD tokens**: `hex(nonce ‖ ciphertext ‖ tag)`, fail-closed decryption
//! - **Pluggable storage backends**: SQLite, Redis, Redis Cluster, Memory, or custom stores
//! - **Flash messages**: one-shot strings piggybacked on the session record
//! - **Salvo binding**: a hoop that resolves the session cookie on every request
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sealed_session::{SessionConfig, SessionManager, SqliteStore};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     user: String,
//! }
//!
//! let store = SqliteStore::connect("sqlite://sessions.db?mode=rwc", SessionConfig::default()).await?;
//! let manager: SessionManager<User, _> = SessionManager::with_key(store, &key_hex)?;
//!
//! let token = manager.create_session(&User { user: "bob".into() }).await?;
//! let resolved = manager.session_from_cookie_value(Some(&token)).await;
//! assert_eq!(resolved.session.unwrap().user, "bob");
//! ```

pub mod config;
pub mod cookie;
pub mod encryption;
pub mod error;
pub mod manager;
pub mod session;
pub mod store;

pub use config::{SameSite, SessionConfig};
pub use cookie::CookieJar;
pub use encryption::{Algorithm, DecryptError, Encryption, TokenCipher};
pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{ResolvedSession, FLASH_KEY};
pub use store::{MemoryStore, SessionStore};

#[cfg(feature = "redis-store")]
pub use store::RedisStore;

#[cfg(feature = "redis-cluster")]
pub use store::RedisClusterStore;

#[cfg(feature = "sqlite-store")]
pub use store::SqliteStore;

#[cfg(feature = "salvo")]
pub mod handler;
#[cfg(feature = "salvo")]
pub use handler::{append_set_cookie, SessionHoop};

/// Extension trait for Depot to easily access session
#[cfg(feature = "salvo")]
pub mod depot_ext;
#[cfg(feature = "salvo")]
pub use depot_ext::SessionDepotExt;
