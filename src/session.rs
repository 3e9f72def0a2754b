//! Session payload helpers
//!
//! Stores see a session in its self-describing form, a `serde_json::Value`.
//! The only attribute the crate itself ever touches is the flash message,
//! kept under the top-level key [`FLASH_KEY`] of an object payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SessionError;

/// Reserved payload key holding the flash message
pub const FLASH_KEY: &str = "flash";

/// Result of resolving an incoming cookie value.
///
/// Both fields are `None` when there was no cookie, the token did not open,
/// or nothing is stored under the decrypted id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSession<T> {
    /// Decrypted session id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Stored session, if the id is still live
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<T>,
}

impl<T> Default for ResolvedSession<T> {
    fn default() -> Self {
        Self {
            session_id: None,
            session: None,
        }
    }
}

impl<T> ResolvedSession<T> {
    /// An empty result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether both an id and a session were found
    pub fn is_live(&self) -> bool {
        self.session_id.is_some() && self.session.is_some()
    }
}

/// Remove the flash message from `payload`.
///
/// Returns `None` for non-object payloads and for missing or non-string
/// flash values; a non-string value is still removed.
pub fn take_flash(payload: &mut Value) -> Option<String> {
    match payload.as_object_mut()?.remove(FLASH_KEY)? {
        Value::String(flash) => Some(flash),
        _ => None,
    }
}

/// Attach `flash` to `payload`, replacing any earlier message.
///
/// `Null` is treated as an empty object; any other non-object payload
/// cannot carry a flash message.
pub fn put_flash(payload: &mut Value, flash: &str) -> Result<(), SessionError> {
    if payload.is_null() {
        *payload = Value::Object(Map::new());
    }
    let object = payload.as_object_mut().ok_or_else(|| {
        SessionError::Serialization("flash messages need an object session".to_string())
    })?;
    object.insert(FLASH_KEY.to_string(), Value::String(flash.to_string()));
    Ok(())
}
