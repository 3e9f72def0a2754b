//! Extension trait for Depot to easily access sessions

use salvo_core::Depot;

use crate::encryption::TokenCipher;
use crate::handler::{MANAGER_KEY, SESSION_KEY};
use crate::manager::SessionManager;
use crate::session::ResolvedSession;
use crate::store::SessionStore;

/// Extension trait for Salvo's Depot to read what [`SessionHoop`] resolved
///
/// The type parameters must match the ones the hoop was built with,
/// otherwise the lookups return `None`.
///
/// [`SessionHoop`]: crate::SessionHoop
pub trait SessionDepotExt {
    /// The resolved session id and session
    fn session<T: Send + Sync + 'static>(&self) -> Option<&ResolvedSession<T>>;

    /// The decrypted session id, if the cookie resolved to a live session
    fn session_id<T: Send + Sync + 'static>(&self) -> Option<&str> {
        self.session::<T>()?.session_id.as_deref()
    }

    /// The session manager, for writes and cookie changes
    fn session_manager<T, S, C>(&self) -> Option<&SessionManager<T, S, C>>
    where
        T: 'static,
        S: SessionStore,
        C: TokenCipher;
}

impl SessionDepotExt for Depot {
    fn session<T: Send + Sync + 'static>(&self) -> Option<&ResolvedSession<T>> {
        self.get::<ResolvedSession<T>>(SESSION_KEY).ok()
    }

    fn session_manager<T, S, C>(&self) -> Option<&SessionManager<T, S, C>>
    where
        T: 'static,
        S: SessionStore,
        C: TokenCipher,
    {
        self.get::<SessionManager<T, S, C>>(MANAGER_KEY).ok()
    }
}
