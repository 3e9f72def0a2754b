//! Session resolver hoop for Salvo
//!
//! The hoop only resolves: it decrypts the incoming cookie, loads the session
//! and leaves both in the `Depot`. Writing sessions and cookies stays with the
//! route handlers, through the manager stored next to the session.

use salvo_core::http::header::{HeaderValue, SET_COOKIE};
use salvo_core::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::encryption::{Encryption, TokenCipher};
use crate::error::SessionError;
use crate::manager::SessionManager;
use crate::store::SessionStore;

pub(crate) const SESSION_KEY: &str = "sealed.session";
pub(crate) const MANAGER_KEY: &str = "sealed.session.manager";

/// Salvo hoop that resolves the session cookie of every request
///
/// ```rust,ignore
/// let manager = SessionManager::<User, _>::with_key(store, &key)?;
/// let router = Router::new().hoop(SessionHoop::new(manager)).get(index);
/// ```
pub struct SessionHoop<T, S, C = Encryption> {
    manager: SessionManager<T, S, C>,
}

impl<T, S, C> SessionHoop<T, S, C>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
    S: SessionStore,
    C: TokenCipher,
{
    /// Create a hoop around a session manager
    pub fn new(manager: SessionManager<T, S, C>) -> Self {
        Self { manager }
    }
}

impl<T, S, C> Clone for SessionHoop<T, S, C> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
        }
    }
}

#[async_trait]
impl<T, S, C> Handler for SessionHoop<T, S, C>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
    S: SessionStore,
    C: TokenCipher,
{
    async fn handle(&self, req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
        let value = req
            .cookie(self.manager.cookie_name())
            .map(|cookie| cookie.value().to_owned());

        let resolved = self.manager.session_from_cookie_value(value.as_deref()).await;
        depot.insert(SESSION_KEY, resolved);
        depot.insert(MANAGER_KEY, self.manager.clone());

        ctrl.call_next(req, depot, res).await;
    }
}

/// Append a Set-Cookie header built by the manager or a store
pub fn append_set_cookie(res: &mut Response, header: &str) -> Result<(), SessionError> {
    let value = HeaderValue::from_str(header)
        .map_err(|e| SessionError::Serialization(format!("invalid Set-Cookie value: {}", e)))?;
    res.headers_mut().append(SET_COOKIE, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depot_ext::SessionDepotExt;
    use crate::store::MemoryStore;
    use crate::SessionConfig;
    use salvo_core::test::{ResponseExt, TestClient};
    use serde::Deserialize;

    const KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        user: String,
    }

    type Manager = SessionManager<User, MemoryStore>;

    struct WhoAmI;

    #[async_trait]
    impl Handler for WhoAmI {
        async fn handle(&self, _req: &mut Request, depot: &mut Depot, res: &mut Response, _ctrl: &mut FlowCtrl) {
            let name = depot
                .session::<User>()
                .and_then(|resolved| resolved.session.as_ref())
                .map(|user| user.user.clone())
                .unwrap_or_else(|| "anonymous".to_string());
            res.render(name);
        }
    }

    struct Login;

    #[async_trait]
    impl Handler for Login {
        async fn handle(&self, _req: &mut Request, depot: &mut Depot, res: &mut Response, _ctrl: &mut FlowCtrl) {
            let Some(manager) = depot.session_manager::<User, MemoryStore, Encryption>().cloned() else {
                res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
                return;
            };
            let user = User {
                user: "bob".to_string(),
            };
            let header = manager.create_or_update_session(None, &user).await.unwrap();
            if let Some(header) = header {
                append_set_cookie(res, &header).unwrap();
            }
            res.render("ok");
        }
    }

    fn service(manager: Manager) -> Service {
        let router = Router::new()
            .hoop(SessionHoop::new(manager))
            .get(WhoAmI)
            .push(Router::with_path("login").get(Login));
        Service::new(router)
    }

    #[tokio::test]
    async fn test_hoop_resolves_cookie() {
        let manager: Manager = SessionManager::with_key(MemoryStore::default(), KEY).unwrap();
        let token = manager
            .create_session(&User {
                user: "bob".to_string(),
            })
            .await
            .unwrap();
        let service = service(manager);

        let body = TestClient::get("http://127.0.0.1:5800/")
            .add_header("cookie", format!("session={}", token), true)
            .send(&service)
            .await
            .take_string()
            .await
            .unwrap();
        assert_eq!(body, "bob");

        let body = TestClient::get("http://127.0.0.1:5800/")
            .add_header("cookie", "session=deadbeef", true)
            .send(&service)
            .await
            .take_string()
            .await
            .unwrap();
        assert_eq!(body, "anonymous");

        let body = TestClient::get("http://127.0.0.1:5800/")
            .send(&service)
            .await
            .take_string()
            .await
            .unwrap();
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn test_logout_clears_response_cookie() {
        let config = SessionConfig::new("sid").with_cookie_path("/app");
        let manager: Manager = SessionManager::with_key(MemoryStore::new(config), KEY).unwrap();
        let token = manager
            .create_session(&User {
                user: "bob".to_string(),
            })
            .await
            .unwrap();
        let sid = manager.get_session_id(&token).await.unwrap();

        let mut res = Response::new();
        let reset = manager
            .delete_session_and_clear_cookie(&sid, Some(res.cookies_mut()))
            .await
            .unwrap();
        assert!(reset.starts_with("sid=; Path=/app;"));
        assert_eq!(manager.get_session(&sid).await.unwrap(), None);

        let emitted: Vec<String> = res.cookies().delta().map(|c| c.to_string()).collect();
        assert_eq!(emitted.len(), 1, "{:?}", emitted);
        assert!(emitted[0].starts_with("sid=;"), "{}", emitted[0]);
        assert!(emitted[0].contains("Path=/app"), "{}", emitted[0]);
        assert!(emitted[0].contains("Max-Age=0"), "{}", emitted[0]);
    }

    #[tokio::test]
    async fn test_login_sets_cookie() {
        let manager: Manager = SessionManager::with_key(
            MemoryStore::new(SessionConfig::new("sid")),
            KEY,
        )
        .unwrap();
        let service = service(manager);

        let res = TestClient::get("http://127.0.0.1:5800/login")
            .send(&service)
            .await;
        let header = res
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(header.starts_with("sid="));
        assert!(header.contains("; Secure; HttpOnly; Expires="));

        let token = header
            .strip_prefix("sid=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        let body = TestClient::get("http://127.0.0.1:5800/")
            .add_header("cookie", format!("sid={}", token), true)
            .send(&service)
            .await
            .take_string()
            .await
            .unwrap();
        assert_eq!(body, "bob");
    }
}
