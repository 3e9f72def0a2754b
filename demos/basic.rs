//! Basic example using the SQLite session store
//!
//! Set `ENCRYPTION_KEY` to 64 hex characters (in the environment or a `.env`
//! file) before running:
//!
//! ```sh
//! ENCRYPTION_KEY=$(openssl rand -hex 32) cargo run --example basic
//! ```

use salvo::prelude::*;
use sealed_session::{
    append_set_cookie, Encryption, SessionConfig, SessionDepotExt, SessionHoop, SessionManager,
    SqliteStore,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct User {
    name: String,
}

type Manager = SessionManager<User, SqliteStore>;

fn manager(depot: &Depot) -> Manager {
    depot
        .session_manager::<User, SqliteStore, Encryption>()
        .cloned()
        .expect("SessionHoop not installed")
}

#[handler]
async fn index(depot: &mut Depot) -> String {
    match depot.session::<User>().and_then(|s| s.session.as_ref()) {
        Some(user) => format!("Logged in as: {}", user.name),
        None => "Not logged in".to_string(),
    }
}

#[handler]
async fn login(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let name = req.query::<String>("name").unwrap_or_else(|| "anonymous".to_string());
    let sid = depot.session_id::<User>().map(str::to_owned);
    let manager = manager(depot);

    match manager.create_or_update_session(sid.as_deref(), &User { name: name.clone() }).await {
        Ok(Some(cookie)) => {
            if let Err(e) = append_set_cookie(res, &cookie) {
                tracing::error!("Failed to set session cookie: {}", e);
            }
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!("Failed to save session: {}", e);
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            return;
        }
    }
    res.render(format!("User set to: {}", name));
}

#[handler]
async fn set_flash(depot: &mut Depot) -> String {
    let Some(sid) = depot.session_id::<User>().map(str::to_owned) else {
        return "no session".to_string();
    };
    match manager(depot).set_flash(&sid, "Profile saved").await {
        Ok(()) => "Flash set".to_string(),
        Err(e) => format!("Failed to set flash: {}", e),
    }
}

#[handler]
async fn get_flash(depot: &mut Depot) -> String {
    let Some(sid) = depot.session_id::<User>().map(str::to_owned) else {
        return "no session".to_string();
    };
    match manager(depot).get_flash(&sid).await {
        Ok(Some(flash)) => format!("Flash: {}", flash),
        Ok(None) => "No flash".to_string(),
        Err(e) => format!("Failed to read flash: {}", e),
    }
}

#[handler]
async fn logout(depot: &mut Depot, res: &mut Response) {
    let Some(sid) = depot.session_id::<User>().map(str::to_owned) else {
        res.render("no session");
        return;
    };
    let manager = manager(depot);
    match manager
        .delete_session_and_clear_cookie(&sid, Some(res.cookies_mut()))
        .await
    {
        Ok(reset) => {
            if let Err(e) = append_set_cookie(res, &reset) {
                tracing::error!("Failed to clear session cookie: {}", e);
            }
            res.render("Logged out successfully");
        }
        Err(e) => {
            tracing::error!("Failed to delete session: {}", e);
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}

#[tokio::main]
async fn main() {
    // Set up logging
    tracing_subscriber::fmt::init();

    let config = SessionConfig::new("session")
        .with_secure(false) // plain http on localhost
        .with_max_age_secs(3600);
    let store = SqliteStore::connect("sqlite::memory:", config)
        .await
        .expect("Failed to open SQLite store");
    let cipher = Encryption::from_default_env().expect("ENCRYPTION_KEY must hold 32 hex-encoded bytes");
    let manager: Manager = SessionManager::new(store, cipher);

    let router = Router::new()
        .hoop(SessionHoop::new(manager))
        .get(index)
        .push(Router::with_path("login").get(login))
        .push(Router::with_path("flash").get(get_flash).post(set_flash))
        .push(Router::with_path("logout").get(logout));

    let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
    println!("Server running at http://127.0.0.1:5800");
    println!("Try these endpoints:");
    println!("  GET  /                 - Current user");
    println!("  GET  /login?name=alice - Create or update the session");
    println!("  POST /flash            - Set a flash message");
    println!("  GET  /flash            - Read the flash message once");
    println!("  GET  /logout           - Delete the session and clear the cookie");

    Server::new(acceptor).serve(router).await;
}
