//! Set-Cookie header rendering and the mutable cookie handle
//!
//! Header format:
//! `<name>=<value>; Path=<path>; SameSite=<s>[; Secure][; HttpOnly]; Expires=<IMF-fixdate>`

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::config::SessionConfig;

/// `Expires` value that tells the client to drop the cookie right away.
pub const EPOCH_EXPIRES: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Format a timestamp as an RFC 7231 IMF-fixdate
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Render a Set-Cookie value for `value` expiring at `expires`
pub fn set_cookie_header(config: &SessionConfig, value: &str, expires: &str) -> String {
    let mut header = format!(
        "{}={}; Path={}; SameSite={}",
        config.cookie_name, value, config.cookie_path, config.cookie_same_site
    );
    if config.cookie_secure {
        header.push_str("; Secure");
    }
    if config.cookie_http_only {
        header.push_str("; HttpOnly");
    }
    header.push_str("; Expires=");
    header.push_str(expires);
    header
}

/// Cookie carrying `token`, expiring one `max_age` from now
pub fn session_cookie(config: &SessionConfig, token: &str) -> String {
    let expires = Utc::now() + config.max_age;
    set_cookie_header(config, token, &http_date(expires))
}

/// Cookie with an empty value that expires immediately
pub fn reset_cookie(config: &SessionConfig) -> String {
    set_cookie_header(config, "", EPOCH_EXPIRES)
}

/// A mutable, request-scoped collection of client cookies.
///
/// Handed to [`SessionManager::delete_session_and_clear_cookie`] so the
/// client-visible entry disappears together with the stored record.
///
/// [`SessionManager::delete_session_and_clear_cookie`]: crate::SessionManager::delete_session_and_clear_cookie
pub trait CookieJar {
    /// Remove the cookie called `name` set on `path`, returning whether it was
    /// present
    fn remove(&mut self, name: &str, path: &str) -> bool;
}

impl<H: BuildHasher> CookieJar for HashMap<String, String, H> {
    fn remove(&mut self, name: &str, _path: &str) -> bool {
        HashMap::remove(self, name).is_some()
    }
}

/// Salvo jars only emit a removal for cookies they were built with, and a
/// response jar starts empty, so an explicit expired cookie is always added.
#[cfg(feature = "salvo")]
impl CookieJar for salvo_core::http::cookie::CookieJar {
    fn remove(&mut self, name: &str, path: &str) -> bool {
        use salvo_core::http::cookie::{time, Cookie};

        let present = self.get(name).is_some();
        let removal = Cookie::build((name.to_owned(), ""))
            .path(path.to_owned())
            .max_age(time::Duration::ZERO)
            .expires(time::OffsetDateTime::UNIX_EPOCH)
            .build();
        self.add(removal);
        present
    }
}
