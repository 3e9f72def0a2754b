//! Session configuration

use chrono::Duration;
use std::fmt;

/// Largest TTL (in seconds) handed to a remote store.
pub const MAX_TTL_SECS: u64 = 2_147_483_647;

/// Cookie and expiry settings shared by a store and the cookies it renders.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Name of the session cookie (default: "session")
    pub cookie_name: String,

    /// Cookie path (default: "/")
    pub cookie_path: String,

    /// HttpOnly flag for cookie (default: true)
    pub cookie_http_only: bool,

    /// Secure flag for cookie (default: true)
    pub cookie_secure: bool,

    /// SameSite attribute for cookie (default: Strict)
    pub cookie_same_site: SameSite,

    /// Lifetime of the cookie and TTL of the stored record (default: 24 hours).
    /// Every successful read slides the record's expiry forward by this amount.
    pub max_age: Duration,
}

/// SameSite cookie attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SameSite {
    /// Strict - cookie only sent for same-site requests
    #[default]
    Strict,
    /// Lax - cookie sent for same-site requests and top-level navigations
    Lax,
    /// None - cookie sent for all requests (requires Secure)
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => f.write_str("Strict"),
            SameSite::Lax => f.write_str("Lax"),
            SameSite::None => f.write_str("None"),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            cookie_path: "/".to_string(),
            cookie_http_only: true,
            cookie_secure: true,
            cookie_same_site: SameSite::Strict,
            max_age: Duration::hours(24),
        }
    }
}

impl SessionConfig {
    /// Create a configuration with the given cookie name and default attributes
    pub fn new<S: Into<String>>(cookie_name: S) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            ..Default::default()
        }
    }

    /// Set the cookie name (default: "session")
    pub fn with_cookie_name<S: Into<String>>(mut self, name: S) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the cookie path (default: "/")
    pub fn with_cookie_path<S: Into<String>>(mut self, path: S) -> Self {
        self.cookie_path = path.into();
        self
    }

    /// Set the HttpOnly flag (default: true)
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.cookie_http_only = http_only;
        self
    }

    /// Set the Secure flag (default: true)
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Set the SameSite attribute (default: Strict)
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie_same_site = same_site;
        self
    }

    /// Set the session lifetime
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set the session lifetime in seconds
    pub fn with_max_age_secs(mut self, secs: u64) -> Self {
        self.max_age = Duration::seconds(secs.min(MAX_TTL_SECS) as i64);
        self
    }

    /// Session lifetime in whole seconds, clamped to what a remote store accepts.
    ///
    /// Redis rejects `EX 0`, so sub-second lifetimes round up to one second.
    pub fn ttl_secs(&self) -> u64 {
        let secs = self.max_age.num_seconds().max(1) as u64;
        secs.min(MAX_TTL_SECS)
    }

    /// Session lifetime in milliseconds, never negative.
    pub fn ttl_millis(&self) -> i64 {
        self.max_age.num_milliseconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, "session");
        assert_eq!(config.cookie_path, "/");
        assert!(config.cookie_secure);
        assert!(config.cookie_http_only);
        assert_eq!(config.cookie_same_site, SameSite::Strict);
        assert_eq!(config.max_age, Duration::hours(24));
    }

    #[test]
    fn test_ttl_clamping() {
        let config = SessionConfig::default().with_max_age(Duration::milliseconds(200));
        assert_eq!(config.ttl_secs(), 1);
        assert_eq!(config.ttl_millis(), 200);

        let config = SessionConfig::default().with_max_age_secs(u64::MAX);
        assert_eq!(config.ttl_secs(), MAX_TTL_SECS);

        let config = SessionConfig::default().with_max_age(Duration::seconds(-5));
        assert_eq!(config.ttl_millis(), 0);
    }

    #[test]
    fn test_same_site_display() {
        assert_eq!(SameSite::Strict.to_string(), "Strict");
        assert_eq!(SameSite::Lax.to_string(), "Lax");
        assert_eq!(SameSite::None.to_string(), "None");
    }
}
