//! Route guard and demo login session.
//!
//! This is a UI gate, not a security boundary: everything of value lives
//! in the local store on the user's own device, so the "session" is just
//! a marker cookie the guard checks before rendering protected routes.

use tracing::debug;

/// Name of the session marker cookie.
pub const AUTH_COOKIE: &str = "isAuthenticated";

/// Demo credential accepted by [`login`].
const DEMO_EMAIL: &str = "demo@prodad.app";
const DEMO_PASSWORD: &str = "prodad-demo";

/// Seven days, matching the cookie lifetime of the login session.
const SESSION_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// Routes reachable without a session.
const PUBLIC_ROUTES: &[&str] = &["/login"];

/// Outcome of guarding a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectToLogin,
}

/// A `Set-Cookie` value to hand back to the shell after login/logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    /// Zero clears the cookie.
    pub max_age_secs: i64,
}

impl SetCookie {
    /// Renders the `Set-Cookie` header value.
    pub fn header_value(&self) -> String {
        format!(
            "{}={}; Max-Age={}; Path=/; Secure; SameSite=Strict",
            self.name, self.value, self.max_age_secs
        )
    }
}

/// Decides whether `path` may render given the request's `Cookie` header.
///
/// Public routes and asset-style paths are always allowed; everything
/// else requires the session marker cookie set to `true`. The decision is
/// a pure function of its inputs.
pub fn guard(path: &str, cookie_header: Option<&str>) -> RouteDecision {
    if PUBLIC_ROUTES.contains(&path) || is_asset_path(path) {
        return RouteDecision::Allow;
    }

    let authenticated = cookie_header
        .and_then(|header| cookie_value(header, AUTH_COOKIE))
        .map(|v| v == "true")
        .unwrap_or(false);

    if authenticated {
        RouteDecision::Allow
    } else {
        debug!(path, "unauthenticated navigation, redirecting to login");
        RouteDecision::RedirectToLogin
    }
}

/// Checks the demo credential. Success yields the session cookie with a
/// 7-day lifetime; anything else yields `None`.
pub fn login(email: &str, password: &str) -> Option<SetCookie> {
    if email == DEMO_EMAIL && password == DEMO_PASSWORD {
        Some(SetCookie {
            name: AUTH_COOKIE.to_string(),
            value: "true".to_string(),
            max_age_secs: SESSION_MAX_AGE_SECS,
        })
    } else {
        None
    }
}

/// Yields the cookie that clears the session.
pub fn logout() -> SetCookie {
    SetCookie {
        name: AUTH_COOKIE.to_string(),
        value: String::new(),
        max_age_secs: 0,
    }
}

/// Extracts a cookie's value from a `Cookie` request header.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k.trim() == name).then(|| v.trim())
    })
}

/// Static files, API routes, and framework internals bypass the guard.
fn is_asset_path(path: &str) -> bool {
    if path.starts_with("/api/") || path.starts_with("/_next/") {
        return true;
    }
    path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_parses_multi_cookie_headers() {
        let header = "theme=dark; isAuthenticated=true; lang=en";
        assert_eq!(cookie_value(header, "isAuthenticated"), Some("true"));
        assert_eq!(cookie_value(header, "theme"), Some("dark"));
        assert_eq!(cookie_value(header, "missing"), None);
    }

    #[test]
    fn cookie_value_ignores_prefix_matches() {
        assert_eq!(cookie_value("isAuthenticatedX=true", "isAuthenticated"), None);
    }

    #[test]
    fn asset_paths_bypass_the_guard() {
        assert!(is_asset_path("/manifest.json"));
        assert!(is_asset_path("/icons/icon-192.png"));
        assert!(is_asset_path("/api/health"));
        assert!(is_asset_path("/_next/static/chunk.js"));
        assert!(!is_asset_path("/dashboard"));
    }
}
