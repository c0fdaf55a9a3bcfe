use prodad_app::auth::{cookie_value, guard, login, logout, RouteDecision, AUTH_COOKIE};
use pretty_assertions::assert_eq;

// ── Route guard ──────────────────────────────────────────────────

#[test]
fn login_route_is_always_public() {
    assert_eq!(guard("/login", None), RouteDecision::Allow);
    assert_eq!(guard("/login", Some("isAuthenticated=false")), RouteDecision::Allow);
    assert_eq!(guard("/login", Some("isAuthenticated=true")), RouteDecision::Allow);
}

#[test]
fn protected_routes_require_the_session_cookie() {
    for path in ["/", "/dashboard", "/reminders", "/documents", "/ask-ai"] {
        assert_eq!(guard(path, None), RouteDecision::RedirectToLogin);
        assert_eq!(
            guard(path, Some("theme=dark; isAuthenticated=true")),
            RouteDecision::Allow
        );
    }
}

#[test]
fn only_the_exact_true_value_authenticates() {
    assert_eq!(guard("/", Some("isAuthenticated=false")), RouteDecision::RedirectToLogin);
    assert_eq!(guard("/", Some("isAuthenticated=True")), RouteDecision::RedirectToLogin);
    assert_eq!(guard("/", Some("isAuthenticated=")), RouteDecision::RedirectToLogin);
    assert_eq!(guard("/", Some("other=true")), RouteDecision::RedirectToLogin);
}

#[test]
fn guard_is_deterministic() {
    let cases = [
        ("/", Some("isAuthenticated=true")),
        ("/reminders", None),
        ("/login", None),
    ];
    for (path, header) in cases {
        let first = guard(path, header);
        for _ in 0..10 {
            assert_eq!(guard(path, header), first);
        }
    }
}

// ── Demo login ───────────────────────────────────────────────────

#[test]
fn demo_credential_yields_a_week_long_session() {
    let cookie = login("demo@prodad.app", "prodad-demo").unwrap();
    assert_eq!(cookie.name, AUTH_COOKIE);
    assert_eq!(cookie.value, "true");
    assert_eq!(cookie.max_age_secs, 7 * 24 * 60 * 60);

    let header = cookie.header_value();
    assert!(header.starts_with("isAuthenticated=true; Max-Age=604800"));
    assert!(header.contains("SameSite=Strict"));
}

#[test]
fn wrong_credentials_are_rejected() {
    assert!(login("demo@prodad.app", "wrong").is_none());
    assert!(login("someone@else.example", "prodad-demo").is_none());
    assert!(login("", "").is_none());
}

#[test]
fn login_cookie_satisfies_the_guard_and_logout_clears_it() {
    let session = login("demo@prodad.app", "prodad-demo").unwrap();
    let header = format!("{}={}", session.name, session.value);
    assert_eq!(guard("/dashboard", Some(&header)), RouteDecision::Allow);

    let cleared = logout();
    assert_eq!(cleared.max_age_secs, 0);
    assert_eq!(
        cookie_value(&format!("{}={}", cleared.name, cleared.value), AUTH_COOKIE),
        Some("")
    );
    assert_eq!(
        guard("/dashboard", Some(&format!("{}={}", cleared.name, cleared.value))),
        RouteDecision::RedirectToLogin
    );
}
