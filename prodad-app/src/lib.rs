//! Application-facing pieces that sit on top of the store: the route
//! guard with its demo login cookie, and the scripted chat assistant.

pub mod assistant;
pub mod auth;

pub use assistant::{respond, ChatSession};
pub use auth::{guard, login, logout, RouteDecision, SetCookie, AUTH_COOKIE};

/// Installs the process-wide log subscriber. `RUST_LOG` overrides the
/// default `info` filter. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
