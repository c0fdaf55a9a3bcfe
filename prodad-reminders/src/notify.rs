//! Notification side-effect seam.
//!
//! The scheduler never talks to a platform notification API directly; it
//! goes through this trait so the delivery mechanism (and tests) can be
//! swapped. Permission denial is non-fatal: scheduling is skipped
//! silently and the reminder still exists in the store.

/// Delivers OS-level notifications and reports permission state.
pub trait NotificationSink: Send + Sync + 'static {
    /// Whether the platform permits showing notifications. Checked before
    /// each delivery; a denial suppresses the notification only.
    fn has_permission(&self) -> bool;

    /// Fire-and-forget delivery. Failures are the sink's to log; the
    /// scheduler does not retry.
    fn notify(&self, title: &str, body: &str);
}

/// Default sink: logs deliveries through `tracing`. Stands in wherever no
/// platform integration is wired up.
#[derive(Debug, Default, Clone)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn has_permission(&self) -> bool {
        true
    }

    fn notify(&self, title: &str, body: &str) {
        tracing::info!(title, body, "reminder notification");
    }
}
