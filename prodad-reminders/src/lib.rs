//! Reminder notification scheduling for ProDad.
//!
//! Decides, for each active reminder, whether a local notification should
//! be scheduled now, fired immediately as catch-up, or left alone, and
//! records delivery in the store's tracker collection so a due reminder
//! fires at most once per session.
//!
//! Timers are in-memory only. The persisted `scheduled`/`delivered` flags
//! are the source of truth; on every start the policy re-derives timers
//! from the reminder list, so a restart loses nothing but pending sleeps.

mod error;
mod notify;
mod policy;
mod scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use notify::{NotificationSink, TracingSink};
pub use policy::{DueAction, DuePolicy};
pub use scheduler::{
    create_scheduler, ReminderScheduler, SchedulerCommand, SchedulerConfig, SchedulerHandle,
};
