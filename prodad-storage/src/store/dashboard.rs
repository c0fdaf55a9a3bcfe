//! Dashboard summary query: the "recent items" the home screen shows.

use super::ProDadStore;
use crate::error::StorageResult;
use prodad_model::{now_ms, CalendarEvent, Document, Reminder};

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;
const WIDGET_LIMIT: usize = 5;

/// The three dashboard widgets' contents.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentItems {
    /// Events starting within the next 7 days, soonest first.
    pub events: Vec<CalendarEvent>,
    /// Oldest-first active reminders.
    pub reminders: Vec<Reminder>,
    /// Most recently uploaded documents.
    pub documents: Vec<Document>,
}

impl ProDadStore {
    /// Gathers the dashboard widgets in one call, each list capped at 5.
    pub fn recent_items(&self) -> StorageResult<RecentItems> {
        let now = now_ms();

        let mut events = self.events_between(now, now + WEEK_MS)?;
        events.truncate(WIDGET_LIMIT);

        let mut reminders = self.active_reminders()?;
        reminders.truncate(WIDGET_LIMIT);

        let mut documents = self.all_documents()?;
        documents.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        documents.truncate(WIDGET_LIMIT);

        Ok(RecentItems {
            events,
            reminders,
            documents,
        })
    }
}
