//! Reminder and notification-tracker access functions.
//!
//! The tracker (`reminderNotifications`) is a satellite collection: at
//! most one row per reminder, created lazily the first time a reminder is
//! scheduled or fired. Deleting a reminder cascades to its tracker row.

use super::ProDadStore;
use crate::error::StorageResult;
use prodad_model::{now_ms, Collection, Reminder, ReminderNotification};
use serde_json::{json, Value};
use tracing::debug;

impl ProDadStore {
    /// Adds a reminder. New reminders start not completed, unsynced, with
    /// fresh `createdAt`/`updatedAt` stamps.
    pub fn add_reminder(&self, mut reminder: Reminder) -> StorageResult<i64> {
        let now = now_ms();
        reminder.id = None;
        reminder.completed = false;
        reminder.synced = false;
        reminder.created_at = now;
        reminder.updated_at = now;
        self.add(Collection::Reminders, &serde_json::to_value(&reminder)?)
    }

    /// Merges `changes` (camelCase fields), re-stamping `updatedAt` and
    /// resetting `synced`. Returns rows affected.
    pub fn update_reminder(&self, id: i64, changes: &Value) -> StorageResult<usize> {
        self.update_stamped(Collection::Reminders, id, changes)
    }

    /// Toggles completion. Idempotent: completing a completed reminder is
    /// another stamped update, nothing more.
    pub fn complete_reminder(&self, id: i64, completed: bool) -> StorageResult<usize> {
        self.update_stamped(Collection::Reminders, id, &json!({ "completed": completed }))
    }

    /// Deletes a reminder and cascades to its tracker row. Two sequential
    /// deletes, not a transaction: a crash in between leaves an orphaned
    /// tracker row (unenforced invariant, tolerated).
    pub fn delete_reminder(&self, id: i64) -> StorageResult<()> {
        self.delete(Collection::Reminders, id)?;
        self.delete_tracker_for_reminder(id)?;
        debug!(reminder_id = id, "reminder deleted with cascade");
        Ok(())
    }

    pub fn get_reminder(&self, id: i64) -> StorageResult<Option<Reminder>> {
        self.get(Collection::Reminders, id)?
            .map(|doc| serde_json::from_value(doc).map_err(Into::into))
            .transpose()
    }

    pub fn all_reminders(&self) -> StorageResult<Vec<Reminder>> {
        decode_reminders(self.list(Collection::Reminders)?)
    }

    /// Non-completed reminders, insertion order.
    pub fn active_reminders(&self) -> StorageResult<Vec<Reminder>> {
        decode_reminders(self.find(Collection::Reminders, "completed", &Value::Bool(false))?)
    }

    /// Active reminders due today, local time.
    pub fn today_reminders(&self) -> StorageResult<Vec<Reminder>> {
        use chrono::{Duration, Local};
        let midnight = Local::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|start| start.and_local_timezone(Local).single())
            .map(|start| start.timestamp_millis())
            .unwrap_or_else(now_ms);
        let tomorrow = midnight + Duration::days(1).num_milliseconds();
        self.reminders_due_between(midnight, tomorrow)
    }

    /// Active reminders due in `[day_start, day_end)`. Callers supply the
    /// bounds (the dashboard uses local midnight to midnight).
    pub fn reminders_due_between(&self, day_start: i64, day_end: i64) -> StorageResult<Vec<Reminder>> {
        decode_reminders(self.filter(Collection::Reminders, |doc| {
            let completed = doc
                .get("completed")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let due = doc.get("date").and_then(Value::as_i64).unwrap_or(0);
            !completed && due >= day_start && due < day_end
        })?)
    }

    // ── Notification trackers ────────────────────────────────────

    /// The tracker row for a reminder, if one exists.
    pub fn tracker_for_reminder(
        &self,
        reminder_id: i64,
    ) -> StorageResult<Option<ReminderNotification>> {
        let rows = self.find(
            Collection::ReminderNotifications,
            "reminderId",
            &Value::from(reminder_id),
        )?;
        rows.into_iter()
            .next()
            .map(|doc| serde_json::from_value(doc).map_err(Into::into))
            .transpose()
    }

    /// Creates or replaces the tracker row for `tracker.reminder_id`,
    /// keeping the one-row-per-reminder invariant. Returns the row id.
    pub fn upsert_tracker(&self, tracker: &ReminderNotification) -> StorageResult<i64> {
        match self.tracker_for_reminder(tracker.reminder_id)? {
            Some(existing) => {
                let id = existing.id.unwrap_or_default();
                let mut doc = serde_json::to_value(tracker)?;
                if let Some(obj) = doc.as_object_mut() {
                    obj.remove("id");
                }
                self.update(Collection::ReminderNotifications, id, &doc)?;
                Ok(id)
            }
            None => {
                let mut row = tracker.clone();
                row.id = None;
                self.add(
                    Collection::ReminderNotifications,
                    &serde_json::to_value(&row)?,
                )
            }
        }
    }

    /// Flips the delivered flag on a reminder's tracker row. Returns rows
    /// affected (0 when no tracker exists yet).
    pub fn mark_tracker_delivered(&self, reminder_id: i64, delivered: bool) -> StorageResult<usize> {
        match self.tracker_for_reminder(reminder_id)? {
            Some(tracker) => self.update(
                Collection::ReminderNotifications,
                tracker.id.unwrap_or_default(),
                &json!({ "delivered": delivered }),
            ),
            None => Ok(0),
        }
    }

    /// Tracker rows not yet delivered.
    pub fn pending_trackers(&self) -> StorageResult<Vec<ReminderNotification>> {
        self.find(
            Collection::ReminderNotifications,
            "delivered",
            &Value::Bool(false),
        )?
        .into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(Into::into))
        .collect()
    }

    /// Removes the tracker row(s) for a reminder. Idempotent.
    pub fn delete_tracker_for_reminder(&self, reminder_id: i64) -> StorageResult<()> {
        let rows = self.find(
            Collection::ReminderNotifications,
            "reminderId",
            &Value::from(reminder_id),
        )?;
        for doc in rows {
            if let Some(id) = doc.get("id").and_then(Value::as_i64) {
                self.delete(Collection::ReminderNotifications, id)?;
            }
        }
        Ok(())
    }
}

fn decode_reminders(docs: Vec<Value>) -> StorageResult<Vec<Reminder>> {
    docs.into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(Into::into))
        .collect()
}
