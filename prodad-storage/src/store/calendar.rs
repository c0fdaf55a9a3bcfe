//! Calendar event access functions.

use super::ProDadStore;
use crate::error::StorageResult;
use prodad_model::{now_ms, CalendarEvent, Collection};
use serde_json::Value;

impl ProDadStore {
    /// Adds an event, stamping `createdAt`/`updatedAt` and `synced = false`.
    /// The store does not enforce `start <= end`; that is a caller concern.
    pub fn add_event(&self, mut event: CalendarEvent) -> StorageResult<i64> {
        let now = now_ms();
        event.id = None;
        event.created_at = now;
        event.updated_at = now;
        event.synced = false;
        self.add(Collection::CalendarEvents, &serde_json::to_value(&event)?)
    }

    /// Merges `changes` (camelCase fields) into the event, re-stamping
    /// `updatedAt` and resetting `synced`. Returns rows affected.
    pub fn update_event(&self, id: i64, changes: &Value) -> StorageResult<usize> {
        self.update_stamped(Collection::CalendarEvents, id, changes)
    }

    pub fn delete_event(&self, id: i64) -> StorageResult<()> {
        self.delete(Collection::CalendarEvents, id)
    }

    pub fn get_event(&self, id: i64) -> StorageResult<Option<CalendarEvent>> {
        self.get(Collection::CalendarEvents, id)?
            .map(|doc| serde_json::from_value(doc).map_err(Into::into))
            .transpose()
    }

    /// All events in insertion order.
    pub fn all_events(&self) -> StorageResult<Vec<CalendarEvent>> {
        decode_events(self.list(Collection::CalendarEvents)?)
    }

    /// Events starting in `[from, to)`, ordered by start.
    pub fn events_between(&self, from: i64, to: i64) -> StorageResult<Vec<CalendarEvent>> {
        let mut events = decode_events(self.filter(Collection::CalendarEvents, |doc| {
            doc.get("start")
                .and_then(Value::as_i64)
                .map(|start| start >= from && start < to)
                .unwrap_or(false)
        })?)?;
        events.sort_by_key(|e| e.start);
        Ok(events)
    }
}

fn decode_events(docs: Vec<Value>) -> StorageResult<Vec<CalendarEvent>> {
    docs.into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(Into::into))
        .collect()
}
