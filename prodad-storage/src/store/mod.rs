//! Core store: thread-safe DuckDB wrapper with per-collection operations.

mod calendar;
mod chat;
pub(crate) mod dashboard;
mod documents;
mod profile;
mod records;
mod reminders;

use crate::error::StorageResult;
use crate::live::{ChangeEvent, ChangeKind};
use crate::schema::initialize_store_schema;
use duckdb::Connection;
use prodad_model::Collection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

/// Capacity of the change bus. A lagging subscriber misses events and
/// should re-fetch; live queries re-run the whole query anyway.
const CHANGE_BUS_CAPACITY: usize = 256;

/// Resource limits applied to the embedded database on open.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub memory_limit: String,
    pub threads: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            memory_limit: "256MB".to_string(),
            threads: 2,
        }
    }
}

/// The ProDad local document store.
///
/// One connection behind a mutex; operations are serialized per store.
/// Cloning shares the connection and the change bus.
#[derive(Clone)]
pub struct ProDadStore {
    conn: Arc<Mutex<Connection>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl ProDadStore {
    /// Opens or creates the store at the given path with default limits.
    pub fn open(path: &Path) -> StorageResult<Self> {
        Self::open_with_config(path, &StoreConfig::default())
    }

    /// Opens or creates the store with explicit resource limits.
    pub fn open_with_config(path: &Path, config: &StoreConfig) -> StorageResult<Self> {
        let conn =
            crate::open_duckdb_with_wal_recovery(path, &config.memory_limit, config.threads)?;
        initialize_store_schema(&conn)?;
        Ok(Self::from_conn(conn))
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_store_schema(&conn)?;
        Ok(Self::from_conn(conn))
    }

    fn from_conn(conn: Connection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUS_CAPACITY);
        Self {
            conn: Arc::new(Mutex::new(conn)),
            changes,
        }
    }

    /// Subscribes to store mutations. Each subscriber gets every change
    /// emitted after the call; on lag, re-fetch and resubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    /// Acquire the connection lock, recovering from poison so one panicked
    /// writer does not wedge the whole store.
    pub(crate) fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            tracing::error!("recovering from poisoned store mutex");
            poisoned.into_inner()
        })
    }

    /// Emit a change; no receivers is fine.
    pub(crate) fn emit(&self, event: ChangeEvent) {
        let _ = self.changes.send(event);
    }

    /// Clears every collection and the chat log, the "clear all data"
    /// settings action.
    pub fn clear_all(&self) -> StorageResult<()> {
        {
            let conn = self.lock_conn();
            conn.execute_batch("DELETE FROM records; DELETE FROM chat_messages;")?;
        }
        for collection in Collection::all() {
            self.emit(ChangeEvent::record(collection, ChangeKind::Cleared, None));
        }
        self.emit(ChangeEvent::chat(ChangeKind::Cleared));
        tracing::info!("all store data cleared");
        Ok(())
    }
}

impl ProDadStore {
    /// Domain-layer update: merges `partial` then re-stamps `updatedAt`
    /// and resets `synced`, the rule every collection's update shares.
    pub(crate) fn update_stamped(
        &self,
        collection: Collection,
        id: i64,
        partial: &serde_json::Value,
    ) -> StorageResult<usize> {
        let prev = self
            .get(collection, id)?
            .and_then(|doc| doc.get("updatedAt").and_then(serde_json::Value::as_i64))
            .unwrap_or(0);

        let mut merged = partial.clone();
        if let Some(obj) = merged.as_object_mut() {
            obj.insert("updatedAt".into(), next_stamp(prev).into());
            obj.insert("synced".into(), false.into());
        }
        self.update(collection, id, &merged)
    }
}

/// Next `updatedAt` stamp: strictly after the previous one even when two
/// updates land in the same millisecond.
pub(crate) fn next_stamp(prev: i64) -> i64 {
    prodad_model::now_ms().max(prev + 1)
}
