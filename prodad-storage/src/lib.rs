//! DuckDB storage layer for ProDad.
//!
//! One local database holds every collection of the app: calendar events,
//! reminders, documents, reminder-notification trackers, the singleton
//! user/partner profiles, and the chat log. Records are stored as JSON
//! documents in a single `records` table keyed by (collection, id), with
//! ids drawn from a sequence; chat messages get their own string-keyed
//! table.
//!
//! # Architecture
//!
//! - `ProDadStore` wraps one connection behind a mutex; writes serialize,
//!   reads fetch rows and filter in Rust
//! - Every mutation emits a [`ChangeEvent`] on a broadcast bus so readers
//!   can re-run their queries instead of polling
//! - Domain access functions (timestamping, singleton upserts, cascade
//!   deletes) live in per-collection modules layered on the generic core

mod error;
mod live;
mod schema;
mod store;

pub use error::{StorageError, StorageResult};
pub use live::{ChangeEvent, ChangeKind, ChangedCollection};
pub use store::dashboard::RecentItems;
pub use store::{ProDadStore, StoreConfig};

/// Open a DuckDB connection with stale WAL recovery and resource limits.
///
/// If the initial open fails and a `.wal` file exists alongside the
/// database, it is removed and the open is retried once. This handles an
/// unclean shutdown leaving a WAL file that prevents reopening. A failure
/// past that point is fatal for the session (the app surfaces a blocking
/// error screen), so no further recovery is attempted here.
pub fn open_duckdb_with_wal_recovery(
    path: &std::path::Path,
    memory_limit: &str,
    threads: u32,
) -> StorageResult<duckdb::Connection> {
    let conn = match duckdb::Connection::open(path) {
        Ok(c) => c,
        Err(first_err) => {
            let wal_path = path.with_extension(
                path.extension()
                    .map(|ext| format!("{}.wal", ext.to_string_lossy()))
                    .unwrap_or_else(|| "wal".to_string()),
            );
            if wal_path.exists() {
                tracing::warn!(
                    "DuckDB open failed, removing stale WAL and retrying: {}",
                    wal_path.display()
                );
                if std::fs::remove_file(&wal_path).is_ok() {
                    let c = duckdb::Connection::open(path)?;
                    apply_resource_limits(&c, memory_limit, threads)?;
                    return Ok(c);
                }
            }
            return Err(first_err.into());
        }
    };
    apply_resource_limits(&conn, memory_limit, threads)?;
    Ok(conn)
}

/// Apply memory and thread limits to a DuckDB connection.
///
/// DuckDB defaults to ~80% of system RAM and all cores, far too aggressive
/// for a store that mostly holds a family's reminders.
fn apply_resource_limits(
    conn: &duckdb::Connection,
    memory_limit: &str,
    threads: u32,
) -> StorageResult<()> {
    conn.execute_batch(&format!(
        "PRAGMA memory_limit='{}'; PRAGMA threads={};",
        memory_limit, threads
    ))?;
    Ok(())
}
