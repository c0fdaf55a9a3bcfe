//! Store schema initialization.

use crate::error::StorageResult;
use duckdb::Connection;

/// Creates the store schema if it does not exist. Idempotent; runs on
/// every open.
pub(crate) fn initialize_store_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        -- Row id 1 is reserved for singleton profile rows, which are
        -- written at a fixed id and never draw from the sequence.
        CREATE SEQUENCE IF NOT EXISTS record_ids START 2;

        -- All integer-keyed collections share one table; `collection`
        -- discriminates, `data_json` holds the full record (id included).
        CREATE TABLE IF NOT EXISTS records (
            collection VARCHAR NOT NULL,
            id BIGINT NOT NULL,
            data_json TEXT NOT NULL,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL,
            PRIMARY KEY (collection, id)
        );
        CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection);
        CREATE INDEX IF NOT EXISTS idx_records_updated ON records(collection, updated_at DESC);

        -- Chat log is string-keyed and ordered by timestamp.
        CREATE TABLE IF NOT EXISTS chat_messages (
            id VARCHAR PRIMARY KEY,
            content TEXT NOT NULL,
            sender VARCHAR NOT NULL,
            ts BIGINT NOT NULL,
            reaction VARCHAR
        );
        CREATE INDEX IF NOT EXISTS idx_chat_ts ON chat_messages(ts);
        "#,
    )?;
    Ok(())
}
