//! Generic record operations: the raw store contract every collection
//! shares. Domain modules layer typed access and timestamping on top.

use super::ProDadStore;
use crate::error::{StorageError, StorageResult};
use crate::live::{ChangeEvent, ChangeKind};
use duckdb::params;
use prodad_model::Collection;
use serde_json::Value;

impl ProDadStore {
    /// Inserts a record, assigning the next id from the store sequence.
    /// The assigned id is merged into the stored document under `"id"`.
    pub fn add(&self, collection: Collection, record: &Value) -> StorageResult<i64> {
        let mut doc = record.clone();
        let obj = doc
            .as_object_mut()
            .ok_or_else(|| StorageError::InvalidRecord("record must be a JSON object".into()))?;

        let now = prodad_model::now_ms();
        let id: i64 = {
            let conn = self.lock_conn();
            let id: i64 =
                conn.query_row("SELECT nextval('record_ids')", [], |row| row.get(0))?;
            obj.insert("id".into(), Value::from(id));
            let data_json = serde_json::to_string(&doc)?;
            conn.execute(
                "INSERT INTO records (collection, id, data_json, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
                params![collection.name(), id, data_json, now, now],
            )?;
            id
        };

        self.emit(ChangeEvent::record(collection, ChangeKind::Added, Some(id)));
        Ok(id)
    }

    /// Fetches a single record by id.
    pub fn get(&self, collection: Collection, id: i64) -> StorageResult<Option<Value>> {
        let conn = self.lock_conn();
        let result = conn.query_row(
            "SELECT data_json FROM records WHERE collection = ? AND id = ?",
            params![collection.name(), id],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Merges `partial`'s top-level fields into the record. Returns rows
    /// affected: 0 when the id is absent (not an error; callers that
    /// care check the count, most don't).
    pub fn update(
        &self,
        collection: Collection,
        id: i64,
        partial: &Value,
    ) -> StorageResult<usize> {
        let affected = {
            let conn = self.lock_conn();
            let existing = conn.query_row(
                "SELECT data_json FROM records WHERE collection = ? AND id = ?",
                params![collection.name(), id],
                |row| row.get::<_, String>(0),
            );
            let raw = match existing {
                Ok(raw) => raw,
                Err(duckdb::Error::QueryReturnedNoRows) => return Ok(0),
                Err(e) => return Err(e.into()),
            };

            let mut doc: Value = serde_json::from_str(&raw)?;
            merge_top_level(&mut doc, partial);
            // The id column stays authoritative regardless of the partial.
            if let Some(obj) = doc.as_object_mut() {
                obj.insert("id".into(), Value::from(id));
            }
            let data_json = serde_json::to_string(&doc)?;
            conn.execute(
                "UPDATE records SET data_json = ?, updated_at = ? WHERE collection = ? AND id = ?",
                params![data_json, prodad_model::now_ms(), collection.name(), id],
            )?
        };

        if affected > 0 {
            self.emit(ChangeEvent::record(collection, ChangeKind::Updated, Some(id)));
        }
        Ok(affected)
    }

    /// Removes a record. Idempotent: deleting an absent id is not an error.
    pub fn delete(&self, collection: Collection, id: i64) -> StorageResult<()> {
        let affected = {
            let conn = self.lock_conn();
            conn.execute(
                "DELETE FROM records WHERE collection = ? AND id = ?",
                params![collection.name(), id],
            )?
        };
        if affected > 0 {
            self.emit(ChangeEvent::record(collection, ChangeKind::Deleted, Some(id)));
        }
        Ok(())
    }

    /// All records of a collection in insertion (id) order.
    pub fn list(&self, collection: Collection) -> StorageResult<Vec<Value>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT data_json FROM records WHERE collection = ? ORDER BY id ASC",
        )?;
        let rows: Vec<String> = stmt
            .query_map(params![collection.name()], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        drop(stmt);
        drop(conn);

        let mut out = Vec::with_capacity(rows.len());
        for raw in rows {
            out.push(serde_json::from_str(&raw)?);
        }
        Ok(out)
    }

    /// Records whose top-level `field` equals `value`. Fetches the
    /// collection and filters in Rust; collections here are a family's
    /// worth of rows, not an analytics workload.
    pub fn find(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> StorageResult<Vec<Value>> {
        Ok(self
            .list(collection)?
            .into_iter()
            .filter(|doc| doc.get(field) == Some(value))
            .collect())
    }

    /// Records matching an arbitrary predicate, in insertion order.
    pub fn filter<F>(&self, collection: Collection, predicate: F) -> StorageResult<Vec<Value>>
    where
        F: Fn(&Value) -> bool,
    {
        Ok(self
            .list(collection)?
            .into_iter()
            .filter(|doc| predicate(doc))
            .collect())
    }

    /// Deletes every record of one collection.
    pub fn clear(&self, collection: Collection) -> StorageResult<()> {
        {
            let conn = self.lock_conn();
            conn.execute(
                "DELETE FROM records WHERE collection = ?",
                params![collection.name()],
            )?;
        }
        self.emit(ChangeEvent::record(collection, ChangeKind::Cleared, None));
        Ok(())
    }

    /// Count of records in a collection.
    pub fn count(&self, collection: Collection) -> StorageResult<usize> {
        let conn = self.lock_conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?",
            params![collection.name()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Shallow merge: `partial`'s top-level keys overwrite `doc`'s.
fn merge_top_level(doc: &mut Value, partial: &Value) {
    if let (Some(target), Some(source)) = (doc.as_object_mut(), partial.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
}
