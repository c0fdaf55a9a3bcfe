//! Singleton profile rows: the user and their partner.
//!
//! Each lives at a fixed well-known row id instead of "first row in the
//! collection", so a duplicate row can never silently shadow the profile.

use super::ProDadStore;
use crate::error::StorageResult;
use crate::live::{ChangeEvent, ChangeKind};
use duckdb::params;
use prodad_model::{now_ms, Collection, Partner, User};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// The one row id a singleton collection ever uses.
const SINGLETON_ID: i64 = 1;

impl ProDadStore {
    /// Saves the user profile: creates the row on first save, updates it
    /// in place afterwards. `updatedAt` is stamped either way.
    pub fn save_user(&self, mut user: User) -> StorageResult<i64> {
        user.id = Some(SINGLETON_ID);
        user.updated_at = now_ms();
        self.put_singleton(Collection::Users, &user)
    }

    pub fn get_user(&self) -> StorageResult<Option<User>> {
        self.get_singleton(Collection::Users)
    }

    pub fn save_partner(&self, mut partner: Partner) -> StorageResult<i64> {
        partner.id = Some(SINGLETON_ID);
        partner.updated_at = now_ms();
        self.put_singleton(Collection::Partners, &partner)
    }

    pub fn get_partner(&self) -> StorageResult<Option<Partner>> {
        self.get_singleton(Collection::Partners)
    }

    /// Upsert at the fixed row id. Bypasses the id sequence entirely:
    /// singleton rows never consume sequence values.
    fn put_singleton<T: Serialize>(&self, collection: Collection, record: &T) -> StorageResult<i64> {
        let existed;
        {
            let conn = self.lock_conn();
            let data_json = serde_json::to_string(record)?;
            let now = now_ms();
            existed = conn.execute(
                "UPDATE records SET data_json = ?, updated_at = ? WHERE collection = ? AND id = ?",
                params![data_json, now, collection.name(), SINGLETON_ID],
            )? > 0;
            if !existed {
                conn.execute(
                    "INSERT INTO records (collection, id, data_json, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
                    params![collection.name(), SINGLETON_ID, data_json, now, now],
                )?;
            }
        }
        let kind = if existed {
            ChangeKind::Updated
        } else {
            ChangeKind::Added
        };
        self.emit(ChangeEvent::record(collection, kind, Some(SINGLETON_ID)));
        Ok(SINGLETON_ID)
    }

    fn get_singleton<T: DeserializeOwned>(&self, collection: Collection) -> StorageResult<Option<T>> {
        self.get(collection, SINGLETON_ID)?
            .map(|doc| serde_json::from_value(doc).map_err(Into::into))
            .transpose()
    }
}
