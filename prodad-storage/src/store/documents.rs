//! Document access functions.

use super::ProDadStore;
use crate::error::StorageResult;
use prodad_model::{now_ms, Collection, Document, DocumentType};
use serde_json::Value;

impl ProDadStore {
    /// Adds a document, stamping `uploadDate`/`updatedAt` and
    /// `synced = false`. File contents arrive already base64-encoded;
    /// a failed file read never reaches this layer.
    pub fn add_document(&self, mut document: Document) -> StorageResult<i64> {
        let now = now_ms();
        document.id = None;
        document.upload_date = now;
        document.updated_at = now;
        document.synced = false;
        self.add(Collection::Documents, &serde_json::to_value(&document)?)
    }

    /// Merges `changes` (camelCase fields), re-stamping `updatedAt` and
    /// resetting `synced`. `uploadDate` is never re-stamped.
    pub fn update_document(&self, id: i64, changes: &Value) -> StorageResult<usize> {
        self.update_stamped(Collection::Documents, id, changes)
    }

    pub fn delete_document(&self, id: i64) -> StorageResult<()> {
        self.delete(Collection::Documents, id)
    }

    pub fn get_document(&self, id: i64) -> StorageResult<Option<Document>> {
        self.get(Collection::Documents, id)?
            .map(|doc| serde_json::from_value(doc).map_err(Into::into))
            .transpose()
    }

    pub fn all_documents(&self) -> StorageResult<Vec<Document>> {
        decode_documents(self.list(Collection::Documents)?)
    }

    /// Documents of one type, insertion order.
    pub fn documents_of_type(&self, doc_type: DocumentType) -> StorageResult<Vec<Document>> {
        let wanted = serde_json::to_value(doc_type)?;
        decode_documents(self.find(Collection::Documents, "type", &wanted)?)
    }

    /// Case-insensitive substring match over title, description, and file
    /// name, serving the document list's search box.
    pub fn search_documents(&self, query: &str) -> StorageResult<Vec<Document>> {
        let needle = query.to_lowercase();
        decode_documents(self.filter(Collection::Documents, |doc| {
            ["title", "description", "fileName"].iter().any(|field| {
                doc.get(*field)
                    .and_then(Value::as_str)
                    .map(|s| s.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
        })?)
    }
}

fn decode_documents(docs: Vec<Value>) -> StorageResult<Vec<Document>> {
    docs.into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(Into::into))
        .collect()
}
