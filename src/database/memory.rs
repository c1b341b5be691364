use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{OwnedRwLockReadGuard, RwLock};

use super::id::DocumentId;
use super::store::{merge_set, Document, DocumentStore, ReadSnapshot, StoreError, StoredDocument, UpdateResult};
use crate::filter::{Filter, Page};

type Collections = HashMap<String, Vec<StoredDocument>>;

/// Process-local document store. Used by `serve --in-memory` and by tests,
/// which also read [`MemoryDocumentStore::calls`] to assert that a request
/// never reached storage.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<Collections>>,
    calls: AtomicUsize,
    closed: AtomicBool,
    unique_text_fields: Vec<(String, String)>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes that would give two documents of `collection` the same
    /// `field` value, compared case-insensitively.
    pub fn with_unique_text_fields(mut self, fields: &[(&str, &str)]) -> Self {
        self.unique_text_fields = fields.iter().map(|(c, f)| (c.to_string(), f.to_string())).collect();
        self
    }

    /// Number of storage primitives invoked so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn check_unique(&self, documents: &[StoredDocument], collection: &str, id: DocumentId, body: &Document) -> Result<(), StoreError> {
        let lowered = |doc: &Document, field: &str| doc.get(field).and_then(Value::as_str).map(str::to_lowercase);
        for (_, field) in self.unique_text_fields.iter().filter(|(c, _)| c == collection) {
            let Some(value) = lowered(body, field) else {
                continue;
            };
            if documents.iter().any(|d| d.id != id && lowered(&d.body, field).as_ref() == Some(&value)) {
                return Err(StoreError::Duplicate {
                    collection: collection.to_string(),
                    constraint: format!("{}_{}_key", collection, field),
                });
            }
        }
        Ok(())
    }
}

fn select(collections: &Collections, collection: &str, filter: &Filter, page: Page) -> Result<Vec<StoredDocument>, StoreError> {
    filter.validate()?;
    let Some(documents) = collections.get(collection) else {
        return Ok(vec![]);
    };
    let matching = documents.iter().filter(|d| filter.matches(&d.id, &d.body)).cloned();
    Ok(page.slice(matching))
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find(&self, collection: &str, filter: &Filter, page: Page) -> Result<Vec<StoredDocument>, StoreError> {
        self.enter()?;
        let collections = self.collections.read().await;
        select(&collections, collection, filter, page)
    }

    async fn find_by_id(&self, collection: &str, id: DocumentId) -> Result<Option<StoredDocument>, StoreError> {
        self.enter()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned())
    }

    async fn insert_one(&self, collection: &str, body: Document) -> Result<DocumentId, StoreError> {
        self.enter()?;
        let id = DocumentId::generate();
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();
        self.check_unique(documents, collection, id, &body)?;
        documents.push(StoredDocument { id, body });
        Ok(id)
    }

    async fn update_one(
        &self,
        collection: &str,
        id: DocumentId,
        set: Document,
        guard: &Filter,
    ) -> Result<UpdateResult, StoreError> {
        self.enter()?;
        guard.validate()?;
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(UpdateResult::default());
        };
        let Some(index) = documents.iter().position(|d| d.id == id && guard.matches(&d.id, &d.body)) else {
            return Ok(UpdateResult::default());
        };

        let mut merged = documents[index].body.clone();
        if !merge_set(&mut merged, set) {
            return Ok(UpdateResult { matched: 1, modified: 0 });
        }
        self.check_unique(documents, collection, id, &merged)?;
        documents[index].body = merged;
        Ok(UpdateResult { matched: 1, modified: 1 })
    }

    async fn delete_one(&self, collection: &str, id: DocumentId) -> Result<u64, StoreError> {
        self.enter()?;
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = documents.len();
        documents.retain(|d| d.id != id);
        Ok((before - documents.len()) as u64)
    }

    async fn snapshot(&self) -> Result<Box<dyn ReadSnapshot + '_>, StoreError> {
        self.enter()?;
        let guard = self.collections.clone().read_owned().await;
        Ok(Box::new(MemorySnapshot { guard, store: self }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        tracing::info!("In-memory document store closed");
    }
}

/// Holds the read lock for its lifetime, so writers wait until it is finished.
struct MemorySnapshot<'a> {
    guard: OwnedRwLockReadGuard<Collections>,
    store: &'a MemoryDocumentStore,
}

#[async_trait]
impl ReadSnapshot for MemorySnapshot<'_> {
    async fn find(&mut self, collection: &str, filter: &Filter, page: Page) -> Result<Vec<StoredDocument>, StoreError> {
        self.store.enter()?;
        select(&self.guard, collection, filter, page)
    }

    async fn finish(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_then_find_preserves_insertion_order() {
        let store = MemoryDocumentStore::new();
        for n in 0..5 {
            store.insert_one("symptoms", body(json!({ "n": n }))).await.unwrap();
        }
        let docs = store.find("symptoms", &Filter::all(), Page { limit: 3, offset: 1 }).await.unwrap();
        let ns: Vec<_> = docs.iter().map(|d| d.body["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn update_distinguishes_matched_from_modified() {
        let store = MemoryDocumentStore::new();
        let id = store.insert_one("paps", body(json!({ "revision": 0, "allowPublic": false }))).await.unwrap();

        let noop = store
            .update_one("paps", id, body(json!({ "allowPublic": false })), &Filter::all())
            .await
            .unwrap();
        assert_eq!(noop, UpdateResult { matched: 1, modified: 0 });

        let stale = store
            .update_one("paps", id, body(json!({ "allowPublic": true })), &Filter::all().eq("revision", 7))
            .await
            .unwrap();
        assert_eq!(stale, UpdateResult::default());

        let applied = store
            .update_one("paps", id, body(json!({ "allowPublic": true })), &Filter::all().eq("revision", 0))
            .await
            .unwrap();
        assert_eq!(applied, UpdateResult { matched: 1, modified: 1 });
    }

    #[tokio::test]
    async fn unique_text_fields_ignore_case() {
        let store = MemoryDocumentStore::new().with_unique_text_fields(&[("users", "email")]);
        store.insert_one("users", body(json!({ "email": "an@example.com" }))).await.unwrap();
        let other = store.insert_one("users", body(json!({ "email": "binh@example.com" }))).await.unwrap();

        let dup = store.insert_one("users", body(json!({ "email": "AN@example.com" }))).await;
        assert!(matches!(dup, Err(StoreError::Duplicate { .. })));

        let steal = store
            .update_one("users", other, body(json!({ "email": "an@example.com" })), &Filter::all())
            .await;
        assert!(matches!(steal, Err(StoreError::Duplicate { .. })));

        // rewriting a document's own value is fine
        let same = store
            .update_one("users", other, body(json!({ "email": "Binh@example.com" })), &Filter::all())
            .await
            .unwrap();
        assert_eq!(same, UpdateResult { matched: 1, modified: 1 });

        // other collections are unaffected
        store.insert_one("symptoms", body(json!({ "email": "an@example.com" }))).await.unwrap();
    }

    #[tokio::test]
    async fn delete_reports_count_and_counts_calls() {
        let store = MemoryDocumentStore::new();
        let id = store.insert_one("allergens", Document::new()).await.unwrap();
        assert_eq!(store.delete_one("allergens", id).await.unwrap(), 1);
        assert_eq!(store.delete_one("allergens", id).await.unwrap(), 0);
        assert_eq!(store.calls(), 3);
    }

    #[tokio::test]
    async fn snapshot_reads_and_shutdown_closes() {
        let store = MemoryDocumentStore::new();
        store.insert_one("allergies", Document::new()).await.unwrap();
        let mut snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.find("allergies", &Filter::all(), Page::default()).await.unwrap().len(), 1);
        snapshot.finish().await.unwrap();

        store.shutdown().await;
        assert!(matches!(store.ping().await, Err(StoreError::Closed)));
        assert!(store.find("allergies", &Filter::all(), Page::default()).await.is_err());
    }
}
