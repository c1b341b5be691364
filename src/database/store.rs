use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use super::id::DocumentId;
use crate::filter::{Filter, FilterError, Page};

/// A stored document body. The identifier lives beside it, never inside it.
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub body: Document,
}

/// Outcome of a partial update. `matched` counts documents selected by id and
/// guard, `modified` those whose body actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateResult {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Corrupt document in '{collection}': {message}")]
    CorruptDocument { collection: String, message: String },

    #[error("Store is shut down")]
    Closed,

    #[error("Duplicate value in '{collection}' violates {constraint}")]
    Duplicate { collection: String, constraint: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// The five document primitives consumed per collection, plus snapshot reads
/// and lifecycle hooks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents matching `filter`, in natural insertion order, paged.
    async fn find(&self, collection: &str, filter: &Filter, page: Page) -> Result<Vec<StoredDocument>, StoreError>;

    async fn find_by_id(&self, collection: &str, id: DocumentId) -> Result<Option<StoredDocument>, StoreError>;

    async fn insert_one(&self, collection: &str, body: Document) -> Result<DocumentId, StoreError>;

    /// Shallow-merges `set` into the document with `id` when it also satisfies `guard`.
    async fn update_one(
        &self,
        collection: &str,
        id: DocumentId,
        set: Document,
        guard: &Filter,
    ) -> Result<UpdateResult, StoreError>;

    /// Returns the number of removed documents (0 or 1).
    async fn delete_one(&self, collection: &str, id: DocumentId) -> Result<u64, StoreError>;

    /// Opens a read view in which consecutive finds observe one consistent state.
    async fn snapshot(&self) -> Result<Box<dyn ReadSnapshot + '_>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn shutdown(&self);
}

#[async_trait]
pub trait ReadSnapshot: Send {
    async fn find(&mut self, collection: &str, filter: &Filter, page: Page) -> Result<Vec<StoredDocument>, StoreError>;

    /// Releases the snapshot.
    async fn finish(self: Box<Self>) -> Result<(), StoreError>;
}

/// Merge used by every store so `modified` means the same thing everywhere.
pub(crate) fn merge_set(body: &mut Document, set: Document) -> bool {
    let mut changed = false;
    for (key, value) in set {
        if body.get(&key) != Some(&value) {
            body.insert(key, value);
            changed = true;
        }
    }
    changed
}
