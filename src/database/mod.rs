pub mod id;
pub mod memory;
pub mod postgres;
pub mod store;

pub use id::{DocumentId, InvalidDocumentId};
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use store::{Document, DocumentStore, ReadSnapshot, StoreError, StoredDocument, UpdateResult};
