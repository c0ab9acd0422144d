//! Storage module for resource collections
//!
//! Provides functionality for:
//! - An abstract collection store (`CollectionStore`) that the query engine
//!   and the auth service talk to
//! - Filter, sort, projection and relation descriptions understood by stores
//! - A chainable `find` cursor (`sort`, `select`, `skip`, `limit`, `populate`)
//! - An in-memory implementation with unique indexes

pub mod cursor;
pub mod filter;
pub mod memory;
pub mod timestamp;

pub use cursor::{CollectionStoreExt, Find};
pub use filter::{Condition, Direction, Filter, FindOptions, Op, Projection, Relation, SortKey};
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored record: a JSON object carrying a string `id`.
pub type Document = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Duplicate value for {fields} in {collection}")]
    Duplicate { collection: String, fields: String },

    #[error("Document is not a JSON object")]
    NotAnObject,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Collection-oriented persistence used by every resource.
///
/// Implementations must apply `filter` identically in `fetch` and `count` so a
/// page and its total describe the same record set.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Filtered, sorted, windowed, projected and relation-expanded read.
    async fn fetch(&self, collection: &str, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>>;

    /// Number of records matching `filter`, ignoring any window.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64>;

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Insert a record, assigning `id` and `createdAt` when absent.
    async fn insert(&self, collection: &str, document: Document) -> Result<Document>;

    /// Shallow merge of `patch` into the record. A `null` value removes the key.
    async fn update(&self, collection: &str, id: &str, patch: Document) -> Result<Option<Document>>;

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64>;
}

/// Serialize a typed record into a store document.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StorageError::NotAnObject),
    }
}

/// Deserialize a store document into a typed record.
pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// The `id` of a stored document, if it has one.
pub fn document_id(document: &Document) -> Option<&str> {
    document.get("id").and_then(Value::as_str)
}
