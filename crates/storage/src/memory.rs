use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::filter::{lookup, sort_order, values_equal};
use crate::{
    CollectionStore, Direction, Document, Filter, FindOptions, Projection, Relation, Result, SortKey,
    StorageError, document_id, timestamp,
};

/// Fields that together must be unique within a collection.
#[derive(Debug, Clone)]
pub struct UniqueIndex {
    pub collection: String,
    pub fields: Vec<String>,
}

/// Collection store kept entirely in process memory.
///
/// Every operation takes the lock, works synchronously and releases it before
/// returning.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    indexes: Vec<UniqueIndex>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a unique index; inserts and updates that would violate it fail
    /// with `StorageError::Duplicate`.
    pub fn with_unique_index(mut self, collection: &str, fields: &[&str]) -> Self {
        self.indexes.push(UniqueIndex {
            collection: collection.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        self
    }

    fn check_unique(&self, collection: &str, existing: &[Document], candidate: &Document) -> Result<()> {
        let candidate_id = document_id(candidate);

        for index in self.indexes.iter().filter(|i| i.collection == collection) {
            let key: Option<Vec<&Value>> = index
                .fields
                .iter()
                .map(|field| candidate.get(field).filter(|v| !v.is_null()))
                .collect();

            // Records missing any indexed field are not constrained.
            let Some(key) = key else { continue };

            let clash = existing.iter().any(|other| {
                document_id(other) != candidate_id
                    && index
                        .fields
                        .iter()
                        .zip(&key)
                        .all(|(field, value)| other.get(field).is_some_and(|o| values_equal(o, value)))
            });

            if clash {
                return Err(StorageError::Duplicate {
                    collection: collection.to_string(),
                    fields: index.fields.join(", "),
                });
            }
        }

        Ok(())
    }
}

fn sort_documents(documents: &mut [&Document], keys: &[SortKey]) {
    documents.sort_by(|a, b| {
        for key in keys {
            let ordering = sort_order(lookup(a, &key.field), lookup(b, &key.field));
            let ordering = match key.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering.is_ne() {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });
}

fn keep_fields(document: &Document, fields: &[&str]) -> Document {
    if fields.is_empty() {
        return document.clone();
    }
    document
        .iter()
        .filter(|(key, _)| key.as_str() == "id" || fields.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn populate(collections: &HashMap<String, Vec<Document>>, document: &mut Document, relation: &Relation) {
    let local = document.get(relation.local_field).cloned();
    let related = collections.get(relation.collection).map(Vec::as_slice).unwrap_or_default();

    let mut matches = related
        .iter()
        .filter(|candidate| match (&local, candidate.get(relation.foreign_field)) {
            (Some(local), Some(foreign)) => values_equal(local, foreign),
            _ => false,
        })
        .map(|candidate| Value::Object(keep_fields(candidate, relation.select)));

    let expanded = if relation.many {
        Value::Array(matches.collect())
    } else {
        matches.next().unwrap_or(Value::Null)
    };

    document.insert(relation.field.to_string(), expanded);
}

fn project(document: Document, projection: &Projection, populated: &[Relation]) -> Document {
    match projection {
        Projection::All => document,
        Projection::Fields(fields) => document
            .into_iter()
            .filter(|(key, _)| {
                key == "id" || fields.contains(key) || populated.iter().any(|relation| relation.field == key)
            })
            .collect(),
    }
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn fetch(&self, collection: &str, filter: &Filter, options: &FindOptions) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Document> = documents.iter().filter(|doc| filter.matches(doc)).collect();
        sort_documents(&mut matched, &options.sort);

        let limit = options.limit.map_or(usize::MAX, to_usize);
        let page = matched
            .into_iter()
            .skip(to_usize(options.skip))
            .take(limit)
            .map(|doc| {
                let mut doc = doc.clone();
                for relation in &options.populate {
                    populate(&collections, &mut doc, relation);
                }
                project(doc, &options.projection, &options.populate)
            })
            .collect();

        Ok(page)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let collections = self.collections.read().await;
        let count = collections
            .get(collection)
            .map_or(0, |documents| documents.iter().filter(|doc| filter.matches(doc)).count());
        Ok(count as u64)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.iter().find(|doc| document_id(doc) == Some(id)))
            .cloned())
    }

    async fn insert(&self, collection: &str, mut document: Document) -> Result<Document> {
        if document_id(&document).is_none() {
            document.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        if !document.contains_key("createdAt") {
            document.insert("createdAt".to_string(), Value::String(timestamp::now()));
        }

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();
        self.check_unique(collection, documents, &document)?;
        documents.push(document.clone());

        debug!(collection, id = document_id(&document), "inserted document");
        Ok(document)
    }

    async fn update(&self, collection: &str, id: &str, patch: Document) -> Result<Option<Document>> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(position) = documents.iter().position(|doc| document_id(doc) == Some(id)) else {
            return Ok(None);
        };

        let mut merged = documents[position].clone();
        for (key, value) in patch {
            if key == "id" {
                continue;
            }
            if value.is_null() {
                merged.remove(&key);
            } else {
                merged.insert(key, value);
            }
        }

        self.check_unique(collection, documents, &merged)?;
        documents[position] = merged.clone();

        Ok(Some(merged))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let removed = documents
            .iter()
            .position(|doc| document_id(doc) == Some(id))
            .map(|position| documents.remove(position));
        Ok(removed)
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = documents.len();
        documents.retain(|doc| !filter.matches(doc));
        Ok((before - documents.len()) as u64)
    }
}
