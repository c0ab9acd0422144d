use crate::{CollectionStore, Document, Filter, FindOptions, Projection, Relation, Result, SortKey};

/// Chainable read against one collection.
///
/// ```ignore
/// let page = store
///     .find("bootcamps", filter)
///     .sort(vec![SortKey::desc("createdAt")])
///     .skip(25)
///     .limit(25)
///     .populate(COURSES)
///     .exec()
///     .await?;
/// ```
pub struct Find<'a, S: ?Sized> {
    store: &'a S,
    collection: &'a str,
    filter: Filter,
    options: FindOptions,
}

impl<'a, S: CollectionStore + ?Sized> Find<'a, S> {
    pub fn new(store: &'a S, collection: &'a str, filter: Filter) -> Self {
        Self {
            store,
            collection,
            filter,
            options: FindOptions::default(),
        }
    }

    pub fn sort(mut self, keys: Vec<SortKey>) -> Self {
        self.options.sort = keys;
        self
    }

    pub fn select(mut self, projection: Projection) -> Self {
        self.options.projection = projection;
        self
    }

    pub fn skip(mut self, count: u64) -> Self {
        self.options.skip = count;
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.options.limit = Some(count);
        self
    }

    pub fn populate(mut self, relation: Relation) -> Self {
        self.options.populate.push(relation);
        self
    }

    pub async fn exec(self) -> Result<Vec<Document>> {
        self.store.fetch(self.collection, &self.filter, &self.options).await
    }

    /// First matching record, if any.
    pub async fn first(self) -> Result<Option<Document>> {
        Ok(self.limit(1).exec().await?.into_iter().next())
    }
}

/// Entry point for cursor-style reads on any store, including `dyn CollectionStore`.
pub trait CollectionStoreExt: CollectionStore {
    fn find<'a>(&'a self, collection: &'a str, filter: Filter) -> Find<'a, Self> {
        Find::new(self, collection, filter)
    }
}

impl<S: CollectionStore + ?Sized> CollectionStoreExt for S {}
