use serde::Serialize;
use storage::{CollectionStore, CollectionStoreExt, Document};
use tracing::debug;

use crate::pagination::{PaginationWindow, plan};
use crate::schema::ResourceSchema;
use crate::translator::QuerySpec;
use crate::Result;

/// Uniform success body for list and detail responses.
#[derive(Debug, Clone, Serialize)]
pub struct ResultEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationWindow>,
    pub data: T,
}

impl<T> ResultEnvelope<T> {
    /// Envelope for a single record or message.
    pub fn single(data: T) -> Self {
        Self {
            success: true,
            count: None,
            pagination: None,
            data,
        }
    }
}

impl<T> ResultEnvelope<Vec<T>> {
    /// Envelope for an unpaginated list.
    pub fn list(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(data.len()),
            pagination: None,
            data,
        }
    }
}

/// Run a translated list query against `store`, expanding the schema's
/// relations on every returned record.
///
/// The total is counted with the same filter as the page fetch; the two reads
/// are not atomic, so concurrent writes can skew them.
pub async fn advanced_results<S>(
    store: &S,
    schema: &ResourceSchema,
    spec: &QuerySpec,
) -> Result<ResultEnvelope<Vec<Document>>>
where
    S: CollectionStore + ?Sized,
{
    let total = store.count(schema.collection, &spec.filter).await?;
    let window = plan(spec.page, spec.limit, total);

    let mut find = store
        .find(schema.collection, spec.filter.clone())
        .select(spec.projection.clone())
        .sort(spec.sort.clone())
        .skip(window.offset)
        .limit(window.limit);
    for relation in schema.relations {
        find = find.populate(*relation);
    }

    let mut data = find.exec().await?;
    for document in &mut data {
        schema.strip_hidden(document);
    }

    debug!(collection = schema.collection, total, returned = data.len(), "assembled list results");

    Ok(ResultEnvelope {
        success: true,
        count: Some(data.len()),
        pagination: Some(window),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldKind};
    use crate::translator::translate;
    use serde_json::{Value, json};
    use storage::{MemoryStore, Relation};

    const CAMPS: ResourceSchema = ResourceSchema {
        collection: "bootcamps",
        fields: &[
            Field::new("name", FieldKind::Text),
            Field::new("averageCost", FieldKind::Number),
            Field::new("createdAt", FieldKind::Date),
        ],
        hidden: &["internalNotes"],
        managed: &[],
        relations: &[COURSES],
    };

    const COURSES: Relation = Relation {
        field: "courses",
        collection: "courses",
        local_field: "id",
        foreign_field: "bootcamp",
        many: true,
        select: &[],
    };

    async fn store_with(camps: &[(&str, i64)]) -> MemoryStore {
        let store = MemoryStore::new();
        for (name, cost) in camps {
            let doc = json!({ "name": name, "averageCost": cost, "internalNotes": "n/a" });
            store.insert("bootcamps", doc.as_object().cloned().unwrap()).await.unwrap();
        }
        store
    }

    fn names(envelope: &ResultEnvelope<Vec<Document>>) -> Vec<&str> {
        envelope
            .data
            .iter()
            .filter_map(|doc| doc.get("name").and_then(Value::as_str))
            .collect()
    }

    fn params(query: &str) -> Vec<(String, String)> {
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_filtered_sorted_second_page() {
        // Four camps match the cost filter; "Zulu" does not.
        let store = store_with(&[
            ("Alpha", 5000),
            ("Bravo", 9000),
            ("Charlie", 10000),
            ("Delta", 7000),
            ("Zulu", 25000),
        ])
        .await;

        let spec = translate(&params("averageCost[lte]=10000&sort=-name&page=2&limit=2"), &CAMPS).unwrap();
        let envelope = advanced_results(&store, &CAMPS, &spec).await.unwrap();

        assert_eq!(names(&envelope), vec!["Bravo", "Alpha"]);
        assert_eq!(envelope.count, Some(2));

        let body = serde_json::to_value(&envelope).unwrap();
        assert_eq!(body["pagination"], json!({ "prev": { "page": 1, "limit": 2 } }));
        assert_eq!(body["success"], json!(true));
    }

    #[tokio::test]
    async fn test_total_counts_matching_records_only() {
        let store = store_with(&[("Alpha", 1), ("Bravo", 2), ("Charlie", 50), ("Delta", 60)]).await;

        let spec = translate(&params("averageCost[lt]=10&limit=1"), &CAMPS).unwrap();
        let envelope = advanced_results(&store, &CAMPS, &spec).await.unwrap();

        let window = envelope.pagination.unwrap();
        assert_eq!(window.total, 2);
        assert_eq!(window.next.map(|next| next.page), Some(2));
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let store = store_with(&[("Alpha", 1)]).await;

        let spec = translate(&params("page=4&limit=10"), &CAMPS).unwrap();
        let envelope = advanced_results(&store, &CAMPS, &spec).await.unwrap();

        assert!(envelope.data.is_empty());
        let window = envelope.pagination.unwrap();
        assert!(window.next.is_none());
        assert_eq!(window.prev.map(|prev| prev.page), Some(3));
    }

    #[tokio::test]
    async fn test_hidden_fields_are_stripped_and_relations_expanded() {
        let store = store_with(&[("Alpha", 1)]).await;
        let camp_id = store.find("bootcamps", storage::Filter::new()).first().await.unwrap().unwrap()["id"].clone();
        let course = json!({ "title": "Rust", "bootcamp": camp_id });
        store.insert("courses", course.as_object().cloned().unwrap()).await.unwrap();

        let spec = translate(&params("select=name"), &CAMPS).unwrap();
        let envelope = advanced_results(&store, &CAMPS, &spec).await.unwrap();

        let camp = &envelope.data[0];
        assert!(camp.get("internalNotes").is_none());
        assert!(camp.get("averageCost").is_none());
        assert_eq!(camp["courses"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_only_declared_relations_are_expanded() {
        const PLAIN: ResourceSchema = ResourceSchema { relations: &[], ..CAMPS };
        let store = store_with(&[("Alpha", 1)]).await;

        let envelope = advanced_results(&store, &PLAIN, &QuerySpec::default()).await.unwrap();
        assert!(envelope.data[0].get("courses").is_none());

        let envelope = advanced_results(&store, &CAMPS, &QuerySpec::default()).await.unwrap();
        assert_eq!(envelope.data[0]["courses"], json!([]));
    }

    #[test]
    fn test_single_envelope_shape() {
        let body = serde_json::to_value(ResultEnvelope::single("done")).unwrap();
        assert_eq!(body, json!({ "success": true, "data": "done" }));

        let body = serde_json::to_value(ResultEnvelope::list(vec![1, 2])).unwrap();
        assert_eq!(body, json!({ "success": true, "count": 2, "data": [1, 2] }));
    }
}
