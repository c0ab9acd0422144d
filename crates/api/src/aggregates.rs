//! Derived bootcamp fields and cascading deletes.
//!
//! Both run explicitly from the handlers that change courses, reviews or
//! bootcamps.

use serde_json::{Map, Number, Value};
use storage::{CollectionStore, CollectionStoreExt, Filter, StorageError};
use tracing::debug;

use crate::resources::{BOOTCAMPS, COURSES, REVIEWS};

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

async fn field_values(
    store: &dyn CollectionStore,
    collection: &str,
    bootcamp_id: &str,
    field: &str,
) -> Result<Vec<f64>, StorageError> {
    let records = store.find(collection, Filter::eq("bootcamp", bootcamp_id)).exec().await?;
    Ok(records
        .iter()
        .filter_map(|record| record.get(field).and_then(Value::as_f64))
        .collect())
}

async fn store_average(
    store: &dyn CollectionStore,
    bootcamp_id: &str,
    field: &str,
    average: Option<f64>,
) -> Result<(), StorageError> {
    let value = average
        .and_then(Number::from_f64)
        .map_or(Value::Null, Value::Number);
    debug!(bootcamp_id, field, %value, "refreshed bootcamp aggregate");

    let mut patch = Map::new();
    patch.insert(field.to_string(), value);
    store.update(BOOTCAMPS.collection, bootcamp_id, patch).await?;
    Ok(())
}

/// Recompute `averageCost` as the rounded mean course tuition.
pub async fn refresh_average_cost(store: &dyn CollectionStore, bootcamp_id: &str) -> Result<Option<f64>, StorageError> {
    let tuitions = field_values(store, COURSES.collection, bootcamp_id, "tuition").await?;
    let average = mean(&tuitions).map(f64::round);
    store_average(store, bootcamp_id, "averageCost", average).await?;
    Ok(average)
}

/// Recompute `averageRating` as the mean review rating to one decimal.
pub async fn refresh_average_rating(
    store: &dyn CollectionStore,
    bootcamp_id: &str,
) -> Result<Option<f64>, StorageError> {
    let ratings = field_values(store, REVIEWS.collection, bootcamp_id, "rating").await?;
    let average = mean(&ratings).map(|mean| (mean * 10.0).round() / 10.0);
    store_average(store, bootcamp_id, "averageRating", average).await?;
    Ok(average)
}

/// Delete a bootcamp's courses, then its reviews, then the bootcamp itself.
///
/// Returns whether the bootcamp existed.
pub async fn delete_bootcamp(store: &dyn CollectionStore, bootcamp_id: &str) -> Result<bool, StorageError> {
    let dependents = Filter::eq("bootcamp", bootcamp_id);
    let courses = store.delete_many(COURSES.collection, &dependents).await?;
    let reviews = store.delete_many(REVIEWS.collection, &dependents).await?;
    let removed = store.delete(BOOTCAMPS.collection, bootcamp_id).await?;

    debug!(bootcamp_id, courses, reviews, "deleted bootcamp and dependents");
    Ok(removed.is_some())
}
