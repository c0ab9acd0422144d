//! Generic list-query engine ("advanced results").
//!
//! Turns raw query-string pairs into a [`QuerySpec`], plans the page window,
//! and runs both against any [`storage::CollectionStore`] to produce a uniform
//! [`ResultEnvelope`].

pub mod pagination;
pub mod results;
pub mod schema;
pub mod translator;

pub use pagination::{PageRef, PaginationWindow, plan};
pub use results::{ResultEnvelope, advanced_results};
pub use schema::{Field, FieldKind, ResourceSchema};
pub use translator::{QuerySpec, translate};

use storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Malformed filter parameter '{0}'")]
    MalformedFilter(String),

    #[error("Unknown filter field '{0}'")]
    UnknownField(String),

    #[error("Invalid value '{value}' for field '{field}'")]
    InvalidValue { field: String, value: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, QueryError>;
