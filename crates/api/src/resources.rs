//! Declared shapes of the exposed collections.

use query::{Field, FieldKind, ResourceSchema};
use storage::{MemoryStore, Relation};

pub const BOOTCAMPS: ResourceSchema = ResourceSchema {
    collection: "bootcamps",
    fields: &[
        Field::new("name", FieldKind::Text),
        Field::new("slug", FieldKind::Text),
        Field::new("description", FieldKind::Text),
        Field::new("website", FieldKind::Text),
        Field::new("phone", FieldKind::Text),
        Field::new("email", FieldKind::Text),
        Field::new("address", FieldKind::Text),
        Field::new("careers", FieldKind::Text),
        Field::new("averageRating", FieldKind::Number),
        Field::new("averageCost", FieldKind::Number),
        Field::new("photo", FieldKind::Text),
        Field::new("housing", FieldKind::Boolean),
        Field::new("jobAssistance", FieldKind::Boolean),
        Field::new("jobGuarantee", FieldKind::Boolean),
        Field::new("acceptGi", FieldKind::Boolean),
        Field::new("createdAt", FieldKind::Date),
        Field::new("user", FieldKind::Id),
    ],
    hidden: &[],
    managed: &["slug", "averageRating", "averageCost", "user"],
    relations: &[BOOTCAMP_COURSES],
};

pub const COURSES: ResourceSchema = ResourceSchema {
    collection: "courses",
    fields: &[
        Field::new("title", FieldKind::Text),
        Field::new("description", FieldKind::Text),
        Field::new("weeks", FieldKind::Text),
        Field::new("tuition", FieldKind::Number),
        Field::new("minimumSkill", FieldKind::Text),
        Field::new("scholarshipAvailable", FieldKind::Boolean),
        Field::new("createdAt", FieldKind::Date),
        Field::new("bootcamp", FieldKind::Id),
        Field::new("user", FieldKind::Id),
    ],
    hidden: &[],
    managed: &["bootcamp", "user"],
    relations: &[PARENT_BOOTCAMP],
};

pub const REVIEWS: ResourceSchema = ResourceSchema {
    collection: "reviews",
    fields: &[
        Field::new("title", FieldKind::Text),
        Field::new("text", FieldKind::Text),
        Field::new("rating", FieldKind::Number),
        Field::new("createdAt", FieldKind::Date),
        Field::new("bootcamp", FieldKind::Id),
        Field::new("user", FieldKind::Id),
    ],
    hidden: &[],
    managed: &["bootcamp", "user"],
    relations: &[PARENT_BOOTCAMP],
};

pub const USERS: ResourceSchema = ResourceSchema {
    collection: auth::USERS,
    fields: &[
        Field::new("name", FieldKind::Text),
        Field::new("email", FieldKind::Text),
        Field::new("role", FieldKind::Text),
        Field::new("createdAt", FieldKind::Date),
    ],
    hidden: &["passwordHash", "resetPasswordToken", "resetPasswordExpire", "passwordChangedAt"],
    managed: &[],
    relations: &[],
};

pub const BOOTCAMP_COURSES: Relation = Relation {
    field: "courses",
    collection: "courses",
    local_field: "id",
    foreign_field: "bootcamp",
    many: true,
    select: &[],
};

/// The owning bootcamp of a course or review, trimmed to name and description.
pub const PARENT_BOOTCAMP: Relation = Relation {
    field: "bootcamp",
    collection: "bootcamps",
    local_field: "bootcamp",
    foreign_field: "id",
    many: false,
    select: &["name", "description"],
};

/// Unique constraints per collection.
pub const UNIQUE_INDEXES: &[(&str, &[&str])] = &[
    ("bootcamps", &["name"]),
    ("reviews", &["bootcamp", "user"]),
    (auth::USERS, &["email"]),
];

/// An empty in-memory store carrying every unique index.
pub fn memory_store() -> MemoryStore {
    UNIQUE_INDEXES
        .iter()
        .fold(MemoryStore::new(), |store, (collection, fields)| {
            store.with_unique_index(collection, fields)
        })
}
