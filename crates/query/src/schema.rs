use serde_json::{Number, Value};
use storage::{Document, Relation, timestamp};

/// How raw query-string values are coerced before they reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Date,
    Id,
}

impl FieldKind {
    /// Coerce a query-string literal, or `None` when it does not fit the kind.
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        match self {
            FieldKind::Text | FieldKind::Id => Some(Value::String(raw.to_string())),
            FieldKind::Number => {
                let raw = raw.trim();
                if let Ok(int) = raw.parse::<i64>() {
                    return Some(Value::from(int));
                }
                raw.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
            }
            FieldKind::Boolean => match raw.trim() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            FieldKind::Date => timestamp::parse(raw.trim()).map(|at| Value::String(timestamp::format(&at))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

const ID_FIELD: Field = Field::new("id", FieldKind::Id);

/// Statically declared shape of one resource collection.
///
/// `fields` lists everything a client may filter, sort or select on (the `id`
/// field is implicit). `hidden` fields are stored but never leave the store
/// through a list query. `managed` fields are set by the server and ignored
/// in request bodies. `relations` are expanded on every list query.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSchema {
    pub collection: &'static str,
    pub fields: &'static [Field],
    pub hidden: &'static [&'static str],
    pub managed: &'static [&'static str],
    pub relations: &'static [Relation],
}

impl ResourceSchema {
    pub fn field(&self, name: &str) -> Option<&Field> {
        if name == ID_FIELD.name {
            return Some(&ID_FIELD);
        }
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn strip_hidden(&self, document: &mut Document) {
        for field in self.hidden {
            document.remove(*field);
        }
    }

    /// Keep only declared, client-writable fields of a request body.
    pub fn writable(&self, body: &Document) -> Document {
        body.iter()
            .filter(|(key, _)| {
                let key = key.as_str();
                key != "createdAt"
                    && !self.managed.contains(&key)
                    && self.fields.iter().any(|field| field.name == key)
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}
