use serde_json::Value;
use storage::{Condition, Filter, Op, Projection, SortKey};
use tracing::debug;

use crate::schema::ResourceSchema;
use crate::{QueryError, Result};

/// Query-string keys that control the query rather than filter it.
pub const RESERVED_KEYS: [&str; 4] = ["select", "sort", "page", "limit"];

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 25;
pub const DEFAULT_SORT_FIELD: &str = "createdAt";

/// Structured form of one list request.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub filter: Filter,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    pub page: u64,
    pub limit: u64,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            filter: Filter::new(),
            sort: vec![SortKey::desc(DEFAULT_SORT_FIELD)],
            projection: Projection::All,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Translate raw query-string pairs into a [`QuerySpec`] for `schema`.
///
/// Filter keys are `field` (equality) or `field[op]` with `op` one of `gt`,
/// `gte`, `lt`, `lte`, `in`. Malformed filters fail; control keys fall back to
/// their defaults instead.
pub fn translate(params: &[(String, String)], schema: &ResourceSchema) -> Result<QuerySpec> {
    let mut filter = Filter::new();
    for (key, value) in params.iter().filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str())) {
        filter.push(parse_condition(key, value, schema)?);
    }

    let spec = QuerySpec {
        filter,
        sort: control(params, "sort").map(|raw| parse_sort(raw, schema)).unwrap_or_default(),
        projection: control(params, "select")
            .map(|raw| parse_select(raw, schema))
            .unwrap_or_default(),
        page: control(params, "page").and_then(parse_positive).unwrap_or(DEFAULT_PAGE),
        limit: control(params, "limit").and_then(parse_positive).unwrap_or(DEFAULT_LIMIT),
    };

    let spec = if spec.sort.is_empty() {
        QuerySpec { sort: vec![SortKey::desc(DEFAULT_SORT_FIELD)], ..spec }
    } else {
        spec
    };

    debug!(
        collection = schema.collection,
        conditions = spec.filter.conditions().len(),
        page = spec.page,
        limit = spec.limit,
        "translated list query"
    );
    Ok(spec)
}

/// Last value given for a control key.
fn control<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// Split `field[op]` into its field and store operator.
///
/// The operator is only recognised as the complete bracketed segment, so a
/// field such as `ingest` or `index` is never mistaken for `in`.
fn parse_filter_key(key: &str) -> Result<(&str, Op)> {
    let malformed = || QueryError::MalformedFilter(key.to_string());

    let Some(open) = key.find('[') else {
        if key.is_empty() || key.contains(']') {
            return Err(malformed());
        }
        return Ok((key, Op::Eq));
    };

    let (field, bracketed) = key.split_at(open);
    if field.is_empty() || field.contains(']') {
        return Err(malformed());
    }

    let token = bracketed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .filter(|token| !token.contains('[') && !token.contains(']'))
        .ok_or_else(malformed)?;

    let op = Op::from_token(token).ok_or_else(malformed)?;
    Ok((field, op))
}

fn parse_condition(key: &str, raw: &str, schema: &ResourceSchema) -> Result<Condition> {
    let (name, op) = parse_filter_key(key)?;
    let field = schema
        .field(name)
        .ok_or_else(|| QueryError::UnknownField(name.to_string()))?;

    let invalid = |value: &str| QueryError::InvalidValue {
        field: name.to_string(),
        value: value.to_string(),
    };

    let value = if op == Op::In {
        let items = raw
            .split(',')
            .map(|item| field.kind.coerce(item).ok_or_else(|| invalid(item)))
            .collect::<Result<Vec<Value>>>()?;
        Value::Array(items)
    } else {
        field.kind.coerce(raw).ok_or_else(|| invalid(raw))?
    };

    Ok(Condition::new(name, op, value))
}

fn parse_select(raw: &str, schema: &ResourceSchema) -> Projection {
    let fields: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|name| schema.field(name).is_some())
        .map(str::to_string)
        .collect();

    if fields.is_empty() {
        Projection::All
    } else {
        Projection::Fields(fields)
    }
}

fn parse_sort(raw: &str, schema: &ResourceSchema) -> Vec<SortKey> {
    raw.split(',')
        .map(str::trim)
        .map(|entry| match entry.strip_prefix('-') {
            Some(name) => SortKey::desc(name),
            None => SortKey::asc(entry.strip_prefix('+').unwrap_or(entry)),
        })
        .filter(|key| schema.field(&key.field).is_some())
        .collect()
}

fn parse_positive(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|n| *n > 0)
}
