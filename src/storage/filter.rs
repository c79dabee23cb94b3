use rusqlite::types::Value;

use super::{Column, Entity};

/// Equality predicate over the fields of one entity type.
///
/// The same expression is rendered to SQL for committed rows and evaluated
/// in memory against staged entities, so both sides must agree: `Null`
/// compares with `IS NULL`, text compares byte-wise like SQLite's `BINARY`
/// collation.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter<F> {
    Eq(F, Value),
    And(Vec<Filter<F>>),
    Or(Vec<Filter<F>>),
}

impl<F: Column> Filter<F> {
    pub fn eq(field: F, value: impl Into<Value>) -> Self {
        Filter::Eq(field, value.into())
    }

    pub fn and(self, other: Filter<F>) -> Self {
        match self {
            Filter::And(mut parts) => {
                parts.push(other);
                Filter::And(parts)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Filter<F>) -> Self {
        match self {
            Filter::Or(mut parts) => {
                parts.push(other);
                Filter::Or(parts)
            }
            first => Filter::Or(vec![first, other]),
        }
    }

    /// Renders a `WHERE` clause body, appending bound values to `params`.
    pub(crate) fn to_sql(&self, params: &mut Vec<Value>) -> String {
        match self {
            Filter::Eq(field, Value::Null) => format!("{} IS NULL", field.name()),
            Filter::Eq(field, value) => {
                params.push(value.clone());
                format!("{} = ?{}", field.name(), params.len())
            }
            Filter::And(parts) => join(parts, " AND ", "1", params),
            Filter::Or(parts) => join(parts, " OR ", "0", params),
        }
    }

    pub fn matches<E: Entity<Field = F>>(&self, entity: &E) -> bool {
        match self {
            Filter::Eq(field, value) => entity.field_value(*field) == *value,
            Filter::And(parts) => parts.iter().all(|part| part.matches(entity)),
            Filter::Or(parts) => parts.iter().any(|part| part.matches(entity)),
        }
    }
}

fn join<F: Column>(parts: &[Filter<F>], sep: &str, empty: &str, params: &mut Vec<Value>) -> String {
    if parts.is_empty() {
        return empty.to_string();
    }
    let rendered = parts
        .iter()
        .map(|part| format!("({})", part.to_sql(params)))
        .collect::<Vec<_>>();
    rendered.join(sep)
}
