use rusqlite::{types::Value, Row};

use crate::storage::{Column, Entity, StorageResult};

/// A product category. Names are unique across the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl Category {
    pub const NAME_MAX_CHARS: usize = 50;

    /// A category that has not been persisted yet.
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryField {
    Id,
    Name,
    Description,
}

impl Column for CategoryField {
    fn name(self) -> &'static str {
        match self {
            CategoryField::Id => "id",
            CategoryField::Name => "name",
            CategoryField::Description => "description",
        }
    }
}

impl Entity for Category {
    type Field = CategoryField;

    const TABLE: &'static str = "categories";
    const COLUMNS: &'static [&'static str] = &["name", "description"];

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
        })
    }

    fn values(&self) -> StorageResult<Vec<Value>> {
        Ok(vec![
            Value::Text(self.name.clone()),
            self.description.clone().into(),
        ])
    }

    fn field_value(&self, field: CategoryField) -> Value {
        match field {
            CategoryField::Id => Value::Integer(self.id),
            CategoryField::Name => Value::Text(self.name.clone()),
            CategoryField::Description => self.description.clone().into(),
        }
    }
}
