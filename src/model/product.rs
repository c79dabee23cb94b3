use rusqlite::{types::Value, Row};
use rust_decimal::Decimal;

use super::price;
use crate::storage::{Column, Entity, StorageError, StorageResult};

/// A product listed under exactly one category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: i64,
}

impl Product {
    pub const NAME_MAX_CHARS: usize = 100;

    /// A product that has not been persisted yet. The price is rounded to
    /// the stored precision.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        price: Decimal,
        category_id: i64,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description,
            price: price::normalize(price),
            category_id,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductField {
    Id,
    Name,
    Description,
    Price,
    CategoryId,
}

impl Column for ProductField {
    fn name(self) -> &'static str {
        match self {
            ProductField::Id => "id",
            ProductField::Name => "name",
            ProductField::Description => "description",
            ProductField::Price => "price_cents",
            ProductField::CategoryId => "category_id",
        }
    }
}

impl Entity for Product {
    type Field = ProductField;

    const TABLE: &'static str = "products";
    const COLUMNS: &'static [&'static str] =
        &["name", "description", "price_cents", "category_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let price_cents: i64 = row.get(3)?;
        Ok(Product {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            price: price::from_cents(price_cents),
            category_id: row.get(4)?,
        })
    }

    fn values(&self) -> StorageResult<Vec<Value>> {
        let cents = price::exact_cents(self.price)
            .map_err(|err| StorageError::InvalidData(err.to_string()))?;
        Ok(vec![
            Value::Text(self.name.clone()),
            self.description.clone().into(),
            Value::Integer(cents),
            Value::Integer(self.category_id),
        ])
    }

    fn field_value(&self, field: ProductField) -> Value {
        match field {
            ProductField::Id => Value::Integer(self.id),
            ProductField::Name => Value::Text(self.name.clone()),
            ProductField::Description => self.description.clone().into(),
            ProductField::Price => {
                price::exact_cents(self.price).map_or(Value::Null, Value::Integer)
            }
            ProductField::CategoryId => Value::Integer(self.category_id),
        }
    }
}
