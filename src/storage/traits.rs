use std::fmt::Debug;

use rusqlite::{types::Value, Row};

use super::{Filter, PendingId, StorageResult};
use crate::model::{Category, Product};

/// A column an entity can be filtered on.
pub trait Column: Copy + Debug + Eq + 'static {
    fn name(self) -> &'static str;
}

/// A record mapped onto one table with an integer `id` primary key.
///
/// Rows are read as `id` followed by [`Entity::COLUMNS`]; writes bind
/// [`Entity::values`] in the same column order.
pub trait Entity: Clone + Debug + 'static {
    type Field: Column;

    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    /// Zero until the store assigns an identifier.
    fn id(&self) -> i64;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
    fn values(&self) -> StorageResult<Vec<Value>>;
    fn field_value(&self, field: Self::Field) -> Value;
}

/// CRUD access to one entity type. Mutations are staged on the owning unit
/// of work and only reach the store when it completes.
pub trait Repository<E: Entity> {
    fn get_all(&self) -> StorageResult<Vec<E>>;
    fn get_by_id(&self, id: i64) -> StorageResult<Option<E>>;
    fn find(&self, filter: &Filter<E::Field>) -> StorageResult<Vec<E>>;
    fn exists(&self, filter: &Filter<E::Field>) -> StorageResult<bool>;
    fn add(&self, entity: E) -> StorageResult<PendingId>;
    fn update(&self, entity: E) -> StorageResult<()>;
    fn delete(&self, entity: &E) -> StorageResult<()>;
}

pub trait UnitOfWork {
    type Categories: Repository<Category>;
    type Products: Repository<Product>;

    fn categories(&self) -> &Self::Categories;
    fn products(&self) -> &Self::Products;

    /// Applies every staged change atomically and returns the number of
    /// affected rows. Staged changes are discarded whether or not the
    /// commit succeeds.
    fn complete(&self) -> StorageResult<usize>;
}

pub trait Storage {
    type Uow: UnitOfWork;

    /// Opens a unit of work with its own connection. Dropping it releases
    /// the connection and discards anything left uncommitted.
    fn begin(&self) -> StorageResult<Self::Uow>;
}
