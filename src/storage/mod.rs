mod error;
mod filter;
mod repository;
pub mod sqlite;
pub mod traits;
mod unit_of_work;

pub use error::{ConstraintKind, IntegrityViolation, StorageError, StorageResult};
pub use filter::Filter;
pub use repository::SqliteRepository;
pub use sqlite::SqliteStorage;
pub use traits::{Column, Entity, Repository, Storage, UnitOfWork};
pub use unit_of_work::{PendingId, SqliteUnitOfWork};
