use std::{
    any::Any,
    cell::{OnceCell, RefCell},
    rc::Rc,
    sync::{Arc, OnceLock},
};

use rusqlite::{params_from_iter, types::Value, Connection, Transaction, TransactionBehavior};

use super::{
    repository::SqliteRepository,
    traits::{Entity, UnitOfWork},
    StorageError, StorageResult,
};
use crate::model::{Category, Product};

/// Identifier of a staged insert, filled in once the owning unit of work
/// commits.
#[derive(Clone, Debug, Default)]
pub struct PendingId(Arc<OnceLock<i64>>);

impl PendingId {
    pub fn get(&self) -> Option<i64> {
        self.0.get().copied()
    }

    fn assign(&self, id: i64) {
        let _ = self.0.set(id);
    }
}

pub(crate) enum Change<E: Entity> {
    Insert {
        entity: E,
        values: Vec<Value>,
        pending: PendingId,
    },
    Update {
        entity: E,
        values: Vec<Value>,
    },
    Delete {
        id: i64,
    },
}

/// Type-erased journal entry so one context can hold changes for every
/// entity type in staging order.
pub(crate) trait StagedChange {
    fn apply(&self, conn: &Connection) -> StorageResult<usize>;
    fn pending(&self) -> Option<&PendingId>;
    fn as_any(&self) -> &dyn Any;
}

impl<E: Entity> StagedChange for Change<E> {
    fn apply(&self, conn: &Connection) -> StorageResult<usize> {
        match self {
            Change::Insert { values, .. } => {
                let placeholders = (1..=E::COLUMNS.len())
                    .map(|i| format!("?{i}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    E::TABLE,
                    E::COLUMNS.join(", "),
                    placeholders
                );
                Ok(conn.execute(&sql, params_from_iter(values.iter()))?)
            }
            Change::Update { entity, values } => {
                let assignments = E::COLUMNS
                    .iter()
                    .enumerate()
                    .map(|(i, column)| format!("{column} = ?{}", i + 1))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!(
                    "UPDATE {} SET {} WHERE id = ?{}",
                    E::TABLE,
                    assignments,
                    E::COLUMNS.len() + 1
                );
                let id = Value::Integer(entity.id());
                let rows = conn.execute(&sql, params_from_iter(values.iter().chain([&id])))?;
                ensure_row(E::TABLE, entity.id(), rows)
            }
            Change::Delete { id } => {
                let sql = format!("DELETE FROM {} WHERE id = ?1", E::TABLE);
                let rows = conn.execute(&sql, [id])?;
                ensure_row(E::TABLE, *id, rows)
            }
        }
    }

    fn pending(&self) -> Option<&PendingId> {
        match self {
            Change::Insert { pending, .. } => Some(pending),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn ensure_row(table: &'static str, id: i64, rows: usize) -> StorageResult<usize> {
    if rows == 0 {
        return Err(StorageError::MissingRow { table, id });
    }
    Ok(rows)
}

/// The transactional context shared by every repository of one unit of
/// work: a single connection plus the journal of staged changes.
pub(crate) struct DbContext {
    conn: Connection,
    journal: RefCell<Vec<Box<dyn StagedChange>>>,
}

impl DbContext {
    pub(crate) fn new(conn: Connection) -> Self {
        Self {
            conn,
            journal: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn stage<E: Entity>(&self, change: Change<E>) {
        self.journal.borrow_mut().push(Box::new(change));
    }

    /// Calls `f` with every staged change for `E`, oldest first.
    pub(crate) fn for_each_staged<E: Entity>(&self, mut f: impl FnMut(&Change<E>)) {
        for staged in self.journal.borrow().iter() {
            if let Some(change) = staged.as_any().downcast_ref::<Change<E>>() {
                f(change);
            }
        }
    }

    pub(crate) fn has_staged<E: Entity>(&self) -> bool {
        self.journal
            .borrow()
            .iter()
            .any(|staged| staged.as_any().is::<Change<E>>())
    }

    fn commit(&self) -> StorageResult<usize> {
        let staged = std::mem::take(&mut *self.journal.borrow_mut());
        if staged.is_empty() {
            return Ok(0);
        }

        // Rolls back on drop if any change fails.
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let mut affected = 0;
        let mut assigned = Vec::new();
        for change in &staged {
            affected += change.apply(&tx)?;
            if let Some(pending) = change.pending() {
                assigned.push((pending, tx.last_insert_rowid()));
            }
        }
        tx.commit()?;

        for (pending, id) in assigned {
            pending.assign(id);
        }
        Ok(affected)
    }
}

pub struct SqliteUnitOfWork {
    ctx: Rc<DbContext>,
    categories: OnceCell<SqliteRepository<Category>>,
    products: OnceCell<SqliteRepository<Product>>,
}

impl SqliteUnitOfWork {
    pub(crate) fn new(conn: Connection) -> Self {
        Self {
            ctx: Rc::new(DbContext::new(conn)),
            categories: OnceCell::new(),
            products: OnceCell::new(),
        }
    }
}

impl UnitOfWork for SqliteUnitOfWork {
    type Categories = SqliteRepository<Category>;
    type Products = SqliteRepository<Product>;

    fn categories(&self) -> &SqliteRepository<Category> {
        self.categories
            .get_or_init(|| SqliteRepository::new(self.ctx.clone()))
    }

    fn products(&self) -> &SqliteRepository<Product> {
        self.products
            .get_or_init(|| SqliteRepository::new(self.ctx.clone()))
    }

    fn complete(&self) -> StorageResult<usize> {
        match self.ctx.commit() {
            Ok(affected) => {
                log::debug!("Unit of work committed, {} rows affected", affected);
                Ok(affected)
            }
            Err(err) => {
                log::warn!("Unit of work commit failed: {}", err);
                Err(err)
            }
        }
    }
}
