use std::{marker::PhantomData, rc::Rc};

use rusqlite::{params_from_iter, types::Value, OptionalExtension};

use super::{
    traits::{Entity, Repository},
    unit_of_work::{Change, DbContext, PendingId},
    Filter, StorageError, StorageResult,
};

/// Generic SQLite repository. Reads see committed rows with this unit of
/// work's staged changes laid over them; writes only touch the journal.
pub struct SqliteRepository<E: Entity> {
    ctx: Rc<DbContext>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> SqliteRepository<E> {
    pub(crate) fn new(ctx: Rc<DbContext>) -> Self {
        Self {
            ctx,
            _entity: PhantomData,
        }
    }

    fn select_sql(filter: Option<&str>) -> String {
        let mut sql = format!("SELECT id, {} FROM {}", E::COLUMNS.join(", "), E::TABLE);
        if let Some(clause) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }
        sql.push_str(" ORDER BY id");
        sql
    }

    fn query_committed(&self, filter: Option<&Filter<E::Field>>) -> StorageResult<Vec<E>> {
        let mut params = Vec::new();
        let clause = filter.map(|f| f.to_sql(&mut params));
        let mut stmt = self.ctx.conn().prepare(&Self::select_sql(clause.as_deref()))?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), E::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Replays staged changes over committed rows. Staged inserts have no id
    /// yet and sort after everything else.
    fn overlay(&self, mut rows: Vec<E>, filter: Option<&Filter<E::Field>>) -> Vec<E> {
        let keep = |entity: &E| filter.map_or(true, |f| f.matches(entity));
        self.ctx.for_each_staged::<E>(|change| match change {
            Change::Insert { entity, .. } => {
                if keep(entity) {
                    rows.push(entity.clone());
                }
            }
            Change::Update { entity, .. } => {
                rows.retain(|row| row.id() != entity.id());
                if keep(entity) {
                    rows.push(entity.clone());
                }
            }
            Change::Delete { id } => rows.retain(|row| row.id() != *id),
        });
        rows.sort_by_key(|row| (row.id() == 0, row.id()));
        rows
    }

    fn require_id(entity: &E) -> StorageResult<i64> {
        match entity.id() {
            0 => Err(StorageError::Unsaved { table: E::TABLE }),
            id => Ok(id),
        }
    }
}

impl<E: Entity> Repository<E> for SqliteRepository<E> {
    fn get_all(&self) -> StorageResult<Vec<E>> {
        let rows = self.query_committed(None)?;
        Ok(self.overlay(rows, None))
    }

    fn get_by_id(&self, id: i64) -> StorageResult<Option<E>> {
        let mut staged: Option<Option<E>> = None;
        self.ctx.for_each_staged::<E>(|change| match change {
            Change::Update { entity, .. } if entity.id() == id => {
                staged = Some(Some(entity.clone()))
            }
            Change::Delete { id: deleted } if *deleted == id => staged = Some(None),
            _ => {}
        });
        if let Some(entity) = staged {
            return Ok(entity);
        }

        let sql = format!(
            "SELECT id, {} FROM {} WHERE id = ?1",
            E::COLUMNS.join(", "),
            E::TABLE
        );
        let row = self
            .ctx
            .conn()
            .query_row(&sql, [id], E::from_row)
            .optional()?;
        Ok(row)
    }

    fn find(&self, filter: &Filter<E::Field>) -> StorageResult<Vec<E>> {
        let rows = self.query_committed(Some(filter))?;
        Ok(self.overlay(rows, Some(filter)))
    }

    fn exists(&self, filter: &Filter<E::Field>) -> StorageResult<bool> {
        if self.ctx.has_staged::<E>() {
            return Ok(!self.find(filter)?.is_empty());
        }

        let mut params = Vec::<Value>::new();
        let clause = filter.to_sql(&mut params);
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE {})", E::TABLE, clause);
        let found: bool = self
            .ctx
            .conn()
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(found)
    }

    fn add(&self, entity: E) -> StorageResult<PendingId> {
        let values = entity.values()?;
        let pending = PendingId::default();
        log::debug!("Staging insert into {}", E::TABLE);
        self.ctx.stage(Change::Insert {
            entity,
            values,
            pending: pending.clone(),
        });
        Ok(pending)
    }

    fn update(&self, entity: E) -> StorageResult<()> {
        let id = Self::require_id(&entity)?;
        let values = entity.values()?;
        log::debug!("Staging update of {} {}", E::TABLE, id);
        self.ctx.stage(Change::Update { entity, values });
        Ok(())
    }

    fn delete(&self, entity: &E) -> StorageResult<()> {
        let id = Self::require_id(entity)?;
        log::debug!("Staging delete of {} {}", E::TABLE, id);
        self.ctx.stage(Change::<E>::Delete { id });
        Ok(())
    }
}
