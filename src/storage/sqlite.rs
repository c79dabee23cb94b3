use std::{path::Path, time::Duration};

use rusqlite::Connection;

use super::{traits::Storage, unit_of_work::SqliteUnitOfWork, StorageResult};

const DB_SCHEMA_VERSION: i64 = 1;
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct SqliteStorage {
    pub path: String,
    busy_timeout: Duration,
}

impl Storage for SqliteStorage {
    type Uow = SqliteUnitOfWork;

    fn begin(&self) -> StorageResult<SqliteUnitOfWork> {
        let conn = self.open()?;
        Ok(SqliteUnitOfWork::new(conn))
    }
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Deletes the database file along with any WAL leftovers.
    pub fn reset_all(&self) -> std::io::Result<()> {
        for suffix in ["", "-wal", "-shm"] {
            let path = format!("{}{}", self.path, suffix);
            if Path::new(&path).exists() {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Creates or checks the schema. Must run before the first `begin`.
    pub fn init(&self) -> StorageResult<()> {
        let conn = self.open()?;
        Self::migrate(&conn)?;
        Ok(())
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    fn migrate(conn: &Connection) -> rusqlite::Result<()> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version == DB_SCHEMA_VERSION {
            return Ok(());
        }

        log::info!(
            "SQLite schema migration: {} -> {}",
            version,
            DB_SCHEMA_VERSION
        );

        if version == 0 {
            conn.execute_batch(
                r#"
            CREATE TABLE categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 50),
                description TEXT
            );
            CREATE UNIQUE INDEX categories_name_idx ON categories(name);
            CREATE TABLE products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 100),
                description TEXT,
                price_cents INTEGER NOT NULL
                    CHECK (price_cents BETWEEN 0 AND 999999999999999999),
                category_id INTEGER NOT NULL
                    REFERENCES categories(id) ON DELETE RESTRICT
            );
            CREATE INDEX products_name_idx ON products(name);
            CREATE INDEX products_category_idx ON products(category_id);
        "#,
            )?;
            conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
            return Ok(());
        }

        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_SCHEMA),
            Some("database schema version mismatch; please run with --reset option".to_string()),
        ))
    }
}
