use std::fmt;

use rusqlite::{ffi, ErrorCode};
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("integrity violation: {0}")]
    Integrity(#[from] IntegrityViolation),
    #[error("no {table} row with id {id}")]
    MissingRow { table: &'static str, id: i64 },
    #[error("{table} entity has no identifier; it must be committed before it can be updated or deleted")]
    Unsaved { table: &'static str },
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("sqlite: {0}")]
    Sqlite(rusqlite::Error),
}

impl StorageError {
    pub fn integrity(&self) -> Option<&IntegrityViolation> {
        match self {
            StorageError::Integrity(violation) => Some(violation),
            _ => None,
        }
    }

    pub fn is_integrity_violation(&self) -> bool {
        self.integrity().is_some()
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                let message = message.clone().unwrap_or_else(|| failure.to_string());
                StorageError::Integrity(IntegrityViolation {
                    kind: ConstraintKind::classify(failure.extended_code, &message),
                    message,
                })
            }
            _ => StorageError::Sqlite(err),
        }
    }
}

/// A write rejected by a uniqueness, foreign-key or check constraint.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{kind} constraint failed ({message})")]
pub struct IntegrityViolation {
    pub kind: ConstraintKind,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    PrimaryKey,
    ForeignKey,
    Check,
    NotNull,
    Other,
}

impl ConstraintKind {
    /// `ON DELETE RESTRICT` is enforced by an internal trigger, so it
    /// reports `SQLITE_CONSTRAINT_TRIGGER` with the foreign-key message.
    fn classify(code: i32, message: &str) -> Self {
        match code {
            ffi::SQLITE_CONSTRAINT_TRIGGER if message.starts_with("FOREIGN KEY") => {
                ConstraintKind::ForeignKey
            }
            ffi::SQLITE_CONSTRAINT_UNIQUE => ConstraintKind::Unique,
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY => ConstraintKind::PrimaryKey,
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ConstraintKind::ForeignKey,
            ffi::SQLITE_CONSTRAINT_CHECK => ConstraintKind::Check,
            ffi::SQLITE_CONSTRAINT_NOTNULL => ConstraintKind::NotNull,
            _ => ConstraintKind::Other,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::Unique => "unique",
            ConstraintKind::PrimaryKey => "primary key",
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::Check => "check",
            ConstraintKind::NotNull => "not null",
            ConstraintKind::Other => "other",
        };
        f.write_str(name)
    }
}
