use crate::{context, storage};
use anyhow::{Context, Result};

pub fn init_data_dir(ctx: &context::Context) -> Result<()> {
    let data_dir = std::path::PathBuf::from(&ctx.config.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    Ok(())
}

pub fn init_storage(ctx: &context::Context) -> Result<storage::SqliteStorage> {
    let db_path = ctx.config.database_path();
    let sqlite =
        storage::SqliteStorage::new(&db_path).with_busy_timeout(ctx.config.busy_timeout);
    if ctx.config.reset {
        log::warn!("🧹 Resetting database {}", db_path.to_string_lossy());
        sqlite.reset_all().context("resetting storage")?;
    }
    sqlite.init().context("initializing storage")?;
    Ok(sqlite)
}
