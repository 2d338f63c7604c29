//! Database configuration module for `cashbook`.
//!
//! The record store is a `SQLite` database accessed through `SeaORM`. This module resolves
//! the connection URL, opens the connection, and creates the `users`, `collections` and
//! `emis` tables from the entity definitions using `Schema::create_table_from_entity`.
//! Tables are created with `IF NOT EXISTS` so startup is safe against an existing file.

use crate::entities::{Collection, Emi, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::{debug, info, instrument};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/cashbook.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, or the default
/// local `SQLite` file if it is not set.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Creates the parent directory of a file-backed `SQLite` URL so `mode=rwc` can create the file.
///
/// In-memory and non-`SQLite` URLs are left alone.
pub fn ensure_database_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.contains(":memory:") {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
        debug!(dir = %parent.display(), "Ensured database directory");
    }
    Ok(())
}

/// Opens a connection to the record store at `database_url`.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to record store");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all record store tables from the entity definitions.
///
/// Users are created first because both record tables reference `users.uid`.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut user_table = schema.create_table_from_entity(User);
    let mut collection_table = schema.create_table_from_entity(Collection);
    let mut emi_table = schema.create_table_from_entity(Emi);

    user_table.if_not_exists();
    collection_table.if_not_exists();
    emi_table.if_not_exists();

    db.execute(builder.build(&user_table)).await?;
    db.execute(builder.build(&collection_table)).await?;
    db.execute(builder.build(&emi_table)).await?;

    info!("Record store tables ensured");
    Ok(())
}
