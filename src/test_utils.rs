use std::path::{Path, PathBuf};
use std::sync::Arc;

use migration::MigratorTrait;
use sea_orm::{ConnectionTrait, Database as SeaDatabase};

use crate::database::Database;

pub async fn test_db() -> Arc<Database> {
    let conn = SeaDatabase::connect("sqlite::memory:?mode=rwc")
        .await
        .unwrap();

    // Enable foreign keys
    conn.execute_unprepared("PRAGMA foreign_keys = ON")
        .await
        .unwrap();

    migration::Migrator::up(&conn, None)
        .await
        .unwrap_or_else(|e| panic!("Failed to run migrations: {}", e));

    Arc::new(Database { conn })
}

/// Write a catalog file into `dir` and return its path
pub fn write_catalog_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
