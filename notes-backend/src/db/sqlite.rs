//! SQLite database handle and startup migrations

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;

use super::tables;

pub type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;

pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open (or create) the database at `path` and run migrations.
    pub fn new(path: &str) -> Result<Self, String> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create database directory: {}", e))?;
            }
        }

        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder()
            .max_size(8)
            .build(manager)
            .map_err(|e| format!("Failed to create connection pool: {}", e))?;

        let db = Self { pool };

        {
            let conn = db.conn();
            run_migrations(&conn).map_err(|e| format!("Migration failed: {}", e))?;
        }

        log::info!("[DB] Database ready at {}", path);
        Ok(db)
    }

    /// Get a pooled connection. Dropping it returns it to the pool on
    /// every exit path.
    pub fn conn(&self) -> DbConn {
        self.pool.get().expect("Database pool exhausted")
    }
}

fn run_migrations(conn: &Connection) -> SqliteResult<()> {
    tables::notes::init_tables(conn)?;

    // Defined in the schema for future account support; no code path
    // reads or writes it yet.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE,
            hashed_password TEXT
        )",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_new_creates_missing_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("notes.db");

        let db = Database::new(path.to_str().unwrap()).expect("Failed to open database");
        assert!(path.exists());

        // Migrations are idempotent across reopens
        drop(db);
        Database::new(path.to_str().unwrap()).expect("Failed to reopen database");
    }
}
