use rusqlite::{Connection, Result};
use std::sync::Mutex;
use crate::db::migration_runner::{is_in_memory, MigrationRunner};
use log;

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = if is_in_memory(db_path) {
            Connection::open_in_memory()?
        } else {
            let conn = Connection::open(db_path)?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn
        };

        conn.execute("PRAGMA foreign_keys = ON", [])?;

        Self::migrate(&conn, db_path)?;

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::new(":memory:")
    }

    fn migrate(conn: &Connection, db_path: &str) -> Result<()> {
        let runner = MigrationRunner::new();

        log::info!("=== Starting database migration check ===");
        log::info!("Current schema version: {:?}", runner.get_current_version(conn)?);

        let applied = runner.run_pending_migrations(conn, db_path)?;
        if applied > 0 {
            log::info!("Applied {} migrations", applied);
        } else {
            log::info!("Database schema is up to date");
        }

        runner.verify_migrations(conn)?;

        if let Some(version) = runner.get_current_version(conn)? {
            log::info!("Final schema version: {}", version);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_database_is_migrated() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.conn.lock().unwrap();
        let current_set: i64 = conn
            .query_row("SELECT current_set FROM counter WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(current_set, 1);
    }

    #[test]
    fn test_reopening_file_database_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");
        let path = path.to_str().unwrap();

        {
            let db = Database::new(path).unwrap();
            let conn = db.conn.lock().unwrap();
            conn.execute("UPDATE counter SET current_set = 4 WHERE id = 1", [])
                .unwrap();
        }

        let db = Database::new(path).unwrap();
        let conn = db.conn.lock().unwrap();
        let current_set: i64 = conn
            .query_row("SELECT current_set FROM counter WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(current_set, 4);
    }
}
