use rusqlite::{params, Connection, OptionalExtension, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

#[cfg(not(test))]
use log;

// Conditional logging that works in both test and production
#[allow(unused_macros)]
macro_rules! log_info {
    ($($arg:tt)*) => {
        #[cfg(not(test))]
        {
            log::info!($($arg)*);
        }
        #[cfg(test)]
        {
            println!("[INFO] {}", format!($($arg)*));
        }
    };
}

#[allow(unused_macros)]
macro_rules! log_error {
    ($($arg:tt)*) => {
        #[cfg(not(test))]
        {
            log::error!($($arg)*);
        }
        #[cfg(test)]
        {
            eprintln!("[ERROR] {}", format!($($arg)*));
        }
    };
}

#[allow(unused_macros)]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        #[cfg(not(test))]
        {
            log::warn!($($arg)*);
        }
        #[cfg(test)]
        {
            println!("[WARN] {}", format!($($arg)*));
        }
    };
}

const BACKUPS_TO_KEEP: usize = 5;

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

impl Migration {
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sql.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn new(version: u32, name: &'static str, sql: &'static str) -> Self {
        Self { version, name, sql }
    }
}

/// Applies the journal's schema migrations in order, each in its own
/// transaction, and records them in `schema_migrations` with a checksum.
///
/// Databases written by the older journal (tables present, no
/// `schema_migrations`) are adopted: the migrations their schema already
/// satisfies are recorded without being run.
pub struct MigrationRunner {
    migrations: Vec<Migration>,
}

impl Default for MigrationRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationRunner {
    pub fn new() -> Self {
        Self {
            migrations: Self::collect_migrations(),
        }
    }

    fn collect_migrations() -> Vec<Migration> {
        vec![
            Migration::new(
                0,
                "bootstrap",
                include_str!("migrations/000_bootstrap.sql"),
            ),
            Migration::new(
                1,
                "initial_schema",
                include_str!("migrations/001_initial_schema.sql"),
            ),
            Migration::new(
                2,
                "seed_counter",
                include_str!("migrations/002_seed_counter.sql"),
            ),
            Migration::new(
                3,
                "trade_set_index",
                include_str!("migrations/003_trade_set_index.sql"),
            ),
        ]
    }

    pub fn run_pending_migrations(&self, conn: &Connection, db_path: &str) -> Result<usize> {
        if !self.has_table(conn, "schema_migrations")? {
            log_info!("No migration history found - bootstrapping migration system");
            self.bootstrap_legacy_schema(conn)?;
        }

        let current_version = self.get_current_version(conn)?;

        let pending: Vec<&Migration> = self
            .migrations
            .iter()
            .filter(|m| match current_version {
                Some(v) => m.version > v,
                None => m.version > 0,
            })
            .collect();

        let Some(target) = pending.last() else {
            return Ok(0);
        };

        log_info!("Found {} pending migrations", pending.len());

        let backup_path = self.create_backup(db_path, target.version)?;
        if let Some(path) = &backup_path {
            log_info!("Backup created: {}", path.display());
        }

        let mut applied = 0;
        for migration in pending {
            if let Err(e) = self.apply_migration(conn, migration) {
                log_error!("Migration {} ({}) failed: {}", migration.version, migration.name, e);
                log_error!("Migration rolled back; schema left at the previous version.");
                if let Some(path) = &backup_path {
                    log_error!("Backup available at: {}", path.display());
                }
                return Err(e);
            }
            applied += 1;
        }

        Ok(applied)
    }

    fn apply_migration(&self, conn: &Connection, migration: &Migration) -> Result<()> {
        let start = Instant::now();

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql)?;

        let execution_time = start.elapsed().as_millis() as i64;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at, checksum, execution_time_ms, notes)
             VALUES (?, ?, ?, ?, ?, NULL)",
            params![
                migration.version,
                migration.name,
                current_timestamp(),
                migration.checksum(),
                execution_time
            ],
        )?;

        tx.commit()?;

        log_info!(
            "Applied migration {}: {} in {}ms",
            migration.version,
            migration.name,
            execution_time
        );

        Ok(())
    }

    /// Fails when an applied migration's stored checksum no longer matches
    /// the SQL compiled into this binary.
    pub fn verify_migrations(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(
            "SELECT version, name, checksum FROM schema_migrations WHERE checksum IS NOT NULL ORDER BY version",
        )?;

        let applied: Vec<(u32, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<_>>>()?;

        for (version, name, stored_checksum) in applied {
            let Some(migration) = self.migrations.iter().find(|m| m.version == version) else {
                continue;
            };
            let expected_checksum = migration.checksum();
            if stored_checksum != expected_checksum {
                log_error!("Checksum mismatch for migration {} ({})", version, name);
                log_error!("Expected: {}", expected_checksum);
                log_error!("Actual:   {}", stored_checksum);
                log_error!("The migration SQL changed after it was applied; restore it or use a backup.");
                return Err(rusqlite::Error::InvalidQuery);
            }
        }

        Ok(())
    }

    pub fn get_current_version(&self, conn: &Connection) -> Result<Option<u32>> {
        if !self.has_table(conn, "schema_migrations")? {
            return Ok(None);
        }

        let version: Option<u32> = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(version)
    }

    /// Copies the database aside before migrating. In-memory databases have
    /// nothing to back up.
    fn create_backup(&self, db_path: &str, target_version: u32) -> Result<Option<PathBuf>> {
        if is_in_memory(db_path) {
            return Ok(None);
        }

        let db_path_buf = PathBuf::from(db_path);
        let db_dir = db_path_buf
            .parent()
            .ok_or_else(|| rusqlite::Error::InvalidPath(db_path_buf.clone()))?;
        let backup_dir = db_dir.join("backups");

        fs::create_dir_all(&backup_dir)
            .map_err(|e| io_failure("Failed to create backup directory", e))?;

        let backup_name = format!(
            "pre_migration_v{}_{}.db",
            target_version,
            current_timestamp()
        );
        let backup_path = backup_dir.join(&backup_name);

        let src = Connection::open(db_path)?;
        let mut dst = Connection::open(&backup_path)?;
        {
            let backup = rusqlite::backup::Backup::new(&src, &mut dst)?;
            backup.run_to_completion(5, std::time::Duration::from_millis(250), None)?;
        }

        let metadata =
            fs::metadata(&backup_path).map_err(|e| io_failure("Failed to verify backup", e))?;
        if metadata.len() == 0 {
            log_error!("Backup file is empty");
            return Err(sqlite_failure("Backup file is empty".to_string()));
        }

        let integrity: String = dst.pragma_query_value(None, "integrity_check", |row| row.get(0))?;
        if integrity != "ok" {
            log_error!("Backup integrity check failed: {}", integrity);
            return Err(sqlite_failure(format!(
                "Backup integrity check failed: {}",
                integrity
            )));
        }

        self.cleanup_old_backups(&backup_dir)?;

        Ok(Some(backup_path))
    }

    fn cleanup_old_backups(&self, backup_dir: &Path) -> Result<()> {
        let mut backups: Vec<_> = fs::read_dir(backup_dir)
            .map_err(|e| io_failure("Failed to read backup directory", e))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.path().extension().and_then(|s| s.to_str()) == Some("db")
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|s| s.starts_with("pre_migration_"))
            })
            .collect();

        // oldest first
        backups.sort_by_key(|entry| {
            entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH)
        });

        if backups.len() > BACKUPS_TO_KEEP {
            for entry in backups.iter().take(backups.len() - BACKUPS_TO_KEEP) {
                if let Err(e) = fs::remove_file(entry.path()) {
                    log_warn!("Failed to delete old backup: {}", e);
                }
            }
        }

        Ok(())
    }

    fn has_table(&self, conn: &Connection, table: &str) -> Result<bool> {
        self.has_schema_object(conn, "table", table)
    }

    fn has_schema_object(&self, conn: &Connection, kind: &str, name: &str) -> Result<bool> {
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = ? AND name = ?",
            params![kind, name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn bootstrap_legacy_schema(&self, conn: &Connection) -> Result<()> {
        let legacy_version = self.detect_legacy_version(conn)?;
        if legacy_version > 0 {
            log_info!("Detected existing journal schema at version {}", legacy_version);
        }

        self.apply_migration(conn, &self.migrations[0])?;

        let now = current_timestamp();
        for migration in &self.migrations[1..=legacy_version as usize] {
            conn.execute(
                "INSERT INTO schema_migrations (version, name, applied_at, checksum, execution_time_ms, notes)
                 VALUES (?, ?, ?, NULL, 0, 'Legacy migration - detected via introspection')",
                params![migration.version, migration.name, now],
            )?;
            log_info!("Marked legacy migration {} as applied", migration.name);
        }

        self.validate_schema_integrity(conn)
    }

    fn detect_legacy_version(&self, conn: &Connection) -> Result<u32> {
        if self.has_schema_object(conn, "index", "idx_trade_set_num")? {
            return Ok(3);
        }

        if !(self.has_table(conn, "trade")? && self.has_table(conn, "counter")?) {
            return Ok(0);
        }

        let counter_seeded: Option<i64> = conn
            .query_row("SELECT id FROM counter WHERE id = 1", [], |row| row.get(0))
            .optional()?;
        if counter_seeded.is_some() {
            return Ok(2);
        }

        Ok(1)
    }

    fn validate_schema_integrity(&self, conn: &Connection) -> Result<()> {
        let integrity: String =
            conn.pragma_query_value(None, "integrity_check", |row| row.get(0))?;
        if integrity != "ok" {
            log_error!("Schema integrity check failed: {}", integrity);
            return Err(sqlite_failure(format!(
                "Schema integrity check failed: {}",
                integrity
            )));
        }
        Ok(())
    }
}

pub fn is_in_memory(db_path: &str) -> bool {
    db_path.is_empty() || db_path == ":memory:"
}

fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

fn sqlite_failure(message: String) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(1), Some(message))
}

fn io_failure(context: &str, e: std::io::Error) -> rusqlite::Error {
    log_error!("{}: {}", context, e);
    sqlite_failure(format!("{}: {}", context, e))
}
