use anyhow::{anyhow, Context as _};
use rusqlite::{Connection, OptionalExtension, Params, Row};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub mod entities;
pub mod schema;

pub use entities::{
    ChannelKind, ChannelSnapshot, GuildSnapshot, LogRow, MemberSnapshot, NewLogEntry,
    ObservedMessage, ServerStats,
};

/// Single SQLite handle shared by the whole process.
///
/// Every call holds the one connection lock for its full duration, so two
/// logical operations never interleave their statements.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (creating if needed) the database at `path`. `:memory:` gives a
    /// private in-memory store, which is what the tests use.
    pub fn open(path: &str) -> anyhow::Result<Self> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory {}", parent.display())
                    })?;
                }
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path))?;
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        debug!("Database: opened {} (journal_mode={})", path, journal_mode);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }

    /// Runs one statement and returns the number of affected rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> anyhow::Result<usize> {
        let conn = self.lock()?;
        Ok(conn.execute(sql, params)?)
    }

    pub fn fetch_one<T, P, F>(&self, sql: &str, params: P, map_row: F) -> anyhow::Result<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.lock()?;
        Ok(conn.query_row(sql, params, map_row).optional()?)
    }

    pub fn fetch_many<T, P, F>(&self, sql: &str, params: P, map_row: F) -> anyhow::Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, map_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<T>>>()?)
    }

    /// Runs `sql` once per parameter set inside a single transaction.
    /// Nothing is committed if any execution fails.
    pub fn execute_many<P, I>(&self, sql: &str, param_sets: I) -> anyhow::Result<usize>
    where
        P: Params,
        I: IntoIterator<Item = P>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut affected = 0;
        {
            let mut stmt = tx.prepare(sql)?;
            for params in param_sets {
                affected += stmt.execute(params)?;
            }
        }
        tx.commit()?;
        Ok(affected)
    }

    pub fn execute_script(&self, script: &str) -> anyhow::Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(script)?;
        Ok(())
    }

    /// Runs `f` with the connection locked, for multi-statement work that
    /// must not interleave with other callers.
    pub(crate) fn with_conn<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(&mut Connection) -> anyhow::Result<T>,
    {
        let mut conn = self.lock()?;
        f(&mut conn)
    }

    /// Moves synchronous database work onto tokio's blocking pool.
    pub async fn run_blocking<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db)).await?
    }

    /// Creates any missing tables and indexes. Existing rows are kept.
    pub fn setup(&self) -> anyhow::Result<BTreeSet<String>> {
        info!("Database: Initializing schema...");
        self.execute_script(schema::CREATE_SCHEMA)?;
        let tables = self.verify()?;
        info!(
            "Database: schema ready ({})",
            tables.iter().cloned().collect::<Vec<_>>().join(", ")
        );
        Ok(tables)
    }

    /// Drops and recreates every table. All stored data is lost.
    pub fn reset(&self) -> anyhow::Result<BTreeSet<String>> {
        warn!("Database: dropping all tables and recreating the schema");
        self.execute_script(schema::DROP_SCHEMA)?;
        self.setup()
    }

    /// Returns the user tables present; warns about any expected table that
    /// is missing instead of failing.
    pub fn verify(&self) -> anyhow::Result<BTreeSet<String>> {
        let tables: BTreeSet<String> = self
            .fetch_many(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )?
            .into_iter()
            .collect();

        let missing: Vec<&str> = schema::EXPECTED_TABLES
            .iter()
            .copied()
            .filter(|name| !tables.contains(*name))
            .collect();
        if !missing.is_empty() {
            warn!("Database: missing tables: {}", missing.join(", "));
        }

        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Database {
        let db = Database::open(":memory:").unwrap();
        db.setup().unwrap();
        db
    }

    #[test]
    fn test_setup_creates_all_tables() {
        let db = memory_db();
        let tables = db.verify().unwrap();
        for name in schema::EXPECTED_TABLES {
            assert!(tables.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_setup_is_idempotent_and_keeps_rows() {
        let db = memory_db();
        db.upsert_server(1, "guild", None).unwrap();

        db.setup().unwrap();

        let count: Option<i64> = db
            .fetch_one("SELECT COUNT(*) FROM Servers", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, Some(1));
    }

    #[test]
    fn test_reset_drops_existing_rows() {
        let db = memory_db();
        db.upsert_server(1, "guild", None).unwrap();

        let tables = db.reset().unwrap();
        assert_eq!(tables.len(), schema::EXPECTED_TABLES.len());

        let count: Option<i64> = db
            .fetch_one("SELECT COUNT(*) FROM Servers", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, Some(0));
    }

    #[test]
    fn test_verify_reports_missing_tables_without_failing() {
        let db = Database::open(":memory:").unwrap();
        let tables = db.verify().unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = memory_db();
        let enabled: Option<i64> = db
            .fetch_one("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, Some(1));
    }

    #[test]
    fn test_file_database_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logs.db");
        let db = Database::open(path.to_str().unwrap()).unwrap();

        let mode: Option<String> = db
            .fetch_one("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.as_deref(), Some("wal"));
        assert!(path.exists());
    }

    #[test]
    fn test_fetch_one_returns_none_for_no_rows() {
        let db = memory_db();
        let row: Option<String> = db
            .fetch_one("SELECT server_name FROM Servers WHERE server_id = ?1", [42], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(row.is_none());
    }

    #[test]
    fn test_execute_many_is_all_or_nothing() {
        let db = memory_db();
        let result = db.execute_many(
            "INSERT INTO Servers (server_id, server_name) VALUES (?1, ?2)",
            vec![(1, "one"), (2, "two"), (1, "duplicate")],
        );
        assert!(result.is_err());

        let count: Option<i64> = db
            .fetch_one("SELECT COUNT(*) FROM Servers", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, Some(0));

        let inserted = db
            .execute_many(
                "INSERT INTO Servers (server_id, server_name) VALUES (?1, ?2)",
                vec![(1, "one"), (2, "two")],
            )
            .unwrap();
        assert_eq!(inserted, 2);
    }

    #[test]
    fn test_execute_propagates_storage_errors() {
        let db = Database::open(":memory:").unwrap();
        assert!(db.execute("INSERT INTO Servers (server_id) VALUES (1)", []).is_err());
    }

    #[tokio::test]
    async fn test_run_blocking_uses_shared_connection() {
        let db = memory_db();
        db.run_blocking(|db| db.upsert_user(7, "alice", None)).await.unwrap();

        let name: Option<String> = db
            .fetch_one("SELECT username FROM Users WHERE user_id = 7", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name.as_deref(), Some("alice"));
    }
}
