//! SQLite-backed change state store
//!
//! Holds one fingerprint per tracked file path, partitioned into named
//! tables so independent folder sets can keep separate namespaces.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Default table name for tracked file records.
pub const DEFAULT_TABLE: &str = "files";

/// Bounded wait for the SQLite file lock before a query fails.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Store faults, split by whether the run can continue.
///
/// A connect fault is fatal before any scanning starts; a query fault
/// affects a single record and the cycle continues without it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to open change store {path}: {source}")]
    Connect {
        path: String,
        source: rusqlite::Error,
    },
    #[error("store query failed: {0}")]
    Query(#[from] rusqlite::Error),
    #[error("invalid table name: {0:?}")]
    InvalidTable(String),
    #[error("failed to close change store: {0}")]
    Close(rusqlite::Error),
}

/// One persisted record: a tracked file path and its last-seen fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedFile {
    pub path: String,
    pub fingerprint: String,
}

/// Change state store over a single SQLite file.
///
/// Owned by the run loop for the duration of a run; not designed for
/// concurrent multi-writer access.
pub struct ChangeStore {
    db: Connection,
}

impl ChangeStore {
    /// Open (creating if absent) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Connection::open(path).map_err(|source| StoreError::Connect {
            path: path.display().to_string(),
            source,
        })?;
        db.busy_timeout(BUSY_TIMEOUT)
            .map_err(|source| StoreError::Connect {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self { db })
    }

    /// In-memory store for tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let db = Connection::open_in_memory().map_err(|source| StoreError::Connect {
            path: ":memory:".to_string(),
            source,
        })?;
        Ok(Self { db })
    }

    /// Create `table` and its supporting index if absent. Idempotent.
    pub fn ensure_table(&self, table: &str) -> Result<(), StoreError> {
        let table = checked_table_name(table)?;
        self.db.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS \"{}\" (
                    path TEXT PRIMARY KEY,
                    fingerprint TEXT NOT NULL
                )",
                table
            ),
            [],
        )?;
        self.db.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS \"idx_{}_path_fingerprint\"
                 ON \"{}\" (path, fingerprint)",
                table, table
            ),
            [],
        )?;
        Ok(())
    }

    /// Point lookup of the stored fingerprint for `path`.
    ///
    /// Absence is `Ok(None)`, never an error; only storage faults raise.
    pub fn lookup(&self, path: &str, table: &str) -> Result<Option<String>, StoreError> {
        let table = checked_table_name(table)?;
        let fp = self
            .db
            .query_row(
                &format!("SELECT fingerprint FROM \"{}\" WHERE path = ?1", table),
                [path],
                |row| row.get(0),
            )
            .optional()?;
        Ok(fp)
    }

    /// Insert a new record. Callers must have checked that no record for
    /// `path` exists; the classifier guarantees this by looking up first.
    pub fn insert(&self, path: &str, fingerprint: &str, table: &str) -> Result<(), StoreError> {
        let table = checked_table_name(table)?;
        self.db.execute(
            &format!(
                "INSERT INTO \"{}\" (path, fingerprint) VALUES (?1, ?2)",
                table
            ),
            params![path, fingerprint],
        )?;
        Ok(())
    }

    /// Overwrite the fingerprint of an existing record.
    ///
    /// Self-healing: if no record for `path` exists the update falls back
    /// to an insert rather than silently doing nothing.
    pub fn update(&self, path: &str, fingerprint: &str, table: &str) -> Result<(), StoreError> {
        let table = checked_table_name(table)?;
        let updated = self.db.execute(
            &format!("UPDATE \"{}\" SET fingerprint = ?2 WHERE path = ?1", table),
            params![path, fingerprint],
        )?;
        if updated == 0 {
            self.insert(path, fingerprint, &table)?;
        }
        Ok(())
    }

    /// Names of all user tables in the store. Read-only.
    pub fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.db.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// All records in `table`. Read-only; no ordering is implied.
    pub fn list_records(&self, table: &str) -> Result<Vec<TrackedFile>, StoreError> {
        let table = checked_table_name(table)?;
        let mut stmt = self
            .db
            .prepare(&format!("SELECT path, fingerprint FROM \"{}\"", table))?;
        let records = stmt
            .query_map([], |row| {
                Ok(TrackedFile {
                    path: row.get(0)?,
                    fingerprint: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Drop `table` and all its records. For reset and testing only.
    pub fn delete_table(&self, table: &str) -> Result<(), StoreError> {
        let table = checked_table_name(table)?;
        self.db
            .execute(&format!("DROP TABLE IF EXISTS \"{}\"", table), [])?;
        Ok(())
    }

    /// Close the underlying connection explicitly.
    pub fn close(self) -> Result<(), StoreError> {
        self.db.close().map_err(|(_, e)| StoreError::Close(e))
    }
}

/// Table names are interpolated into SQL, so restrict them to plain
/// identifiers.
fn checked_table_name(name: &str) -> Result<String, StoreError> {
    let ok = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(name.to_string())
    } else {
        Err(StoreError::InvalidTable(name.to_string()))
    }
}

/// Normalize a path for consistent storage and lookup.
/// On Windows, lowercases for case-insensitive matching.
pub fn normalize_path(path: &Path) -> String {
    #[cfg(windows)]
    {
        path.to_string_lossy().to_lowercase().replace('\\', "/")
    }
    #[cfg(not(windows))]
    {
        path.to_string_lossy().replace('\\', "/")
    }
}
