//! Persistent element store
//!
//! A single SQLite table of element records, deduplicated on the content
//! triple (name, line1, line2). One connection sits behind a mutex: every
//! upsert batch is one transaction taken under the lock and every scan is one
//! query under the lock, so readers never see half a batch.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::Serialize;
use tracing::debug;

use crate::data::ElementTriple;
use crate::Result;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS tles (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL,
    line1      TEXT NOT NULL,
    line2      TEXT NOT NULL,
    source     TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    UNIQUE (name, line1, line2)
);
";

// Element lines are never rewritten on conflict, only the metadata
const UPSERT_SQL: &str = "
INSERT INTO tles (name, line1, line2, source, fetched_at)
VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT (name, line1, line2) DO UPDATE SET
    source = excluded.source,
    fetched_at = excluded.fetched_at
";

const SELECT_ALL_SQL: &str =
    "SELECT id, name, line1, line2, source, fetched_at FROM tles ORDER BY id";

/// A stored element set with its fetch metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementRecord {
    pub id: i64,
    pub name: String,
    pub line1: String,
    pub line2: String,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

/// Outcome of one upsert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// Triples that were not stored before
    pub inserted: usize,
    /// Triples that already existed and had their metadata refreshed
    pub refreshed: usize,
}

/// SQLite-backed element store, shareable across threads.
pub struct ElementStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for ElementStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementStore").finish_non_exhaustive()
    }
}

impl ElementStore {
    /// Open (or create) the database file at `path`.
    ///
    /// Missing parent directories are created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(Duration::from_secs(5))?;
        debug!(path = %path.as_ref().display(), "opened element store");
        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(ElementStore {
            conn: Mutex::new(conn),
        })
    }

    /// Upsert a batch stamped with the current time.
    pub fn upsert(&self, records: &[ElementTriple], source: &str) -> Result<UpsertReport> {
        self.upsert_at(records, source, Utc::now())
    }

    /// Upsert a batch with an explicit fetch timestamp.
    ///
    /// New triples are inserted; existing ones get `source` and `fetched_at`
    /// replaced. The whole batch commits or none of it does.
    pub fn upsert_at(
        &self,
        records: &[ElementTriple],
        source: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<UpsertReport> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let before = count_rows(&tx)?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
            for r in records {
                stmt.execute(params![r.name, r.line1, r.line2, source, fetched_at])?;
            }
        }
        let after = count_rows(&tx)?;

        tx.commit()?;

        let inserted = (after - before) as usize;
        Ok(UpsertReport {
            inserted,
            refreshed: records.len() - inserted,
        })
    }

    /// Every stored record, in ascending id (first insertion) order.
    pub fn fetch_all(&self) -> Result<Vec<ElementRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(SELECT_ALL_SQL)?;
        let rows = stmt.query_map([], |row| {
            Ok(ElementRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                line1: row.get(2)?,
                line2: row.get(3)?,
                source: row.get(4)?,
                fetched_at: row.get(5)?,
            })
        })?;

        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Number of stored records.
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock();
        Ok(count_rows(&conn)? as usize)
    }

    /// True when nothing has been stored yet.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn count_rows(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM tles", [], |row| row.get(0))
}
