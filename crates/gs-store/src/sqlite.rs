//! SQLite backend.
//!
//! One `positions` table guarded by `UNIQUE (latitude, longitude)`.  The
//! connection sits behind a mutex and every bulk call runs inside a single
//! transaction, so the dedup key scan and the inserts see one consistent
//! view of the table.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::Connection;
use rustc_hash::FxHashSet;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use gs_core::{PersistedPosition, PositionKey, PositionRecord};

use crate::sink::{BulkOutcome, PositionStore};
use crate::{QueryOptions, StoreError, StoreResult};

/// A [`PositionStore`] over a local SQLite database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and initialise the schema.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// An in-memory store, private to this instance.
    pub fn in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS positions (
                 id                INTEGER PRIMARY KEY AUTOINCREMENT,
                 latitude          REAL NOT NULL,
                 longitude         REAL NOT NULL,
                 is_inside_polygon INTEGER NOT NULL,
                 exit_time         TEXT NOT NULL,
                 UNIQUE (latitude, longitude)
             );",
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

// ── Row mapping ───────────────────────────────────────────────────────────────

/// `exit_time` is stored as RFC 3339 TEXT: lexicographic order equals
/// chronological order, so `ORDER BY exit_time` needs no decoding.
fn encode_time(t: OffsetDateTime) -> StoreResult<String> {
    Ok(t.format(&Rfc3339)?)
}

fn row_to_position(row: &rusqlite::Row<'_>) -> rusqlite::Result<PersistedPosition> {
    let raw_time: String = row.get(4)?;
    let exit_time = OffsetDateTime::parse(&raw_time, &Rfc3339)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    Ok(PersistedPosition {
        id:     row.get(0)?,
        record: PositionRecord {
            latitude:          row.get(1)?,
            longitude:         row.get(2)?,
            is_inside_polygon: row.get(3)?,
            exit_time,
        },
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ── PositionStore impl ────────────────────────────────────────────────────────

const INSERT_SQL: &str = "INSERT INTO positions \
     (latitude, longitude, is_inside_polygon, exit_time) \
     VALUES (?1, ?2, ?3, ?4)";

impl PositionStore for SqliteStore {
    fn insert(&self, record: &PositionRecord) -> StoreResult<PersistedPosition> {
        let exit_time = encode_time(record.exit_time)?;
        let conn = self.conn.lock();

        let result = conn.execute(
            INSERT_SQL,
            rusqlite::params![
                record.latitude,
                record.longitude,
                record.is_inside_polygon,
                exit_time,
            ],
        );
        match result {
            Ok(_) => Ok(PersistedPosition {
                id:     conn.last_insert_rowid(),
                record: record.clone(),
            }),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict {
                latitude:  record.latitude,
                longitude: record.longitude,
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn insert_bulk(&self, batch: &[PositionRecord]) -> StoreResult<BulkOutcome> {
        if batch.is_empty() {
            return Err(StoreError::EmptyBatch);
        }

        let conn = self.conn.lock();
        let tx = conn.unchecked_transaction()?;

        // Key scan and inserts share the transaction: one consistent view.
        let mut seen: FxHashSet<PositionKey> = FxHashSet::default();
        {
            let mut stmt = tx.prepare_cached("SELECT latitude, longitude FROM positions")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                seen.insert(PositionKey::new(row.get(0)?, row.get(1)?));
            }
        }

        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare_cached(INSERT_SQL)?;
            for record in batch {
                // `insert` returning false covers both already-stored keys
                // and duplicates earlier in this batch.
                if !seen.insert(record.natural_key()) {
                    continue;
                }
                stmt.execute(rusqlite::params![
                    record.latitude,
                    record.longitude,
                    record.is_inside_polygon,
                    encode_time(record.exit_time)?,
                ])?;
                inserted += 1;
            }
        }
        tx.commit()?;

        Ok(BulkOutcome { inserted, skipped: batch.len() - inserted })
    }

    fn get(&self, id: i64) -> StoreResult<PersistedPosition> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, latitude, longitude, is_inside_polygon, exit_time \
             FROM positions WHERE id = ?1",
        )?;
        match stmt.query_row([id], row_to_position) {
            Ok(row) => Ok(row),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    fn query(&self, opts: &QueryOptions) -> StoreResult<Vec<PersistedPosition>> {
        let mut sql = String::from(
            "SELECT id, latitude, longitude, is_inside_polygon, exit_time FROM positions",
        );
        if opts.inside.is_some() {
            sql.push_str(" WHERE is_inside_polygon = ?1");
        }
        // Sort column comes from the SortField enum, never from raw input.
        // Id tiebreak keeps the order deterministic on equal keys.
        sql.push_str(" ORDER BY ");
        sql.push_str(opts.sort.column());
        sql.push_str(if opts.ascending { " ASC" } else { " DESC" });
        sql.push_str(", id ASC");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = match opts.inside {
            Some(flag) => stmt.query_map([flag], row_to_position)?,
            None => stmt.query_map([], row_to_position)?,
        };
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn delete(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM positions WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM positions", [])?;
        tracing::debug!(removed, "position table cleared");
        Ok(())
    }
}
