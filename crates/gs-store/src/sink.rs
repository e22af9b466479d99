//! The `PositionStore` trait implemented by all backends.

use gs_core::{PersistedPosition, PositionRecord};

use crate::{QueryOptions, StoreResult};

/// Counts reported by a bulk insert.  Wire shape:
/// `{"insertedCount": …, "skippedCount": …}`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct BulkOutcome {
    #[serde(rename = "insertedCount")]
    pub inserted: usize,
    #[serde(rename = "skippedCount")]
    pub skipped: usize,
}

/// The persistence sink's boundary contract.
///
/// Implementations must be callable from any thread: the pipeline hands
/// batches over from blocking tasks while other callers may be querying.
/// The bulk dedup check and its inserts are one unit per call; concurrent
/// `insert_bulk`/`insert` calls never surface duplicate-key failures to the
/// caller.
pub trait PositionStore: Send + Sync {
    /// Persist one record, assigning its id.
    ///
    /// Fails with [`StoreError::Conflict`][crate::StoreError::Conflict]
    /// when the (latitude, longitude) pair is already stored.
    fn insert(&self, record: &PositionRecord) -> StoreResult<PersistedPosition>;

    /// Persist a batch, skipping records whose (latitude, longitude) pair
    /// is already stored or duplicated earlier in the same batch.
    ///
    /// Rejects an empty batch.  Resubmitting an already-persisted batch is
    /// a no-op that reports everything skipped.
    fn insert_bulk(&self, batch: &[PositionRecord]) -> StoreResult<BulkOutcome>;

    /// Fetch one row by id.
    fn get(&self, id: i64) -> StoreResult<PersistedPosition>;

    /// All rows matching `opts`, in the requested order.
    fn query(&self, opts: &QueryOptions) -> StoreResult<Vec<PersistedPosition>>;

    /// All rows, id ascending.
    fn all(&self) -> StoreResult<Vec<PersistedPosition>> {
        self.query(&QueryOptions::default())
    }

    /// Delete one row by id; unknown ids report
    /// [`StoreError::NotFound`][crate::StoreError::NotFound].
    fn delete(&self, id: i64) -> StoreResult<()>;

    /// Delete every row.
    fn clear(&self) -> StoreResult<()>;
}
