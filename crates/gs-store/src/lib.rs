//! `gs-store` — the ingestion-sink boundary of the `geosim` pipeline.
//!
//! The [`PositionStore`] trait is the request surface of the persistence
//! collaborator, one method per operation:
//!
//! | Method        | Request-surface equivalent                          |
//! |---------------|-----------------------------------------------------|
//! | `insert`      | `POST /positions`                                   |
//! | `insert_bulk` | `POST /positions/bulk`                              |
//! | `get`         | `GET /positions/{id}`                               |
//! | `query`       | `GET /positions` / `GET /positions/filtered?…`      |
//! | `delete`      | `DELETE /positions/{id}`                            |
//! | `clear`       | `DELETE /positions`                                 |
//!
//! Two backends are provided:
//!
//! | Feature  | Backend       | Where the rows live                        |
//! |----------|---------------|--------------------------------------------|
//! | *(none)* | [`SqliteStore`] | a local SQLite file (or `:memory:`)      |
//! | `http`   | `RemoteStore` | an out-of-process sink speaking JSON       |
//!
//! The natural key for deduplication is the exact (latitude, longitude)
//! pair.  `SqliteStore` enforces it with a `UNIQUE` constraint *and* runs
//! each bulk call as one locked transaction, so check-then-insert is a
//! single unit even under concurrent callers.

pub mod error;
pub mod query;
pub mod sink;
pub mod sqlite;

#[cfg(feature = "http")]
pub mod http;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{StoreError, StoreResult};
pub use query::{QueryOptions, SortField, UnknownSortField};
pub use sink::{BulkOutcome, PositionStore};
pub use sqlite::SqliteStore;

#[cfg(feature = "http")]
pub use http::RemoteStore;
