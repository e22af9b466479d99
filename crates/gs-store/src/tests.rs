//! Unit tests for gs-store (SQLite backend and query options).

use time::macros::datetime;
use time::Duration as TimeDuration;

use gs_core::PositionRecord;

use crate::sink::PositionStore;
use crate::{BulkOutcome, QueryOptions, SortField, SqliteStore, StoreError};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn store() -> SqliteStore {
    SqliteStore::in_memory().expect("open in-memory store")
}

fn rec(latitude: f64, longitude: f64, inside: bool) -> PositionRecord {
    PositionRecord {
        latitude,
        longitude,
        is_inside_polygon: inside,
        exit_time: datetime!(2024-01-01 00:00 UTC),
    }
}

fn rec_at(latitude: f64, longitude: f64, secs: i64) -> PositionRecord {
    PositionRecord {
        latitude,
        longitude,
        is_inside_polygon: true,
        exit_time: datetime!(2024-01-01 00:00 UTC) + TimeDuration::seconds(secs),
    }
}

// ── Single insert ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod single_insert {
    use super::*;

    #[test]
    fn insert_assigns_increasing_ids() {
        let s = store();
        let a = s.insert(&rec(1.0, 1.0, true)).unwrap();
        let b = s.insert(&rec(2.0, 2.0, false)).unwrap();
        assert!(b.id > a.id);
        assert_eq!(a.record, rec(1.0, 1.0, true));
    }

    #[test]
    fn duplicate_pair_conflicts() {
        let s = store();
        s.insert(&rec(1.0, 2.0, true)).unwrap();

        // Same pair at a different exit time is still a conflict: the
        // natural key is the coordinate pair alone.
        let later = rec_at(1.0, 2.0, 3600);
        let err = s.insert(&later).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { latitude, longitude }
            if latitude == 1.0 && longitude == 2.0));
    }

    #[test]
    fn swapped_components_are_distinct() {
        let s = store();
        s.insert(&rec(1.0, 2.0, true)).unwrap();
        s.insert(&rec(2.0, 1.0, true)).unwrap();
        assert_eq!(s.all().unwrap().len(), 2);
    }
}

// ── Bulk insert ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod bulk_insert {
    use super::*;

    #[test]
    fn empty_batch_rejected() {
        let s = store();
        assert!(matches!(s.insert_bulk(&[]), Err(StoreError::EmptyBatch)));
    }

    #[test]
    fn bulk_is_idempotent_under_resubmission() {
        let s = store();
        let batch: Vec<_> = (0..5).map(|i| rec(i as f64, 0.0, true)).collect();

        let first = s.insert_bulk(&batch).unwrap();
        assert_eq!(first, BulkOutcome { inserted: 5, skipped: 0 });

        let second = s.insert_bulk(&batch).unwrap();
        assert_eq!(second, BulkOutcome { inserted: 0, skipped: 5 });
        assert_eq!(s.all().unwrap().len(), 5);
    }

    #[test]
    fn intra_batch_duplicates_collapse() {
        let s = store();
        let batch = vec![rec(1.0, 1.0, true), rec(2.0, 2.0, true), rec(1.0, 1.0, false)];
        let outcome = s.insert_bulk(&batch).unwrap();
        assert_eq!(outcome, BulkOutcome { inserted: 2, skipped: 1 });

        // The first occurrence wins.
        let rows = s.all().unwrap();
        let kept = rows.iter().find(|p| p.record.latitude == 1.0).unwrap();
        assert!(kept.record.is_inside_polygon);
    }

    #[test]
    fn bulk_skips_rows_already_stored() {
        let s = store();
        s.insert(&rec(1.0, 1.0, true)).unwrap();

        let batch = vec![rec(1.0, 1.0, true), rec(2.0, 2.0, false)];
        let outcome = s.insert_bulk(&batch).unwrap();
        assert_eq!(outcome, BulkOutcome { inserted: 1, skipped: 1 });
    }

    #[test]
    fn bulk_preserves_batch_order() {
        let s = store();
        let batch: Vec<_> = [3.0, 1.0, 2.0].iter().map(|&lat| rec(lat, 0.0, true)).collect();
        s.insert_bulk(&batch).unwrap();

        let rows = s.all().unwrap(); // id ascending = insertion order
        let lats: Vec<f64> = rows.iter().map(|p| p.record.latitude).collect();
        assert_eq!(lats, vec![3.0, 1.0, 2.0]);
    }
}

// ── Queries ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod queries {
    use super::*;

    fn mixed_store() -> SqliteStore {
        let s = store();
        s.insert(&rec(3.0, 30.0, true)).unwrap();
        s.insert(&rec(1.0, 10.0, false)).unwrap();
        s.insert(&rec(2.0, 20.0, true)).unwrap();
        s
    }

    #[test]
    fn default_is_id_ascending() {
        let s = mixed_store();
        let ids: Vec<i64> = s.all().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn inside_filter_with_descending_latitude() {
        let s = mixed_store();
        let opts = QueryOptions::default()
            .inside(true)
            .sort(SortField::Latitude)
            .descending();
        let rows = s.query(&opts).unwrap();

        assert!(rows.iter().all(|p| p.record.is_inside_polygon));
        let lats: Vec<f64> = rows.iter().map(|p| p.record.latitude).collect();
        assert_eq!(lats, vec![3.0, 2.0]);
    }

    #[test]
    fn outside_filter() {
        let s = mixed_store();
        let rows = s.query(&QueryOptions::default().inside(false)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.latitude, 1.0);
    }

    #[test]
    fn sort_by_exit_time() {
        let s = store();
        s.insert(&rec_at(1.0, 1.0, 300)).unwrap();
        s.insert(&rec_at(2.0, 2.0, 100)).unwrap();
        s.insert(&rec_at(3.0, 3.0, 200)).unwrap();

        let rows = s.query(&QueryOptions::default().sort(SortField::ExitTime)).unwrap();
        let lats: Vec<f64> = rows.iter().map(|p| p.record.latitude).collect();
        assert_eq!(lats, vec![2.0, 3.0, 1.0]);
    }

    #[test]
    fn exit_time_round_trips() {
        let s = store();
        let original = rec_at(5.0, 6.0, 4242);
        s.insert(&original).unwrap();
        let fetched = s.get(1).unwrap();
        assert_eq!(fetched.record.exit_time, original.exit_time);
    }
}

// ── Get / delete / clear ──────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use super::*;

    #[test]
    fn get_unknown_id_not_found() {
        let s = store();
        assert!(matches!(s.get(99), Err(StoreError::NotFound(99))));
    }

    #[test]
    fn delete_then_get_not_found() {
        let s = store();
        let row = s.insert(&rec(1.0, 1.0, true)).unwrap();
        s.delete(row.id).unwrap();
        assert!(matches!(s.get(row.id), Err(StoreError::NotFound(_))));
        assert!(matches!(s.delete(row.id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn clear_empties_the_table() {
        let s = store();
        s.insert(&rec(1.0, 1.0, true)).unwrap();
        s.insert(&rec(2.0, 2.0, false)).unwrap();
        s.clear().unwrap();
        assert!(s.all().unwrap().is_empty());

        // Clearing releases the natural keys.
        s.insert(&rec(1.0, 1.0, true)).unwrap();
    }

    #[test]
    fn file_backed_store_persists() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("positions.db");
        {
            let s = SqliteStore::open(&path).unwrap();
            s.insert(&rec(1.0, 1.0, true)).unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.all().unwrap().len(), 1);
    }
}

// ── Wire shapes ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod wire {
    use super::*;

    #[test]
    fn sort_field_parses_wire_names() {
        assert_eq!("id".parse::<SortField>().unwrap(), SortField::Id);
        assert_eq!("latitude".parse::<SortField>().unwrap(), SortField::Latitude);
        assert_eq!("isinsidepolygon".parse::<SortField>().unwrap(), SortField::IsInsidePolygon);
        assert_eq!("ExitTime".parse::<SortField>().unwrap(), SortField::ExitTime);
        assert!("distance".parse::<SortField>().is_err());
    }

    #[test]
    fn bulk_outcome_wire_names() {
        let json = serde_json::to_value(BulkOutcome { inserted: 3, skipped: 1 }).unwrap();
        assert_eq!(json["insertedCount"], 3);
        assert_eq!(json["skippedCount"], 1);
    }
}
