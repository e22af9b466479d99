//! Unit and integration tests for gs-sim.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use time::macros::datetime;

use gs_core::{PositionRecord, Waypoint};
use gs_engine::{EngineObserver, NoopEngineObserver, StepEngine, StepState};
use gs_geo::{GeofenceIndex, TrackSequence};
use gs_store::{PositionStore, SqliteStore, StoreError, StoreResult};

use crate::orchestrator::deliver;
use crate::{Command, Orchestrator, RecordBuffer};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn rec(latitude: f64, longitude: f64) -> PositionRecord {
    PositionRecord {
        latitude,
        longitude,
        is_inside_polygon: false,
        exit_time: datetime!(2024-01-01 00:00 UTC),
    }
}

fn square_track() -> TrackSequence {
    TrackSequence::from_points(vec![
        Waypoint::new(0.0, 0.0),
        Waypoint::new(1.0, 0.0),
        Waypoint::new(1.0, 1.0),
        Waypoint::new(0.0, 1.0),
    ])
}

fn engine() -> StepEngine {
    StepEngine::new(Arc::new(GeofenceIndex::degraded()), Duration::from_millis(5))
}

fn orchestrator() -> (Orchestrator<SqliteStore, NoopEngineObserver>, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::in_memory().expect("open store"));
    let orch = Orchestrator::new(engine(), Arc::clone(&store), NoopEngineObserver);
    (orch, store)
}

// ── RecordBuffer ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod record_buffer {
    use super::*;

    #[test]
    fn append_then_drain_preserves_order() {
        let mut buf = RecordBuffer::new();
        buf.append(rec(1.0, 0.0));
        buf.append(rec(2.0, 0.0));
        buf.append(rec(3.0, 0.0));
        assert_eq!(buf.len(), 3);

        let batch = buf.drain();
        let lats: Vec<f64> = batch.iter().map(|r| r.latitude).collect();
        assert_eq!(lats, vec![1.0, 2.0, 3.0]);
        assert!(buf.is_empty());
    }

    #[test]
    fn accepts_appends_after_drain() {
        let mut buf = RecordBuffer::new();
        buf.append(rec(1.0, 0.0));
        let _ = buf.drain();
        buf.append(rec(2.0, 0.0));
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn drain_of_empty_is_empty() {
        let mut buf = RecordBuffer::new();
        assert!(buf.drain().is_empty());
    }
}

// ── Orchestrator bodies (no timers) ───────────────────────────────────────────

#[cfg(test)]
mod bodies {
    use super::*;

    #[test]
    fn steps_buffer_in_emission_order() {
        let (mut orch, store) = orchestrator();
        orch.apply(Command::Load(square_track()));
        assert!(orch.apply(Command::Start), "start must request a timer arm");

        for _ in 0..10 {
            orch.step();
        }
        // 4 waypoints → 3 emissions, then the engine is finished.
        assert_eq!(orch.engine.state(), StepState::Finished);
        assert_eq!(orch.buffer.len(), 3);

        let batch = orch.take_batch().expect("non-empty batch");
        deliver(store.as_ref(), &batch);

        let rows = store.all().unwrap();
        assert_eq!(rows.len(), 3);
        // Id order equals emission order.
        let lons: Vec<f64> = rows.iter().map(|p| p.record.longitude).collect();
        assert_eq!(lons, vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn take_batch_empty_buffer_is_none() {
        let (mut orch, _store) = orchestrator();
        assert!(orch.take_batch().is_none());
    }

    #[test]
    fn pause_and_restart_do_not_rearm() {
        let (mut orch, _store) = orchestrator();
        orch.apply(Command::Load(square_track()));
        orch.apply(Command::Start);
        assert!(!orch.apply(Command::Pause));
        assert!(!orch.apply(Command::Restart));
    }

    #[test]
    fn retime_rearms_only_while_running() {
        let (mut orch, _store) = orchestrator();
        orch.apply(Command::Load(square_track()));

        // Not running yet: interval updates without a re-arm request.
        assert!(!orch.apply(Command::SetInterval(Duration::from_millis(20))));
        assert_eq!(orch.engine.interval(), Duration::from_millis(20));

        orch.apply(Command::Start);
        orch.step();
        let index_before = orch.engine.current_index();
        assert!(orch.apply(Command::SetInterval(Duration::from_millis(7))));
        assert_eq!(orch.engine.current_index(), index_before, "retime must not move the cursor");
    }

    #[test]
    fn restart_keeps_buffered_records() {
        let (mut orch, _store) = orchestrator();
        orch.apply(Command::Load(square_track()));
        orch.apply(Command::Start);
        orch.step();
        assert_eq!(orch.buffer.len(), 1);

        orch.apply(Command::Restart);
        assert_eq!(orch.buffer.len(), 1, "restart only resets the engine");
    }

    #[test]
    fn start_without_track_does_not_arm() {
        let (mut orch, _store) = orchestrator();
        assert!(!orch.apply(Command::Start));
    }
}

// ── Hand-off ──────────────────────────────────────────────────────────────────

/// A sink whose bulk insert always fails.
struct FailingSink;

impl PositionStore for FailingSink {
    fn insert(&self, _: &PositionRecord) -> StoreResult<gs_core::PersistedPosition> {
        Err(StoreError::EmptyBatch)
    }
    fn insert_bulk(&self, _: &[PositionRecord]) -> StoreResult<gs_store::BulkOutcome> {
        Err(StoreError::EmptyBatch)
    }
    fn get(&self, id: i64) -> StoreResult<gs_core::PersistedPosition> {
        Err(StoreError::NotFound(id))
    }
    fn query(&self, _: &gs_store::QueryOptions) -> StoreResult<Vec<gs_core::PersistedPosition>> {
        Ok(vec![])
    }
    fn delete(&self, id: i64) -> StoreResult<()> {
        Err(StoreError::NotFound(id))
    }
    fn clear(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod hand_off {
    use super::*;

    #[test]
    fn failed_delivery_is_dropped_not_propagated() {
        // Must not panic; the batch is simply gone.
        deliver(&FailingSink, &[rec(1.0, 1.0)]);
    }

    #[test]
    fn delivery_dedups_against_store() {
        let store = SqliteStore::in_memory().unwrap();
        let batch = vec![rec(1.0, 1.0), rec(2.0, 2.0)];
        deliver(&store, &batch);
        deliver(&store, &batch); // duplicate flush of the same records
        assert_eq!(store.all().unwrap().len(), 2);
    }
}

// ── Timed loop ────────────────────────────────────────────────────────────────

/// Observer flagging completion, shareable with the test body.
#[derive(Clone, Default)]
struct CompletionFlag {
    finished: Arc<AtomicBool>,
    changes:  Arc<AtomicUsize>,
}

impl EngineObserver for CompletionFlag {
    fn on_containment_change(&mut self, _at: Waypoint, _inside: bool, _message: &str) {
        self.changes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_finished(&mut self, _steps: usize) {
        self.finished.store(true, Ordering::SeqCst);
    }
}

async fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if done() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    done()
}

#[cfg(test)]
mod timed {
    use super::*;

    #[tokio::test]
    async fn pipeline_runs_to_completion() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let flag = CompletionFlag::default();

        let orch = Orchestrator::new(engine(), Arc::clone(&store), flag.clone())
            .flush_period(Duration::from_millis(20));
        let (handle, join) = orch.spawn();

        assert!(handle.load(square_track()));
        assert!(handle.start());

        let finished = wait_until(Duration::from_secs(5), || {
            flag.finished.load(Ordering::SeqCst)
        })
        .await;
        assert!(finished, "engine should finish within the deadline");

        let persisted = wait_until(Duration::from_secs(5), || {
            store.all().map(|rows| rows.len() == 3).unwrap_or(false)
        })
        .await;
        assert!(persisted, "all 3 records should be flushed and stored");

        // One unknown→outside edge against the degraded fence.
        assert_eq!(flag.changes.load(Ordering::SeqCst), 1);

        handle.shutdown();
        join.await.expect("orchestrator task must not panic");
    }

    #[tokio::test]
    async fn shutdown_flushes_residual_records() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let flag = CompletionFlag::default();

        // Flush period far beyond the test horizon: only the shutdown
        // flush can deliver the records.
        let orch = Orchestrator::new(engine(), Arc::clone(&store), flag.clone())
            .flush_period(Duration::from_secs(600));
        let (handle, join) = orch.spawn();

        handle.load(square_track());
        handle.start();
        assert!(
            wait_until(Duration::from_secs(5), || flag.finished.load(Ordering::SeqCst)).await
        );
        assert!(store.all().unwrap().is_empty(), "nothing flushed yet");

        handle.shutdown();
        join.await.unwrap();
        assert_eq!(store.all().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn dropped_handle_stops_the_loop() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let orch = Orchestrator::new(engine(), store, NoopEngineObserver);
        let (handle, join) = orch.spawn();
        drop(handle);
        join.await.expect("loop exits when the last handle is dropped");
    }
}
