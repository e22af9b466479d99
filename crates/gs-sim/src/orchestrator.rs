//! The orchestrator loop: step timer, flush timer, command channel.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use gs_core::PositionRecord;
use gs_engine::{EngineObserver, StepEngine};
use gs_geo::TrackSequence;
use gs_store::PositionStore;

use crate::{Command, RecordBuffer};

/// Buffer drain period.  Deliberately coarser than the step interval: many
/// steps ride in one batch.
pub const DEFAULT_FLUSH_PERIOD: Duration = Duration::from_secs(1);

/// Wires a [`StepEngine`] through a [`RecordBuffer`] into a
/// [`PositionStore`], and forwards engine notifications to the supplied
/// observer.  Holds no state beyond these wirings.
pub struct Orchestrator<S: PositionStore + 'static, O: EngineObserver> {
    pub(crate) engine:   StepEngine,
    pub(crate) buffer:   RecordBuffer,
    pub(crate) sink:     Arc<S>,
    pub(crate) observer: O,
    flush_period: Duration,
}

impl<S, O> Orchestrator<S, O>
where
    S: PositionStore + 'static,
    O: EngineObserver + Send + 'static,
{
    pub fn new(engine: StepEngine, sink: Arc<S>, observer: O) -> Self {
        Self {
            engine,
            buffer: RecordBuffer::new(),
            sink,
            observer,
            flush_period: DEFAULT_FLUSH_PERIOD,
        }
    }

    /// Override the flush period.  A zero period is ignored.
    pub fn flush_period(mut self, period: Duration) -> Self {
        if !period.is_zero() {
            self.flush_period = period;
        }
        self
    }

    /// Spawn the loop onto the current runtime, returning a control handle
    /// and the loop's join handle.
    pub fn spawn(self) -> (SimHandle, JoinHandle<()>) {
        let (commands, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let handle = SimHandle { commands, cancel: cancel.clone() };
        let join = tokio::spawn(self.run(receiver, cancel));
        (handle, join)
    }

    /// The cooperative loop.  Runs until cancelled or until every
    /// [`SimHandle`] is dropped, then flushes the residual buffer.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        cancel: CancellationToken,
    ) {
        tracing::info!(flush_period_ms = self.flush_period.as_millis() as u64, "orchestrator started");

        let mut step_timer = arm(self.engine.interval());
        let mut flush_timer = arm(self.flush_period);

        loop {
            let running = self.engine.is_running();
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if self.apply(command) {
                        // Old timer is dropped before the new one is armed:
                        // there is never a second live step timer.
                        step_timer = arm(self.engine.interval());
                    }
                }

                _ = step_timer.tick(), if running => self.step(),

                _ = flush_timer.tick() => self.flush(),
            }
        }

        // Records emitted since the last flush are not lost on shutdown.
        if let Some(batch) = self.take_batch() {
            let sink = Arc::clone(&self.sink);
            let _ = tokio::task::spawn_blocking(move || deliver(sink.as_ref(), &batch)).await;
        }
        tracing::info!("orchestrator stopped");
    }

    // ── Loop bodies (separated from scheduling for testability) ───────────

    /// Apply one command; returns whether the step timer must be re-armed.
    pub(crate) fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Load(track) => {
                self.engine.load(track);
                false
            }
            Command::Start => self.engine.start(),
            Command::Pause => {
                self.engine.pause();
                false
            }
            Command::Restart => {
                self.engine.restart();
                false
            }
            Command::SetInterval(interval) => {
                self.engine.set_interval(interval);
                // Retime takes effect immediately, not after the old period.
                self.engine.is_running()
            }
        }
    }

    /// One step-timer fire: advance the engine and buffer the emission.
    pub(crate) fn step(&mut self) {
        let now = OffsetDateTime::now_utc();
        if let Some(emission) = self.engine.tick(now, &mut self.observer) {
            self.buffer.append(emission.record);
        }
    }

    /// One flush-timer fire: swap the buffer out and hand the batch off
    /// without awaiting the result.
    fn flush(&mut self) {
        let Some(batch) = self.take_batch() else { return };
        let sink = Arc::clone(&self.sink);
        tokio::task::spawn_blocking(move || deliver(sink.as_ref(), &batch));
    }

    pub(crate) fn take_batch(&mut self) -> Option<Vec<PositionRecord>> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(self.buffer.drain())
    }
}

/// Hand one batch to the sink.  At-most-once: a failed batch is logged and
/// dropped, never retried, and never surfaces to the simulation loop.
pub(crate) fn deliver<S: PositionStore + ?Sized>(sink: &S, batch: &[PositionRecord]) {
    match sink.insert_bulk(batch) {
        Ok(outcome) => {
            tracing::debug!(inserted = outcome.inserted, skipped = outcome.skipped, "batch persisted");
        }
        Err(e) => {
            tracing::warn!(dropped = batch.len(), "batch hand-off failed: {e}");
        }
    }
}

/// A fresh repeating timer whose first fire is one full period out.
fn arm(period: Duration) -> Interval {
    let mut timer = tokio::time::interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

// ── SimHandle ─────────────────────────────────────────────────────────────────

/// Cheap cloneable control handle for a spawned orchestrator.
///
/// Send methods report whether the loop was still alive to receive the
/// command.
#[derive(Clone)]
pub struct SimHandle {
    commands: mpsc::UnboundedSender<Command>,
    cancel:   CancellationToken,
}

impl SimHandle {
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn load(&self, track: TrackSequence) -> bool {
        self.send(Command::Load(track))
    }

    pub fn start(&self) -> bool {
        self.send(Command::Start)
    }

    pub fn pause(&self) -> bool {
        self.send(Command::Pause)
    }

    pub fn restart(&self) -> bool {
        self.send(Command::Restart)
    }

    pub fn set_interval(&self, interval: Duration) -> bool {
        self.send(Command::SetInterval(interval))
    }

    /// Stop the loop.  The orchestrator flushes residual records first.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
