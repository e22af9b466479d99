//! Control commands accepted by the orchestrator.

use std::time::Duration;

use gs_geo::TrackSequence;

/// One engine transition, delivered over the orchestrator's command channel.
///
/// Commands are applied between timer ticks, never during one, so every
/// transition observes a quiescent engine.
#[derive(Debug)]
pub enum Command {
    /// Bind a new track and reset the cursor.
    Load(TrackSequence),
    /// Begin or resume stepping.
    Start,
    /// Stop stepping, retaining the cursor.
    Pause,
    /// Reset the cursor and return to idle.  Buffered records are kept.
    Restart,
    /// Change the step period; re-arms the timer immediately when running.
    SetInterval(Duration),
}
