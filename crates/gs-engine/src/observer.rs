//! Engine observer trait for geofence notifications and run progress.

use gs_core::Waypoint;

/// Callbacks raised by [`StepEngine::tick`][crate::StepEngine::tick] at key
/// points of a run.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — transition printer
///
/// ```rust,ignore
/// struct TransitionPrinter;
///
/// impl EngineObserver for TransitionPrinter {
///     fn on_containment_change(&mut self, _at: Waypoint, inside: bool, message: &str) {
///         println!("{} {message}", if inside { "IN " } else { "OUT" });
///     }
/// }
/// ```
pub trait EngineObserver {
    /// Raised once per containment edge (outside→inside or inside→outside),
    /// including the unknown→known edge on the first step of a run.  Never
    /// raised on repeated same-state steps.
    fn on_containment_change(&mut self, _at: Waypoint, _inside: bool, _message: &str) {}

    /// Raised on the first step of a run when the geofence is degraded
    /// (reference geometry absent or unparseable): every containment answer
    /// of this run is `false` by policy.
    fn on_degraded_geofence(&mut self) {}

    /// Raised when the engine consumes the final waypoint pair and stops.
    /// `steps` is the number of records emitted during the run.
    fn on_finished(&mut self, _steps: usize) {}
}

/// An [`EngineObserver`] that does nothing.
pub struct NoopEngineObserver;

impl EngineObserver for NoopEngineObserver {}
