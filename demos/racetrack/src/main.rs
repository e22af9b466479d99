//! racetrack — smallest runnable composition of the geosim pipeline.
//!
//! Steps a simulated vehicle around an embedded circuit (or any GeoJSON/CSV
//! track you pass in), checks each position against the reference geofence,
//! and persists the deduplicated stream to SQLite.  Containment transitions
//! are logged as they happen; the persisted table is printed at the end.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use time::format_description::well_known::Rfc3339;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

use gs_core::Waypoint;
use gs_engine::{EngineObserver, StepEngine};
use gs_geo::{GeofenceIndex, TrackSequence};
use gs_sim::Orchestrator;
use gs_store::{PositionStore, QueryOptions, SortField, SqliteStore};

// ── Embedded sample inputs ────────────────────────────────────────────────────

/// Rectangular circuit fence, (0,0)..(10,6).
const SAMPLE_FENCE: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "geometry": {"type": "Polygon", "coordinates":
      [[[0.0, 0.0], [10.0, 0.0], [10.0, 6.0], [0.0, 6.0], [0.0, 0.0]]]}}
  ]
}"#;

/// One lap with a short excursion off the circuit between points 5 and 7.
const SAMPLE_TRACK: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1.0, 1.0]}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [3.0, 1.0]}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [5.0, 1.5]}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [7.0, 2.0]}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [9.0, 3.0]}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [11.0, 4.0]}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [11.5, 5.5]}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [9.5, 5.5]}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [7.0, 5.0]}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [4.0, 4.5]}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [2.0, 3.0]}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1.0, 1.5]}}
  ]
}"#;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "racetrack", about = "Geofenced track-position simulator")]
struct Cli {
    /// Track file: GeoJSON Point features, or CSV with an x,y header.
    #[arg(long)]
    track: Option<PathBuf>,

    /// Geofence file: GeoJSON Polygon/MultiPolygon features.
    #[arg(long)]
    fence: Option<PathBuf>,

    /// Step period in milliseconds.
    #[arg(long, default_value_t = 50)]
    interval_ms: u64,

    /// Buffer flush period in milliseconds.
    #[arg(long, default_value_t = 1000)]
    flush_ms: u64,

    /// SQLite database path; in-memory when omitted.
    #[arg(long)]
    db: Option<PathBuf>,
}

// ── Observer ──────────────────────────────────────────────────────────────────

/// Logs engine notifications and signals run completion to main.
struct ConsoleObserver {
    done: Option<oneshot::Sender<usize>>,
}

impl EngineObserver for ConsoleObserver {
    fn on_containment_change(&mut self, _at: Waypoint, inside: bool, message: &str) {
        if inside {
            tracing::info!("{message}");
        } else {
            tracing::warn!("{message}");
        }
    }

    fn on_degraded_geofence(&mut self) {
        tracing::warn!("geofence unavailable: every position reports outside");
    }

    fn on_finished(&mut self, steps: usize) {
        if let Some(done) = self.done.take() {
            let _ = done.send(steps);
        }
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // 1. Reference geofence: parse failures run degraded, not silent.
    let fence = match &cli.fence {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read fence file {}", path.display()))?;
            match GeofenceIndex::from_geojson_str(&raw) {
                Ok(fence) => fence,
                Err(e) => {
                    tracing::warn!("fence rejected ({e}); continuing degraded");
                    GeofenceIndex::degraded()
                }
            }
        }
        None => GeofenceIndex::from_geojson_str(SAMPLE_FENCE).expect("embedded fence is valid"),
    };
    let fence = Arc::new(fence);
    tracing::info!(polygons = fence.polygon_count(), degraded = fence.is_degraded(), "geofence ready");

    // 2. Track: an invalid track refuses to start (reject-all, no partial load).
    let track = match &cli.track {
        Some(path) => {
            let is_csv = path.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if is_csv {
                let file = std::fs::File::open(path)
                    .with_context(|| format!("open track file {}", path.display()))?;
                TrackSequence::from_csv_reader(file)?
            } else {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("read track file {}", path.display()))?;
                TrackSequence::from_geojson_str(&raw)?
            }
        }
        None => TrackSequence::from_geojson_str(SAMPLE_TRACK).expect("embedded track is valid"),
    };
    if track.len() < 2 {
        bail!("track has {} waypoint(s); at least 2 are required", track.len());
    }
    let waypoints = track.len();
    tracing::info!(waypoints, "track loaded");

    // 3. Store.
    let store = Arc::new(match &cli.db {
        Some(path) => SqliteStore::open(path)?,
        None => SqliteStore::in_memory()?,
    });

    // 4. Wire the pipeline.
    let engine = StepEngine::new(fence, Duration::from_millis(cli.interval_ms.max(1)));
    let (done_tx, done_rx) = oneshot::channel();
    let orchestrator = Orchestrator::new(
        engine,
        Arc::clone(&store),
        ConsoleObserver { done: Some(done_tx) },
    )
    .flush_period(Duration::from_millis(cli.flush_ms.max(1)));
    let (handle, join) = orchestrator.spawn();

    // 5. Run to completion.
    handle.load(track);
    handle.start();

    let deadline = Duration::from_millis(cli.interval_ms.max(1) * waypoints as u64 + 5_000);
    match tokio::time::timeout(deadline, done_rx).await {
        Ok(Ok(steps)) => tracing::info!(steps, "run complete"),
        _ => tracing::warn!("run did not complete before the deadline; shutting down"),
    }

    handle.shutdown(); // flushes the residual buffer
    join.await.expect("orchestrator task panicked");

    // 6. Persisted table, id ascending.
    let rows = store.all()?;
    println!();
    println!("{:<6} {:<12} {:<12} {:<8} {:<26}", "id", "latitude", "longitude", "inside", "exit time");
    println!("{}", "-".repeat(68));
    for row in &rows {
        println!(
            "{:<6} {:<12.6} {:<12.6} {:<8} {:<26}",
            row.id,
            row.record.latitude,
            row.record.longitude,
            row.record.is_inside_polygon,
            row.record.exit_time.format(&Rfc3339)?,
        );
    }
    println!();

    let inside = store.query(&QueryOptions::default().inside(true).sort(SortField::Latitude))?;
    println!("{} positions persisted, {} inside the geofence", rows.len(), inside.len());

    Ok(())
}
