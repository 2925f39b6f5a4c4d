#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

/// Installs a stdout tracing subscriber honoring `RUST_LOG`, defaulting to
/// `info` for the library.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,iso_track=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// One-line lattice summary for example output.
pub fn summarize(tracker: &iso_track::polygonizer::SurfaceTracker) -> String {
    let lattice = tracker.lattice();
    format!(
        "{}: {} voxels, {} points, {} seeds dropped",
        tracker.name(),
        lattice.voxel_count(),
        lattice.sample_count(),
        lattice.seeds_dropped
    )
}
