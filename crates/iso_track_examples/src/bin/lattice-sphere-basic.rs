use iso_track::models;
use iso_track::polygonizer::{Resolution, SurfaceTracker, TrackerConfig};
use iso_track_examples::{init_tracing, summarize};

fn main() -> anyhow::Result<()> {
    init_tracing();

    // A unit sphere tracked at the default iso-value of 0.5, so the surface
    // sits half a unit outside the primitive.
    let config = TrackerConfig::new(Resolution::LOW);
    let mut tracker = SurfaceTracker::try_new(models::sphere(1.0), "sphere", config)?;

    tracker.construct_lattice();

    println!("{}", summarize(&tracker));
    print!("{}", tracker.log());

    Ok(())
}
