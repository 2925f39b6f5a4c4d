use iso_track::models;
use iso_track::polygonizer::{Resolution, SurfaceTracker, TrackerConfig};
use iso_track_examples::{init_tracing, summarize};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    init_tracing();

    // A blob of random particles blended into one surface. Change the seed
    // for a different blob; the run is deterministic per seed.
    let mut rng = StdRng::seed_from_u64(42);
    let blob = models::particles(32, 2.0, &mut rng);

    let config = TrackerConfig::new(Resolution::LOW).with_iso_value(0.25);
    let mut tracker = SurfaceTracker::try_new(blob, "particles", config)?;

    tracker.construct_lattice();

    println!("{}", summarize(&tracker));
    print!("{}", tracker.log());

    Ok(())
}
