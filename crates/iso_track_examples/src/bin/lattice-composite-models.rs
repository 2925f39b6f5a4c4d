use iso_track::fieldtree::FieldTree;
use iso_track::models;
use iso_track::polygonizer::{Resolution, SurfaceTracker, TrackerConfig};
use iso_track_examples::{init_tracing, summarize};

fn main() -> anyhow::Result<()> {
    init_tracing();

    // Compare lattice sizes across the composite operators at the same
    // resolution: the sharp union, the blended peanut, the lens-shaped
    // intersection, and a transformed torus.
    let models: [(&str, FieldTree); 4] = [
        ("union", models::union_spheres()),
        ("peanut", models::peanut()),
        ("intersection", models::intersection_spheres()),
        ("tilted torus", models::transformed_torus()),
    ];

    let config = TrackerConfig::new(Resolution::LOW);
    for (name, tree) in models {
        let mut tracker = SurfaceTracker::try_new(tree, name, config.clone())?;
        tracker.construct_lattice();
        println!("{}", summarize(&tracker));
    }

    Ok(())
}
