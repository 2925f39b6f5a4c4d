#![forbid(unsafe_code)]
//! iso_track: implicit-surface polygonization with field-tree evaluation and
//! concurrent surface tracking.
//!
//! Modules:
//! - fieldtree: author and evaluate CSG-style DAGs of implicit scalar fields
//! - polygonizer: coarse spatial cache, surface tracker, and lattice output
//! - models: canonical model constructors used by examples and benches
//!
//! The polygonizer discovers the voxels straddling an iso-surface by flood
//! filling outward from seed points; the resulting [`polygonizer::lattice::Lattice`]
//! is handed to an external mesh assembler.
pub mod error;
pub mod fieldtree;
pub mod geom;
pub mod models;
pub mod polygonizer;

/// Convenient re-exports for common types. Import with `use iso_track::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::fieldtree::{FieldNode, FieldRef, FieldTree};
    pub use crate::geom::Aabb;
    pub use crate::polygonizer::cache::{SpatialCache, SuperVoxel};
    pub use crate::polygonizer::config::{Resolution, TrackerConfig};
    pub use crate::polygonizer::lattice::Lattice;
    pub use crate::polygonizer::tracker::SurfaceTracker;
    pub use crate::polygonizer::voxel::{FieldSample, GridId, Voxel};
}
