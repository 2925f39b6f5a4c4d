//! Polygonization kernel: spatial acceleration, surface tracking, and the
//! lattice output handed to an external mesh assembler.
pub mod cache;
pub mod config;
pub mod hash;
pub mod lattice;
pub mod tables;
pub mod tracker;
pub mod voxel;

pub use cache::{SpatialCache, SuperVoxel};
pub use config::{Resolution, TrackerConfig};
pub use lattice::Lattice;
pub use tracker::SurfaceTracker;
pub use voxel::{FieldSample, GridId, Voxel};
