//! Lattice output of a polygonization run.
use std::collections::HashMap;

use crate::polygonizer::voxel::{FieldSample, Voxel};

/// The discovered surface lattice: every accepted voxel straddling the
/// iso-surface plus all memoized corner samples, keyed by packed point id.
///
/// This is the hand-off boundary to the external mesh assembler; no
/// triangulation is performed here.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct Lattice {
    /// Accepted surface voxels in discovery order.
    pub voxels: Vec<Voxel>,
    /// Memoized field samples keyed by packed fine-grid id.
    pub samples: HashMap<u64, FieldSample>,
    /// Seeds whose local search was abandoned (walk left the grid or hit
    /// the step cap).
    pub seeds_dropped: usize,
}

impl Lattice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn voxel_count(&self) -> usize {
        self.voxels.len()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }
}
