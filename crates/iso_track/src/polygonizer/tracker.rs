//! Surface tracker: discovers every fine-grid voxel the iso-surface passes
//! through.
//!
//! A run builds the coarse [`SpatialCache`], converts the tree's seed points
//! to grid cells, walks each seed along the field gradient until it finds a
//! cell with a sign change (in parallel, with a hard step cap), then drains
//! the frontier single-threaded: pop, dedup, fill, classify, expand across
//! crossed edges. Point evaluation is memoized so cells sharing corners
//! never evaluate the field twice.
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Write as _;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use glam::Vec3;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::fieldtree::FieldTree;
use crate::geom::Aabb;
use crate::polygonizer::cache::SpatialCache;
use crate::polygonizer::config::TrackerConfig;
use crate::polygonizer::lattice::Lattice;
use crate::polygonizer::tables::{EDGE_DECALS, LINE_TABLE, VOXEL_DECALS};
use crate::polygonizer::voxel::{FieldSample, GridId, Voxel};

/// Polygonizer for one implicit model.
///
/// Owns the field tree for its lifetime; per-run state (spatial cache,
/// memoized points, dedup set, lattice) is rebuilt by
/// [`SurfaceTracker::construct_lattice`] and discarded when the model or
/// iso-value changes.
pub struct SurfaceTracker {
    tree: FieldTree,
    config: TrackerConfig,
    name: String,
    bounds: Aabb,
    grid_delta: Vec3,
    cache: Option<SpatialCache>,
    seen_points: Mutex<HashMap<u64, FieldSample>>,
    seen_voxels: Mutex<HashSet<u64>>,
    lattice: Lattice,
    log: String,
}

impl SurfaceTracker {
    /// Creates a tracker for `tree`, validating the configuration and the
    /// tree's adjacency before any parallel work can start.
    pub fn try_new(tree: FieldTree, name: impl Into<String>, config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        tree.validate()?;

        let (bounds, grid_delta) = model_region(&tree, &config);
        Ok(Self {
            tree,
            config,
            name: name.into(),
            bounds,
            grid_delta,
            cache: None,
            seen_points: Mutex::new(HashMap::new()),
            seen_voxels: Mutex::new(HashSet::new()),
            lattice: Lattice::new(),
            log: String::new(),
        })
    }

    /// Replaces the model and discards all per-run state.
    pub fn set_model(&mut self, tree: FieldTree) -> Result<()> {
        tree.validate()?;
        let (bounds, grid_delta) = model_region(&tree, &self.config);
        self.tree = tree;
        self.bounds = bounds;
        self.grid_delta = grid_delta;
        self.reset_run_state();
        Ok(())
    }

    /// Changes the target iso-value and discards all per-run state.
    pub fn set_iso_value(&mut self, iso_value: f32) {
        self.config.iso_value = iso_value;
        let (bounds, grid_delta) = model_region(&self.tree, &self.config);
        self.bounds = bounds;
        self.grid_delta = grid_delta;
        self.reset_run_state();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn tree(&self) -> &FieldTree {
        &self.tree
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The lattice produced by the last [`SurfaceTracker::construct_lattice`].
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Human-readable run log: phase timings and counts.
    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Responsibility boundary: mesh assembly happens downstream of the
    /// lattice, so there is nothing to write here.
    pub fn save_mesh(&self) {
        debug!(
            model = %self.name,
            "mesh assembly is delegated to an external consumer; no file written"
        );
    }

    /// Discovers all voxels straddling the iso-surface and populates the
    /// lattice. An empty or rootless model yields an empty lattice.
    pub fn construct_lattice(&mut self) {
        let total = Instant::now();
        self.reset_run_state();

        let _ = writeln!(self.log, "Lattice generation: '{}'", self.name);
        let _ = writeln!(self.log, "#===========================#");

        if !self.tree.has_root() {
            info!(model = %self.name, "no model set; lattice left empty");
            let _ = writeln!(self.log, "no model set; nothing to do");
            return;
        }

        let phase = Instant::now();
        let cache = SpatialCache::build(&self.tree, &self.bounds, self.config.sv_size);
        let _ = writeln!(
            self.log,
            "super-voxels: {} occupied cells in {:.3}s",
            cache.len(),
            phase.elapsed().as_secs_f32()
        );
        self.cache = Some(cache);

        let phase = Instant::now();
        let seed_points = self.tree.seeds();
        let this: &Self = self;
        let seeds: Vec<GridId> = seed_points
            .par_iter()
            .map(|&p| this.grid_id_at(p))
            .collect();
        let _ = writeln!(
            self.log,
            "seeds: {} converted in {:.3}s",
            seeds.len(),
            phase.elapsed().as_secs_f32()
        );

        let phase = Instant::now();
        self.march_on_surface(&seeds);
        let _ = writeln!(
            self.log,
            "march: {} voxels, {} points, {} seeds dropped in {:.3}s",
            self.lattice.voxel_count(),
            self.lattice.sample_count(),
            self.lattice.seeds_dropped,
            phase.elapsed().as_secs_f32()
        );
        let _ = writeln!(
            self.log,
            "total: {:.3}s",
            total.elapsed().as_secs_f32()
        );

        info!(
            model = %self.name,
            voxels = self.lattice.voxel_count(),
            points = self.lattice.sample_count(),
            seeds_dropped = self.lattice.seeds_dropped,
            "lattice constructed"
        );
    }

    fn reset_run_state(&mut self) {
        self.cache = None;
        self.seen_points
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.seen_voxels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.lattice = Lattice::new();
    }

    /// Memoized point evaluation.
    ///
    /// Safe under concurrent insertion of the same key: results are
    /// deterministic for identical inputs, so the last writer wins.
    fn find_voxel_point(&self, id: GridId) -> FieldSample {
        let key = id.key();
        if let Some(sample) = self
            .seen_points
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .copied()
        {
            return sample;
        }

        let position = self.bounds.min + id.as_vec3() * self.grid_delta;
        let sample = match self.cache.as_ref() {
            Some(cache) => {
                let sv_id = cache.locate_id(position);
                match cache.get(sv_id) {
                    Some(sv) => FieldSample::new(
                        position,
                        sv.eval(position),
                        sv.grad(position),
                        sv_id.key(),
                    ),
                    // A corner can sit in a coarse cell without support;
                    // fall back to the full tree there.
                    None => FieldSample::new(
                        position,
                        self.tree.eval(position),
                        self.tree.grad(position),
                        sv_id.key(),
                    ),
                }
            }
            None => FieldSample::new(
                position,
                self.tree.eval(position),
                self.tree.grad(position),
                0,
            ),
        };

        self.seen_points
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, sample);
        sample
    }

    /// Resolves the four corner samples of `voxel` concurrently.
    fn fill_voxel(&self, voxel: &mut Voxel) {
        let id = voxel.id;
        voxel
            .corners
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, corner)| {
                let [dx, dy, dz] = VOXEL_DECALS[i];
                *corner = self.find_voxel_point(id.offset(dx as i64, dy as i64, dz as i64));
            });
    }

    /// Dedup gate. One lock spans the check and the insert so two
    /// concurrent callers cannot both observe "not seen" for the same id.
    fn seen_voxel(&self, id: GridId) -> bool {
        !self
            .seen_voxels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.key())
    }

    /// Edges of the quad whose endpoints straddle the iso-value, scanning
    /// consecutive corners.
    fn crossed_edges(&self, voxel: &Voxel) -> Vec<usize> {
        let mut edges = Vec::new();
        for edge in 0..voxel.corners.len() {
            let a = voxel.corners[edge].scalar() - self.config.iso_value;
            let b = voxel.corners[(edge + 1) % voxel.corners.len()].scalar() - self.config.iso_value;
            if (a > 0.0) != (b > 0.0) {
                edges.push(edge);
            }
        }
        edges
    }

    /// 4-bit case code of a filled voxel; bit `i` is set when corner `i`
    /// lies above the iso-value.
    pub fn case_code(&self, voxel: &Voxel) -> usize {
        voxel
            .corners
            .iter()
            .enumerate()
            .filter(|(_, c)| c.scalar() > self.config.iso_value)
            .fold(0, |code, (i, _)| code | (1 << i))
    }

    /// Contour segments of a filled voxel as pairs of edge ids.
    pub fn contour_segments(&self, voxel: &Voxel) -> Vec<[usize; 2]> {
        let row = LINE_TABLE[self.case_code(voxel)];
        row.chunks_exact(2)
            .filter(|pair| pair[0] >= 0)
            .map(|pair| [pair[0] as usize, pair[1] as usize])
            .collect()
    }

    /// Seed-to-frontier discovery followed by the sequential frontier drain.
    fn march_on_surface(&mut self, seeds: &[GridId]) {
        if seeds.is_empty() {
            warn!(model = %self.name, "no seeds; lattice left empty");
            return;
        }

        // Each seed walks independently; results funnel into one frontier.
        let this: &Self = self;
        let starts: Vec<GridId> = seeds
            .par_iter()
            .filter_map(|&seed| this.frontier_start(seed))
            .collect();
        let dropped = seeds.len() - starts.len();

        let mut frontier: VecDeque<GridId> = starts.into();
        if frontier.is_empty() {
            debug!("exiting on empty frontier");
        }

        // Sequential by design: correctness relies on the incremental
        // dedup-and-expand ordering.
        let mut accepted: Vec<Voxel> = Vec::new();
        while let Some(top) = frontier.pop_front() {
            if self.seen_voxel(top) {
                continue;
            }

            let mut voxel = Voxel::new(top);
            self.fill_voxel(&mut voxel);

            let edges = self.crossed_edges(&voxel);
            if edges.is_empty() {
                // Dead end; do not expand neighbours.
                continue;
            }

            for edge in edges {
                let [dx, dy] = EDGE_DECALS[edge];
                let neighbour = top.offset(dx, dy, 0);
                if !neighbour.in_grid(self.config.grid_size) {
                    continue;
                }
                frontier.push_back(neighbour);
            }
            accepted.push(voxel);
        }

        self.lattice.voxels = accepted;
        self.lattice.seeds_dropped = dropped;
        self.lattice.samples = std::mem::take(
            &mut *self
                .seen_points
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
    }

    /// Finds a surface-crossing voxel for one seed, or `None` when the walk
    /// leaves the grid, meets a flat gradient, or exceeds the step cap.
    fn frontier_start(&self, seed: GridId) -> Option<GridId> {
        let grid_size = self.config.grid_size;
        let clamp = |c: u64| c.min(grid_size - 1);
        let mut current = GridId::new(clamp(seed.x), clamp(seed.y), clamp(seed.z));

        if self.contains_surface(current) {
            return Some(current);
        }

        for _ in 0..self.config.walk_cap() {
            let centre = self.bounds.min + (current.as_vec3() + Vec3::splat(0.5)) * self.grid_delta;
            let value = self.tree.eval(centre);
            let mut normal = self.tree.grad(centre).normalize_or_zero();
            if normal == Vec3::ZERO {
                return None;
            }
            // Walk down the field when outside the surface, up when inside.
            if value > self.config.iso_value {
                normal = -normal;
            }

            current = current.offset(
                normal.x.round() as i64,
                normal.y.round() as i64,
                normal.z.round() as i64,
            );
            if !current.in_grid(grid_size) {
                return None;
            }
            if self.contains_surface(current) {
                return Some(current);
            }
        }

        debug!(
            cap = self.config.walk_cap(),
            "seed walk exceeded step cap; dropping seed"
        );
        None
    }

    fn contains_surface(&self, id: GridId) -> bool {
        let mut voxel = Voxel::new(id);
        self.fill_voxel(&mut voxel);
        !self.crossed_edges(&voxel).is_empty()
    }

    /// Fine-grid cell owning a world-space point, clamped into the grid.
    fn grid_id_at(&self, p: Vec3) -> GridId {
        let v = (p - self.bounds.min) / self.grid_delta;
        let clamp = |c: f32| (c.max(0.0) as u64).min(self.config.grid_size - 1);
        GridId::new(clamp(v.x), clamp(v.y), clamp(v.z))
    }
}

fn model_region(tree: &FieldTree, config: &TrackerConfig) -> (Aabb, Vec3) {
    if !tree.has_root() {
        return (Aabb::default(), Vec3::ZERO);
    }

    // The iso-surface of a distance-like field sits up to `iso_value`
    // outside the primitive bounds; pad by that plus a safety margin so
    // boundary voxels still straddle it.
    let raw = tree.bounds();
    let pad = config.iso_value.max(0.0) + 0.05 * raw.size().max_element().max(1.0);
    let bounds = raw.expand(pad);
    let grid_delta = bounds.size() / config.grid_size as f32;
    (bounds, grid_delta)
}
