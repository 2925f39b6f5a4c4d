//! Coarse spatial cache of restricted field trees.
//!
//! The model's bounding region is partitioned into `sv_size^3` cubes; each
//! cube that intersects the model's support caches the sub-tree relevant to
//! its box. Construction is data-parallel with inserts serialized by one
//! mutex; afterwards the map is frozen and read without locking.
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use glam::Vec3;
use rayon::prelude::*;
use tracing::debug;

use crate::fieldtree::FieldTree;
use crate::geom::Aabb;
use crate::polygonizer::voxel::GridId;

/// One coarse cell and the field restricted to its box.
#[derive(Clone, Debug)]
pub struct SuperVoxel {
    pub id: GridId,
    pub field: FieldTree,
}

impl SuperVoxel {
    /// Evaluates the restricted field at `p`.
    pub fn eval(&self, p: Vec3) -> f32 {
        self.field.eval(p)
    }

    /// Evaluates the restricted field gradient at `p`.
    pub fn grad(&self, p: Vec3) -> Vec3 {
        self.field.grad(p)
    }
}

/// Frozen coarse grid of [`SuperVoxel`]s keyed by packed cell id.
#[derive(Debug)]
pub struct SpatialCache {
    sv_size: u64,
    sv_delta: Vec3,
    origin: Vec3,
    cells: HashMap<u64, SuperVoxel>,
}

impl SpatialCache {
    /// Partitions `bounds` into `sv_size^3` cubes and restricts `tree` to
    /// each in parallel. Cubes without support are left absent.
    pub fn build(tree: &FieldTree, bounds: &Aabb, sv_size: u64) -> Self {
        let origin = bounds.min;
        let sv_delta = bounds.size() / sv_size as f32;
        let cells = Mutex::new(HashMap::new());

        (0..sv_size * sv_size * sv_size)
            .into_par_iter()
            .for_each(|i| {
                let id = GridId::new(i % sv_size, (i / sv_size) % sv_size, i / (sv_size * sv_size));
                let lo = origin + id.as_vec3() * sv_delta;
                let cell = Aabb::new(lo, lo + sv_delta);

                if let Some(field) = tree.sub_tree(&cell) {
                    let sv = SuperVoxel { id, field };
                    // Critical section: one insert per occupied cell.
                    cells
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(id.key(), sv);
                }
            });

        let cells = cells.into_inner().unwrap_or_else(PoisonError::into_inner);
        debug!(
            occupied = cells.len(),
            total = sv_size * sv_size * sv_size,
            "spatial cache built"
        );

        Self {
            sv_size,
            sv_delta,
            origin,
            cells,
        }
    }

    /// Number of occupied coarse cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn sv_delta(&self) -> Vec3 {
        self.sv_delta
    }

    /// Looks up an occupied cell by id.
    pub fn get(&self, id: GridId) -> Option<&SuperVoxel> {
        self.cells.get(&id.key())
    }

    /// Coarse cell id owning `p`, clamped at the boundary so a coordinate
    /// landing exactly on the far face maps to the last cell.
    pub fn locate_id(&self, p: Vec3) -> GridId {
        let v = (p - self.origin) / self.sv_delta;
        let clamp = |c: f32| (c.max(0.0) as u64).min(self.sv_size - 1);
        GridId::new(clamp(v.x), clamp(v.y), clamp(v.z))
    }

    /// The super-voxel owning `p`, if that cell has support.
    pub fn locate(&self, p: Vec3) -> Option<&SuperVoxel> {
        self.get(self.locate_id(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fieldtree::FieldNode;

    fn sphere_tree() -> FieldTree {
        FieldTree::from_root(FieldNode::sphere(1.0, Vec3::ZERO))
    }

    fn sphere_bounds() -> Aabb {
        Aabb::new(Vec3::splat(-2.0), Vec3::splat(2.0))
    }

    #[test]
    fn build_skips_cells_without_support() {
        let cache = SpatialCache::build(&sphere_tree(), &sphere_bounds(), 4);

        // The 4^3 partition of [-2, 2] has corner cells a unit sphere
        // cannot reach.
        assert!(cache.len() < 64);
        assert!(!cache.is_empty());
        assert!(cache.get(GridId::new(0, 0, 0)).is_none());
        assert!(cache.get(GridId::new(1, 1, 1)).is_some());
    }

    #[test]
    fn locate_clamps_the_far_boundary() {
        let cache = SpatialCache::build(&sphere_tree(), &sphere_bounds(), 4);

        assert_eq!(cache.locate_id(Vec3::splat(2.0)), GridId::new(3, 3, 3));
        assert_eq!(cache.locate_id(Vec3::splat(-2.0)), GridId::new(0, 0, 0));
        assert_eq!(cache.locate_id(Vec3::ZERO), GridId::new(2, 2, 2));
    }

    #[test]
    fn occupied_cells_evaluate_like_the_full_tree() {
        let tree = sphere_tree();
        let cache = SpatialCache::build(&tree, &sphere_bounds(), 4);

        let p = Vec3::new(0.9, 0.1, 0.0);
        let sv = cache.locate(p).expect("cell near the surface has support");
        assert!((sv.eval(p) - tree.eval(p)).abs() < 1e-6);
        assert!((sv.grad(p) - tree.grad(p)).length() < 1e-6);
    }

    #[test]
    fn restricted_intersection_matches_the_full_tree() {
        let tree = crate::models::intersection_spheres();
        let bounds = tree.bounds().expand(0.6);
        let cache = SpatialCache::build(&tree, &bounds, 4);
        assert!(!cache.is_empty());

        // An intersection's value depends on every child at every point, so
        // the restricted field must agree with the full tree across each
        // occupied cell, children in range or not.
        let delta = cache.sv_delta();
        for sv in cache.cells.values() {
            let lo = bounds.min + sv.id.as_vec3() * delta;
            for corner in 0..8u32 {
                let offset = Vec3::new(
                    (corner & 1) as f32,
                    ((corner >> 1) & 1) as f32,
                    ((corner >> 2) & 1) as f32,
                );
                let p = lo + offset * delta;
                assert!(
                    (sv.eval(p) - tree.eval(p)).abs() < 1e-6,
                    "cell {:?} diverges at {p}",
                    sv.id
                );
            }
            let centre = lo + delta * 0.5;
            assert!((sv.eval(centre) - tree.eval(centre)).abs() < 1e-6);
        }
    }

    #[test]
    fn empty_tree_builds_an_empty_cache() {
        let cache = SpatialCache::build(&FieldTree::new(), &sphere_bounds(), 4);
        assert!(cache.is_empty());
    }
}
