//! Ready-made implicit models for demos, tests, and benchmarks.
use glam::{Affine3A, Quat, Vec3};
use rand::RngCore;

use crate::fieldtree::{FieldNode, FieldTree};

/// Unit-ish sphere at the origin.
pub fn sphere(radius: f32) -> FieldTree {
    FieldTree::from_root(FieldNode::sphere(radius, Vec3::ZERO))
}

/// Torus in the XZ plane at the origin.
pub fn torus(major_radius: f32, minor_radius: f32) -> FieldTree {
    FieldTree::from_root(FieldNode::torus(major_radius, minor_radius, Vec3::ZERO))
}

/// Two overlapping spheres blended into a peanut shape.
pub fn peanut() -> FieldTree {
    let left = FieldNode::sphere(1.0, Vec3::new(-0.75, 0.0, 0.0));
    let right = FieldNode::sphere(1.0, Vec3::new(0.75, 0.0, 0.0));
    FieldTree::from_root(FieldNode::blend(vec![left, right], 0.5))
}

/// Sharp union of two offset spheres.
pub fn union_spheres() -> FieldTree {
    let left = FieldNode::sphere(1.0, Vec3::new(-0.75, 0.0, 0.0));
    let right = FieldNode::sphere(1.0, Vec3::new(0.75, 0.0, 0.0));
    FieldTree::from_root(FieldNode::union(vec![left, right]))
}

/// Lens-shaped intersection of two offset spheres.
pub fn intersection_spheres() -> FieldTree {
    let left = FieldNode::sphere(1.0, Vec3::new(-0.5, 0.0, 0.0));
    let right = FieldNode::sphere(1.0, Vec3::new(0.5, 0.0, 0.0));
    FieldTree::from_root(FieldNode::intersection(vec![left, right]))
}

/// Torus tilted out of its plane and pushed off the origin.
pub fn transformed_torus() -> FieldTree {
    let torus = FieldNode::torus(1.0, 0.25, Vec3::ZERO);
    let transform = Affine3A::from_rotation_translation(
        Quat::from_rotation_x(std::f32::consts::FRAC_PI_4),
        Vec3::new(0.5, 0.25, 0.0),
    );
    FieldTree::from_root(FieldNode::transform(torus, transform))
}

/// Blob of `count` small spheres at random positions inside a cube of the
/// given half extent, blended into one surface. Deterministic for a given
/// rng state.
pub fn particles(count: usize, half_extent: f32, rng: &mut dyn RngCore) -> FieldTree {
    let spheres = (0..count)
        .map(|_| {
            let center = Vec3::new(
                (rand01(rng) * 2.0 - 1.0) * half_extent,
                (rand01(rng) * 2.0 - 1.0) * half_extent,
                (rand01(rng) * 2.0 - 1.0) * half_extent,
            );
            let radius = 0.2 + 0.3 * rand01(rng);
            FieldNode::sphere(radius, center)
        })
        .collect();
    FieldTree::from_root(FieldNode::blend(spheres, 0.5))
}

/// Generate a random float in the range [0, 1].
#[inline]
fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}
