//! Field node variants for implicit-surface composition.
//!
//! This module defines the data model for the field DAG: primitive distance
//! fields as leaves and CSG-style operators as interior nodes. Nodes are
//! shared through [`FieldRef`] so one primitive may be aliased by several
//! composite parents without duplicating evaluation state.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::sync::Arc;

use glam::{Affine3A, Vec2, Vec3};

use crate::geom::Aabb;

/// Shared handle to a field node.
pub type FieldRef = Arc<FieldNode>;

/// Step used for finite-difference gradients where no analytic form exists.
const GRAD_EPS: f32 = 1e-3;

/// Parameters for a sphere primitive.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug)]
pub struct SphereParams {
    /// Sphere radius.
    pub radius: f32,
    /// Sphere center in world space.
    pub center: Vec3,
}

/// Parameters for a torus primitive. The ring lies in the XZ plane.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug)]
pub struct TorusParams {
    /// Distance from the center to the middle of the tube.
    pub major_radius: f32,
    /// Tube radius.
    pub minor_radius: f32,
    /// Torus center in world space.
    pub center: Vec3,
}

/// Parameters for a smooth blend operator.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug)]
pub struct BlendParams {
    /// Blending radius; larger values smooth a wider band around the join.
    pub smoothing: f32,
}

/// Parameters for a spatial transform operator.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug)]
pub struct TransformParams {
    /// Local-to-world transform applied to the child field.
    pub transform: Affine3A,
    /// Cached world-to-local inverse used on the evaluation path.
    pub inverse: Affine3A,
}

impl TransformParams {
    pub fn new(transform: Affine3A) -> Self {
        Self {
            transform,
            inverse: transform.inverse(),
        }
    }
}

/// A node in the field DAG.
///
/// Evaluation is bottom-up and the composition graph must stay acyclic;
/// [`crate::fieldtree::FieldTree::validate`] checks the latter through the
/// explicit adjacency.
#[derive(Clone, Debug)]
pub enum FieldNode {
    Sphere {
        params: SphereParams,
    },
    Torus {
        params: TorusParams,
    },
    /// Minimum of the children.
    Union {
        children: Vec<FieldRef>,
    },
    /// Maximum of the children.
    Intersection {
        children: Vec<FieldRef>,
    },
    /// Smooth minimum of the children; C1 where Union is only C0.
    Blend {
        children: Vec<FieldRef>,
        params: BlendParams,
    },
    /// Child field evaluated at the inverse-transformed point.
    Transform {
        child: FieldRef,
        params: TransformParams,
    },
}

impl FieldNode {
    /// Creates a shared sphere primitive.
    pub fn sphere(radius: f32, center: Vec3) -> FieldRef {
        Arc::new(FieldNode::Sphere {
            params: SphereParams { radius, center },
        })
    }

    /// Creates a shared torus primitive.
    pub fn torus(major_radius: f32, minor_radius: f32, center: Vec3) -> FieldRef {
        Arc::new(FieldNode::Torus {
            params: TorusParams {
                major_radius,
                minor_radius,
                center,
            },
        })
    }

    /// Creates a union of the given children.
    pub fn union(children: Vec<FieldRef>) -> FieldRef {
        Arc::new(FieldNode::Union { children })
    }

    /// Creates an intersection of the given children.
    pub fn intersection(children: Vec<FieldRef>) -> FieldRef {
        Arc::new(FieldNode::Intersection { children })
    }

    /// Creates a smooth blend of the given children.
    pub fn blend(children: Vec<FieldRef>, smoothing: f32) -> FieldRef {
        Arc::new(FieldNode::Blend {
            children,
            params: BlendParams { smoothing },
        })
    }

    /// Creates a transformed copy of `child`.
    pub fn transform(child: FieldRef, transform: Affine3A) -> FieldRef {
        Arc::new(FieldNode::Transform {
            child,
            params: TransformParams::new(transform),
        })
    }

    /// Child nodes of this node; empty for primitives.
    pub fn children(&self) -> &[FieldRef] {
        match self {
            FieldNode::Sphere { .. } | FieldNode::Torus { .. } => &[],
            FieldNode::Union { children }
            | FieldNode::Intersection { children }
            | FieldNode::Blend { children, .. } => children,
            FieldNode::Transform { child, .. } => std::slice::from_ref(child),
        }
    }

    /// True for leaf primitives.
    pub fn is_primitive(&self) -> bool {
        self.children().is_empty()
    }

    /// Evaluates the scalar field at `p`.
    pub fn eval(&self, p: Vec3) -> f32 {
        match self {
            FieldNode::Sphere { params } => (p - params.center).length() - params.radius,
            FieldNode::Torus { params } => {
                let rel = p - params.center;
                let ring = Vec2::new(rel.x, rel.z).length() - params.major_radius;
                Vec2::new(ring, rel.y).length() - params.minor_radius
            }
            FieldNode::Union { children } => children
                .iter()
                .map(|c| c.eval(p))
                .fold(f32::INFINITY, f32::min),
            FieldNode::Intersection { children } => children
                .iter()
                .map(|c| c.eval(p))
                .fold(f32::NEG_INFINITY, f32::max),
            FieldNode::Blend { children, params } => {
                let mut value = f32::INFINITY;
                for child in children {
                    value = smooth_min(value, child.eval(p), params.smoothing);
                }
                value
            }
            FieldNode::Transform { child, params } => {
                child.eval(params.inverse.transform_point3(p))
            }
        }
    }

    /// Evaluates the field gradient at `p`, consistent with [`FieldNode::eval`].
    pub fn grad(&self, p: Vec3) -> Vec3 {
        match self {
            FieldNode::Sphere { params } => (p - params.center).normalize_or_zero(),
            FieldNode::Torus { params } => {
                let rel = p - params.center;
                let ring = Vec2::new(rel.x, rel.z);
                let ring_len = ring.length();
                if ring_len <= f32::EPSILON {
                    // On the torus axis the field is radially symmetric; any
                    // outward direction in the ring plane is a valid gradient.
                    return Vec3::new(-1.0, 0.0, 0.0);
                }
                let ring_dir = ring / ring_len;
                let q = Vec2::new(ring_len - params.major_radius, rel.y).normalize_or_zero();
                Vec3::new(q.x * ring_dir.x, q.y, q.x * ring_dir.y)
            }
            FieldNode::Union { children } => {
                let mut best = f32::INFINITY;
                let mut grad = Vec3::ZERO;
                for child in children {
                    let value = child.eval(p);
                    if value < best {
                        best = value;
                        grad = child.grad(p);
                    }
                }
                grad
            }
            FieldNode::Intersection { children } => {
                let mut best = f32::NEG_INFINITY;
                let mut grad = Vec3::ZERO;
                for child in children {
                    let value = child.eval(p);
                    if value > best {
                        best = value;
                        grad = child.grad(p);
                    }
                }
                grad
            }
            // The smooth minimum has no cheap closed-form gradient over an
            // arbitrary child count; central differences keep it consistent
            // with eval.
            FieldNode::Blend { .. } => {
                let dx = Vec3::new(GRAD_EPS, 0.0, 0.0);
                let dy = Vec3::new(0.0, GRAD_EPS, 0.0);
                let dz = Vec3::new(0.0, 0.0, GRAD_EPS);
                Vec3::new(
                    self.eval(p + dx) - self.eval(p - dx),
                    self.eval(p + dy) - self.eval(p - dy),
                    self.eval(p + dz) - self.eval(p - dz),
                ) / (2.0 * GRAD_EPS)
            }
            FieldNode::Transform { child, params } => {
                let local = params.inverse.transform_point3(p);
                params.inverse.matrix3.transpose() * child.grad(local)
            }
        }
    }

    /// Bounding volume of the node's support. Conservative for composites.
    pub fn bounds(&self) -> Aabb {
        match self {
            FieldNode::Sphere { params } => {
                Aabb::from_center_half_extents(params.center, Vec3::splat(params.radius))
            }
            FieldNode::Torus { params } => {
                let reach = params.major_radius + params.minor_radius;
                Aabb::from_center_half_extents(
                    params.center,
                    Vec3::new(reach, params.minor_radius, reach),
                )
            }
            FieldNode::Union { children } | FieldNode::Intersection { children } => {
                merged_bounds(children)
            }
            FieldNode::Blend { children, params } => {
                merged_bounds(children).expand(params.smoothing)
            }
            FieldNode::Transform { child, params } => child.bounds().transform(&params.transform),
        }
    }

    /// Surface seed points: at least one per primitive, pushed through any
    /// enclosing transforms. Empty only when the node owns no primitives.
    pub fn seeds(&self) -> Vec<Vec3> {
        match self {
            FieldNode::Sphere { params } => {
                vec![params.center + Vec3::new(params.radius, 0.0, 0.0)]
            }
            FieldNode::Torus { params } => {
                vec![
                    params.center
                        + Vec3::new(params.major_radius + params.minor_radius, 0.0, 0.0),
                ]
            }
            FieldNode::Union { children }
            | FieldNode::Intersection { children }
            | FieldNode::Blend { children, .. } => {
                children.iter().flat_map(|c| c.seeds()).collect()
            }
            FieldNode::Transform { child, params } => child
                .seeds()
                .into_iter()
                .map(|s| params.transform.transform_point3(s))
                .collect(),
        }
    }

    /// Reduces `node` to the sub-DAG whose primitives intersect `region`.
    ///
    /// Returns `None` when no primitive under `node` touches the region.
    /// Untouched sub-DAGs are shared rather than cloned.
    pub fn restrict(node: &FieldRef, region: &Aabb) -> Option<FieldRef> {
        match node.as_ref() {
            FieldNode::Sphere { .. } | FieldNode::Torus { .. } => {
                node.bounds().intersects(region).then(|| node.clone())
            }
            FieldNode::Union { children } => {
                rebuild_composite(node, children, region, |kept| FieldNode::Union {
                    children: kept,
                })
            }
            // The maximum depends on every child at every point: dropping a
            // child whose bounds miss the region would turn max(a, b) into b
            // inside it. Keep the node whole whenever any child has support.
            FieldNode::Intersection { children } => children
                .iter()
                .any(|c| FieldNode::restrict(c, region).is_some())
                .then(|| node.clone()),
            FieldNode::Blend { children, params } => {
                let params = *params;
                rebuild_composite(node, children, region, move |kept| FieldNode::Blend {
                    children: kept,
                    params,
                })
            }
            FieldNode::Transform { child, params } => {
                let local_region = region.transform(&params.inverse);
                let kept = FieldNode::restrict(child, &local_region)?;
                if Arc::ptr_eq(&kept, child) {
                    Some(node.clone())
                } else {
                    Some(Arc::new(FieldNode::Transform {
                        child: kept,
                        params: *params,
                    }))
                }
            }
        }
    }
}

fn merged_bounds(children: &[FieldRef]) -> Aabb {
    let mut iter = children.iter();
    let Some(first) = iter.next() else {
        return Aabb::default();
    };
    iter.fold(first.bounds(), |acc, c| acc.merge(&c.bounds()))
}

fn rebuild_composite(
    node: &FieldRef,
    children: &[FieldRef],
    region: &Aabb,
    make: impl FnOnce(Vec<FieldRef>) -> FieldNode,
) -> Option<FieldRef> {
    let kept: Vec<FieldRef> = children
        .iter()
        .filter_map(|c| FieldNode::restrict(c, region))
        .collect();

    if kept.is_empty() {
        return None;
    }
    let unchanged = kept.len() == children.len()
        && kept.iter().zip(children).all(|(a, b)| Arc::ptr_eq(a, b));
    if unchanged {
        Some(node.clone())
    } else {
        Some(Arc::new(make(kept)))
    }
}

/// Polynomial smooth minimum with blending radius `k`.
fn smooth_min(a: f32, b: f32, k: f32) -> f32 {
    if k <= 0.0 || !a.is_finite() {
        return a.min(b);
    }
    let h = (0.5 + 0.5 * (b - a) / k).clamp(0.0, 1.0);
    b + (a - b) * h - k * h * (1.0 - h)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32, tol: f32) {
        assert!((a - b).abs() < tol, "{a} != {b}");
    }

    fn finite_difference_grad(node: &FieldNode, p: Vec3) -> Vec3 {
        let e = 1e-3;
        Vec3::new(
            node.eval(p + Vec3::X * e) - node.eval(p - Vec3::X * e),
            node.eval(p + Vec3::Y * e) - node.eval(p - Vec3::Y * e),
            node.eval(p + Vec3::Z * e) - node.eval(p - Vec3::Z * e),
        ) / (2.0 * e)
    }

    #[test]
    fn sphere_eval_is_signed_distance() {
        let s = FieldNode::sphere(1.0, Vec3::ZERO);
        approx_eq(s.eval(Vec3::new(2.0, 0.0, 0.0)), 1.0, 1e-6);
        approx_eq(s.eval(Vec3::ZERO), -1.0, 1e-6);
        approx_eq(s.eval(Vec3::new(0.0, 1.0, 0.0)), 0.0, 1e-6);
    }

    #[test]
    fn torus_zero_level_on_ring() {
        let t = FieldNode::torus(1.0, 0.25, Vec3::ZERO);
        approx_eq(t.eval(Vec3::new(1.25, 0.0, 0.0)), 0.0, 1e-6);
        approx_eq(t.eval(Vec3::new(0.0, 0.0, 0.75)), 0.0, 1e-6);
        assert!(t.eval(Vec3::ZERO) > 0.0);
    }

    #[test]
    fn union_is_min_intersection_is_max_of_children() {
        let a = FieldNode::sphere(1.0, Vec3::new(1.0, 0.0, 0.0));
        let b = FieldNode::sphere(1.0, Vec3::new(-1.0, 0.0, 0.0));
        let union = FieldNode::union(vec![a.clone(), b.clone()]);
        let inter = FieldNode::intersection(vec![a.clone(), b.clone()]);

        let p = Vec3::new(0.5, 0.0, 0.0);
        approx_eq(union.eval(p), a.eval(p).min(b.eval(p)), 1e-6);
        approx_eq(inter.eval(p), a.eval(p).max(b.eval(p)), 1e-6);
        // At the origin both children agree by symmetry.
        approx_eq(union.eval(Vec3::ZERO), 0.0, 1e-6);
    }

    #[test]
    fn blend_stays_at_or_below_union() {
        let a = FieldNode::sphere(1.0, Vec3::new(1.0, 0.0, 0.0));
        let b = FieldNode::sphere(1.0, Vec3::new(-1.0, 0.0, 0.0));
        let union = FieldNode::union(vec![a.clone(), b.clone()]);
        let blend = FieldNode::blend(vec![a, b], 0.5);

        for x in [-1.5f32, -0.5, 0.0, 0.5, 1.5] {
            let p = Vec3::new(x, 0.2, 0.1);
            assert!(blend.eval(p) <= union.eval(p) + 1e-6);
        }
    }

    #[test]
    fn gradients_match_finite_differences() {
        let torus = FieldNode::torus(1.0, 0.25, Vec3::ZERO);
        let blend = FieldNode::blend(
            vec![
                FieldNode::sphere(1.0, Vec3::new(1.0, 0.0, 0.0)),
                FieldNode::sphere(1.0, Vec3::new(-1.0, 0.0, 0.0)),
            ],
            0.5,
        );

        for p in [
            Vec3::new(1.4, 0.3, 0.2),
            Vec3::new(0.2, 0.8, -0.4),
            Vec3::new(-0.7, 0.1, 0.9),
        ] {
            let g = torus.grad(p);
            let fd = finite_difference_grad(&torus, p);
            assert!((g - fd).length() < 1e-2, "torus grad mismatch at {p}");

            let g = blend.grad(p);
            let fd = finite_difference_grad(&blend, p);
            assert!((g - fd).length() < 1e-2, "blend grad mismatch at {p}");
        }
    }

    #[test]
    fn transform_evaluates_child_at_inverse_point() {
        let s = FieldNode::sphere(1.0, Vec3::ZERO);
        let moved = FieldNode::transform(s, Affine3A::from_translation(Vec3::new(2.0, 0.0, 0.0)));

        approx_eq(moved.eval(Vec3::new(2.0, 0.0, 0.0)), -1.0, 1e-6);
        approx_eq(moved.eval(Vec3::new(4.0, 0.0, 0.0)), 1.0, 1e-6);

        let g = moved.grad(Vec3::new(3.5, 0.0, 0.0));
        assert!((g - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn restrict_prunes_disjoint_primitives_and_shares_untouched_nodes() {
        let near = FieldNode::sphere(1.0, Vec3::ZERO);
        let far = FieldNode::sphere(1.0, Vec3::new(10.0, 0.0, 0.0));
        let union = FieldNode::union(vec![near.clone(), far.clone()]);

        let region = Aabb::new(Vec3::splat(-2.0), Vec3::splat(2.0));
        let restricted = FieldNode::restrict(&union, &region).expect("near sphere intersects");
        assert_eq!(restricted.children().len(), 1);
        assert!(Arc::ptr_eq(&restricted.children()[0], &near));

        let empty_region = Aabb::new(Vec3::splat(20.0), Vec3::splat(21.0));
        assert!(FieldNode::restrict(&union, &empty_region).is_none());

        // A region covering everything shares the original node.
        let wide = Aabb::new(Vec3::splat(-20.0), Vec3::splat(20.0));
        let same = FieldNode::restrict(&union, &wide).expect("all intersect");
        assert!(Arc::ptr_eq(&same, &union));
    }

    #[test]
    fn restrict_keeps_every_intersection_child() {
        let a = FieldNode::sphere(1.0, Vec3::new(-0.5, 0.0, 0.0));
        let b = FieldNode::sphere(1.0, Vec3::new(0.5, 0.0, 0.0));
        let inter = FieldNode::intersection(vec![a.clone(), b.clone()]);

        // Region overlapping only the left sphere's bounds. Pruning the
        // right child here would change max(a, b) to a inside the region.
        let region = Aabb::new(Vec3::new(-1.5, -0.2, -0.2), Vec3::new(-1.1, 0.2, 0.2));
        let restricted = FieldNode::restrict(&inter, &region).expect("left sphere intersects");
        assert!(Arc::ptr_eq(&restricted, &inter));

        let p = Vec3::new(-1.2, 0.0, 0.1);
        approx_eq(restricted.eval(p), inter.eval(p), 1e-6);

        let empty = Aabb::new(Vec3::splat(30.0), Vec3::splat(31.0));
        assert!(FieldNode::restrict(&inter, &empty).is_none());
    }

    #[test]
    fn seeds_cover_each_primitive() {
        let a = FieldNode::sphere(1.0, Vec3::new(5.0, 0.0, 0.0));
        let b = FieldNode::torus(1.0, 0.25, Vec3::new(-5.0, 0.0, 0.0));
        let union = FieldNode::union(vec![a, b]);

        let seeds = union.seeds();
        assert_eq!(seeds.len(), 2);
        approx_eq(union.eval(seeds[0]), 0.0, 1e-5);
        approx_eq(union.eval(seeds[1]), 0.0, 1e-5);
    }
}
