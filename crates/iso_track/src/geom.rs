//! Axis-aligned bounding boxes used for field restriction and cell geometry.
use glam::{Affine3A, Vec3};

/// Axis-aligned bounding box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Box centered at `center` with half-size `half` in each axis.
    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// True if the two boxes overlap (touching faces count as overlap).
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Smallest box enclosing both inputs.
    pub fn merge(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow the box by `amount` on every side.
    pub fn expand(&self, amount: f32) -> Aabb {
        let pad = Vec3::splat(amount);
        Aabb {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    /// Axis-aligned box enclosing this box mapped through `transform`.
    pub fn transform(&self, transform: &Affine3A) -> Aabb {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut min = Vec3::INFINITY;
        let mut max = Vec3::NEG_INFINITY;
        for corner in corners {
            let mapped = transform.transform_point3(corner);
            min = min.min(mapped);
            max = max.max(mapped);
        }
        Aabb { min, max }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersects_is_symmetric_and_counts_touching_faces() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::ONE, Vec3::splat(2.0));
        let c = Aabb::new(Vec3::splat(1.5), Vec3::splat(2.5));

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn merge_encloses_both_inputs() {
        let a = Aabb::new(Vec3::splat(-1.0), Vec3::ZERO);
        let b = Aabb::new(Vec3::ZERO, Vec3::splat(2.0));
        let merged = a.merge(&b);

        assert_eq!(merged.min, Vec3::splat(-1.0));
        assert_eq!(merged.max, Vec3::splat(2.0));
    }

    #[test]
    fn transform_of_translated_box_shifts_extents() {
        let a = Aabb::new(Vec3::splat(-1.0), Vec3::ONE);
        let moved = a.transform(&Affine3A::from_translation(Vec3::new(3.0, 0.0, 0.0)));

        assert_eq!(moved.min, Vec3::new(2.0, -1.0, -1.0));
        assert_eq!(moved.max, Vec3::new(4.0, 1.0, 1.0));
    }

    #[test]
    fn expand_grows_every_side() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE).expand(0.5);
        assert_eq!(a.min, Vec3::splat(-0.5));
        assert_eq!(a.max, Vec3::splat(1.5));
    }
}
