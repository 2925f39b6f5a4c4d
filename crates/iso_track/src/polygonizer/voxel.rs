//! Grid identifiers, memoized field samples, and the tracked voxel.
use glam::{Vec3, Vec4};

use crate::polygonizer::hash::CellHash64;

/// Identifier of a discrete grid cell, coarse or fine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GridId {
    pub x: u64,
    pub y: u64,
    pub z: u64,
}

impl GridId {
    pub const fn new(x: u64, y: u64, z: u64) -> Self {
        Self { x, y, z }
    }

    /// Packed 64-bit key for this id.
    #[inline]
    pub fn key(&self) -> u64 {
        CellHash64::pack(self.x, self.y, self.z)
    }

    /// Applies a signed offset with wrapping arithmetic. An offset past zero
    /// wraps to a huge coordinate, which [`GridId::in_grid`] rejects.
    #[inline]
    pub fn offset(&self, dx: i64, dy: i64, dz: i64) -> GridId {
        GridId {
            x: self.x.wrapping_add(dx as u64),
            y: self.y.wrapping_add(dy as u64),
            z: self.z.wrapping_add(dz as u64),
        }
    }

    /// True when every coordinate lies inside a `size^3` grid.
    #[inline]
    pub fn in_grid(&self, size: u64) -> bool {
        self.x < size && self.y < size && self.z < size
    }

    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

/// Memoized result of evaluating the field at one lattice point.
///
/// `value` packs the gradient in xyz and the scalar field value in w;
/// `source_cell` is the packed key of the super-voxel that produced it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldSample {
    pub position: Vec3,
    pub value: Vec4,
    pub source_cell: u64,
}

impl FieldSample {
    pub fn new(position: Vec3, scalar: f32, gradient: Vec3, source_cell: u64) -> Self {
        Self {
            position,
            value: gradient.extend(scalar),
            source_cell,
        }
    }

    /// Scalar field value at the sample position.
    #[inline]
    pub fn scalar(&self) -> f32 {
        self.value.w
    }

    /// Field gradient at the sample position.
    #[inline]
    pub fn gradient(&self) -> Vec3 {
        self.value.truncate()
    }
}

/// A fine-grid cell: one quadrilateral face with four corner samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Voxel {
    pub id: GridId,
    pub corners: [FieldSample; 4],
}

impl Voxel {
    pub fn new(id: GridId) -> Self {
        Self {
            id,
            corners: [FieldSample::default(); 4],
        }
    }
}
