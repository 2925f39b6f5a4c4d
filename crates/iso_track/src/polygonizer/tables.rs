//! Fixed case tables for classifying a voxel's quadrilateral face.
//!
//! The four corners are scanned counter-clockwise; a 4-bit case code (LSB =
//! corner 0) indexes the canonical 2D marching-squares tables below. Cases 5
//! and 10 are the ambiguous saddle cases carrying two segments.

/// Corner offsets of the quad face relative to the voxel id, in scan order.
pub const VOXEL_DECALS: [[u64; 3]; 4] = [[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0]];

/// Neighbour offset across each edge of the quad, in the XY plane.
pub const EDGE_DECALS: [[i64; 2]; 4] = [[0, -1], [1, 0], [0, 1], [-1, 0]];

/// Crossed-edge bitmask per case code.
pub const EDGE_TABLE: [u8; 16] = [
    0x00, 0x09, 0x03, 0x0A, //
    0x06, 0x0F, 0x05, 0x0C, //
    0x0C, 0x05, 0x0F, 0x06, //
    0x0A, 0x03, 0x09, 0x00,
];

/// Contour segments per case code as pairs of edge ids, `-1` padded.
pub const LINE_TABLE: [[i8; 4]; 16] = [
    [-1, -1, -1, -1], // 0
    [3, 0, -1, -1],   // 1
    [0, 1, -1, -1],   // 2
    [3, 1, -1, -1],   // 3
    [1, 2, -1, -1],   // 4
    [1, 0, 3, 2],     // 5
    [0, 2, -1, -1],   // 6
    [3, 2, -1, -1],   // 7
    [2, 3, -1, -1],   // 8
    [2, 0, -1, -1],   // 9
    [0, 3, 2, 1],     // 10
    [2, 1, -1, -1],   // 11
    [1, 3, -1, -1],   // 12
    [1, 0, -1, -1],   // 13
    [0, 3, -1, -1],   // 14
    [-1, -1, -1, -1], // 15
];
