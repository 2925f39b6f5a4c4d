//! Field tree subsystem: authoring and evaluating CSG-style implicit fields.
//!
//! This module groups the shared field-node DAG ([`FieldNode`]) and the
//! [`FieldTree`] wrapper that owns the node set, the explicit parent/child
//! adjacency, and the designated root used by the polygonizer.
pub mod node;
pub mod tree;

pub use node::{
    BlendParams, FieldNode, FieldRef, SphereParams, TorusParams, TransformParams,
};
pub use tree::FieldTree;
