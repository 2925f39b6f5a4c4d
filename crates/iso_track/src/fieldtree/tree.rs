//! The field tree: node set, explicit adjacency, and designated root.
use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;

use crate::error::{Error, Result};
use crate::fieldtree::node::{FieldNode, FieldRef};
use crate::geom::Aabb;

/// A directed acyclic composition of field nodes with an explicit
/// parent/child adjacency kept alongside the node-internal links.
///
/// The adjacency duplicates what the [`FieldNode`] graph already encodes so
/// that it can be validated independently: [`FieldTree::validate`] checks
/// that both agree and that every node is reachable from the root.
#[derive(Clone, Debug, Default)]
pub struct FieldTree {
    fields: Vec<FieldRef>,
    children: Vec<Vec<usize>>,
    root: Option<FieldRef>,
}

impl FieldTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from a root node, deriving the node set and adjacency
    /// by traversal. Shared nodes are recorded once.
    pub fn from_root(root: FieldRef) -> Self {
        let mut tree = FieldTree::new();
        let mut indices: HashMap<*const FieldNode, usize> = HashMap::new();
        collect(&root, &mut tree.fields, &mut tree.children, &mut indices);
        tree.root = Some(root);
        tree
    }

    /// Registers a field node. Call [`FieldTree::set_adjacency`] afterwards
    /// with one child list per registered node.
    pub fn insert_field(&mut self, field: FieldRef) -> &mut Self {
        self.fields.push(field);
        self
    }

    pub fn insert_fields(&mut self, fields: impl IntoIterator<Item = FieldRef>) -> &mut Self {
        self.fields.extend(fields);
        self
    }

    /// Sets the parent/child adjacency: `adjacency[i]` lists the node
    /// indices of node `i`'s children, empty for primitives.
    pub fn set_adjacency(&mut self, adjacency: Vec<Vec<usize>>) -> &mut Self {
        self.children = adjacency;
        self
    }

    /// Designates the evaluation root.
    pub fn set_root(&mut self, root: FieldRef) -> &mut Self {
        self.root = Some(root);
        self
    }

    pub fn has_root(&self) -> bool {
        self.root.is_some()
    }

    /// Number of registered field nodes.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The designated root.
    ///
    /// # Panics
    /// Panics when no root has been set; evaluating an unrooted tree is a
    /// programming error, not a recoverable condition.
    pub fn root(&self) -> &FieldRef {
        self.root.as_ref().expect("field tree has no root")
    }

    /// Evaluates the root field at `p`. Panics on an unrooted tree.
    pub fn eval(&self, p: Vec3) -> f32 {
        self.root().eval(p)
    }

    /// Evaluates the root gradient at `p`. Panics on an unrooted tree.
    pub fn grad(&self, p: Vec3) -> Vec3 {
        self.root().grad(p)
    }

    /// Bounding volume of the root field. Panics on an unrooted tree.
    pub fn bounds(&self) -> Aabb {
        self.root().bounds()
    }

    /// Surface seed points; empty for a tree without a root.
    pub fn seeds(&self) -> Vec<Vec3> {
        self.root.as_ref().map(|r| r.seeds()).unwrap_or_default()
    }

    /// Returns the reduced tree containing only primitives whose bounds
    /// intersect `region`, or `None` when no primitive does.
    pub fn sub_tree(&self, region: &Aabb) -> Option<FieldTree> {
        let root = self.root.as_ref()?;
        FieldNode::restrict(root, region).map(FieldTree::from_root)
    }

    /// Checks that the explicit adjacency matches the node graph and that
    /// every registered node is reachable from the root.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Ok(());
        }

        if self.children.len() != self.fields.len() {
            return Err(Error::Tree(format!(
                "adjacency covers {} nodes but {} are registered",
                self.children.len(),
                self.fields.len()
            )));
        }

        for (i, (field, child_indices)) in self.fields.iter().zip(&self.children).enumerate() {
            let linked = field.children();
            if linked.len() != child_indices.len() {
                return Err(Error::Tree(format!(
                    "node {i} links {} children but adjacency lists {}",
                    linked.len(),
                    child_indices.len()
                )));
            }
            for (slot, (&idx, link)) in child_indices.iter().zip(linked).enumerate() {
                let registered = self.fields.get(idx).ok_or_else(|| {
                    Error::Tree(format!("node {i} child {slot} index {idx} out of range"))
                })?;
                if !Arc::ptr_eq(registered, link) {
                    return Err(Error::Tree(format!(
                        "node {i} child {slot} disagrees with the field graph"
                    )));
                }
            }
        }

        let Some(root) = &self.root else {
            return Err(Error::Tree("no root designated".into()));
        };
        let root_index = self
            .fields
            .iter()
            .position(|f| Arc::ptr_eq(f, root))
            .ok_or_else(|| Error::Tree("root is not a registered node".into()))?;

        let mut visited = vec![false; self.fields.len()];
        let mut stack = vec![root_index];
        while let Some(i) = stack.pop() {
            if std::mem::replace(&mut visited[i], true) {
                continue;
            }
            stack.extend(self.children[i].iter().copied());
        }
        if let Some(unreached) = visited.iter().position(|v| !v) {
            return Err(Error::Tree(format!(
                "node {unreached} is not reachable from the root"
            )));
        }

        Ok(())
    }
}

fn collect(
    node: &FieldRef,
    fields: &mut Vec<FieldRef>,
    children: &mut Vec<Vec<usize>>,
    indices: &mut HashMap<*const FieldNode, usize>,
) -> usize {
    let key = Arc::as_ptr(node);
    if let Some(&existing) = indices.get(&key) {
        return existing;
    }

    let child_indices: Vec<usize> = node
        .children()
        .iter()
        .map(|c| collect(c, fields, children, indices))
        .collect();

    let index = fields.len();
    fields.push(node.clone());
    children.push(child_indices);
    indices.insert(key, index);
    index
}
