//! Tree node and node storage abstraction.

/// Handle of a node inside a [`NodeStore`].
///
/// The tree never owns nodes; it only rewires handles between nodes that
/// live somewhere else (a plain slice, or the entity arena of a run-queue).
pub type NodeId = usize;

/// Node color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// A red-black tree node meant to be embedded in the value it orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RbNode {
    /// Sort key. Must be set before the node is inserted and must not
    /// change while the node is linked into a tree.
    pub key: u64,
    pub(crate) color: Color,
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
}

impl RbNode {
    /// Create an unlinked node with the given key.
    pub const fn new(key: u64) -> Self {
        Self {
            key,
            color: Color::Red,
            parent: None,
            left: None,
            right: None,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    /// Drop every structural link. Used when a node leaves its tree.
    pub(crate) fn unlink(&mut self) {
        self.parent = None;
        self.left = None;
        self.right = None;
        self.color = Color::Red;
    }
}

impl Default for RbNode {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Storage that resolves node handles to nodes.
///
/// Every id the tree hands to a store came from a previous `insert`, so a
/// store may treat an unknown id as a broken invariant.
pub trait NodeStore {
    fn node(&self, id: NodeId) -> &RbNode;
    fn node_mut(&mut self, id: NodeId) -> &mut RbNode;
}

impl NodeStore for [RbNode] {
    fn node(&self, id: NodeId) -> &RbNode {
        &self[id]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut RbNode {
        &mut self[id]
    }
}

impl NodeStore for alloc::vec::Vec<RbNode> {
    fn node(&self, id: NodeId) -> &RbNode {
        &self[id]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut RbNode {
        &mut self[id]
    }
}
