//! Structural self-check for red-black trees.

use super::{Color, NodeId, NodeStore, RbRoot};
use core::fmt;

/// First invariant violation found by [`RbRoot::check_invariants`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RbViolation {
    /// The root is red.
    RedRoot(NodeId),
    /// A red node has a red child.
    RedRedLink { parent: NodeId, child: NodeId },
    /// The two subtrees of a node have different black-heights.
    BlackHeightMismatch(NodeId),
    /// A key is outside the range its ancestors allow.
    OrderViolation(NodeId),
    /// A child does not point back at its parent.
    BrokenParentLink(NodeId),
    /// The recorded length does not match the linked node count.
    LengthMismatch { counted: usize, recorded: usize },
}

impl fmt::Display for RbViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RbViolation::RedRoot(id) => write!(f, "root node {} is red", id),
            RbViolation::RedRedLink { parent, child } => {
                write!(f, "red node {} has red child {}", parent, child)
            }
            RbViolation::BlackHeightMismatch(id) => {
                write!(f, "unequal black height below node {}", id)
            }
            RbViolation::OrderViolation(id) => write!(f, "node {} is out of key order", id),
            RbViolation::BrokenParentLink(id) => write!(f, "node {} has a broken parent link", id),
            RbViolation::LengthMismatch { counted, recorded } => {
                write!(f, "counted {} nodes, tree records {}", counted, recorded)
            }
        }
    }
}

impl RbRoot {
    /// Check every red-black and ordering invariant.
    ///
    /// Returns the black-height of the tree (nil leaves count as zero) or
    /// the first violation found. This walks the whole tree.
    pub fn check_invariants<S: NodeStore + ?Sized>(&self, store: &S) -> Result<usize, RbViolation> {
        let Some(root) = self.root() else {
            return match self.len() {
                0 => Ok(0),
                recorded => Err(RbViolation::LengthMismatch { counted: 0, recorded }),
            };
        };

        let node = store.node(root);
        if node.parent.is_some() {
            return Err(RbViolation::BrokenParentLink(root));
        }
        if node.color == Color::Red {
            return Err(RbViolation::RedRoot(root));
        }

        let mut counted = 0;
        let height = check_subtree(store, root, 0, u64::MAX, &mut counted)?;
        if counted != self.len() {
            return Err(RbViolation::LengthMismatch {
                counted,
                recorded: self.len(),
            });
        }
        Ok(height)
    }
}

fn check_subtree<S: NodeStore + ?Sized>(
    store: &S,
    id: NodeId,
    lo: u64,
    hi: u64,
    counted: &mut usize,
) -> Result<usize, RbViolation> {
    let node = store.node(id);
    *counted += 1;

    if node.key < lo || node.key > hi {
        return Err(RbViolation::OrderViolation(id));
    }

    let bounds = [(lo, node.key), (node.key, hi)];
    let mut heights = [0usize; 2];

    for (side, child) in [node.left, node.right].into_iter().enumerate() {
        let Some(child) = child else {
            continue;
        };
        let child_node = store.node(child);
        if child_node.parent != Some(id) {
            return Err(RbViolation::BrokenParentLink(child));
        }
        if node.color == Color::Red && child_node.color == Color::Red {
            return Err(RbViolation::RedRedLink { parent: id, child });
        }
        let (lo, hi) = bounds[side];
        heights[side] = check_subtree(store, child, lo, hi, counted)?;
    }

    if heights[0] != heights[1] {
        return Err(RbViolation::BlackHeightMismatch(id));
    }

    Ok(heights[0] + usize::from(node.color == Color::Black))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbtree::RbNode;
    use alloc::vec::Vec;

    fn three_node_tree() -> (RbRoot, Vec<RbNode>) {
        let mut store: Vec<RbNode> = [2u64, 1, 3].iter().map(|&k| RbNode::new(k)).collect();
        let mut root = RbRoot::new();
        for id in 0..3 {
            root.insert(&mut store, id);
        }
        (root, store)
    }

    #[test]
    fn test_detects_red_root() {
        let (root, mut store) = three_node_tree();
        store[0].color = Color::Red;
        assert_eq!(root.check_invariants(&store), Err(RbViolation::RedRoot(0)));
    }

    #[test]
    fn test_detects_black_height_mismatch() {
        let (root, mut store) = three_node_tree();
        store[1].color = Color::Black;
        assert_eq!(
            root.check_invariants(&store),
            Err(RbViolation::BlackHeightMismatch(0))
        );
    }

    #[test]
    fn test_detects_order_violation() {
        let (root, mut store) = three_node_tree();
        store[2].key = 0;
        assert_eq!(root.check_invariants(&store), Err(RbViolation::OrderViolation(2)));
    }
}
