//! Red-black tree over externally owned nodes.
//!
//! The tree is a set of links between [`RbNode`]s that live in a
//! [`NodeStore`]; it never allocates and never moves a node. Handles are
//! slot indices, so "parent" is just another index into the same store.
//!
//! Duplicate keys are allowed and are placed to the right of existing
//! equal keys. Only the minimum ([`RbRoot::leftmost`]) and in-order walks
//! are offered as queries, which is all a run-queue needs.

mod node;
mod verify;

pub use node::{Color, NodeId, NodeStore, RbNode};
pub use verify::RbViolation;

/// Root of a red-black tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RbRoot {
    node: Option<NodeId>,
    len: usize,
}

#[inline]
fn is_red<S: NodeStore + ?Sized>(store: &S, id: Option<NodeId>) -> bool {
    matches!(id, Some(n) if store.node(n).color == Color::Red)
}

#[inline]
fn paint<S: NodeStore + ?Sized>(store: &mut S, id: Option<NodeId>, color: Color) {
    if let Some(n) = id {
        store.node_mut(n).color = color;
    }
}

impl RbRoot {
    /// Create an empty tree.
    pub const fn new() -> Self {
        Self { node: None, len: 0 }
    }

    /// Root node handle, if any.
    pub fn root(&self) -> Option<NodeId> {
        self.node
    }

    /// Number of linked nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.node.is_none()
    }

    /// Link `id` into the tree.
    ///
    /// The node's `key` must already be set and the node must not be
    /// linked into any tree. Its structural fields are overwritten.
    pub fn insert<S: NodeStore + ?Sized>(&mut self, store: &mut S, id: NodeId) {
        let key = store.node(id).key;
        let mut parent = None;
        let mut go_left = false;
        let mut cursor = self.node;

        while let Some(cur) = cursor {
            parent = Some(cur);
            let node = store.node(cur);
            go_left = key < node.key;
            cursor = if go_left { node.left } else { node.right };
        }

        {
            let node = store.node_mut(id);
            node.parent = parent;
            node.left = None;
            node.right = None;
            node.color = Color::Red;
        }

        match parent {
            None => self.node = Some(id),
            Some(p) if go_left => store.node_mut(p).left = Some(id),
            Some(p) => store.node_mut(p).right = Some(id),
        }

        self.len += 1;
        self.insert_fixup(store, id);
    }

    fn insert_fixup<S: NodeStore + ?Sized>(&mut self, store: &mut S, mut node: NodeId) {
        loop {
            let Some(mut parent) = store.node(node).parent else {
                break;
            };
            if store.node(parent).color == Color::Black {
                break;
            }
            // A red parent is never the root, so a grandparent exists.
            let Some(gparent) = store.node(parent).parent else {
                break;
            };

            if store.node(gparent).left == Some(parent) {
                let uncle = store.node(gparent).right;
                if is_red(store, uncle) {
                    paint(store, Some(parent), Color::Black);
                    paint(store, uncle, Color::Black);
                    paint(store, Some(gparent), Color::Red);
                    node = gparent;
                    continue;
                }

                if store.node(parent).right == Some(node) {
                    self.rotate_left(store, parent);
                    core::mem::swap(&mut node, &mut parent);
                }

                paint(store, Some(parent), Color::Black);
                paint(store, Some(gparent), Color::Red);
                self.rotate_right(store, gparent);
                break;
            } else {
                let uncle = store.node(gparent).left;
                if is_red(store, uncle) {
                    paint(store, Some(parent), Color::Black);
                    paint(store, uncle, Color::Black);
                    paint(store, Some(gparent), Color::Red);
                    node = gparent;
                    continue;
                }

                if store.node(parent).left == Some(node) {
                    self.rotate_right(store, parent);
                    core::mem::swap(&mut node, &mut parent);
                }

                paint(store, Some(parent), Color::Black);
                paint(store, Some(gparent), Color::Red);
                self.rotate_left(store, gparent);
                break;
            }
        }

        paint(store, self.node, Color::Black);
    }

    /// Unlink `id` from the tree.
    ///
    /// `id` must currently be linked into this tree. On return its links
    /// are cleared; its key is left untouched.
    pub fn delete<S: NodeStore + ?Sized>(&mut self, store: &mut S, id: NodeId) {
        let (left, right, color) = {
            let node = store.node(id);
            (node.left, node.right, node.color)
        };

        let mut removed_color = color;
        let child;
        let child_parent;

        match (left, right) {
            (None, _) => {
                child = right;
                child_parent = store.node(id).parent;
                self.transplant(store, id, right);
            }
            (Some(_), None) => {
                child = left;
                child_parent = store.node(id).parent;
                self.transplant(store, id, left);
            }
            (Some(l), Some(r)) => {
                let successor = Self::minimum(store, r);
                removed_color = store.node(successor).color;
                child = store.node(successor).right;

                if successor == r {
                    child_parent = Some(successor);
                } else {
                    child_parent = store.node(successor).parent;
                    self.transplant(store, successor, child);
                    store.node_mut(successor).right = Some(r);
                    store.node_mut(r).parent = Some(successor);
                }

                self.transplant(store, id, Some(successor));
                store.node_mut(successor).left = Some(l);
                store.node_mut(l).parent = Some(successor);
                store.node_mut(successor).color = color;
            }
        }

        store.node_mut(id).unlink();
        self.len = self.len.saturating_sub(1);

        if removed_color == Color::Black {
            self.delete_fixup(store, child, child_parent);
        }
    }

    fn delete_fixup<S: NodeStore + ?Sized>(
        &mut self,
        store: &mut S,
        mut node: Option<NodeId>,
        mut parent: Option<NodeId>,
    ) {
        while node != self.node && !is_red(store, node) {
            let Some(p) = parent else {
                break;
            };

            if store.node(p).left == node {
                let Some(mut sibling) = store.node(p).right else {
                    break;
                };

                if store.node(sibling).color == Color::Red {
                    paint(store, Some(sibling), Color::Black);
                    paint(store, Some(p), Color::Red);
                    self.rotate_left(store, p);
                    let Some(s) = store.node(p).right else {
                        break;
                    };
                    sibling = s;
                }

                let near = store.node(sibling).left;
                let far = store.node(sibling).right;
                if !is_red(store, near) && !is_red(store, far) {
                    paint(store, Some(sibling), Color::Red);
                    node = Some(p);
                    parent = store.node(p).parent;
                    continue;
                }

                if !is_red(store, far) {
                    paint(store, near, Color::Black);
                    paint(store, Some(sibling), Color::Red);
                    self.rotate_right(store, sibling);
                    let Some(s) = store.node(p).right else {
                        break;
                    };
                    sibling = s;
                }

                let parent_color = store.node(p).color;
                paint(store, Some(sibling), parent_color);
                paint(store, Some(p), Color::Black);
                let far = store.node(sibling).right;
                paint(store, far, Color::Black);
                self.rotate_left(store, p);
                node = self.node;
                break;
            } else {
                let Some(mut sibling) = store.node(p).left else {
                    break;
                };

                if store.node(sibling).color == Color::Red {
                    paint(store, Some(sibling), Color::Black);
                    paint(store, Some(p), Color::Red);
                    self.rotate_right(store, p);
                    let Some(s) = store.node(p).left else {
                        break;
                    };
                    sibling = s;
                }

                let near = store.node(sibling).right;
                let far = store.node(sibling).left;
                if !is_red(store, near) && !is_red(store, far) {
                    paint(store, Some(sibling), Color::Red);
                    node = Some(p);
                    parent = store.node(p).parent;
                    continue;
                }

                if !is_red(store, far) {
                    paint(store, near, Color::Black);
                    paint(store, Some(sibling), Color::Red);
                    self.rotate_left(store, sibling);
                    let Some(s) = store.node(p).left else {
                        break;
                    };
                    sibling = s;
                }

                let parent_color = store.node(p).color;
                paint(store, Some(sibling), parent_color);
                paint(store, Some(p), Color::Black);
                let far = store.node(sibling).left;
                paint(store, far, Color::Black);
                self.rotate_right(store, p);
                node = self.node;
                break;
            }
        }

        paint(store, node, Color::Black);
    }

    /// Node with the smallest key, or `None` for an empty tree.
    pub fn leftmost<S: NodeStore + ?Sized>(&self, store: &S) -> Option<NodeId> {
        self.node.map(|root| Self::minimum(store, root))
    }

    /// In-order successor of `id`.
    pub fn next<S: NodeStore + ?Sized>(store: &S, id: NodeId) -> Option<NodeId> {
        if let Some(right) = store.node(id).right {
            return Some(Self::minimum(store, right));
        }

        let mut cur = id;
        while let Some(parent) = store.node(cur).parent {
            if store.node(parent).left == Some(cur) {
                return Some(parent);
            }
            cur = parent;
        }
        None
    }

    /// Walk the tree in key order.
    pub fn iter<'a, S: NodeStore + ?Sized>(&self, store: &'a S) -> Iter<'a, S> {
        Iter {
            store,
            next: self.leftmost(store),
        }
    }

    fn minimum<S: NodeStore + ?Sized>(store: &S, mut id: NodeId) -> NodeId {
        while let Some(left) = store.node(id).left {
            id = left;
        }
        id
    }

    fn rotate_left<S: NodeStore + ?Sized>(&mut self, store: &mut S, x: NodeId) {
        let Some(y) = store.node(x).right else {
            return;
        };

        let y_left = store.node(y).left;
        store.node_mut(x).right = y_left;
        if let Some(b) = y_left {
            store.node_mut(b).parent = Some(x);
        }

        let x_parent = store.node(x).parent;
        store.node_mut(y).parent = x_parent;
        self.replace_child(store, x_parent, x, Some(y));

        store.node_mut(y).left = Some(x);
        store.node_mut(x).parent = Some(y);
    }

    fn rotate_right<S: NodeStore + ?Sized>(&mut self, store: &mut S, x: NodeId) {
        let Some(y) = store.node(x).left else {
            return;
        };

        let y_right = store.node(y).right;
        store.node_mut(x).left = y_right;
        if let Some(b) = y_right {
            store.node_mut(b).parent = Some(x);
        }

        let x_parent = store.node(x).parent;
        store.node_mut(y).parent = x_parent;
        self.replace_child(store, x_parent, x, Some(y));

        store.node_mut(y).right = Some(x);
        store.node_mut(x).parent = Some(y);
    }

    /// Put `new` where `u` hangs, including the parent back-link.
    fn transplant<S: NodeStore + ?Sized>(&mut self, store: &mut S, u: NodeId, new: Option<NodeId>) {
        let u_parent = store.node(u).parent;
        self.replace_child(store, u_parent, u, new);
        if let Some(v) = new {
            store.node_mut(v).parent = u_parent;
        }
    }

    fn replace_child<S: NodeStore + ?Sized>(
        &mut self,
        store: &mut S,
        parent: Option<NodeId>,
        old: NodeId,
        new: Option<NodeId>,
    ) {
        match parent {
            None => self.node = new,
            Some(p) => {
                let p = store.node_mut(p);
                if p.left == Some(old) {
                    p.left = new;
                } else {
                    p.right = new;
                }
            }
        }
    }
}

/// In-order iterator returned by [`RbRoot::iter`].
pub struct Iter<'a, S: NodeStore + ?Sized> {
    store: &'a S,
    next: Option<NodeId>,
}

impl<'a, S: NodeStore + ?Sized> Iterator for Iter<'a, S> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = RbRoot::next(self.store, cur);
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn store_with(keys: &[u64]) -> Vec<RbNode> {
        keys.iter().map(|&k| RbNode::new(k)).collect()
    }

    fn keys_in_order(root: &RbRoot, store: &Vec<RbNode>) -> Vec<u64> {
        root.iter(store).map(|id| store[id].key).collect()
    }

    #[test]
    fn test_empty_tree() {
        let store: Vec<RbNode> = Vec::new();
        let root = RbRoot::new();
        assert!(root.is_empty());
        assert_eq!(root.len(), 0);
        assert_eq!(root.leftmost(&store), None);
        assert_eq!(root.check_invariants(&store), Ok(0));
    }

    #[test]
    fn test_single_node_is_black_root() {
        let mut store = store_with(&[42]);
        let mut root = RbRoot::new();
        root.insert(&mut store, 0);

        assert_eq!(root.root(), Some(0));
        assert_eq!(store[0].color(), Color::Black);
        assert_eq!(root.leftmost(&store), Some(0));
        assert_eq!(root.check_invariants(&store), Ok(1));
    }

    #[test]
    fn test_ascending_inserts_stay_balanced() {
        let keys: Vec<u64> = (0..64).collect();
        let mut store = store_with(&keys);
        let mut root = RbRoot::new();

        for id in 0..keys.len() {
            root.insert(&mut store, id);
            assert!(root.check_invariants(&store).is_ok());
        }

        assert_eq!(keys_in_order(&root, &store), keys);
        // 64 nodes fit in black-height 4..=7 for a valid red-black tree.
        let bh = root.check_invariants(&store).unwrap();
        assert!(bh >= 3 && bh <= 7, "black height {}", bh);
    }

    #[test]
    fn test_duplicate_keys_go_right() {
        let mut store = store_with(&[5, 5, 5, 1]);
        let mut root = RbRoot::new();
        for id in 0..4 {
            root.insert(&mut store, id);
        }

        let order: Vec<NodeId> = root.iter(&store).collect();
        assert_eq!(order, alloc::vec![3, 0, 1, 2]);
        assert!(root.check_invariants(&store).is_ok());
    }

    #[test]
    fn test_delete_every_shape() {
        let keys = [50, 30, 70, 20, 40, 60, 80, 10, 25, 35, 45];
        for victim in 0..keys.len() {
            let mut store = store_with(&keys);
            let mut root = RbRoot::new();
            for id in 0..keys.len() {
                root.insert(&mut store, id);
            }

            root.delete(&mut store, victim);
            assert!(root.check_invariants(&store).is_ok());
            assert_eq!(root.len(), keys.len() - 1);
            assert!(root.iter(&store).all(|id| id != victim));

            let node = &store[victim];
            assert_eq!((node.parent(), node.left(), node.right()), (None, None, None));
        }
    }

    #[test]
    fn test_delete_down_to_empty() {
        let keys = [9, 3, 7, 1, 8, 2, 6, 4, 5];
        let mut store = store_with(&keys);
        let mut root = RbRoot::new();
        for id in 0..keys.len() {
            root.insert(&mut store, id);
        }

        while let Some(min) = root.leftmost(&store) {
            let expected = keys_in_order(&root, &store)[0];
            assert_eq!(store[min].key, expected);
            root.delete(&mut store, min);
            assert!(root.check_invariants(&store).is_ok());
        }
        assert!(root.is_empty());
        assert_eq!(root.len(), 0);
    }

    #[test]
    fn test_reinsert_after_delete() {
        let mut store = store_with(&[10, 20, 30]);
        let mut root = RbRoot::new();
        for id in 0..3 {
            root.insert(&mut store, id);
        }

        root.delete(&mut store, 0);
        store[0].key = 40;
        root.insert(&mut store, 0);

        assert_eq!(keys_in_order(&root, &store), alloc::vec![20, 30, 40]);
        assert_eq!(root.leftmost(&store), Some(1));
        assert!(root.check_invariants(&store).is_ok());
    }
}
