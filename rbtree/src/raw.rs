use core::fmt;
use core::iter::FusedIterator;
use core::mem;
use core::ops::{Index, IndexMut};
use std::borrow::Borrow;

use log::{debug, trace};
use slab::Slab;

use crate::error::InvariantError;
use crate::node::{Node, NodeId, Side};

/// Color-agnostic core shared by both trees.
///
/// Owns the node arena and the root. Everything here keeps the search tree
/// property and the parent links intact, nothing here looks at `A`.
pub(crate) struct RawTree<K, A> {
    nodes: Slab<Node<K, A>>,
    root: Option<NodeId>,
}

/// A node that was spliced out of the tree by [`RawTree::unlink`].
pub(crate) struct Unlinked<K, A> {
    pub(crate) key: K,
    pub(crate) aug: A,
    /// The subtree that took the spliced node's place.
    pub(crate) child: Option<NodeId>,
    /// Parent of the spliced position.
    pub(crate) parent: Option<NodeId>,
}

impl<K, A> Index<NodeId> for RawTree<K, A> {
    type Output = Node<K, A>;

    #[inline]
    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

impl<K, A> IndexMut<NodeId> for RawTree<K, A> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        &mut self.nodes[id.0]
    }
}

impl<K, A> RawTree<K, A> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Slab::new(),
            root: None,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub(crate) fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    #[inline]
    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self[id].parent
    }

    #[inline]
    pub(crate) fn child(&self, id: NodeId, side: Side) -> Option<NodeId> {
        self[id].child(side)
    }

    /// Which child of its parent `id` is, `None` for the root.
    pub(crate) fn side_of(&self, id: NodeId) -> Option<Side> {
        let parent = self[id].parent?;
        if self[parent].left == Some(id) {
            Some(Side::Left)
        } else {
            debug_assert_eq!(self[parent].right, Some(id));
            Some(Side::Right)
        }
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub(crate) fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|root| (root, 1)).into_iter().collect();
        while let Some((id, depth)) = stack.pop() {
            height = height.max(depth);
            let node = &self[id];
            stack.extend(
                [node.left, node.right]
                    .into_iter()
                    .flatten()
                    .map(|child| (child, depth + 1)),
            );
        }

        height
    }

    pub(crate) fn find<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cursor = self.root;
        while let Some(id) = cursor {
            let node = &self[id];
            cursor = match key.cmp(node.key.borrow()) {
                std::cmp::Ordering::Less => node.left,
                std::cmp::Ordering::Equal => return Some(id),
                std::cmp::Ordering::Greater => node.right,
            };
        }

        None
    }

    pub(crate) fn min_of(&self, root: NodeId) -> NodeId {
        let mut x = root;
        while let Some(left) = self[x].left {
            x = left;
        }

        x
    }

    pub(crate) fn max_of(&self, root: NodeId) -> NodeId {
        let mut x = root;
        while let Some(right) = self[x].right {
            x = right;
        }

        x
    }

    /// Next node in in-order.
    pub(crate) fn successor_of(&self, mut node: NodeId) -> Option<NodeId> {
        //       +---------- 34 ---------+
        //       |                       |
        // +---- 2 ----+                 58 ----+
        // |           |                        |
        // 1      +--- 9 ----+              +-- 77 --+
        //        |          |              |        |
        //     +- 6       +- 20 -+      +- 71 -+     82
        //     |          |      |      |      |
        //     5         12 -+   24    67      75
        //                   |
        //                   13
        //
        // With a right subtree the successor is its minimum (9 -> 12, 58 -> 67).
        // Otherwise climb until we come up out of a left subtree, that parent
        // is the successor (13 -> 20, 24 -> 34). Running off the root means
        // `node` was the maximum.
        if let Some(right) = self[node].right {
            return Some(self.min_of(right));
        }

        let mut parent = self[node].parent;
        while let Some(p) = parent {
            if self[p].left == Some(node) {
                break;
            }
            node = p;
            parent = self[p].parent;
        }

        parent
    }

    /// Previous node in in-order, the mirror of [`successor_of`].
    ///
    /// [`successor_of`]: RawTree::successor_of
    pub(crate) fn predecessor_of(&self, mut node: NodeId) -> Option<NodeId> {
        if let Some(left) = self[node].left {
            return Some(self.max_of(left));
        }

        let mut parent = self[node].parent;
        while let Some(p) = parent {
            if self[p].right == Some(node) {
                break;
            }
            node = p;
            parent = self[p].parent;
        }

        parent
    }

    /// Node with the smallest key strictly greater than `key`.
    pub(crate) fn first_above<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut best = None;
        let mut cursor = self.root;
        while let Some(id) = cursor {
            let node = &self[id];
            let node_key: &Q = node.key.borrow();
            if key < node_key {
                best = Some(id);
                cursor = node.left;
            } else {
                cursor = node.right;
            }
        }

        best
    }

    /// Node with the largest key strictly less than `key`.
    pub(crate) fn last_below<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut best = None;
        let mut cursor = self.root;
        while let Some(id) = cursor {
            let node = &self[id];
            let node_key: &Q = node.key.borrow();
            if node_key < key {
                best = Some(id);
                cursor = node.right;
            } else {
                cursor = node.left;
            }
        }

        best
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, A> {
        Iter {
            tree: self,
            front: self.root.map(|root| self.min_of(root)),
            back: self.root.map(|root| self.max_of(root)),
            remaining: self.len(),
        }
    }

    /// Places a new leaf by walking down from the root, equal keys go right.
    ///
    /// Only the search tree property is maintained, balancing is up to the
    /// caller.
    pub(crate) fn attach(&mut self, key: K, aug: A) -> NodeId
    where
        K: Ord,
    {
        let mut parent = None;
        let mut side = Side::Left;
        let mut cursor = self.root;
        while let Some(id) = cursor {
            parent = Some(id);
            side = if key < self[id].key {
                Side::Left
            } else {
                Side::Right
            };
            cursor = self[id].child(side);
        }

        let id = NodeId(self.nodes.insert(Node::leaf(key, aug, parent)));
        match parent {
            Some(parent) => {
                *self[parent].child_mut(side) = Some(id);
                debug!("attached {id:?} as {side:?} child of {parent:?}");
            }
            None => {
                self.root = Some(id);
                debug!("attached {id:?} as root");
            }
        }

        id
    }

    /// Removes `node` from the tree, splicing in its only child or, with two
    /// children, its in-order successor.
    ///
    /// With two children the keys of `node` and its successor are swapped and
    /// the successor's slot is spliced out instead, so the removed slot never
    /// has more than one child. `aug` of the returned value belongs to that
    /// removed slot.
    pub(crate) fn unlink(&mut self, node: NodeId) -> Unlinked<K, A> {
        //       +---------- 34 ---------+
        //       |                       |
        // +---- 2 ----+                 58 ----+
        // |           |                        |
        // 1      +--- 9 ----+              +-- 77 --+
        //        |          |              |        |
        //     +- 6       +- 20 -+      +- 71 -+     82
        //     |          |      |      |      |
        //     5         12 -+   24    67      75
        //                   |
        //                   13
        //
        // 1, 6, 12, 58 are replaced by their child (or nothing).
        // 9 takes the key 12 and 12's slot is replaced by 13.
        let mut target = node;
        if let (Some(_), Some(right)) = (self[node].left, self[node].right) {
            target = self.min_of(right);
            self.swap_keys(node, target);
        }

        let child = self[target].left.or(self[target].right);
        let parent = self[target].parent;
        self.replace_subtree(target, child);
        let removed = self.nodes.remove(target.0);
        debug!("unlinked {target:?}, {} nodes left", self.len());

        Unlinked {
            key: removed.key,
            aug: removed.aug,
            child,
            parent,
        }
    }

    /// Rotates the edge between `node` and its child on the opposite side,
    /// moving `node` down towards `side`.
    ///
    /// `rotate(x, Side::Left)` is a left rotation:
    ///
    /// ```text
    ///    p                       p
    ///    |                       |
    /// +- x -+                 +- y -+
    /// |     |       -->       |     |
    /// a  +- y -+           +- x -+  c
    ///    |     |           |     |
    ///    b     c           a     b
    /// ```
    ///
    /// and `Side::Right` is the mirror. Panics if the child to promote is
    /// missing.
    pub(crate) fn rotate(&mut self, node: NodeId, side: Side) {
        let Some(pivot) = self[node].child(side.opposite()) else {
            panic!("cannot rotate {node:?} {side:?}: no {:?} child", side.opposite());
        };
        trace!("rotate {side:?} at {node:?}, promoting {pivot:?}");

        // b moves from pivot to node
        let inner = self[pivot].child(side);
        *self[node].child_mut(side.opposite()) = inner;
        if let Some(inner) = inner {
            self[inner].parent = Some(node);
        }

        // pivot takes node's place under p (or as the root)
        self.replace_subtree(node, Some(pivot));

        // node goes under pivot
        *self[pivot].child_mut(side) = Some(node);
        self[node].parent = Some(pivot);
    }

    /// Makes the parent of `old` (or the root) point to `new` and `new`
    /// point back to that parent. `old` keeps its own links.
    fn replace_subtree(&mut self, old: NodeId, new: Option<NodeId>) {
        let parent = self[old].parent;
        match (parent, self.side_of(old)) {
            (Some(parent), Some(side)) => *self[parent].child_mut(side) = new,
            _ => self.root = new,
        }

        if let Some(new) = new {
            self[new].parent = parent;
        }
    }

    fn swap_keys(&mut self, a: NodeId, b: NodeId) {
        let Some((a, b)) = self.nodes.get2_mut(a.0, b.0) else {
            unreachable!("cannot swap keys of {a:?} and {b:?}");
        };
        mem::swap(&mut a.key, &mut b.key);
    }

    /// Checks the parent links, the reachable node count and the key order.
    pub(crate) fn check_links(&self) -> Result<(), InvariantError>
    where
        K: Ord,
    {
        let mut found = 0;
        if let Some(root) = self.root {
            if self[root].parent.is_some() {
                return Err(InvariantError::BrokenParentLink { depth: 0 });
            }

            let mut stack = vec![(root, 0)];
            while let Some((id, depth)) = stack.pop() {
                found += 1;
                // a child reached twice means the links are shared or cyclic
                if found > self.len() {
                    return Err(InvariantError::LenMismatch {
                        expected: self.len(),
                        found,
                    });
                }
                let node = &self[id];
                for child in [node.left, node.right].into_iter().flatten() {
                    if self[child].parent != Some(id) {
                        return Err(InvariantError::BrokenParentLink { depth: depth + 1 });
                    }
                    stack.push((child, depth + 1));
                }
            }
        }

        if found != self.len() {
            return Err(InvariantError::LenMismatch {
                expected: self.len(),
                found,
            });
        }

        let mut keys = self.iter();
        if let Some(mut prev) = keys.next() {
            for (i, key) in keys.enumerate() {
                if key < prev {
                    return Err(InvariantError::OutOfOrder { position: i + 1 });
                }
                prev = key;
            }
        }

        Ok(())
    }

    /// Formats the tree as `name { len, root, nodes }`, nodes in in-order.
    ///
    /// `aug_name` names the augmentation field of each node, `None` leaves it
    /// out.
    pub(crate) fn fmt_with(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &str,
        aug_name: Option<&'static str>,
    ) -> fmt::Result
    where
        K: fmt::Debug,
        A: fmt::Debug,
    {
        struct NodeDebug<'a, K, A> {
            tree: &'a RawTree<K, A>,
            id: NodeId,
            aug_name: Option<&'static str>,
        }

        impl<K, A> fmt::Debug for NodeDebug<'_, K, A>
        where
            K: fmt::Debug,
            A: fmt::Debug,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let node = &self.tree[self.id];
                let key_of = |id: Option<NodeId>| id.map(|id| &self.tree[id].key);

                let mut f = f.debug_struct("Node");
                f.field("key", &node.key);
                if let Some(name) = self.aug_name {
                    f.field(name, &node.aug);
                }
                f.field("parent", &key_of(node.parent))
                    .field("left", &key_of(node.left))
                    .field("right", &key_of(node.right))
                    .finish()
            }
        }

        struct NodesDebug<'a, K, A> {
            tree: &'a RawTree<K, A>,
            aug_name: Option<&'static str>,
        }

        impl<K, A> fmt::Debug for NodesDebug<'_, K, A>
        where
            K: fmt::Debug,
            A: fmt::Debug,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut f = f.debug_list();
                let mut cursor = self.tree.root.map(|root| self.tree.min_of(root));
                while let Some(id) = cursor {
                    f.entry(&NodeDebug {
                        tree: self.tree,
                        id,
                        aug_name: self.aug_name,
                    });
                    cursor = self.tree.successor_of(id);
                }
                f.finish()
            }
        }

        f.debug_struct(name)
            .field("len", &self.len())
            .field(
                "root",
                &self.root.map(|id| NodeDebug {
                    tree: self,
                    id,
                    aug_name,
                }),
            )
            .field(
                "nodes",
                &NodesDebug {
                    tree: self,
                    aug_name,
                },
            )
            .finish()
    }

    /// Node ids in pre-order, for comparing tree shapes in tests.
    #[cfg(test)]
    pub(crate) fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self[id].right);
            stack.extend(self[id].left);
        }
        out
    }
}

/// In-order iterator over the keys of a tree.
pub struct Iter<'a, K, A> {
    tree: &'a RawTree<K, A>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<K, A> Clone for Iter<'_, K, A> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, A> Iterator for Iter<'a, K, A> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let tree = self.tree;
        let id = self.front?;
        self.front = tree.successor_of(id);
        self.remaining -= 1;
        Some(&tree[id].key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, A> DoubleEndedIterator for Iter<'_, K, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let tree = self.tree;
        let id = self.back?;
        self.back = tree.predecessor_of(id);
        self.remaining -= 1;
        Some(&tree[id].key)
    }
}

impl<K, A> ExactSizeIterator for Iter<'_, K, A> {}

impl<K, A> FusedIterator for Iter<'_, K, A> {}
