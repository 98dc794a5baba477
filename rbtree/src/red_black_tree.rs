use core::fmt;
use core::mem;
use std::borrow::Borrow;

use log::trace;

use crate::error::InvariantError;
use crate::node::{Color, NodeId, Side};
use crate::raw::{Iter, RawTree};

/// A red-black tree of keys.
///
/// Equal keys are allowed and kept as separate entries, a new key goes to
/// the right of the ones already equal to it.
///
/// After every `insert` and `delete`:
///  * the root is black,
///  * a red node has no red children (missing children count as black),
///  * every path from a node down to a missing child passes the same number
///    of black nodes.
///
/// Together these keep the height below `2 * log2(len + 1)`.
pub struct RedBlackTree<K> {
    raw: RawTree<K, Color>,
}

impl<K> Default for RedBlackTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for RedBlackTree<K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.raw.fmt_with(f, "RedBlackTree", Some("color"))
    }
}

impl<K> RedBlackTree<K> {
    pub fn new() -> Self {
        Self {
            raw: RawTree::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Number of nodes on the longest path from the root to a leaf, 0 for an
    /// empty tree.
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Number of black nodes on any path from the root down to a missing
    /// child, the root included.
    pub fn black_height(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.raw.root();
        while let Some(id) = cursor {
            if self.color(id).is_black() {
                count += 1;
            }
            cursor = self.raw[id].left;
        }

        count
    }

    pub fn root(&self) -> Option<&K> {
        self.raw.root().map(|id| &self.raw[id].key)
    }

    pub fn root_color(&self) -> Option<Color> {
        self.raw.root().map(|id| self.color(id))
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.find(key).is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.find(key).map(|id| &self.raw[id].key)
    }

    pub fn min(&self) -> Option<&K> {
        self.raw
            .root()
            .map(|root| &self.raw[self.raw.min_of(root)].key)
    }

    pub fn max(&self) -> Option<&K> {
        self.raw
            .root()
            .map(|root| &self.raw[self.raw.max_of(root)].key)
    }

    /// The smallest key strictly greater than `key`. `key` itself does not
    /// need to be in the tree.
    pub fn successor<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.first_above(key).map(|id| &self.raw[id].key)
    }

    /// The largest key strictly less than `key`.
    pub fn predecessor<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.last_below(key).map(|id| &self.raw[id].key)
    }

    pub fn iter(&self) -> Iter<'_, K, Color> {
        self.raw.iter()
    }

    pub fn inorder_for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K),
    {
        for key in self.raw.iter() {
            f(key);
        }
    }

    /// All keys in ascending order.
    pub fn inorder(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.raw.iter().cloned().collect()
    }

    pub fn insert(&mut self, key: K)
    where
        K: Ord,
    {
        let node = self.raw.attach(key, Color::Red);
        self.insert_fixup(node);
    }

    /// Removes one entry equal to `key` and returns it.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.raw.find(key)?;
        let removed = self.raw.unlink(node);
        if removed.aug.is_black() {
            self.delete_fixup(removed.child, removed.parent);
        }

        Some(removed.key)
    }

    /// Checks every red-black and search tree invariant and returns the black
    /// height, see [`black_height`].
    ///
    /// [`black_height`]: RedBlackTree::black_height
    pub fn validate(&self) -> Result<usize, InvariantError>
    where
        K: Ord,
    {
        self.raw.check_links()?;
        let Some(root) = self.raw.root() else {
            return Ok(0);
        };
        if self.color(root).is_red() {
            return Err(InvariantError::RedRoot);
        }

        self.validate_subtree(Some(root), 0)
    }

    fn validate_subtree(&self, node: Option<NodeId>, depth: usize) -> Result<usize, InvariantError> {
        let Some(id) = node else {
            return Ok(0);
        };
        let color = self.color(id);
        let (left, right) = (self.raw[id].left, self.raw[id].right);
        if color.is_red() && (self.color_of(left).is_red() || self.color_of(right).is_red()) {
            return Err(InvariantError::RedRed { depth });
        }

        let left = self.validate_subtree(left, depth + 1)?;
        let right = self.validate_subtree(right, depth + 1)?;
        if left != right {
            return Err(InvariantError::BlackHeight { left, right, depth });
        }

        Ok(left + usize::from(color.is_black()))
    }

    #[inline]
    fn color(&self, id: NodeId) -> Color {
        self.raw[id].aug
    }

    /// Missing nodes are black.
    #[inline]
    fn color_of(&self, id: Option<NodeId>) -> Color {
        id.map_or(Color::Black, |id| self.color(id))
    }

    #[inline]
    fn set_color(&mut self, id: NodeId, color: Color) {
        self.raw[id].aug = color;
    }

    fn expect_child(&self, id: NodeId, side: Side) -> NodeId {
        match self.raw.child(id, side) {
            Some(child) => child,
            None => unreachable!("{id:?} has no {side:?} child"),
        }
    }

    /// Resolves a red `node` under a red parent, the only violation a fresh
    /// red leaf can cause. Does nothing unless both are red.
    fn insert_fixup(&mut self, mut node: NodeId) {
        while self.color(node).is_red() {
            let Some(mut parent) = self.raw.parent(node) else {
                break;
            };
            if self.color(parent).is_black() {
                break;
            }

            // a red parent is never the root
            let (Some(grand_parent), Some(side)) =
                (self.raw.parent(parent), self.raw.side_of(parent))
            else {
                unreachable!("red {parent:?} has no parent");
            };
            debug_assert!(self.color(grand_parent).is_black());

            match self.raw.child(grand_parent, side.opposite()) {
                Some(uncle) if self.color(uncle).is_red() => {
                    //       +-- gp:b --+               +-- gp:r --+
                    //       |          |               |          |
                    //    +- p:r        u:r    -->   +- p:b        u:b
                    //    |                          |
                    //   n:r                        n:r
                    //
                    // Black height is unchanged, the conflict may now be
                    // between gp and its parent.
                    trace!("insert fixup: red uncle {uncle:?}, recolor and move up to {grand_parent:?}");
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grand_parent, Color::Red);
                    node = grand_parent;
                }
                _ => {
                    if self.raw.side_of(node) == Some(side.opposite()) {
                        //     +-- gp:b            +-- gp:b
                        //     |                   |
                        //    p:r -+      -->   +- n:r
                        //         |            |
                        //        n:r          p:r
                        trace!("insert fixup: inner grandchild {node:?}, rotate {side:?} at {parent:?}");
                        self.raw.rotate(parent, side);
                        mem::swap(&mut parent, &mut node);
                    }

                    //        +-- gp:b --+            +--- p:b ---+
                    //        |          |            |           |
                    //     +- p:r       u:b   -->    n:r      gp:r -+
                    //     |                                        |
                    //    n:r                                      u:b
                    //
                    // p is black now, which ends the loop.
                    trace!("insert fixup: outer grandchild {node:?}, rotate {:?} at {grand_parent:?}", side.opposite());
                    self.set_color(parent, Color::Black);
                    self.set_color(grand_parent, Color::Red);
                    self.raw.rotate(grand_parent, side.opposite());
                }
            }
        }

        if let Some(root) = self.raw.root() {
            self.set_color(root, Color::Black);
        }
    }

    /// Restores the black height after a black node was spliced out.
    ///
    /// `node` is the subtree that took the removed slot (possibly missing)
    /// and `parent` its parent. Every path through `node` is one black short
    /// until the loop hands that extra black to a red node or to the root.
    fn delete_fixup(&mut self, mut node: Option<NodeId>, mut parent: Option<NodeId>) {
        while node != self.raw.root() && self.color_of(node).is_black() {
            let Some(p) = parent else {
                break;
            };
            // a missing `node` is on the side whose child is missing
            let side = if self.raw.child(p, Side::Left) == node {
                Side::Left
            } else {
                Side::Right
            };
            let far = side.opposite();
            let mut sibling = self.expect_child(p, far);

            if self.color(sibling).is_red() {
                //     +-- p:b --+                +-- s:b
                //     |         |                |
                //    x:b    +- s:r -+   -->   +- p:r -+
                //           |       |         |       |
                //          c:b     d:b       x:b     c:b
                //
                // x now has a black sibling c under a red parent.
                trace!("delete fixup: red sibling {sibling:?}, rotate {side:?} at {p:?}");
                self.set_color(sibling, Color::Black);
                self.set_color(p, Color::Red);
                self.raw.rotate(p, side);
                sibling = self.expect_child(p, far);
            }

            let near_child = self.raw.child(sibling, side);
            let far_child = self.raw.child(sibling, far);
            if self.color_of(near_child).is_black() && self.color_of(far_child).is_black() {
                // Take one black off both x and s and push it up to p.
                trace!("delete fixup: black sibling {sibling:?} with black children, move up to {p:?}");
                self.set_color(sibling, Color::Red);
                node = Some(p);
                parent = self.raw.parent(p);
                continue;
            }

            if self.color_of(far_child).is_black() {
                //     +-- p --+                 +-- p --+
                //     |       |                 |       |
                //    x:b  +- s:b -+    -->     x:b  +- c:b -+
                //         |       |                         |
                //        c:r     d:b                    s:r -+
                //                                            |
                //                                           d:b
                trace!("delete fixup: red near nephew, rotate {far:?} at {sibling:?}");
                if let Some(near) = near_child {
                    self.set_color(near, Color::Black);
                }
                self.set_color(sibling, Color::Red);
                self.raw.rotate(sibling, far);
                sibling = self.expect_child(p, far);
            }

            //     +-- p:c --+                  +-- s:c --+
            //     |         |                  |         |
            //    x:b    +- s:b -+    -->    +- p:b -+   d:b
            //           |       |           |       |
            //           c      d:r         x:b      c
            //
            // The paths through x gain the missing black, the ones through d
            // keep theirs by recoloring d.
            trace!("delete fixup: red far nephew, rotate {side:?} at {p:?}");
            self.set_color(sibling, self.color(p));
            self.set_color(p, Color::Black);
            if let Some(far_child) = self.raw.child(sibling, far) {
                self.set_color(far_child, Color::Black);
            }
            self.raw.rotate(p, side);
            node = self.raw.root();
            break;
        }

        if let Some(node) = node {
            self.set_color(node, Color::Black);
        }
    }
}

impl<K> FromIterator<K> for RedBlackTree<K>
where
    K: Ord,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K> Extend<K> for RedBlackTree<K>
where
    K: Ord,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<'a, K> IntoIterator for &'a RedBlackTree<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K, Color>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
