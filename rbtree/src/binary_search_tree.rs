use core::fmt;
use std::borrow::Borrow;

use crate::error::InvariantError;
use crate::raw::{Iter, RawTree};

/// An unbalanced binary search tree of keys.
///
/// Shares its structural operations with [`RedBlackTree`] but never
/// rebalances, so sorted input degrades it into a chain. Equal keys are kept,
/// a new key goes to the right of the ones equal to it.
///
/// [`RedBlackTree`]: crate::RedBlackTree
pub struct BinarySearchTree<K> {
    raw: RawTree<K, ()>,
}

impl<K> Default for BinarySearchTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for BinarySearchTree<K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.raw.fmt_with(f, "BinarySearchTree", None)
    }
}

impl<K> BinarySearchTree<K> {
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

    pub fn height(&self) -> usize {
        self.raw.height()
    }

    pub fn root(&self) -> Option<&K> {
        self.raw.root().map(|id| &self.raw[id].key)
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

    /// The smallest key strictly greater than `key`.
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

    pub fn iter(&self) -> Iter<'_, K, ()> {
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
        self.raw.attach(key, ());
    }

    /// Removes one entry equal to `key` and returns it. The hole is filled by
    /// the only child or by the in-order successor, nothing is rebalanced.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.raw.find(key)?;
        Some(self.raw.unlink(node).key)
    }

    /// Checks key order, parent links and the node count.
    pub fn validate(&self) -> Result<(), InvariantError>
    where
        K: Ord,
    {
        self.raw.check_links()
    }
}

impl<K> FromIterator<K> for BinarySearchTree<K>
where
    K: Ord,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K> Extend<K> for BinarySearchTree<K>
where
    K: Ord,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<'a, K> IntoIterator for &'a BinarySearchTree<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K, ()>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
