use core::iter::FusedIterator;

use crate::{NodeRef, WavlTree};

/// An in-order iterator over the elements of a [`WavlTree`].
///
/// Each step follows [`NodeRef::successor`], so a full pass touches every link at most twice.
pub struct Iter<'tree, T> {
    next: Option<NodeRef<'tree, T>>,
    len: usize,
}

impl<'tree, T> Iter<'tree, T> {
    pub(crate) fn new(tree: &'tree WavlTree<T>) -> Self {
        Iter {
            next: tree.first(),
            len: tree.len(),
        }
    }
}

impl<'tree, T> Iterator for Iter<'tree, T> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;

        self.next = cur.successor();
        self.len -= 1;

        Some(cur.element())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            next: self.next,
            len: self.len,
        }
    }
}
