//! An in-memory ordered index built on a rank-balanced binary search tree.
//!
//! Nodes live in an arena owned by the tree and refer to each other by index, so parent links
//! are plain navigation aids and never keep anything alive.

// Conventions used in comments follow Haeupler, Sen and Tarjan:
// - The rank of a node `x` is denoted `r(x)`. A missing node has rank -1.
// - The parent of a node `x` is denoted `p(x)`.
// - The rank difference of a node `x` is given by `r(p(x)) - r(x)`.
// - A node `x` is an `i`-child if its rank difference is `i`.
// - A node is `i,j` if one of its children is an `i`-child and the other is a `j`-child.
//
// The invariants of the tree are:
// 1. All rank differences are either 1 or 2.
// 2. All leaves have rank 0.
//
// Rebalancing keeps `r(x)` equal to the height of the subtree rooted at `x`, so a node is never
// 2,2 and a unary node always has rank 1. Insertion walks up promoting 0,1 parents until the
// rank rule holds again or a single rotation (possibly doubled) absorbs the violation.
// Removal walks up comparing the shortened side against its sibling:
// - a gap of 1 means the parent's rank is still right and the walk stops;
// - a gap of 0 demotes the parent and continues one level up;
// - a gap of 2 rotates the sibling over the parent, and continues unless the sibling was even.

use core::{borrow::Borrow, cmp::Ordering, fmt, mem, ops::Not};

mod arena;
mod debug;
mod error;
mod iter;
mod node;
mod rank;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

use arena::Arena;
use rank::Lean;

pub use arena::NodeId;
pub use error::InvariantError;
pub use iter::Iter;
pub use node::NodeRef;

/// An ordered set of elements stored in a weak AVL tree.
///
/// Elements are ordered by their [`Ord`] implementation, which must be a strict total order.
/// An inconsistent ordering does not cause memory unsafety, but the tree may lose elements or
/// fall out of balance.
///
/// Implementation based on the paper [Rank-Balanced Trees] by Haeupler, Sen and Tarjan.
///
/// [Rank-Balanced Trees]: http://arks.princeton.edu/ark:/88435/pr1nz5z
pub struct WavlTree<T> {
    arena: Arena<T>,
    root: Link,
    len: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

struct Links {
    parent: Link,
    children: [Link; 2],
    rank: u8,
}

type Link = Option<NodeId>;

impl<T> WavlTree<T> {
    /// Returns a new empty tree.
    pub const fn new() -> WavlTree<T> {
        WavlTree {
            arena: Arena::new(),
            root: None,
            len: 0,
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        let empty = self.len() == 0;
        debug_assert_eq!(empty, self.root.is_none());
        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the root node, or `None` if the tree is empty.
    pub fn root(&self) -> Option<NodeRef<'_, T>> {
        self.root.map(|root| NodeRef::new(self, root))
    }

    /// Returns the node holding the minimum element of the tree.
    pub fn first(&self) -> Option<NodeRef<'_, T>> {
        let first = self.min_in_subtree(self.root?);
        Some(NodeRef::new(self, first))
    }

    /// Returns the node holding the maximum element of the tree.
    pub fn last(&self) -> Option<NodeRef<'_, T>> {
        let mut cur = self.root?;

        while let Some(right) = self.links(cur).right() {
            cur = right;
        }

        Some(NodeRef::new(self, cur))
    }

    /// Returns the node holding the next larger element after `node`, if any.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn successor<'tree>(&'tree self, node: NodeRef<'tree, T>) -> Option<NodeRef<'tree, T>> {
        debug_assert!(
            core::ptr::eq(node.tree, self),
            "`node` belongs to another tree"
        );
        node.successor()
    }

    /// Returns an iterator over the elements of the tree, in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Clears the tree, dropping all elements.
    pub fn clear(&mut self) {
        log::debug!("clearing tree of {} elements", self.len);

        self.arena.clear();
        self.root = None;
        self.len = 0;
    }

    // Support methods ========================================================

    #[inline]
    fn links(&self, node: NodeId) -> &Links {
        &self.arena.node(node).links
    }

    #[inline]
    fn links_mut(&mut self, node: NodeId) -> &mut Links {
        &mut self.arena.node_mut(node).links
    }

    #[inline]
    fn element(&self, node: NodeId) -> &T {
        &self.arena.node(node).element
    }

    /// Returns the rank of the pointed-to node.
    #[inline]
    fn rank(&self, node: Link) -> i32 {
        rank::rank(node.map(|n| self.links(n)))
    }

    #[inline]
    fn promote(&mut self, node: NodeId) {
        let links = self.links_mut(node);
        links.rank += 1;
    }

    #[inline]
    fn demote(&mut self, node: NodeId) {
        let links = self.links_mut(node);
        links.rank -= 1;
    }

    #[inline]
    fn demote_twice(&mut self, node: NodeId) {
        let links = self.links_mut(node);
        links.rank -= 2;
    }

    fn which_child(&self, parent: NodeId, child: NodeId) -> Dir {
        if self.links(parent).left() == Some(child) {
            Dir::Left
        } else {
            debug_assert_eq!(self.links(parent).right(), Some(child));
            Dir::Right
        }
    }

    /// Classifies `node` by comparing its children, taking `outer` as the side `node` hangs from
    /// its parent.
    fn lean(&self, node: NodeId, outer: Dir) -> Lean {
        let links = self.links(node);
        Lean::of(self.rank(links.child(!outer)), self.rank(links.child(outer)))
    }

    // Returns the minimum node in the subtree rooted at `root`.
    fn min_in_subtree(&self, root: NodeId) -> NodeId {
        let mut cur = root;

        while let Some(left) = self.links(cur).left() {
            cur = left;
        }

        cur
    }

    pub(crate) fn successor_id(&self, node: NodeId) -> Link {
        if let Some(right) = self.links(node).right() {
            return Some(self.min_in_subtree(right));
        }

        // Climb until arriving at an ancestor from its left subtree.
        let mut child = node;
        let mut opt_parent = self.links(node).parent();

        while let Some(parent) = opt_parent {
            if self.links(parent).left() == Some(child) {
                return Some(parent);
            }

            child = parent;
            opt_parent = self.links(parent).parent();
        }

        None
    }

    // Replaces the child link of `parent` pointing at `old_child` with `new_child`, or replaces the
    // root if `parent` is `None`.
    //
    // `new_child`'s parent link is not updated.
    fn replace_child_or_set_root(&mut self, parent: Link, old_child: NodeId, new_child: Link) {
        match parent {
            Some(parent) => {
                let dir = self.which_child(parent, old_child);
                self.links_mut(parent).set_child(dir, new_child);
            }
            None => self.root = new_child,
        }
    }

    // Performs a single rotation moving `down` one level down in direction `dir`. Its `!dir`
    // child takes its place, and that child's `dir` subtree is reattached under `down`.
    //
    // `Dir::Left` is a classic left rotation and `Dir::Right` a right rotation.
    //
    // The ranks of affected nodes are not updated.
    fn rotate(&mut self, down: NodeId, dir: Dir) {
        let up = self
            .links(down)
            .child(!dir)
            .expect("rotation requires a child to rotate up");

        log::trace!("rotate {dir:?} at {down}, raising {up}");

        let across = self.links(up).child(dir);
        self.links_mut(down).set_child(!dir, across);
        if let Some(across) = across {
            self.links_mut(across).set_parent(Some(down));
        }

        let parent = self.links_mut(down).set_parent(Some(up));
        self.replace_child_or_set_root(parent, down, Some(up));

        let up_links = self.links_mut(up);
        up_links.set_parent(parent);
        up_links.set_child(dir, Some(down));
    }
}

impl<T: Ord> WavlTree<T> {
    /// Returns the node whose element compares equal to `key`.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn find<Q>(&self, key: &Q) -> Option<NodeRef<'_, T>>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.find_id(key)?;
        Some(NodeRef::new(self, node))
    }

    /// Returns a reference to the element that compares equal to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.find_id(key)?;
        Some(self.element(node))
    }

    /// Returns `true` if the tree contains an element equal to `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_id(key).is_some()
    }

    fn find_id<Q>(&self, key: &Q) -> Link
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;

            match key.cmp(self.element(cur).borrow()) {
                Ordering::Less => opt_cur = self.links(cur).left(),
                Ordering::Equal => return Some(cur),
                Ordering::Greater => opt_cur = self.links(cur).right(),
            }
        }
    }

    /// Inserts an element into the tree.
    ///
    /// If the tree already holds an equal element, it is overwritten in place and returned; the
    /// shape of the tree and its length are unchanged.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, element: T) -> Option<T> {
        let Some(root) = self.root else {
            // Tree is empty. Set `element` as the root and return.
            self.root = Some(self.arena.alloc(element));
            self.len = 1;
            return None;
        };

        // Descend the tree, looking for a free child slot.
        let mut parent = root;
        let dir = loop {
            let dir = match element.cmp(self.element(parent)) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => {
                    let slot = &mut self.arena.node_mut(parent).element;
                    return Some(mem::replace(slot, element));
                }
                Ordering::Greater => Dir::Right,
            };

            match self.links(parent).child(dir) {
                Some(child) => parent = child,
                None => break dir,
            }
        };

        let parent_was_leaf = self.links(parent).is_leaf();

        let node = self.arena.alloc(element);
        self.links_mut(node).set_parent(Some(parent));
        self.links_mut(parent).set_child(dir, Some(node));

        if parent_was_leaf {
            // The parent was a rank-0 leaf and the new node is a 0-child. Promoting the parent
            // fixes that, but may make the parent itself a 0-child.
            self.promote(parent);
            self.rebalance_inserted(parent);
        }

        self.len += 1;
        None
    }

    // Performs a bottom-up rebalance of the tree after `x` was promoted.
    //
    // Invariants:
    // - `x` is 1,2.
    // - The only possible rank rule violation is `x` being a 0-child.
    fn rebalance_inserted(&mut self, mut x: NodeId) {
        while let Some(parent) = self.links(x).parent() {
            let parent_rank = self.rank(Some(parent));
            if parent_rank - self.rank(Some(x)) == 1 {
                // `x` is a 1-child, so the rank rule holds.
                return;
            }

            let dir = self.which_child(parent, x);
            let sibling = self.links(parent).child(!dir);

            if parent_rank - self.rank(sibling) == 1 {
                // `parent` is 0,1: promote it and ascend.
                log::trace!("promote {parent}");
                self.promote(parent);
                x = parent;
                continue;
            }

            // `parent` is 0,2. Rotate `x` (or its inner child) above it.
            if self.lean(x, dir) == Lean::Inner {
                let inner = self
                    .links(x)
                    .child(!dir)
                    .expect("inner-leaning node must have an inner child");

                self.demote(x);
                self.promote(inner);
                self.rotate(x, dir);
            }

            self.demote(parent);
            self.rotate(parent, !dir);
            return;
        }
    }

    /// Removes the element that compares equal to `key`, returning it.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = self.find_id(key)?;

        // A node with two children is never unlinked directly. Its successor, which has no left
        // child, donates its element and is unlinked instead.
        if let (Some(_), Some(right)) = (self.links(node).left(), self.links(node).right()) {
            let successor = self.min_in_subtree(right);
            self.arena.swap_elements(node, successor);
            node = successor;
        }

        let links = self.links(node);
        let parent = links.parent();
        let replacement = links.left().or(links.right());

        if let Some(replacement) = replacement {
            self.links_mut(replacement).set_parent(parent);
        }

        match parent {
            None => self.root = replacement,
            Some(parent) => {
                let dir = self.which_child(parent, node);
                let sibling = {
                    let parent_links = self.links_mut(parent);
                    parent_links.set_child(dir, replacement);
                    parent_links.child(!dir)
                };

                self.rebalance_removed(parent, replacement, sibling);
            }
        }

        self.len -= 1;
        Some(self.arena.free(node))
    }

    /// Removes the element that compares equal to `key`.
    ///
    /// Returns `true` if such an element was present.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove(key).is_some()
    }

    // Performs a bottom-up rebalance of the tree after the subtree `x` under `parent` lost one
    // rank. `x` may be missing; `sibling` is the other child of `parent`.
    fn rebalance_removed(&mut self, mut parent: NodeId, mut x: Link, mut sibling: Link) {
        loop {
            let gap = self.rank(sibling) - self.rank(x);
            log::trace!("retrace removal at {parent}: sibling gap {gap}");

            match gap {
                // `parent` still takes its rank from `sibling`.
                1 => return,

                // Both children shrank to the same rank.
                0 => self.demote(parent),

                _ => {
                    debug_assert_eq!(gap, 2);

                    let y = sibling.expect("a sibling two ranks taller must exist");
                    let dir = self.which_child(parent, y);

                    self.demote_twice(parent);

                    match self.lean(y, dir) {
                        Lean::Even => {
                            // `y` rises with its outer child; `parent` keeps `y`'s inner child
                            // and ends up one rank below `y`. The subtree height is unchanged.
                            self.promote(y);
                            self.promote(parent);
                            self.rotate(parent, !dir);
                            return;
                        }

                        Lean::Outer => {
                            self.rotate(parent, !dir);
                            parent = y;
                        }

                        Lean::Inner => {
                            let v = self
                                .links(y)
                                .child(!dir)
                                .expect("inner-leaning node must have an inner child");

                            self.promote(v);
                            self.demote(y);
                            self.rotate(y, dir);
                            self.rotate(parent, !dir);
                            parent = v;
                        }
                    }
                }
            }

            // Ascend one level. If this reaches the root, the tree is balanced.
            let Some(grandparent) = self.links(parent).parent() else {
                return;
            };

            let dir = self.which_child(grandparent, parent);
            x = Some(parent);
            sibling = self.links(grandparent).child(!dir);
            parent = grandparent;
        }
    }

    /// Checks every structural invariant of the tree.
    pub fn validate(&self) -> Result<(), InvariantError> {
        let mut reachable = 0;

        if let Some(root) = self.root {
            if self.links(root).parent().is_some() {
                return Err(InvariantError::RootHasParent { root });
            }

            self.validate_at(root, &mut reachable)?;
        }

        if reachable != self.len {
            return Err(InvariantError::LengthMismatch {
                len: self.len,
                reachable,
            });
        }

        let mut opt_prev = self.first();
        while let Some(prev) = opt_prev {
            let next = prev.successor();
            if let Some(next) = next {
                if prev.element() >= next.element() {
                    return Err(InvariantError::KeyOrder { node: next.id() });
                }
            }
            opt_prev = next;
        }

        Ok(())
    }

    fn validate_at(&self, node: NodeId, reachable: &mut usize) -> Result<(), InvariantError> {
        *reachable += 1;

        let links = self.links(node);
        let rank = links.rank();

        if links.is_leaf() && rank != 0 {
            return Err(InvariantError::LeafRank { node, rank });
        }

        for child in [links.left(), links.right()].into_iter().flatten() {
            let difference = i32::from(rank) - self.rank(Some(child));
            if !(1..=2).contains(&difference) {
                return Err(InvariantError::RankDifference {
                    parent: node,
                    child,
                    difference,
                });
            }

            let found = self.links(child).parent();
            if found != Some(node) {
                return Err(InvariantError::ParentLink {
                    parent: node,
                    child,
                    found,
                });
            }

            self.validate_at(child, reachable)?;
        }

        Ok(())
    }

    #[doc(hidden)]
    #[track_caller]
    pub fn assert_invariants(&self) {
        if let Err(e) = self.validate() {
            panic!("tree invariant violated: {e}");
        }
    }
}

impl<T> Default for WavlTree<T> {
    fn default() -> Self {
        WavlTree::new()
    }
}

impl<T: Ord> Extend<T> for WavlTree<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for element in iter {
            self.insert(element);
        }
    }
}

impl<T: Ord> FromIterator<T> for WavlTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = WavlTree::new();
        tree.extend(iter);
        tree
    }
}

impl<'tree, T> IntoIterator for &'tree WavlTree<T> {
    type Item = &'tree T;
    type IntoIter = Iter<'tree, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for WavlTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Links {
    #[must_use]
    const fn new() -> Self {
        Links {
            parent: None,
            children: [None; 2],
            rank: 0,
        }
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.left().is_none() && self.right().is_none()
    }

    #[inline]
    fn rank(&self) -> u8 {
        self.rank
    }

    #[inline]
    fn parent(&self) -> Link {
        self.parent
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link {
        self.children[dir as usize]
    }

    #[inline]
    fn left(&self) -> Link {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&mut self, parent: Link) -> Link {
        mem::replace(&mut self.parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link) -> Link {
        mem::replace(&mut self.children[dir as usize], child)
    }

    #[cfg(test)]
    fn set_rank(&mut self, rank: u8) {
        self.rank = rank;
    }
}
