use core::{fmt, mem};

use crate::Links;

/// Index of a node slot in a [`WavlTree`](crate::WavlTree)'s arena.
///
/// Ids are only meaningful for the tree that produced them, and only until the next insertion
/// or removal: a vacated slot is reused by the next node allocated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) struct Node<T> {
    pub(crate) element: T,
    pub(crate) links: Links,
}

/// Slot storage for tree nodes.
///
/// Removed nodes leave a vacant slot behind, which is pushed onto the free list and handed out
/// again by the next allocation.
pub(crate) struct Arena<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<u32>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Arena<T> {
        Arena {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Stores `element` in a fresh rank-0 node with no links.
    pub(crate) fn alloc(&mut self, element: T) -> NodeId {
        let node = Node {
            element,
            links: Links::new(),
        };

        match self.free.pop() {
            Some(idx) => {
                debug_assert!(self.slots[idx as usize].is_none());
                self.slots[idx as usize] = Some(node);
                NodeId(idx)
            }

            None => {
                let idx = u32::try_from(self.slots.len()).expect("node arena exhausted");
                if self.slots.len() == self.slots.capacity() {
                    log::debug!("growing node arena past {} slots", self.slots.len());
                }
                self.slots.push(Some(node));
                NodeId(idx)
            }
        }
    }

    /// Vacates the slot at `id`, returning the element it held.
    pub(crate) fn free(&mut self, id: NodeId) -> T {
        let node = self.slots[id.index()]
            .take()
            .expect("freed a vacant arena slot");
        self.free.push(id.0);
        node.element
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node<T> {
        match &self.slots[id.index()] {
            Some(node) => node,
            None => unreachable!("node {id} is vacant"),
        }
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match &mut self.slots[id.index()] {
            Some(node) => node,
            None => unreachable!("node {id} is vacant"),
        }
    }

    /// Exchanges the elements stored at `a` and `b`, leaving their links untouched.
    pub(crate) fn swap_elements(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }

        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.slots.split_at_mut(hi.index());

        match (&mut head[lo.index()], &mut tail[0]) {
            (Some(x), Some(y)) => mem::swap(&mut x.element, &mut y.element),
            _ => unreachable!("swapped elements of a vacant slot"),
        }
    }

    /// Drops every element and forgets all slots.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    /// Number of slots currently allocated, vacant or not.
    #[cfg(test)]
    pub(crate) fn capacity_used(&self) -> usize {
        self.slots.len()
    }
}
