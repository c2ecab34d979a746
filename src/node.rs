use core::fmt;

use crate::{NodeId, WavlTree};

/// A shared handle to a node of a [`WavlTree`].
///
/// The handle borrows the tree, so it cannot outlive the next insertion or removal.
pub struct NodeRef<'tree, T> {
    pub(crate) tree: &'tree WavlTree<T>,
    pub(crate) id: NodeId,
}

impl<'tree, T> NodeRef<'tree, T> {
    #[inline]
    pub(crate) fn new(tree: &'tree WavlTree<T>, id: NodeId) -> Self {
        NodeRef { tree, id }
    }

    /// Returns the arena slot of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the element stored in this node.
    pub fn element(&self) -> &'tree T {
        &self.tree.arena.node(self.id).element
    }

    /// Returns the rank of this node. Leaves have rank 0.
    pub fn rank(&self) -> u8 {
        self.tree.links(self.id).rank()
    }

    pub fn parent(&self) -> Option<NodeRef<'tree, T>> {
        self.link(self.tree.links(self.id).parent())
    }

    pub fn left(&self) -> Option<NodeRef<'tree, T>> {
        self.link(self.tree.links(self.id).left())
    }

    pub fn right(&self) -> Option<NodeRef<'tree, T>> {
        self.link(self.tree.links(self.id).right())
    }

    /// Returns the node holding the next larger element, if any.
    ///
    /// This completes in _O(log(n))_ time.
    pub fn successor(&self) -> Option<NodeRef<'tree, T>> {
        self.link(self.tree.successor_id(self.id))
    }

    #[inline]
    fn link(&self, id: Option<NodeId>) -> Option<NodeRef<'tree, T>> {
        id.map(|id| NodeRef::new(self.tree, id))
    }
}

impl<T> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for NodeRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("rank", &self.rank())
            .field("element", self.element())
            .finish()
    }
}
