use thiserror::Error;

use crate::NodeId;

/// A broken structural rule, as reported by [`WavlTree::validate`](crate::WavlTree::validate).
///
/// None of these can be produced through the public API of a tree whose element ordering is a
/// strict total order; they exist to catch bugs in the rebalancing code.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantError {
    #[error("leaf {node} has rank {rank}, expected 0")]
    LeafRank { node: NodeId, rank: u8 },

    #[error("child {child} of {parent} has rank difference {difference}, expected 1 or 2")]
    RankDifference {
        parent: NodeId,
        child: NodeId,
        difference: i32,
    },

    #[error("child {child} of {parent} links back to {found:?}")]
    ParentLink {
        parent: NodeId,
        child: NodeId,
        found: Option<NodeId>,
    },

    #[error("root {root} has a parent link")]
    RootHasParent { root: NodeId },

    #[error("element at {node} does not follow its in-order predecessor")]
    KeyOrder { node: NodeId },

    #[error("tree records {len} elements but {reachable} are reachable from the root")]
    LengthMismatch { len: usize, reachable: usize },
}
