use crate::Links;

/// Returns the rank of a possibly-missing node. Missing nodes have rank -1.
#[inline]
pub(crate) fn rank(links: Option<&Links>) -> i32 {
    links.map_or(-1, |l| i32::from(l.rank()))
}

/// Which of a node's two subtrees is taller, relative to the side it hangs from its parent.
///
/// The outer child is the one on the same side of the node as the node is of its parent; the
/// inner child sits between the node and its parent in key order. Rebalancing after both
/// insertion and removal picks between a single and a double rotation from this alone.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Lean {
    /// Both children have equal rank.
    Even,
    /// The outer child outranks the inner one. A single rotation suffices.
    Outer,
    /// The inner child outranks the outer one. The inner child must be rotated up twice.
    Inner,
}

impl Lean {
    #[inline]
    pub(crate) fn of(inner_rank: i32, outer_rank: i32) -> Lean {
        match inner_rank.cmp(&outer_rank) {
            core::cmp::Ordering::Less => Lean::Outer,
            core::cmp::Ordering::Equal => Lean::Even,
            core::cmp::Ordering::Greater => Lean::Inner,
        }
    }
}
