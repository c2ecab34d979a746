use std::{borrow::Borrow, cmp::Ordering, ops::Range};

use proptest::prelude::*;

use crate::model;

use super::*;

fn tree_of(keys: &[u32]) -> WavlTree<u32> {
    let mut tree = WavlTree::new();

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    tree
}

fn root_of(tree: &WavlTree<u32>) -> (u32, u8) {
    let root = tree.root().expect("tree is empty");
    (*root.element(), root.rank())
}

// Calls `f` with every permutation of `keys` (Heap's algorithm).
fn for_each_permutation(keys: &mut [u32], f: &mut impl FnMut(&[u32])) {
    fn recurse(k: usize, keys: &mut [u32], f: &mut impl FnMut(&[u32])) {
        if k <= 1 {
            f(keys);
            return;
        }

        for i in 0..k - 1 {
            recurse(k - 1, keys, f);
            if k % 2 == 0 {
                keys.swap(i, k - 1);
            } else {
                keys.swap(0, k - 1);
            }
        }
        recurse(k - 1, keys, f);
    }

    let len = keys.len();
    recurse(len, keys, f);
}

fn insert_find_all(keys: &[u32]) {
    let tree = tree_of(keys);

    for key in keys {
        let node = tree.find(key).expect("item not found");
        assert_eq!(node.element(), key);
    }

    assert_eq!(tree.len(), keys.len());
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn all_permutations_find() {
    for n in 2..=6 {
        let mut keys: Vec<u32> = (0..n).collect();
        for_each_permutation(&mut keys, &mut |perm| insert_find_all(perm));
    }
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree = tree_of(keys);

    for key in keys {
        assert!(tree.delete(key), "item not found");
        tree.assert_invariants();
    }
    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        assert_eq!(tree.remove(key), Some(*key));
        tree.assert_invariants();
    }
    assert!(tree.is_empty());
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn all_permutations_remove() {
    for n in 2..=6 {
        let mut keys: Vec<u32> = (0..n).collect();
        for_each_permutation(&mut keys, &mut |perm| insert_remove_all(perm));
    }
}

#[test]
fn insert_no_rotations() {
    let tree = tree_of(&[5, 6, 4]);

    assert_eq!(tree.len(), 3);
    assert_eq!(root_of(&tree), (5, 1));
}

#[test]
fn insert_right_rotation() {
    let tree = tree_of(&[5, 4, 3]);

    assert_eq!(root_of(&tree), (4, 1));
}

#[test]
fn insert_left_rotation() {
    let tree = tree_of(&[1, 2, 3]);

    assert_eq!(root_of(&tree), (2, 1));
    assert_eq!(tree.root().and_then(|r| r.right()).map(|n| n.rank()), Some(0));
}

#[test]
fn insert_three_left_rotations() {
    let tree = tree_of(&[1, 2, 3, 4, 5, 6]);

    assert_eq!(root_of(&tree), (4, 2));
    assert_eq!(tree.root().and_then(|r| r.right()).map(|n| n.rank()), Some(1));
}

#[test]
fn insert_left_right_rotation() {
    let tree = tree_of(&[3, 1, 2]);

    assert_eq!(root_of(&tree), (2, 1));
    assert_eq!(tree.root().and_then(|r| r.right()).map(|n| n.rank()), Some(0));
}

#[test]
fn insert_right_left_rotation() {
    let tree = tree_of(&[1, 3, 2]);

    assert_eq!(root_of(&tree), (2, 1));
    assert_eq!(tree.root().and_then(|r| r.left()).map(|n| n.rank()), Some(0));
}

#[test_log::test]
fn delete_rotates_at_root() {
    let mut tree = tree_of(&[8, 5, 11, 3, 7, 10, 12, 2, 4, 6, 9, 1]);
    assert_eq!(root_of(&tree).0, 8);

    assert!(tree.delete(&12));
    tree.assert_invariants();

    let root = tree.root().unwrap();
    assert_eq!(*root.element(), 5);
    assert_eq!(root.right().map(|n| n.rank()), Some(2));
    assert_eq!(tree.len(), 11);
    assert!(tree.iter().copied().eq([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]));
}

#[test]
fn delete_two_children_moves_successor() {
    let mut tree = tree_of(&[2, 1, 4, 3, 5]);

    assert_eq!(tree.remove(&2), Some(2));
    tree.assert_invariants();

    assert_eq!(root_of(&tree).0, 3);
    assert!(tree.iter().copied().eq([1, 3, 4, 5]));
}

#[test]
fn delete_unary_root() {
    let mut tree = tree_of(&[1, 2]);

    assert!(tree.delete(&1));
    tree.assert_invariants();

    assert_eq!(tree.len(), 1);
    assert_eq!(root_of(&tree), (2, 0));
}

#[test]
fn delete_absent() {
    let mut empty: WavlTree<u32> = WavlTree::new();
    assert!(!empty.delete(&1));

    let mut tree = tree_of(&[5, 3, 8]);
    assert!(!tree.delete(&4));

    assert_eq!(tree.len(), 3);
    assert_eq!(root_of(&tree), (5, 1));
    assert!(tree.iter().copied().eq([3, 5, 8]));
}

#[test]
fn find_absent() {
    let tree = tree_of(&[10, 20, 30, 40]);

    assert!(tree.find(&25).is_none());
    assert!(!tree.contains(&0));
    assert_eq!(tree.get(&30), Some(&30));
    assert_eq!(tree.find(&40).map(|n| n.element().cmp(&40)), Some(Ordering::Equal));
}

#[test]
fn successor_walks_up() {
    let tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);

    // 3 has no right subtree; its successor is the root.
    let three = tree.find(&3).unwrap();
    assert!(three.right().is_none());
    assert_eq!(tree.successor(three).map(|n| *n.element()), Some(4));

    // 7 is the maximum.
    let seven = tree.find(&7).unwrap();
    assert!(tree.successor(seven).is_none());

    let four = tree.find(&4).unwrap();
    assert_eq!(four.successor().map(|n| *n.element()), Some(5));
}

#[test]
fn first_and_last() {
    let empty: WavlTree<u32> = WavlTree::new();
    assert!(empty.first().is_none());
    assert!(empty.last().is_none());

    let tree = tree_of(&[9, 4, 17, 1]);
    assert_eq!(tree.first().map(|n| *n.element()), Some(1));
    assert_eq!(tree.last().map(|n| *n.element()), Some(17));
}

#[derive(Debug)]
struct Entry {
    key: u32,
    value: &'static str,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl Borrow<u32> for Entry {
    fn borrow(&self) -> &u32 {
        &self.key
    }
}

#[test]
fn insert_overwrites_equal_element() {
    let mut tree = WavlTree::new();
    for (key, value) in [(2, "b"), (1, "a"), (3, "c")] {
        tree.insert(Entry { key, value });
    }

    let root_before = tree.root().map(|n| (n.id(), n.rank()));

    let old = tree.insert(Entry { key: 1, value: "A" });
    assert_eq!(old.map(|e| e.value), Some("a"));

    assert_eq!(tree.len(), 3);
    assert_eq!(tree.root().map(|n| (n.id(), n.rank())), root_before);
    assert_eq!(tree.get(&1u32).map(|e| e.value), Some("A"));
    tree.assert_invariants();
}

#[test]
fn remove_returns_stored_element() {
    let mut tree: WavlTree<Entry> = (0..10).map(|key| Entry { key, value: "x" }).collect();

    let removed = tree.remove(&4u32).unwrap();
    assert_eq!((removed.key, removed.value), (4, "x"));
    assert!(!tree.contains(&4u32));
    tree.assert_invariants();
}

#[test]
fn rotations_preserve_order() {
    let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);
    let root = tree.root.unwrap();

    tree.rotate(root, Dir::Left);
    assert_eq!(root_of(&tree).0, 6);
    assert!(tree.iter().copied().eq(1..=7));

    let root = tree.root.unwrap();
    tree.rotate(root, Dir::Right);
    assert_eq!(root_of(&tree).0, 4);
    assert!(tree.iter().copied().eq(1..=7));

    let root = tree.root.unwrap();
    tree.rotate(root, Dir::Right);
    assert_eq!(root_of(&tree).0, 2);
    assert!(tree.iter().copied().eq(1..=7));

    // Every child still links back to its parent; only the ranks are stale.
    for key in 1..=7 {
        let node = tree.find(&key).unwrap();
        for child in [node.left(), node.right()].into_iter().flatten() {
            assert_eq!(child.parent().map(|p| p.id()), Some(node.id()));
        }
    }
}

#[test]
fn rotation_below_root() {
    let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);
    let two = tree.find(&2).unwrap().id();

    tree.rotate(two, Dir::Right);

    let root = tree.root().unwrap();
    let left = root.left().unwrap();
    assert_eq!(*left.element(), 1);
    assert_eq!(left.parent().map(|p| *p.element()), Some(4));
    assert_eq!(left.right().map(|n| *n.element()), Some(2));
    assert!(tree.iter().copied().eq(1..=7));
}

#[test]
fn round_trip_restores_sequence() {
    let mut tree = tree_of(&[50, 20, 80, 10, 30, 70, 90, 60]);
    let before: Vec<u32> = tree.iter().copied().collect();

    tree.insert(65);
    tree.assert_invariants();
    assert!(tree.delete(&65));
    tree.assert_invariants();

    assert_eq!(tree.len(), before.len());
    assert!(tree.iter().eq(before.iter()));
}

#[test]
fn clear_then_reuse() {
    let mut tree = tree_of(&[3, 1, 4, 1, 5, 9, 2, 6]);
    assert_eq!(tree.len(), 7);

    tree.clear();
    assert!(tree.is_empty());
    assert!(tree.root().is_none());
    assert_eq!(tree.iter().count(), 0);

    tree.extend([7, 8]);
    tree.assert_invariants();
    assert_eq!(format!("{tree:?}"), "{7, 8}");
}

#[test]
fn freed_slots_are_reused() {
    let mut tree = tree_of(&[1, 2, 3, 4]);

    assert!(tree.delete(&2));
    tree.insert(10);
    tree.assert_invariants();

    assert_eq!(tree.arena.capacity_used(), 4);
}

#[test]
fn validate_reports_rank_violation() {
    let mut tree = tree_of(&[2, 1, 3]);
    let root = tree.root.unwrap();

    tree.links_mut(root).set_rank(3);

    assert!(matches!(
        tree.validate(),
        Err(InvariantError::RankDifference { difference: 3, .. })
    ));
}

#[test]
fn validate_reports_leaf_rank() {
    let mut tree = tree_of(&[2, 1, 3]);
    let root = tree.root.unwrap();
    let leaf = tree.find(&1).unwrap().id();

    // Keep both rank differences at the root legal so only the leaf rule breaks.
    tree.links_mut(root).set_rank(2);
    tree.links_mut(leaf).set_rank(1);

    assert_eq!(
        tree.validate(),
        Err(InvariantError::LeafRank { node: leaf, rank: 1 })
    );
}

#[test]
fn rank_bounds_height() {
    // Ascending insertion is the classic worst case for an unbalanced tree.
    let tree: WavlTree<u32> = (0..1024).collect();
    tree.assert_invariants();

    assert_eq!(root_of(&tree).1, 10);
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn successor_equivalence(input in model::successor_input_strategy()) {
        model::run_successor_equivalence(input.values, input.removals);
    }
}
