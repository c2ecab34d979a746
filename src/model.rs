//! Model-based test harnesses comparing [`WavlTree`] against [`BTreeSet`].
//!
//! Used by the crate's property tests and by the `cargo fuzz` targets.

use std::{collections::BTreeSet, ops::Bound};

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::WavlTree;

/// An element value, either picked from the ones currently stored or drawn at random.
#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

impl ItemValue {
    fn resolve(self, sorted: &[u32]) -> u32 {
        match self {
            ItemValue::Index(idx) => {
                if sorted.is_empty() {
                    idx as u32
                } else {
                    sorted[idx % sorted.len()]
                }
            }
            ItemValue::Random(v) => v,
        }
    }
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    Find(ItemValue),
    Remove(ItemValue),
    Delete(ItemValue),
    Successor(ItemValue),
    First,
    Last,
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        match self {
            Op::Insert(item) => FinalOp::Insert(item.resolve(sorted)),
            Op::Find(item) => FinalOp::Find(item.resolve(sorted)),
            Op::Remove(item) => FinalOp::Remove(item.resolve(sorted)),
            Op::Delete(item) => FinalOp::Delete(item.resolve(sorted)),
            Op::Successor(item) => FinalOp::Successor(item.resolve(sorted)),
            Op::First => FinalOp::First,
            Op::Last => FinalOp::Last,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32),
    Find(u32),
    Remove(u32),
    Delete(u32),
    Successor(u32),
    First,
    Last,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        value_strategy().prop_map(Op::Insert),
        value_strategy().prop_map(Op::Find),
        value_strategy().prop_map(Op::Remove),
        value_strategy().prop_map(Op::Delete),
        value_strategy().prop_map(Op::Successor),
        Just(Op::First),
        Just(Op::Last),
    ]
}

/// Applies `ops` to both a [`WavlTree`] and a [`BTreeSet`], panicking on the first divergence
/// or broken tree invariant.
pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut sorted_values = Vec::with_capacity(ops.len());
    let mut btree = BTreeSet::new();
    let mut wavl: WavlTree<u32> = WavlTree::new();

    fn insert_sorted(v: &mut Vec<u32>, value: u32) {
        if let Err(idx) = v.binary_search(&value) {
            v.insert(idx, value);
        }
    }

    fn remove_sorted(v: &mut Vec<u32>, value: u32) {
        if let Ok(idx) = v.binary_search(&value) {
            v.remove(idx);
        }
    }

    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted_values);

        match final_op {
            FinalOp::Insert(value) => {
                insert_sorted(&mut sorted_values, value);

                let from_btree = btree.replace(value);
                let from_wavl = wavl.insert(value);

                assert_eq!(from_btree, from_wavl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Find(value) => {
                let from_btree = btree.get(&value);
                let from_wavl = wavl.find(&value).map(|node| node.element());

                assert_eq!(from_btree, from_wavl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Remove(value) => {
                remove_sorted(&mut sorted_values, value);

                let from_btree = btree.take(&value);
                let from_wavl = wavl.remove(&value);

                assert_eq!(from_btree, from_wavl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Delete(value) => {
                remove_sorted(&mut sorted_values, value);

                let from_btree = btree.remove(&value);
                let from_wavl = wavl.delete(&value);

                assert_eq!(from_btree, from_wavl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Successor(value) => {
                let from_btree = btree
                    .contains(&value)
                    .then(|| next_after(&btree, value))
                    .flatten();
                let from_wavl = wavl
                    .find(&value)
                    .and_then(|node| wavl.successor(node))
                    .map(|node| node.element());

                assert_eq!(from_btree, from_wavl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::First => {
                let from_btree = btree.first();
                let from_wavl = wavl.first().map(|node| node.element());

                assert_eq!(from_btree, from_wavl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Last => {
                let from_btree = btree.last();
                let from_wavl = wavl.last().map(|node| node.element());

                assert_eq!(from_btree, from_wavl, "FinalOp #{op_id}: {final_op:?}");
            }
        }

        wavl.assert_invariants();
        assert_eq!(btree.len(), wavl.len());
        assert!(btree.iter().eq(wavl.iter()));
    }
}

fn next_after(btree: &BTreeSet<u32>, value: u32) -> Option<&u32> {
    btree
        .range((Bound::Excluded(value), Bound::Unbounded))
        .next()
}

#[derive(Clone, Debug)]
pub struct SuccessorEquivalenceInput {
    pub values: Vec<u32>,
    pub removals: Vec<ItemValue>,
}

impl<'a> arbitrary::Arbitrary<'a> for SuccessorEquivalenceInput {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        fn value(u: &mut arbitrary::Unstructured<'_>) -> u32 {
            u32::arbitrary(u).unwrap_or(0)
        }

        fn removal(u: &mut arbitrary::Unstructured<'_>) -> ItemValue {
            ItemValue::arbitrary(u).unwrap_or(ItemValue::Index(0))
        }

        let num_values = u8::arbitrary(u)? % 100;
        let num_removals = u8::arbitrary(u)? % 100;

        let values = core::iter::repeat_with(|| value(u))
            .take(num_values.into())
            .collect();

        let removals = core::iter::repeat_with(|| removal(u))
            .take(num_removals.into())
            .collect();

        Ok(SuccessorEquivalenceInput { values, removals })
    }
}

proptest::prop_compose! {
    pub fn successor_input_strategy()(
        values in proptest::collection::vec(0u32..1000, 0..100),
        removals in proptest::collection::vec(value_strategy(), 0..100),
    ) -> SuccessorEquivalenceInput {
        SuccessorEquivalenceInput { values, removals }
    }
}

/// Builds a tree from `values`, then after each removal walks it front to back with
/// [`WavlTree::successor`] and checks the walk against the [`BTreeSet`] in lockstep.
pub fn run_successor_equivalence(values: Vec<u32>, removals: Vec<ItemValue>) {
    let mut btree: BTreeSet<u32> = values.iter().copied().collect();
    let mut wavl: WavlTree<u32> = values.into_iter().collect();

    fn check_walk(btree: &BTreeSet<u32>, wavl: &WavlTree<u32>) {
        let mut expected = btree.iter();
        let mut cur = wavl.first();

        while let Some(node) = cur {
            assert_eq!(expected.next(), Some(node.element()));
            assert_eq!(
                next_after(btree, *node.element()),
                node.successor().map(|n| n.element())
            );
            cur = wavl.successor(node);
        }

        assert_eq!(expected.next(), None);
    }

    check_walk(&btree, &wavl);

    for removal in removals {
        let sorted: Vec<u32> = btree.iter().copied().collect();
        let value = removal.resolve(&sorted);

        assert_eq!(btree.remove(&value), wavl.delete(&value));
        wavl.assert_invariants();

        check_walk(&btree, &wavl);
    }
}
