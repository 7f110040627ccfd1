//! Model-based equivalence checks against a pair of `BTreeMap`s.
//!
//! Shared by the test suite (through `proptest`) and the fuzz targets (through `arbitrary`).

use std::{
    collections::BTreeMap,
    ops::Bound::{Excluded, Unbounded},
};

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::{BiMap, LeftPosition};

/// The map type exercised by the model.
pub type TestMap = BiMap<u32, u32>;

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    /// Picks an existing key by index, so removals and lookups mostly hit.
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    // A narrow range, so that both sides collide and the default key 0 shows up often.
    fn random_strategy()(
        random in 0u32..64,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue, ItemValue),
    FindLeft(ItemValue),
    FindRight(ItemValue),
    EraseLeft(ItemValue),
    EraseRight(ItemValue),
    EraseLeftAt(ItemValue),
    EraseRightAt(ItemValue),
    AtLeftOrDefault(ItemValue),
    AtRightOrDefault(ItemValue),
    LowerBoundLeft(ItemValue),
    UpperBoundLeft(ItemValue),
    LowerBoundRight(ItemValue),
    UpperBoundRight(ItemValue),
    Clone,
}

impl Op {
    fn finalize(self, lefts: &[u32], rights: &[u32]) -> FinalOp {
        fn get_value(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        idx as u32
                    } else {
                        v[idx % v.len()]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        let left = |i| get_value(lefts, i);
        let right = |i| get_value(rights, i);

        match self {
            Op::Insert(l, r) => FinalOp::Insert(left(l), right(r)),
            Op::FindLeft(l) => FinalOp::FindLeft(left(l)),
            Op::FindRight(r) => FinalOp::FindRight(right(r)),
            Op::EraseLeft(l) => FinalOp::EraseLeft(left(l)),
            Op::EraseRight(r) => FinalOp::EraseRight(right(r)),
            Op::EraseLeftAt(l) => FinalOp::EraseLeftAt(left(l)),
            Op::EraseRightAt(r) => FinalOp::EraseRightAt(right(r)),
            Op::AtLeftOrDefault(l) => FinalOp::AtLeftOrDefault(left(l)),
            Op::AtRightOrDefault(r) => FinalOp::AtRightOrDefault(right(r)),
            Op::LowerBoundLeft(l) => FinalOp::LowerBoundLeft(left(l)),
            Op::UpperBoundLeft(l) => FinalOp::UpperBoundLeft(left(l)),
            Op::LowerBoundRight(r) => FinalOp::LowerBoundRight(right(r)),
            Op::UpperBoundRight(r) => FinalOp::UpperBoundRight(right(r)),
            Op::Clone => FinalOp::Clone,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32, u32),
    FindLeft(u32),
    FindRight(u32),
    EraseLeft(u32),
    EraseRight(u32),
    EraseLeftAt(u32),
    EraseRightAt(u32),
    AtLeftOrDefault(u32),
    AtRightOrDefault(u32),
    LowerBoundLeft(u32),
    UpperBoundLeft(u32),
    LowerBoundRight(u32),
    UpperBoundRight(u32),
    Clone,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        3 => (value_strategy(), value_strategy()).prop_map(|(l, r)| Op::Insert(l, r)),
        1 => value_strategy().prop_map(Op::FindLeft),
        1 => value_strategy().prop_map(Op::FindRight),
        1 => value_strategy().prop_map(Op::EraseLeft),
        1 => value_strategy().prop_map(Op::EraseRight),
        1 => value_strategy().prop_map(Op::EraseLeftAt),
        1 => value_strategy().prop_map(Op::EraseRightAt),
        1 => value_strategy().prop_map(Op::AtLeftOrDefault),
        1 => value_strategy().prop_map(Op::AtRightOrDefault),
        1 => value_strategy().prop_map(Op::LowerBoundLeft),
        1 => value_strategy().prop_map(Op::UpperBoundLeft),
        1 => value_strategy().prop_map(Op::LowerBoundRight),
        1 => value_strategy().prop_map(Op::UpperBoundRight),
        1 => Just(Op::Clone),
    ]
}

/// The reference: two ordered maps kept in sync by hand.
#[derive(Default)]
struct Model {
    fwd: BTreeMap<u32, u32>,
    rev: BTreeMap<u32, u32>,
}

impl Model {
    fn insert(&mut self, left: u32, right: u32) -> bool {
        if self.fwd.contains_key(&left) || self.rev.contains_key(&right) {
            return false;
        }

        self.fwd.insert(left, right);
        self.rev.insert(right, left);
        true
    }

    fn remove_left(&mut self, left: u32) -> Option<(u32, u32)> {
        let right = self.fwd.remove(&left)?;
        self.rev.remove(&right);
        Some((left, right))
    }

    fn remove_right(&mut self, right: u32) -> Option<(u32, u32)> {
        let left = self.rev.remove(&right)?;
        self.fwd.remove(&left);
        Some((left, right))
    }
}

fn next_key(map: &BTreeMap<u32, u32>, key: u32) -> Option<u32> {
    map.range((Excluded(key), Unbounded)).next().map(|(&k, _)| k)
}

fn first_from(map: &BTreeMap<u32, u32>, key: u32) -> Option<u32> {
    map.range(key..).next().map(|(&k, _)| k)
}

pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut model = Model::default();
    let mut map = TestMap::with_seed(ops.len() as u64);

    // Positions of earlier inserts, as `(position, left, right)`. Each must keep pointing at its
    // pair until that pair is erased.
    let mut held: Vec<(LeftPosition, u32, u32)> = Vec::new();

    for (op_id, op) in ops.into_iter().enumerate() {
        let lefts: Vec<u32> = model.fwd.keys().copied().collect();
        let rights: Vec<u32> = model.rev.keys().copied().collect();
        let final_op = op.finalize(&lefts, &rights);

        match final_op {
            FinalOp::Insert(left, right) => {
                let from_model = model.insert(left, right);
                let pos = map.insert(left, right);

                assert_eq!(from_model, !pos.is_end(), "FinalOp #{op_id}: {final_op:?}");
                if from_model {
                    assert_eq!(map.cursor(pos).get(), Some(&left));
                    assert_eq!(map.cursor(pos.flip()).get(), Some(&right));

                    if held.len() < 16 {
                        held.push((pos, left, right));
                    }
                }
            }

            FinalOp::FindLeft(left) => {
                let from_model = model.fwd.get(&left);
                let cursor = map.find_left(&left);

                assert_eq!(from_model, cursor.opposite(), "FinalOp #{op_id}: {final_op:?}");
                assert_eq!(from_model, cursor.flip().get());
                assert_eq!(from_model.ok_or(crate::Error::OutOfRange), map.at_left(&left));
            }

            FinalOp::FindRight(right) => {
                let from_model = model.rev.get(&right);
                let cursor = map.find_right(&right);

                assert_eq!(from_model, cursor.opposite(), "FinalOp #{op_id}: {final_op:?}");
                assert_eq!(from_model.ok_or(crate::Error::OutOfRange), map.at_right(&right));
            }

            FinalOp::EraseLeft(left) => {
                let from_model = model.remove_left(left);
                let from_map = map.remove_left(&left);

                assert_eq!(from_model, from_map, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::EraseRight(right) => {
                let from_model = model.remove_right(right);
                let from_map = map.erase_right(&right);

                assert_eq!(from_model.is_some(), from_map, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::EraseLeftAt(left) => {
                let pos = map.find_left(&left).position();

                // Erasing the end position is a caller error.
                if !pos.is_end() {
                    let expected_next = next_key(&model.fwd, left);
                    model.remove_left(left);

                    let next = map.erase_left_at(pos);
                    assert_eq!(
                        map.cursor(next).get().copied(),
                        expected_next,
                        "FinalOp #{op_id}: {final_op:?}"
                    );
                } else {
                    assert!(!model.fwd.contains_key(&left));
                }
            }

            FinalOp::EraseRightAt(right) => {
                let pos = map.find_right(&right).position();

                if !pos.is_end() {
                    let expected_next = next_key(&model.rev, right);
                    model.remove_right(right);

                    let next = map.erase_right_at(pos);
                    assert_eq!(
                        map.cursor(next).get().copied(),
                        expected_next,
                        "FinalOp #{op_id}: {final_op:?}"
                    );
                } else {
                    assert!(!model.rev.contains_key(&right));
                }
            }

            FinalOp::AtLeftOrDefault(left) => {
                let from_model = match model.fwd.get(&left) {
                    Some(&right) => right,
                    None => {
                        model.remove_right(u32::default());
                        model.insert(left, u32::default());
                        u32::default()
                    }
                };

                let from_map = *map.at_left_or_default(left);
                assert_eq!(from_model, from_map, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::AtRightOrDefault(right) => {
                let from_model = match model.rev.get(&right) {
                    Some(&left) => left,
                    None => {
                        model.remove_left(u32::default());
                        model.insert(u32::default(), right);
                        u32::default()
                    }
                };

                let from_map = *map.at_right_or_default(right);
                assert_eq!(from_model, from_map, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::LowerBoundLeft(left) => {
                let from_model = first_from(&model.fwd, left);
                let from_map = map.lower_bound_left(&left).get().copied();

                assert_eq!(from_model, from_map, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::UpperBoundLeft(left) => {
                let from_model = next_key(&model.fwd, left);
                let from_map = map.upper_bound_left(&left).get().copied();

                assert_eq!(from_model, from_map, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::LowerBoundRight(right) => {
                let from_model = first_from(&model.rev, right);
                let from_map = map.lower_bound_right(&right).get().copied();

                assert_eq!(from_model, from_map, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::UpperBoundRight(right) => {
                let from_model = next_key(&model.rev, right);
                let from_map = map.upper_bound_right(&right).get().copied();

                assert_eq!(from_model, from_map, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Clone => {
                let copy = map.clone();
                copy.assert_invariants();
                assert!(copy == map, "FinalOp #{op_id}: {final_op:?}");

                map = copy;
                for (pos, left, _) in &mut held {
                    *pos = map.find_left(left).position();
                }
            }
        }

        held.retain(|(_, left, right)| model.fwd.get(left) == Some(right));
        for &(pos, left, right) in &held {
            assert_eq!(map.cursor(pos).get(), Some(&left), "FinalOp #{op_id}: held {left}");
            assert_eq!(map.cursor(pos.flip()).get(), Some(&right));
        }

        map.assert_invariants();
        assert_eq!(model.fwd.len(), map.len());
        assert!(model.fwd.iter().eq(map.iter_left()));
        assert!(model.rev.iter().eq(map.iter_right()));
    }
}

#[derive(Clone, Debug, Arbitrary)]
pub enum CursorOp {
    // Get is not an operation as it's executed on every loop iteration to check equivalence.
    MovePrev,
    MoveNext,
    PeekNext,
    PeekPrev,
    Flip,
    RemoveCurrent,
}

pub fn cursor_op_strategy() -> impl Strategy<Value = CursorOp> {
    proptest::prop_oneof![
        Just(CursorOp::MovePrev),
        Just(CursorOp::MoveNext),
        Just(CursorOp::PeekNext),
        Just(CursorOp::PeekPrev),
        Just(CursorOp::Flip),
        Just(CursorOp::RemoveCurrent),
    ]
}

#[derive(Clone, Debug)]
pub struct CursorEquivalenceInput {
    pub pairs: Vec<(u32, u32)>,
    pub ops: Vec<CursorOp>,
}

impl<'a> arbitrary::Arbitrary<'a> for CursorEquivalenceInput {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        fn value(u: &mut arbitrary::Unstructured<'_>) -> u32 {
            u32::arbitrary(u).unwrap_or(0)
        }

        fn op(u: &mut arbitrary::Unstructured<'_>) -> CursorOp {
            CursorOp::arbitrary(u).unwrap_or(CursorOp::MoveNext)
        }

        let num_pairs = u8::arbitrary(u)? % 100;
        let num_ops = u16::arbitrary(u)? % 1000;

        let pairs = core::iter::repeat_with(|| (value(u), value(u)))
            .take(num_pairs.into())
            .collect();

        let ops = core::iter::repeat_with(|| op(u))
            .take(num_ops.into())
            .collect();

        Ok(CursorEquivalenceInput { pairs, ops })
    }
}

/// Drives a left-side position through `ops`, checking it against an index into a sorted `Vec`.
///
/// Moves past either end are caller errors and are skipped rather than executed.
pub fn run_cursor_equivalence(pairs: Vec<(u32, u32)>, ops: Vec<CursorOp>) {
    let mut model = Model::default();
    let mut map = TestMap::with_seed(pairs.len() as u64);

    for (left, right) in pairs {
        let inserted = model.insert(left, right);
        assert_eq!(inserted, !map.insert(left, right).is_end());
    }

    let mut vec: Vec<(u32, u32)> = model.fwd.into_iter().collect();

    // `None` is the end position.
    let mut vec_curs = (!vec.is_empty()).then_some(0);
    let mut pos: LeftPosition = map.begin_left().position();

    // Check that the initial states are equivalent.
    assert_eq!(vec_curs.map(|i| &vec[i].0), map.cursor(pos).get());

    for op in ops {
        match op {
            CursorOp::MoveNext => {
                if let Some(i) = vec_curs {
                    vec_curs = (i + 1 < vec.len()).then_some(i + 1);

                    let mut cursor = map.cursor(pos);
                    cursor.move_next();
                    pos = cursor.position();
                }
            }

            CursorOp::MovePrev => {
                let prev = match vec_curs {
                    Some(i) => i.checked_sub(1),
                    None => vec.len().checked_sub(1),
                };

                if let Some(prev) = prev {
                    vec_curs = Some(prev);

                    let mut cursor = map.cursor(pos);
                    cursor.move_prev();
                    pos = cursor.position();
                }
            }

            CursorOp::PeekNext => {
                let v = match vec_curs {
                    Some(i) => vec.get(i + 1).map(|(l, _)| l),
                    None => None,
                };

                assert_eq!(v, map.cursor(pos).peek_next());
            }

            CursorOp::PeekPrev => {
                let v = match vec_curs {
                    Some(i) => i.checked_sub(1).map(|i| &vec[i].0),
                    None => vec.last().map(|(l, _)| l),
                };

                assert_eq!(v, map.cursor(pos).peek_prev());
            }

            CursorOp::Flip => {
                let cursor = map.cursor(pos);
                let flipped = cursor.flip();

                assert_eq!(vec_curs.map(|i| &vec[i].1), flipped.get());
                assert_eq!(flipped.flip(), cursor);
                assert_eq!(flipped.is_end(), cursor.is_end());
            }

            CursorOp::RemoveCurrent => {
                if let Some(i) = vec_curs {
                    vec.remove(i);
                    vec_curs = (i < vec.len()).then_some(i);

                    pos = map.erase_left_at(pos);
                }
            }
        }

        assert_eq!(vec_curs.map(|i| &vec[i].0), map.cursor(pos).get());
    }

    map.assert_invariants();
    assert_eq!(vec.len(), map.len());
}
