use core::{fmt, mem};

use compare::{Compare, Natural};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{
    cursor::{Cursor, Position},
    error::Error,
    iter::Iter,
    record::Records,
    treap::{Rank, Treap},
    Left, NodeId, Right, Side, Threaded, SENTINEL,
};

/// An ordered one-to-one map between values of `L` and values of `R`.
///
/// Every left value is associated with exactly one right value and vice versa. Both sides are
/// ordered (by `CL` and `CR` respectively) and support lookup, bounds and traversal in expected
/// _O(log(n))_ time. A [`Cursor`] on one side can be flipped to the other half of its pair in
/// _O(1)_.
///
/// Pairs are stored once, in an arena owned by the map, and linked into two treaps: one ordered
/// by left values, one by right values. Both treaps balance a pair with the same random rank.
pub struct BiMap<L, R, CL = Natural<L>, CR = Natural<R>> {
    pub(crate) records: Records<L, R>,
    pub(crate) left: Treap<Left, CL>,
    pub(crate) right: Treap<Right, CR>,
    rng: Xoshiro256PlusPlus,
}

impl<L: Ord, R: Ord> BiMap<L, R> {
    /// Creates an empty map ordered by the natural order of both sides.
    pub fn new() -> Self {
        Self::with_comparators(compare::natural(), compare::natural())
    }

    /// Creates an empty map whose ranks are drawn from a generator seeded with `seed`.
    ///
    /// Two maps built with the same seed and the same sequence of operations have identical
    /// tree shapes.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_comparators_and_seed(compare::natural(), compare::natural(), seed)
    }
}

impl<L, R, CL, CR> BiMap<L, R, CL, CR>
where
    CL: Compare<L>,
    CR: Compare<R>,
{
    /// Creates an empty map ordered by the given comparators.
    pub fn with_comparators(left: CL, right: CR) -> Self {
        Self::from_parts(left, right, Xoshiro256PlusPlus::from_entropy())
    }

    /// Creates an empty map ordered by the given comparators, drawing ranks from a generator
    /// seeded with `seed`.
    pub fn with_comparators_and_seed(left: CL, right: CR, seed: u64) -> Self {
        Self::from_parts(left, right, Xoshiro256PlusPlus::seed_from_u64(seed))
    }

    fn from_parts(left: CL, right: CR, rng: Xoshiro256PlusPlus) -> Self {
        BiMap {
            records: Records::new(),
            left: Treap::new(left),
            right: Treap::new(right),
            rng,
        }
    }

    /// Inserts the pair `(left, right)`.
    ///
    /// If `left` is already present on the left side, or `right` on the right side, the map is
    /// left unchanged and the end position of the left side is returned. Otherwise returns the
    /// position of `left`.
    pub fn insert(&mut self, left: L, right: R) -> Position<Left> {
        // Both checks happen before either tree is touched.
        if self.left.find(&self.records, &left) != SENTINEL
            || self.right.find(&self.records, &right) != SENTINEL
        {
            return Position::new(SENTINEL);
        }

        let rank: Rank = self.rng.gen();
        let node = self.records.alloc(left, right, rank);

        self.left.insert(&mut self.records, node);
        self.right.insert(&mut self.records, node);

        Position::new(node)
    }

    /// Removes the pair at `pos` and returns the position of the next left key.
    ///
    /// `pos` must refer to a pair of this map; erasing the end position is a caller error. Every
    /// other position stays valid.
    pub fn erase_left_at(&mut self, pos: Position<Left>) -> Position<Left> {
        self.erase_at(pos)
    }

    /// Removes the pair at `pos` and returns the position of the next right key.
    ///
    /// See [`erase_left_at`](Self::erase_left_at).
    pub fn erase_right_at(&mut self, pos: Position<Right>) -> Position<Right> {
        self.erase_at(pos)
    }

    /// Removes the pair whose left key is `left`. Returns whether a pair was removed.
    pub fn erase_left(&mut self, left: &L) -> bool {
        self.remove_left(left).is_some()
    }

    /// Removes the pair whose right key is `right`. Returns whether a pair was removed.
    pub fn erase_right(&mut self, right: &R) -> bool {
        self.remove_right(right).is_some()
    }

    /// Removes every pair in `[first, last)` of the left order and returns `last`.
    ///
    /// `last` must be reachable from `first`. Otherwise debug builds panic, and release builds
    /// stop erasing at the end of the side.
    pub fn erase_left_range(
        &mut self,
        first: Position<Left>,
        last: Position<Left>,
    ) -> Position<Left> {
        self.erase_range(first, last)
    }

    /// Removes every pair in `[first, last)` of the right order and returns `last`.
    pub fn erase_right_range(
        &mut self,
        first: Position<Right>,
        last: Position<Right>,
    ) -> Position<Right> {
        self.erase_range(first, last)
    }

    /// Removes the pair whose left key is `left` and returns it.
    pub fn remove_left(&mut self, left: &L) -> Option<(L, R)> {
        let node = self.left.find(&self.records, left);
        (node != SENTINEL).then(|| self.remove_node(node))
    }

    /// Removes the pair whose right key is `right` and returns it.
    pub fn remove_right(&mut self, right: &R) -> Option<(L, R)> {
        let node = self.right.find(&self.records, right);
        (node != SENTINEL).then(|| self.remove_node(node))
    }

    fn erase_at<S: Side>(&mut self, pos: Position<S>) -> Position<S> {
        let node = pos.node();
        debug_assert_ne!(node, SENTINEL, "cannot erase the end position");
        debug_assert!(
            node == SENTINEL || self.records.is_occupied(node),
            "position refers to an erased pair"
        );

        if !self.records.is_occupied(node) {
            return pos;
        }

        let next = <Records<L, R> as Threaded<S>>::next(&self.records, node).unwrap_or(SENTINEL);
        self.remove_node(node);

        Position::new(next)
    }

    fn erase_range<S: Side>(&mut self, first: Position<S>, last: Position<S>) -> Position<S> {
        let mut cur = first;

        while cur != last {
            // Stops at the end, or at an erased pair, when `last` does not follow `first`.
            let valid = !cur.is_end() && self.records.is_occupied(cur.node());
            debug_assert!(valid, "range end is not reachable from its start");

            if !valid {
                break;
            }

            cur = self.erase_at(cur);
        }

        last
    }

    // Unlinks `node` from both trees and releases its slot.
    fn remove_node(&mut self, node: NodeId) -> (L, R) {
        self.left.remove(&mut self.records, node);
        self.right.remove(&mut self.records, node);
        self.records.release(node)
    }

    /// Returns a cursor at `left`, or at the end of the left side if it is absent.
    pub fn find_left(&self, left: &L) -> Cursor<'_, L, R, Left> {
        Cursor::new(&self.records, self.left.find(&self.records, left))
    }

    /// Returns a cursor at `right`, or at the end of the right side if it is absent.
    pub fn find_right(&self, right: &R) -> Cursor<'_, L, R, Right> {
        Cursor::new(&self.records, self.right.find(&self.records, right))
    }

    /// Returns `true` if `left` is present on the left side.
    pub fn contains_left(&self, left: &L) -> bool {
        self.left.find(&self.records, left) != SENTINEL
    }

    /// Returns `true` if `right` is present on the right side.
    pub fn contains_right(&self, right: &R) -> bool {
        self.right.find(&self.records, right) != SENTINEL
    }

    /// Returns the right key paired with `left`, if any.
    pub fn get_left(&self, left: &L) -> Option<&R> {
        self.find_left(left).opposite()
    }

    /// Returns the left key paired with `right`, if any.
    pub fn get_right(&self, right: &R) -> Option<&L> {
        self.find_right(right).opposite()
    }

    /// Returns the right key paired with `left`.
    ///
    /// Fails with [`Error::OutOfRange`] if `left` is absent.
    pub fn at_left(&self, left: &L) -> Result<&R, Error> {
        self.get_left(left).ok_or(Error::OutOfRange)
    }

    /// Returns the left key paired with `right`.
    ///
    /// Fails with [`Error::OutOfRange`] if `right` is absent.
    pub fn at_right(&self, right: &R) -> Result<&L, Error> {
        self.get_right(right).ok_or(Error::OutOfRange)
    }

    /// Returns the right key paired with `left`, inserting `(left, R::default())` if `left` is
    /// absent.
    ///
    /// A default right key can belong to one pair only, so before inserting, any pair whose right
    /// key is `R::default()` is removed.
    pub fn at_left_or_default(&mut self, left: L) -> &R
    where
        R: Default,
    {
        let mut node = self.left.find(&self.records, &left);

        if node == SENTINEL {
            self.erase_right(&R::default());
            node = self.insert(left, R::default()).node();
        }

        &self.records.pair(node).1
    }

    /// Returns the left key paired with `right`, inserting `(L::default(), right)` if `right` is
    /// absent.
    ///
    /// Any pair whose left key is `L::default()` is removed before inserting.
    pub fn at_right_or_default(&mut self, right: R) -> &L
    where
        L: Default,
    {
        let mut node = self.right.find(&self.records, &right);

        if node == SENTINEL {
            self.erase_left(&L::default());
            node = self.insert(L::default(), right).node();
        }

        &self.records.pair(node).0
    }

    /// Returns a cursor at the first left key not less than `left`.
    pub fn lower_bound_left(&self, left: &L) -> Cursor<'_, L, R, Left> {
        Cursor::new(&self.records, self.left.lower_bound(&self.records, left))
    }

    /// Returns a cursor at the first left key greater than `left`.
    pub fn upper_bound_left(&self, left: &L) -> Cursor<'_, L, R, Left> {
        Cursor::new(&self.records, self.left.upper_bound(&self.records, left))
    }

    /// Returns a cursor at the first right key not less than `right`.
    pub fn lower_bound_right(&self, right: &R) -> Cursor<'_, L, R, Right> {
        Cursor::new(&self.records, self.right.lower_bound(&self.records, right))
    }

    /// Returns a cursor at the first right key greater than `right`.
    pub fn upper_bound_right(&self, right: &R) -> Cursor<'_, L, R, Right> {
        Cursor::new(&self.records, self.right.upper_bound(&self.records, right))
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self)
    where
        L: fmt::Debug,
        R: fmt::Debug,
    {
        self.left.assert_invariants(&self.records);
        self.right.assert_invariants(&self.records);

        let len = self.len();
        assert_eq!(len, self.right.len(&self.records), "trees disagree on the pair count");
        assert_eq!(self.records.occupied().count(), len, "unlinked record in the arena");

        // Each record is found from both sides at its own slot, so no key is shared by two pairs.
        for node in self.records.occupied() {
            let (left, right) = self.records.pair(node);
            assert_eq!(self.left.find(&self.records, left), node, "left key {left:?}");
            assert_eq!(self.right.find(&self.records, right), node, "right key {right:?}");
        }
    }
}

impl<L, R, CL, CR> BiMap<L, R, CL, CR> {
    /// Returns the number of pairs in the map.
    pub fn len(&self) -> usize {
        self.left.len(&self.records)
    }

    /// Returns `true` if the map contains no pairs.
    pub fn is_empty(&self) -> bool {
        self.left.root(&self.records).is_none()
    }

    /// Returns a cursor at the smallest left key, or at the end if the map is empty.
    pub fn begin_left(&self) -> Cursor<'_, L, R, Left> {
        Cursor::new(&self.records, self.left.first(&self.records))
    }

    /// Returns a cursor at the end of the left side.
    pub fn end_left(&self) -> Cursor<'_, L, R, Left> {
        Cursor::new(&self.records, SENTINEL)
    }

    /// Returns a cursor at the smallest right key, or at the end if the map is empty.
    pub fn begin_right(&self) -> Cursor<'_, L, R, Right> {
        Cursor::new(&self.records, self.right.first(&self.records))
    }

    /// Returns a cursor at the end of the right side.
    pub fn end_right(&self) -> Cursor<'_, L, R, Right> {
        Cursor::new(&self.records, SENTINEL)
    }

    /// Returns a cursor at `pos`.
    pub fn cursor<S: Side>(&self, pos: Position<S>) -> Cursor<'_, L, R, S> {
        debug_assert!(
            pos.is_end() || self.records.is_occupied(pos.node()),
            "position refers to an erased pair"
        );

        Cursor::new(&self.records, pos.node())
    }

    /// Returns an iterator over the pairs in left order.
    pub fn iter(&self) -> Iter<'_, L, R, Left> {
        self.iter_left()
    }

    /// Returns an iterator over `(left, right)` pairs in left order.
    pub fn iter_left(&self) -> Iter<'_, L, R, Left> {
        Iter::new(&self.records)
    }

    /// Returns an iterator over `(right, left)` pairs in right order.
    pub fn iter_right(&self) -> Iter<'_, L, R, Right> {
        Iter::new(&self.records)
    }

    /// Removes every pair.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Exchanges the contents of two maps in _O(1)_.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }
}

impl<L: Ord, R: Ord> Default for BiMap<L, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L, R, CL, CR> Clone for BiMap<L, R, CL, CR>
where
    L: Clone,
    R: Clone,
    CL: Compare<L> + Clone,
    CR: Compare<R> + Clone,
{
    /// Copies every pair into a new arena. The copy draws fresh ranks from a jumped generator
    /// stream, so its trees are shaped independently of the original's.
    fn clone(&self) -> Self {
        let mut rng = self.rng.clone();
        rng.jump();

        let mut copy = Self::from_parts(
            self.left.comparator().clone(),
            self.right.comparator().clone(),
            rng,
        );

        for (left, right) in self.iter() {
            copy.insert(left.clone(), right.clone());
        }

        copy
    }
}

impl<L, R, CL, CR> PartialEq for BiMap<L, R, CL, CR>
where
    L: PartialEq,
    R: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|((l1, r1), (l2, r2))| l1 == l2 && r1 == r2)
    }
}

impl<L: Eq, R: Eq, CL, CR> Eq for BiMap<L, R, CL, CR> {}

impl<L, R, CL, CR> fmt::Debug for BiMap<L, R, CL, CR>
where
    L: fmt::Debug,
    R: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<L, R, CL, CR> Extend<(L, R)> for BiMap<L, R, CL, CR>
where
    CL: Compare<L>,
    CR: Compare<R>,
{
    /// Inserts every pair in order, skipping pairs that collide with an existing key.
    fn extend<I: IntoIterator<Item = (L, R)>>(&mut self, iter: I) {
        for (left, right) in iter {
            self.insert(left, right);
        }
    }
}

impl<L: Ord, R: Ord> FromIterator<(L, R)> for BiMap<L, R> {
    fn from_iter<I: IntoIterator<Item = (L, R)>>(iter: I) -> Self {
        let mut map = BiMap::new();
        map.extend(iter);
        map
    }
}

impl<'a, L, R, CL, CR> IntoIterator for &'a BiMap<L, R, CL, CR> {
    type Item = (&'a L, &'a R);
    type IntoIter = Iter<'a, L, R, Left>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
