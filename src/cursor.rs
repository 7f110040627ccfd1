use core::{fmt, hash, marker::PhantomData, ptr};

use crate::{record::Records, Left, NodeId, Right, Side, Threaded, SENTINEL};

/// A position on one side of a [`BiMap`](crate::BiMap) that does not borrow the map.
///
/// A position refers either to a pair or to the "end" of its side, which follows the last pair.
/// Positions are what the mutating operations of the map take and return; turn one back into a
/// [`Cursor`] with [`BiMap::cursor`](crate::BiMap::cursor).
///
/// A position stays valid until the pair it refers to is erased. Using it after that, or with a
/// map other than the one that produced it, is a caller error.
pub struct Position<S> {
    node: NodeId,
    _side: PhantomData<fn() -> S>,
}

/// A [`Position`] among the left keys of a map.
pub type LeftPosition = Position<Left>;

/// A [`Position`] among the right keys of a map.
pub type RightPosition = Position<Right>;

impl<S> Position<S> {
    #[inline]
    pub(crate) const fn new(node: NodeId) -> Self {
        Position {
            node,
            _side: PhantomData,
        }
    }

    #[inline]
    pub(crate) const fn node(self) -> NodeId {
        self.node
    }

    /// Returns `true` if this is the end position of its side.
    #[inline]
    pub fn is_end(self) -> bool {
        self.node == SENTINEL
    }
}

impl<S: Side> Position<S> {
    /// Returns the position of the other half of the same pair.
    ///
    /// The end position of one side flips to the end position of the other side. This never
    /// consults either tree.
    #[inline]
    pub fn flip(self) -> Position<S::Opposite> {
        Position::new(self.node)
    }
}

impl<S> Clone for Position<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Position<S> {}

impl<S> PartialEq for Position<S> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<S> Eq for Position<S> {}

impl<S> hash::Hash for Position<S> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.node.hash(state);
    }
}

impl<S> fmt::Debug for Position<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_end() {
            f.write_str("Position(end)")
        } else {
            f.debug_tuple("Position").field(&self.node.index()).finish()
        }
    }
}

/// A cursor over one side of a [`BiMap`](crate::BiMap).
///
/// A cursor points either to a pair or to the "end" of its side. Moving past either end, and
/// moving back from the first pair, are caller errors: debug builds panic, release builds leave
/// the cursor where it is.
pub struct Cursor<'a, L, R, S> {
    records: &'a Records<L, R>,
    node: NodeId,
    _side: PhantomData<fn() -> S>,
}

/// A [`Cursor`] over the left keys of a map.
pub type LeftCursor<'a, L, R> = Cursor<'a, L, R, Left>;

/// A [`Cursor`] over the right keys of a map.
pub type RightCursor<'a, L, R> = Cursor<'a, L, R, Right>;

impl<'a, L, R, S: Side> Cursor<'a, L, R, S> {
    #[inline]
    pub(crate) fn new(records: &'a Records<L, R>, node: NodeId) -> Self {
        Cursor {
            records,
            node,
            _side: PhantomData,
        }
    }

    /// Returns the key on this cursor's side, or `None` at the end.
    #[inline]
    pub fn get(&self) -> Option<&'a S::Key<L, R>> {
        self.records.get(self.node).map(|pair| S::key(pair))
    }

    /// Returns the key paired with the current one, or `None` at the end.
    ///
    /// This is equivalent to `self.flip().get()`.
    #[inline]
    pub fn opposite(&self) -> Option<&'a <S::Opposite as Side>::Key<L, R>> {
        self.records
            .get(self.node)
            .map(|pair| <S::Opposite as Side>::key(pair))
    }

    /// Returns both halves of the current pair, or `None` at the end.
    #[inline]
    pub fn pair(&self) -> Option<(&'a L, &'a R)> {
        self.records.get(self.node).map(|(left, right)| (left, right))
    }

    /// Returns `true` if the cursor is at the end of its side.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.node == SENTINEL
    }

    /// Returns a position equal to this cursor that does not borrow the map.
    #[inline]
    pub fn position(&self) -> Position<S> {
        Position::new(self.node)
    }

    /// Returns a cursor at the other half of the current pair.
    ///
    /// Flipping the end of one side yields the end of the other side.
    #[inline]
    pub fn flip(&self) -> Cursor<'a, L, R, S::Opposite> {
        Cursor::new(self.records, self.node)
    }

    /// Moves the cursor to the next key in order, or to the end after the last key.
    ///
    /// The cursor must not be at the end.
    pub fn move_next(&mut self) {
        let next = <Records<L, R> as Threaded<S>>::next(self.records, self.node);
        debug_assert!(next.is_some(), "cannot advance a cursor past the end");

        if let Some(next) = next {
            self.node = next;
        }
    }

    /// Moves the cursor to the previous key in order. From the end, this moves to the last key.
    ///
    /// The cursor must not be at the first key.
    pub fn move_prev(&mut self) {
        let prev = <Records<L, R> as Threaded<S>>::prev(self.records, self.node);
        debug_assert!(prev.is_some(), "cannot move a cursor before the first key");

        if let Some(prev) = prev {
            self.node = prev;
        }
    }

    /// Returns the next key without moving the cursor.
    ///
    /// Returns `None` if the cursor is at the last key or at the end.
    pub fn peek_next(&self) -> Option<&'a S::Key<L, R>> {
        let next = <Records<L, R> as Threaded<S>>::next(self.records, self.node)?;
        self.records.get(next).map(|pair| S::key(pair))
    }

    /// Returns the previous key without moving the cursor.
    ///
    /// Returns `None` if the cursor is at the first key. At the end, this is the last key.
    pub fn peek_prev(&self) -> Option<&'a S::Key<L, R>> {
        let prev = <Records<L, R> as Threaded<S>>::prev(self.records, self.node)?;
        self.records.get(prev).map(|pair| S::key(pair))
    }
}

impl<L, R, S> Clone for Cursor<'_, L, R, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L, R, S> Copy for Cursor<'_, L, R, S> {}

impl<L, R, S> PartialEq for Cursor<'_, L, R, S> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.records, other.records) && self.node == other.node
    }
}

impl<L, R, S> Eq for Cursor<'_, L, R, S> {}

impl<L, R, S> PartialEq<Position<S>> for Cursor<'_, L, R, S> {
    fn eq(&self, other: &Position<S>) -> bool {
        self.node == other.node
    }
}

impl<L, R, S> fmt::Debug for Cursor<'_, L, R, S>
where
    S: Side,
    S::Key<L, R>: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{BiMap, LeftPosition, RightPosition};

    fn sample() -> BiMap<u32, char> {
        let mut map = BiMap::with_seed(7);
        for (left, right) in [(3, 'c'), (1, 'z'), (2, 'a'), (5, 'm')] {
            map.insert(left, right);
        }
        map
    }

    #[test]
    fn walk_both_directions() {
        let map = sample();

        let mut cur = map.begin_left();
        let mut seen = Vec::new();
        while !cur.is_end() {
            seen.push(*cur.get().unwrap());
            cur.move_next();
        }
        assert_eq!(seen, [1, 2, 3, 5]);
        assert_eq!(cur, map.end_left());

        let mut seen = Vec::new();
        while cur != map.begin_left() {
            cur.move_prev();
            seen.push(*cur.get().unwrap());
        }
        assert_eq!(seen, [5, 3, 2, 1]);
    }

    #[test]
    fn flip_is_an_involution() {
        let map = sample();

        let mut cur = map.begin_left();
        while !cur.is_end() {
            let flipped = cur.flip();
            assert_eq!(flipped.get(), cur.opposite());
            assert_eq!(flipped.opposite(), cur.get());
            assert_eq!(flipped.flip(), cur);
            cur.move_next();
        }

        assert_eq!(map.end_left().flip(), map.end_right());
        assert_eq!(map.end_right().flip(), map.end_left());
        assert_eq!(map.end_left().flip().get(), None);
    }

    #[test]
    fn flip_changes_order() {
        let map = sample();

        // 1 <-> 'z' is first on the left and last on the right.
        let first_left = map.begin_left();
        let flipped = first_left.flip();
        assert_eq!(flipped.get(), Some(&'z'));
        assert_eq!(flipped.peek_next(), None);
        assert_eq!(flipped.peek_prev(), Some(&'m'));

        let mut next = flipped;
        next.move_next();
        assert_eq!(next, map.end_right());
    }

    #[test]
    fn peek() {
        let map = sample();

        let begin = map.begin_right();
        assert_eq!(begin.get(), Some(&'a'));
        assert_eq!(begin.peek_prev(), None);
        assert_eq!(begin.peek_next(), Some(&'c'));
        assert_eq!(begin.pair(), Some((&2, &'a')));

        let end = map.end_right();
        assert_eq!(end.get(), None);
        assert_eq!(end.pair(), None);
        assert_eq!(end.peek_prev(), Some(&'z'));
        assert_eq!(end.peek_next(), None);
    }

    #[test]
    fn positions_flip_without_the_map() {
        let mut map = sample();

        let pos: LeftPosition = map.insert(4, 'q');
        let flipped: RightPosition = pos.flip();
        assert_eq!(flipped.flip(), pos);
        assert_eq!(map.cursor(flipped).get(), Some(&'q'));
        assert_eq!(map.cursor(pos).get(), Some(&4));

        let end = map.end_left().position();
        assert!(end.is_end());
        assert!(end.flip().is_end());
        assert_eq!(end.flip(), map.end_right().position());
    }

    #[test]
    fn cursors_of_different_maps_differ() {
        let a = sample();
        let b = sample();

        assert_ne!(a.end_left(), b.end_left());
        assert_eq!(a.end_left(), b.end_left().position());
    }

    #[test]
    fn debug_output() {
        let map = sample();

        assert_eq!(format!("{:?}", map.begin_left()), "Cursor(Some(1))");
        assert_eq!(format!("{:?}", map.end_right()), "Cursor(None)");
        assert_eq!(format!("{:?}", map.end_right().position()), "Position(end)");
    }
}
