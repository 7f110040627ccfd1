use core::{fmt, iter::FusedIterator, marker::PhantomData};

use crate::{record::Records, NodeId, Side, Threaded, SENTINEL};

/// An iterator over the pairs of a [`BiMap`](crate::BiMap), ordered by the keys of side `S`.
///
/// Each item is `(key on S, key on the opposite side)`.
pub struct Iter<'a, L, R, S> {
    records: &'a Records<L, R>,

    // Next node to yield from the front.
    front: NodeId,
    // One past the next node to yield from the back.
    back: NodeId,

    len: usize,
    _side: PhantomData<fn() -> S>,
}

impl<'a, L, R, S: Side> Iter<'a, L, R, S> {
    pub(crate) fn new(records: &'a Records<L, R>) -> Self {
        Iter {
            records,
            front: <Records<L, R> as Threaded<S>>::min(records, SENTINEL),
            back: SENTINEL,
            len: <Records<L, R> as Threaded<S>>::links(records, SENTINEL).size() - 1,
            _side: PhantomData,
        }
    }

    fn item(&self, node: NodeId) -> (&'a S::Key<L, R>, &'a <S::Opposite as Side>::Key<L, R>) {
        let records: &'a Records<L, R> = self.records;
        let pair = records.pair(node);
        (S::key(pair), <S::Opposite as Side>::key(pair))
    }
}

impl<'a, L, R, S: Side> Iterator for Iter<'a, L, R, S> {
    type Item = (&'a S::Key<L, R>, &'a <S::Opposite as Side>::Key<L, R>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let node = self.front;
        self.front = <Records<L, R> as Threaded<S>>::next(self.records, node).unwrap_or(SENTINEL);
        self.len -= 1;

        Some(self.item(node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<L, R, S: Side> DoubleEndedIterator for Iter<'_, L, R, S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let node = <Records<L, R> as Threaded<S>>::prev(self.records, self.back)
            .expect("a non-empty range has a predecessor of its back bound");
        self.back = node;
        self.len -= 1;

        Some(self.item(node))
    }
}

impl<L, R, S: Side> ExactSizeIterator for Iter<'_, L, R, S> {}

impl<L, R, S: Side> FusedIterator for Iter<'_, L, R, S> {}

impl<L, R, S> Clone for Iter<'_, L, R, S> {
    fn clone(&self) -> Self {
        Iter {
            records: self.records,
            front: self.front,
            back: self.back,
            len: self.len,
            _side: PhantomData,
        }
    }
}

impl<L, R, S> fmt::Debug for Iter<'_, L, R, S>
where
    L: fmt::Debug,
    R: fmt::Debug,
    S: Side,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        let mut node = self.front;

        for _ in 0..self.len {
            list.entry(self.records.pair(node));
            node = <Records<L, R> as Threaded<S>>::next(self.records, node).unwrap_or(SENTINEL);
        }

        list.finish()
    }
}
