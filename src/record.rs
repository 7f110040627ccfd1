use crate::{
    treap::{Keyed, Rank},
    Links, NodeId, Side, Threaded, SENTINEL,
};

/// One `(left, right)` association, linked into both trees at once.
///
/// Both link sets are balanced by the same `rank`.
#[derive(Clone, Debug)]
struct Record<L, R> {
    links: [Links; 2],
    rank: Rank,
    // `None` for the sentinel and for vacant slots.
    pair: Option<(L, R)>,
}

impl<L, R> Record<L, R> {
    const fn vacant() -> Self {
        Record {
            links: [Links::new(), Links::new()],
            rank: 0,
            pair: None,
        }
    }
}

/// The arena owning every pair record of a map.
///
/// Slot 0 is the sentinel shared by both trees. Released slots are recycled.
#[derive(Clone, Debug)]
pub(crate) struct Records<L, R> {
    slots: Vec<Record<L, R>>,
    free: Vec<NodeId>,
}

impl<L, R> Records<L, R> {
    pub(crate) fn new() -> Self {
        Records {
            slots: vec![Record::vacant()],
            free: Vec::new(),
        }
    }

    /// Stores a new, unlinked record and returns its slot.
    pub(crate) fn alloc(&mut self, left: L, right: R, rank: Rank) -> NodeId {
        let record = Record {
            links: [Links::new(), Links::new()],
            rank,
            pair: Some((left, right)),
        };

        match self.free.pop() {
            Some(node) => {
                debug_assert!(self.slots[node.index()].pair.is_none());
                self.slots[node.index()] = record;
                node
            }
            None => {
                self.slots.push(record);
                NodeId::new(self.slots.len() - 1)
            }
        }
    }

    /// Takes the pair out of `node` and recycles the slot.
    ///
    /// The record must already be unlinked from both trees.
    pub(crate) fn release(&mut self, node: NodeId) -> (L, R) {
        assert_ne!(node, SENTINEL, "cannot release the sentinel");

        let pair = self.slots[node.index()]
            .pair
            .take()
            .expect("released slot must be occupied");
        self.free.push(node);
        pair
    }

    /// Returns the pair stored at `node`, or `None` for the sentinel.
    #[inline]
    pub(crate) fn get(&self, node: NodeId) -> Option<&(L, R)> {
        self.slots.get(node.index())?.pair.as_ref()
    }

    /// Returns the pair stored at `node`, which must be occupied.
    #[inline]
    pub(crate) fn pair(&self, node: NodeId) -> &(L, R) {
        self.get(node).expect("slot must hold a pair")
    }

    #[inline]
    pub(crate) fn is_occupied(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    #[inline]
    pub(crate) fn rank_of(&self, node: NodeId) -> Rank {
        self.slots[node.index()].rank
    }

    /// Returns the slots currently holding a pair, in slot order.
    pub(crate) fn occupied(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, record)| record.pair.is_some())
            .map(|(index, _)| NodeId::new(index))
    }

    /// Drops every pair and resets both sentinels.
    pub(crate) fn clear(&mut self) {
        self.slots.truncate(1);
        self.slots[SENTINEL.index()] = Record::vacant();
        self.free.clear();
    }
}

impl<L, R, S: Side> Threaded<S> for Records<L, R> {
    #[inline]
    fn links(&self, node: NodeId) -> &Links {
        &self.slots[node.index()].links[S::INDEX]
    }

    #[inline]
    fn links_mut(&mut self, node: NodeId) -> &mut Links {
        &mut self.slots[node.index()].links[S::INDEX]
    }
}

impl<L, R, S: Side> Keyed<S> for Records<L, R> {
    type Key = S::Key<L, R>;

    #[inline]
    fn key(&self, node: NodeId) -> &Self::Key {
        S::key(self.pair(node))
    }

    #[inline]
    fn rank(&self, node: NodeId) -> Rank {
        self.rank_of(node)
    }
}
