//! A bidirectional ordered map built from two treaps that share one arena of pair records.
//!
//! Every `(left, right)` pair occupies a single arena slot carrying two sets of tree links: one
//! for the tree ordered by left keys and one for the tree ordered by right keys. Both trees are
//! balanced by the same random rank, drawn once when the pair is inserted, so the expected depth
//! of either tree is _O(log(n))_.
//
// Layout conventions:
// - Slot 0 of the arena is the sentinel of both trees. In each tree its left child is the real
//   root, so the in-order successor of the maximum element is the sentinel ("end"), and the
//   predecessor of the sentinel is the maximum.
// - A node's subtree size counts the node itself. The sentinel's size is thus `len + 1`.
// - Flipping a position from one side to the other keeps the slot index and swaps the link set.
//   This holds for the sentinel too, which is why both sentinels share slot 0.

use core::mem;

pub use compare::{natural, Compare, Natural};

pub use crate::{
    cursor::{Cursor, LeftCursor, LeftPosition, Position, RightCursor, RightPosition},
    error::Error,
    iter::Iter,
    map::BiMap,
};

mod cursor;
mod debug;
mod error;
mod iter;
mod map;
mod record;
mod treap;

#[cfg(any(test, feature = "model"))]
pub mod model;


mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Left {}
    impl Sealed for super::Right {}
}

/// One of the two key domains of a [`BiMap`].
///
/// This trait is sealed; [`Left`] and [`Right`] are its only implementors.
pub trait Side: sealed::Sealed + 'static {
    /// The other side.
    type Opposite: Side;

    /// The key type of this side in a `BiMap<L, R>`.
    type Key<L, R>;

    #[doc(hidden)]
    const INDEX: usize;

    #[doc(hidden)]
    fn key<L, R>(pair: &(L, R)) -> &Self::Key<L, R>;
}

/// The side of a [`BiMap`] keyed by `L`.
#[derive(Debug)]
pub enum Left {}

/// The side of a [`BiMap`] keyed by `R`.
#[derive(Debug)]
pub enum Right {}

impl Side for Left {
    type Opposite = Right;
    type Key<L, R> = L;

    const INDEX: usize = 0;

    #[inline]
    fn key<L, R>(pair: &(L, R)) -> &L {
        &pair.0
    }
}

impl Side for Right {
    type Opposite = Left;
    type Key<L, R> = R;

    const INDEX: usize = 1;

    #[inline]
    fn key<L, R>(pair: &(L, R)) -> &R {
        &pair.1
    }
}

/// Index of a slot in the pair-record arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
    #[inline]
    pub(crate) const fn new(index: usize) -> NodeId {
        NodeId(index)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0
    }
}

/// The slot holding the dummy root of both trees.
pub(crate) const SENTINEL: NodeId = NodeId(0);

pub(crate) type Link = Option<NodeId>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

/// The links of a node in one binary tree.
#[derive(Clone, Debug)]
pub(crate) struct Links {
    parent: Link,
    children: [Link; 2],
    size: usize,
}

impl Links {
    #[must_use]
    pub(crate) const fn new() -> Self {
        Links {
            parent: None,
            children: [None; 2],
            size: 1,
        }
    }

    #[inline]
    pub(crate) fn parent(&self) -> Link {
        self.parent
    }

    #[inline]
    pub(crate) fn child(&self, dir: Dir) -> Link {
        self.children[dir as usize]
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn set_parent(&mut self, parent: Link) -> Link {
        mem::replace(&mut self.parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link) -> Link {
        mem::replace(&mut self.children[dir as usize], child)
    }
}

/// A store of nodes that take part in one ordered binary tree, addressed by [`NodeId`].
///
/// `T` selects which set of links the tree threads through, so one store can host several trees
/// over the same population of nodes.
///
/// None of the navigation methods allocate or fail. Asking for the successor of the sentinel, or
/// the predecessor of the minimum element, is a caller error; those calls return `None`.
pub(crate) trait Threaded<T> {
    fn links(&self, node: NodeId) -> &Links;

    fn links_mut(&mut self, node: NodeId) -> &mut Links;

    #[inline]
    fn parent(&self, node: NodeId) -> Link {
        self.links(node).parent()
    }

    #[inline]
    fn child(&self, node: NodeId, dir: Dir) -> Link {
        self.links(node).child(dir)
    }

    #[inline]
    fn left(&self, node: NodeId) -> Link {
        self.child(node, Dir::Left)
    }

    #[inline]
    fn right(&self, node: NodeId) -> Link {
        self.child(node, Dir::Right)
    }

    /// Returns the number of nodes in the subtree rooted at `link`.
    #[inline]
    fn subtree_size(&self, link: Link) -> usize {
        link.map_or(0, |node| self.links(node).size())
    }

    /// Recomputes the cached size of `node` from its children.
    fn update_size(&mut self, node: NodeId) {
        let size = 1 + self.subtree_size(self.left(node)) + self.subtree_size(self.right(node));
        self.links_mut(node).size = size;
    }

    /// Attaches `child` under `node`, fixing up the parent link and the size of `node`.
    ///
    /// The previous occupant of the slot, if any, is not detached.
    fn set_child(&mut self, node: NodeId, dir: Dir, child: Link) {
        self.links_mut(node).set_child(dir, child);

        if let Some(child) = child {
            self.links_mut(child).set_parent(Some(node));
        }

        self.update_size(node);
    }

    #[inline]
    fn set_left(&mut self, node: NodeId, child: Link) {
        self.set_child(node, Dir::Left, child);
    }

    #[inline]
    fn set_right(&mut self, node: NodeId, child: Link) {
        self.set_child(node, Dir::Right, child);
    }

    /// Detaches `link` from its parent, if it has one.
    ///
    /// Only the former parent's size is refreshed; its ancestors are left stale until they are
    /// reattached.
    fn unlink(&mut self, link: Link) {
        let Some(node) = link else {
            return;
        };

        let Some(parent) = self.links_mut(node).set_parent(None) else {
            return;
        };

        let dir = if self.left(parent) == Some(node) {
            Dir::Left
        } else {
            Dir::Right
        };

        self.links_mut(parent).set_child(dir, None);
        self.update_size(parent);
    }

    /// Returns the minimum node of the subtree rooted at `node`.
    fn min(&self, mut node: NodeId) -> NodeId {
        while let Some(left) = self.left(node) {
            node = left;
        }

        node
    }

    /// Returns the maximum node of the subtree rooted at `node`.
    fn max(&self, mut node: NodeId) -> NodeId {
        while let Some(right) = self.right(node) {
            node = right;
        }

        node
    }

    /// Returns the in-order successor of `node`.
    fn next(&self, node: NodeId) -> Link {
        if let Some(right) = self.right(node) {
            return Some(self.min(right));
        }

        // Ascend until arriving from a left child.
        let mut cur = node;
        loop {
            let parent = self.parent(cur)?;

            if self.left(parent) == Some(cur) {
                return Some(parent);
            }

            cur = parent;
        }
    }

    /// Returns the in-order predecessor of `node`.
    fn prev(&self, node: NodeId) -> Link {
        if let Some(left) = self.left(node) {
            return Some(self.max(left));
        }

        // Ascend until arriving from a right child.
        let mut cur = node;
        loop {
            let parent = self.parent(cur)?;

            if self.right(parent) == Some(cur) {
                return Some(parent);
            }

            cur = parent;
        }
    }
}

#[cfg(test)]
mod node_tests {
    use super::*;

    struct Nodes(Vec<Links>);

    impl Nodes {
        fn with_len(len: usize) -> Nodes {
            Nodes(vec![Links::new(); len])
        }
    }

    impl Threaded<()> for Nodes {
        fn links(&self, node: NodeId) -> &Links {
            &self.0[node.index()]
        }

        fn links_mut(&mut self, node: NodeId) -> &mut Links {
            &mut self.0[node.index()]
        }
    }

    fn id(index: usize) -> NodeId {
        NodeId::new(index)
    }

    // Builds, under sentinel 0, the tree
    //
    //        4
    //      /   \
    //     2     6
    //    / \   /
    //   1   3 5
    fn sample() -> Nodes {
        let mut nodes = Nodes::with_len(7);

        nodes.set_left(id(2), Some(id(1)));
        nodes.set_right(id(2), Some(id(3)));
        nodes.set_left(id(6), Some(id(5)));
        nodes.set_left(id(4), Some(id(2)));
        nodes.set_right(id(4), Some(id(6)));
        nodes.set_left(SENTINEL, Some(id(4)));

        nodes
    }

    #[test]
    fn sizes_follow_attachment() {
        let nodes = sample();

        assert_eq!(nodes.links(SENTINEL).size(), 7);
        assert_eq!(nodes.links(id(4)).size(), 6);
        assert_eq!(nodes.links(id(2)).size(), 3);
        assert_eq!(nodes.links(id(6)).size(), 2);
        assert_eq!(nodes.links(id(5)).size(), 1);
        assert_eq!(nodes.parent(id(5)), Some(id(6)));
    }

    #[test]
    fn in_order_walk() {
        let nodes = sample();

        let mut forward = Vec::new();
        let mut cur = nodes.min(SENTINEL);
        while cur != SENTINEL {
            forward.push(cur.index());
            cur = nodes.next(cur).expect("real nodes have a successor");
        }
        assert_eq!(forward, [1, 2, 3, 4, 5, 6]);

        let mut backward = Vec::new();
        let mut cur = SENTINEL;
        while let Some(prev) = nodes.prev(cur) {
            backward.push(prev.index());
            cur = prev;
        }
        assert_eq!(backward, [6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn ends_have_no_neighbors() {
        let nodes = sample();

        assert_eq!(nodes.next(SENTINEL), None);
        assert_eq!(nodes.prev(id(1)), None);
        assert_eq!(nodes.max(id(4)), id(6));
        assert_eq!(nodes.min(id(6)), id(5));
    }

    #[test]
    fn unlink_refreshes_former_parent() {
        let mut nodes = sample();

        nodes.unlink(Some(id(2)));

        assert_eq!(nodes.parent(id(2)), None);
        assert_eq!(nodes.left(id(4)), None);
        assert_eq!(nodes.links(id(4)).size(), 3);
        // The sentinel is an ancestor of the detached subtree and is not refreshed.
        assert_eq!(nodes.links(SENTINEL).size(), 7);

        nodes.update_size(SENTINEL);
        assert_eq!(nodes.links(SENTINEL).size(), 4);

        // Unlinking a root or nothing at all is a no-op.
        nodes.unlink(Some(id(2)));
        nodes.unlink(None);
        assert_eq!(nodes.links(id(2)).size(), 3);
    }

    #[test]
    fn empty_tree_sentinel() {
        let nodes = Nodes::with_len(1);

        assert_eq!(nodes.min(SENTINEL), SENTINEL);
        assert_eq!(nodes.next(SENTINEL), None);
        assert_eq!(nodes.prev(SENTINEL), None);
        assert_eq!(nodes.links(SENTINEL).size(), 1);
    }
}
