//! A treap threaded through a [`Threaded`] store, balanced by split and merge.

use core::{cmp::Ordering, fmt, marker::PhantomData};

use compare::Compare;

use crate::{Dir, Link, NodeId, Threaded, SENTINEL};

/// Random priority of a node. Lower ranks sit closer to the root.
pub(crate) type Rank = u64;

/// A [`Threaded`] store whose nodes carry an immutable key and rank.
pub(crate) trait Keyed<T>: Threaded<T> {
    type Key;

    /// Returns the key of `node`.
    ///
    /// `node` must not be the sentinel.
    fn key(&self, node: NodeId) -> &Self::Key;

    fn rank(&self, node: NodeId) -> Rank;
}

/// The result of splitting a subtree around a key.
#[derive(Debug, Default)]
struct Split {
    less: Link,
    equal: Link,
    greater: Link,
}

// The place a search for a key ended: `child` is the matching node, or `None` if the key would be
// inserted as the `dir` child of `parent`.
#[derive(Copy, Clone, Debug)]
struct Found {
    parent: NodeId,
    child: Link,
    dir: Dir,
}

/// A randomized balanced tree over the `T` links of a node store.
///
/// The tree itself holds only its comparator. The root hangs off the sentinel's left link, and
/// every node's key and rank are read from the store. The tree does not deduplicate: inserting a
/// key that is already present is a caller error.
pub(crate) struct Treap<T, C> {
    cmp: C,
    _tree: PhantomData<fn() -> T>,
}

impl<T, C> Treap<T, C> {
    pub(crate) const fn new(cmp: C) -> Self {
        Treap {
            cmp,
            _tree: PhantomData,
        }
    }

    pub(crate) fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Returns the root of the tree.
    #[inline]
    pub(crate) fn root<N: Threaded<T>>(&self, nodes: &N) -> Link {
        nodes.left(SENTINEL)
    }

    /// Returns the number of nodes in the tree.
    #[inline]
    pub(crate) fn len<N: Threaded<T>>(&self, nodes: &N) -> usize {
        nodes.links(SENTINEL).size() - 1
    }

    /// Returns the minimum node, or the sentinel if the tree is empty.
    #[inline]
    pub(crate) fn first<N: Threaded<T>>(&self, nodes: &N) -> NodeId {
        nodes.min(SENTINEL)
    }

    /// Inserts the detached node `node` into the tree.
    ///
    /// No node with a key equal to `node`'s may already be in the tree.
    pub(crate) fn insert<N>(&self, nodes: &mut N, node: NodeId)
    where
        N: Keyed<T>,
        C: Compare<N::Key>,
    {
        debug_assert!(nodes.parent(node).is_none(), "inserted node must be detached");

        let root = self.root(nodes);
        nodes.unlink(root);

        let split = self.split(nodes, root, node);
        debug_assert!(split.equal.is_none(), "key is already present in the tree");

        let merged = Self::merge(nodes, split.less, Some(node));
        let merged = Self::merge(nodes, merged, split.greater);
        nodes.set_left(SENTINEL, merged);
    }

    /// Removes `node` from the tree, leaving it fully detached.
    ///
    /// `node` must be an element of this tree.
    pub(crate) fn remove<N>(&self, nodes: &mut N, node: NodeId)
    where
        N: Keyed<T>,
        C: Compare<N::Key>,
    {
        let root = self.root(nodes);
        nodes.unlink(root);

        let split = self.split(nodes, root, node);
        debug_assert_eq!(split.equal, Some(node), "removed node must be in the tree");

        let merged = Self::merge(nodes, split.less, split.greater);
        nodes.set_left(SENTINEL, merged);
    }

    /// Returns the node whose key equals `key`, or the sentinel.
    pub(crate) fn find<N>(&self, nodes: &N, key: &N::Key) -> NodeId
    where
        N: Keyed<T>,
        C: Compare<N::Key>,
    {
        self.search(nodes, key).child.unwrap_or(SENTINEL)
    }

    /// Returns the first node whose key is not less than `key`, or the sentinel.
    pub(crate) fn lower_bound<N>(&self, nodes: &N, key: &N::Key) -> NodeId
    where
        N: Keyed<T>,
        C: Compare<N::Key>,
    {
        let found = self.search(nodes, key);

        match (found.child, found.dir) {
            (Some(child), _) => child,
            (None, Dir::Left) => found.parent,
            (None, Dir::Right) => nodes.next(found.parent).unwrap_or(SENTINEL),
        }
    }

    /// Returns the first node whose key is greater than `key`, or the sentinel.
    pub(crate) fn upper_bound<N>(&self, nodes: &N, key: &N::Key) -> NodeId
    where
        N: Keyed<T>,
        C: Compare<N::Key>,
    {
        let found = self.search(nodes, key);

        match (found.child, found.dir) {
            (Some(child), _) => nodes.next(child).unwrap_or(SENTINEL),
            (None, Dir::Left) => found.parent,
            (None, Dir::Right) => nodes.next(found.parent).unwrap_or(SENTINEL),
        }
    }

    fn search<N>(&self, nodes: &N, key: &N::Key) -> Found
    where
        N: Keyed<T>,
        C: Compare<N::Key>,
    {
        let mut found = Found {
            parent: SENTINEL,
            child: self.root(nodes),
            dir: Dir::Left,
        };

        while let Some(child) = found.child {
            let dir = match self.cmp.compare(key, nodes.key(child)) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return found,
                Ordering::Greater => Dir::Right,
            };

            found = Found {
                parent: child,
                child: nodes.child(child, dir),
                dir,
            };
        }

        found
    }

    // Partitions the detached subtree `link` around the key of `target`.
    //
    // The comparator is invoked once per visited node. All three parts come back detached.
    fn split<N>(&self, nodes: &mut N, link: Link, target: NodeId) -> Split
    where
        N: Keyed<T>,
        C: Compare<N::Key>,
    {
        let Some(node) = link else {
            return Split::default();
        };

        let left = nodes.left(node);
        let right = nodes.right(node);

        match self.cmp.compare(nodes.key(target), nodes.key(node)) {
            Ordering::Less => {
                nodes.unlink(left);

                let mut split = self.split(nodes, left, target);
                split.greater = Self::merge(nodes, split.greater, Some(node));
                split
            }

            Ordering::Greater => {
                nodes.unlink(right);

                let mut split = self.split(nodes, right, target);
                split.less = Self::merge(nodes, Some(node), split.less);
                split
            }

            Ordering::Equal => {
                nodes.unlink(left);
                nodes.unlink(right);

                Split {
                    less: left,
                    equal: Some(node),
                    greater: right,
                }
            }
        }
    }

    // Joins two detached subtrees where every key in `lhs` is less than every key in `rhs`.
    //
    // The root with the lower rank becomes the parent; ties go to `lhs`.
    fn merge<N: Keyed<T>>(nodes: &mut N, lhs: Link, rhs: Link) -> Link {
        let (lhs, rhs) = match (lhs, rhs) {
            (None, rhs) => return rhs,
            (lhs, None) => return lhs,
            (Some(lhs), Some(rhs)) => (lhs, rhs),
        };

        if nodes.rank(lhs) <= nodes.rank(rhs) {
            let right = nodes.right(lhs);
            nodes.unlink(right);

            let merged = Self::merge(nodes, right, Some(rhs));
            nodes.set_right(lhs, merged);
            Some(lhs)
        } else {
            let left = nodes.left(rhs);
            nodes.unlink(left);

            let merged = Self::merge(nodes, Some(lhs), left);
            nodes.set_left(rhs, merged);
            Some(rhs)
        }
    }

    /// Checks the structure of the whole tree, panicking on the first violation.
    ///
    /// Checked: parent back-links, cached sizes, strictly increasing in-order keys, and that no
    /// node has a lower rank than its parent.
    pub(crate) fn assert_invariants<N>(&self, nodes: &N)
    where
        N: Keyed<T>,
        N::Key: fmt::Debug,
        C: Compare<N::Key>,
    {
        assert_eq!(nodes.parent(SENTINEL), None, "sentinel must not have a parent");
        assert_eq!(nodes.right(SENTINEL), None, "sentinel must not have a right child");

        let size = match self.root(nodes) {
            Some(root) => {
                assert_eq!(nodes.parent(root), Some(SENTINEL));
                self.assert_invariants_at(nodes, root)
            }
            None => 0,
        };
        assert_eq!(nodes.links(SENTINEL).size(), size + 1, "sentinel size is stale");

        let mut prev: Option<NodeId> = None;
        let mut cur = self.first(nodes);
        while cur != SENTINEL {
            if let Some(prev) = prev {
                assert_eq!(
                    self.cmp.compare(nodes.key(prev), nodes.key(cur)),
                    Ordering::Less,
                    "keys out of order: {:?} then {:?}",
                    nodes.key(prev),
                    nodes.key(cur),
                );
            }

            prev = Some(cur);
            cur = nodes
                .next(cur)
                .expect("every element has a successor in a sentinel-rooted tree");
        }
    }

    // Returns the size of the subtree rooted at `node`.
    fn assert_invariants_at<N>(&self, nodes: &N, node: NodeId) -> usize
    where
        N: Keyed<T>,
        N::Key: fmt::Debug,
        C: Compare<N::Key>,
    {
        let mut size = 1;

        for dir in [Dir::Left, Dir::Right] {
            if let Some(child) = nodes.child(node, dir) {
                let parent = nodes
                    .parent(child)
                    .expect("child parent pointer not set");
                assert_eq!(node, parent);

                assert!(
                    nodes.rank(node) <= nodes.rank(child),
                    "rank of {:?} exceeds rank of its child {:?}",
                    nodes.key(node),
                    nodes.key(child),
                );

                let expected = match dir {
                    Dir::Left => Ordering::Greater,
                    Dir::Right => Ordering::Less,
                };
                assert_eq!(self.cmp.compare(nodes.key(node), nodes.key(child)), expected);

                size += self.assert_invariants_at(nodes, child);
            }
        }

        assert_eq!(nodes.links(node).size(), size, "stale size at {:?}", nodes.key(node));
        size
    }
}

#[cfg(test)]
mod tests {
    use compare::Natural;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    use super::*;
    use crate::Links;

    struct TestNode {
        links: Links,
        key: u32,
        rank: Rank,
    }

    struct TestNodes(Vec<TestNode>);

    impl TestNodes {
        fn new() -> TestNodes {
            TestNodes(vec![TestNode {
                links: Links::new(),
                key: 0,
                rank: 0,
            }])
        }

        fn push(&mut self, key: u32, rank: Rank) -> NodeId {
            self.0.push(TestNode {
                links: Links::new(),
                key,
                rank,
            });
            NodeId::new(self.0.len() - 1)
        }

        fn keys(&self) -> Vec<u32> {
            let mut keys = Vec::new();
            let mut cur = self.min(SENTINEL);
            while cur != SENTINEL {
                keys.push(self.0[cur.index()].key);
                cur = self.next(cur).unwrap();
            }
            keys
        }
    }

    impl Threaded<()> for TestNodes {
        fn links(&self, node: NodeId) -> &Links {
            &self.0[node.index()].links
        }

        fn links_mut(&mut self, node: NodeId) -> &mut Links {
            &mut self.0[node.index()].links
        }
    }

    impl Keyed<()> for TestNodes {
        type Key = u32;

        fn key(&self, node: NodeId) -> &u32 {
            assert_ne!(node, SENTINEL, "the sentinel has no key");
            &self.0[node.index()].key
        }

        fn rank(&self, node: NodeId) -> Rank {
            self.0[node.index()].rank
        }
    }

    type TestTreap = Treap<(), Natural<u32>>;

    fn treap() -> TestTreap {
        Treap::new(compare::natural())
    }

    fn insert_all(keys: &[u32]) -> (TestTreap, TestNodes) {
        let tree = treap();
        let mut nodes = TestNodes::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(keys.len() as u64);

        for &key in keys {
            let node = nodes.push(key, rng.gen());
            tree.insert(&mut nodes, node);
            tree.assert_invariants(&nodes);
        }

        (tree, nodes)
    }

    fn insert_find_all(keys: &[u32]) {
        let (tree, nodes) = insert_all(keys);

        assert_eq!(tree.len(&nodes), keys.len());

        for key in keys {
            let node = tree.find(&nodes, key);
            assert_ne!(node, SENTINEL, "item not found");
            assert_eq!(nodes.key(node), key);
        }

        let mut sorted = keys.to_vec();
        sorted.sort_unstable();
        assert_eq!(nodes.keys(), sorted);
    }

    #[test]
    fn zero_elems_find() {
        insert_find_all(&[]);

        let (tree, nodes) = insert_all(&[]);
        assert_eq!(tree.find(&nodes, &7), SENTINEL);
        assert_eq!(tree.lower_bound(&nodes, &7), SENTINEL);
        assert_eq!(tree.upper_bound(&nodes, &7), SENTINEL);
    }

    #[test]
    fn single_elem_find() {
        insert_find_all(&[0]);
    }

    #[test]
    fn two_elems_find() {
        insert_find_all(&[0, 1]);
        insert_find_all(&[1, 0]);
    }

    #[test]
    fn three_elems_find() {
        insert_find_all(&[0, 1, 2]);
        insert_find_all(&[0, 2, 1]);
        insert_find_all(&[1, 0, 2]);
        insert_find_all(&[1, 2, 0]);
        insert_find_all(&[2, 0, 1]);
        insert_find_all(&[2, 1, 0]);
    }

    #[test]
    fn many_elems_find() {
        let keys: Vec<u32> = (0..500).map(|i| (i * 7919) % 1009).collect();
        insert_find_all(&keys);
    }

    fn insert_remove_all(keys: &[u32]) {
        let (tree, mut nodes) = insert_all(keys);

        for key in keys {
            let node = tree.find(&nodes, key);
            tree.remove(&mut nodes, node);
            tree.assert_invariants(&nodes);

            assert_eq!(tree.find(&nodes, key), SENTINEL);
            assert_eq!(nodes.parent(node), None);
            assert_eq!(nodes.left(node), None);
            assert_eq!(nodes.right(node), None);
        }

        assert_eq!(tree.len(&nodes), 0);
        assert_eq!(tree.root(&nodes), None);
    }

    #[test]
    fn remove_one() {
        insert_remove_all(&[0]);
    }

    #[test]
    fn remove_two() {
        insert_remove_all(&[0, 1]);
        insert_remove_all(&[1, 0]);
    }

    #[test]
    fn remove_three() {
        insert_remove_all(&[0, 1, 2]);
        insert_remove_all(&[0, 2, 1]);
        insert_remove_all(&[1, 0, 2]);
        insert_remove_all(&[1, 2, 0]);
        insert_remove_all(&[2, 0, 1]);
        insert_remove_all(&[2, 1, 0]);
    }

    #[test]
    fn remove_interleaved() {
        let keys: Vec<u32> = (0..200).map(|i| (i * 37) % 211).collect();
        let (tree, mut nodes) = insert_all(&keys);

        for key in keys.iter().step_by(2) {
            let node = tree.find(&nodes, key);
            tree.remove(&mut nodes, node);
        }
        tree.assert_invariants(&nodes);

        let mut expected: Vec<u32> = keys.iter().skip(1).step_by(2).copied().collect();
        expected.sort_unstable();
        assert_eq!(nodes.keys(), expected);
    }

    #[test]
    fn lowest_rank_is_root() {
        let tree = treap();
        let mut nodes = TestNodes::new();

        for (key, rank) in [(10, 50), (20, 5), (30, 70), (40, 1), (50, 60)] {
            let node = nodes.push(key, rank);
            tree.insert(&mut nodes, node);
        }

        tree.assert_invariants(&nodes);

        let root = tree.root(&nodes).unwrap();
        assert_eq!(*nodes.key(root), 40);
        assert_eq!(*nodes.key(nodes.left(root).unwrap()), 20);
        assert_eq!(*nodes.key(nodes.right(root).unwrap()), 50);
    }

    #[test]
    fn bounds() {
        let (tree, nodes) = insert_all(&[10, 20, 30, 40, 50]);

        let key_at = |node: NodeId| (node != SENTINEL).then(|| *nodes.key(node));

        assert_eq!(key_at(tree.lower_bound(&nodes, &5)), Some(10));
        assert_eq!(key_at(tree.lower_bound(&nodes, &10)), Some(10));
        assert_eq!(key_at(tree.lower_bound(&nodes, &11)), Some(20));
        assert_eq!(key_at(tree.lower_bound(&nodes, &50)), Some(50));
        assert_eq!(key_at(tree.lower_bound(&nodes, &51)), None);

        assert_eq!(key_at(tree.upper_bound(&nodes, &5)), Some(10));
        assert_eq!(key_at(tree.upper_bound(&nodes, &10)), Some(20));
        assert_eq!(key_at(tree.upper_bound(&nodes, &29)), Some(30));
        assert_eq!(key_at(tree.upper_bound(&nodes, &30)), Some(40));
        assert_eq!(key_at(tree.upper_bound(&nodes, &50)), None);
    }

    #[test]
    fn bounds_match_linear_scan() {
        let keys: Vec<u32> = (0..100).map(|i| i * 3).collect();
        let (tree, nodes) = insert_all(&keys);

        for probe in 0..310 {
            let lower = keys.iter().copied().find(|&k| k >= probe);
            let upper = keys.iter().copied().find(|&k| k > probe);

            let lb = tree.lower_bound(&nodes, &probe);
            let ub = tree.upper_bound(&nodes, &probe);

            assert_eq!((lb != SENTINEL).then(|| *nodes.key(lb)), lower, "lower_bound({probe})");
            assert_eq!((ub != SENTINEL).then(|| *nodes.key(ub)), upper, "upper_bound({probe})");
        }
    }

    #[test]
    fn reversed_comparator() {
        let tree: Treap<(), _> = Treap::new(|a: &u32, b: &u32| b.cmp(a));
        let mut nodes = TestNodes::new();

        for (key, rank) in [(1, 3), (2, 1), (3, 2)] {
            let node = nodes.push(key, rank);
            tree.insert(&mut nodes, node);
        }
        tree.assert_invariants(&nodes);

        assert_eq!(nodes.keys(), [3, 2, 1]);
        assert_eq!(*nodes.key(tree.lower_bound(&nodes, &5)), 3);
    }
}
