//! An augmented red-black tree of closed intervals.
//!
//! Every node caches the smallest start and the largest end found in its
//! subtree, which lets overlap queries skip whole subtrees. There's no
//! removal: flow shapes rebuild their tree from scratch whenever their
//! geometry changes.

/// A closed interval `[start, end]` carrying some data.
///
/// Callers must construct intervals with `start <= end`; the overlap test
/// silently gives wrong answers otherwise.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Interval<T> {
    /// The smaller endpoint.
    pub start: f64,
    /// The larger endpoint.
    pub end: f64,
    /// The payload.
    pub data: T,
}

impl<T> Interval<T> {
    /// Creates a new interval.
    pub fn new(start: f64, end: f64, data: T) -> Self {
        debug_assert!(start <= end, "reversed interval [{start}, {end}]");
        Interval { start, end, data }
    }

    /// Do the two closed intervals share at least one point?
    pub fn overlaps<U>(&self, other: &Interval<U>) -> bool {
        self.overlaps_range(other.start, other.end)
    }

    /// Does this interval share at least one point with `[start, end]`?
    pub fn overlaps_range(&self, start: f64, end: f64) -> bool {
        self.start <= end && self.end >= start
    }
}

impl Interval<()> {
    /// Creates an interval without a payload, typically for use as a query.
    pub fn span(start: f64, end: f64) -> Self {
        Interval::new(start, end, ())
    }
}

/// An index into the node arena of an [`IntervalTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Clone, Debug)]
struct Node<T> {
    interval: Interval<T>,
    color: Color,
    parent: Option<NodeIdx>,
    left: Option<NodeIdx>,
    right: Option<NodeIdx>,
    // Smallest start in this subtree.
    min: f64,
    // Largest end in this subtree.
    max: f64,
}

struct NodeVec<T> {
    inner: Vec<T>,
}

impl<T: Clone> Clone for NodeVec<T> {
    fn clone(&self) -> Self {
        NodeVec {
            inner: self.inner.clone(),
        }
    }
}

impl_typed_vec!(NodeVec, NodeIdx, "n");

/// A balanced search tree of intervals, ordered by their start.
///
/// Children are stored as indices into an arena, with `None` marking a
/// missing child; there is no shared sentinel leaf.
#[derive(Clone, Debug)]
pub struct IntervalTree<T> {
    nodes: NodeVec<Node<T>>,
    root: Option<NodeIdx>,
}

impl<T> Default for IntervalTree<T> {
    fn default() -> Self {
        IntervalTree {
            nodes: NodeVec::default(),
            root: None,
        }
    }
}

impl<T> IntervalTree<T> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty tree with room for `cap` intervals.
    pub fn with_capacity(cap: usize) -> Self {
        IntervalTree {
            nodes: NodeVec::with_capacity(cap),
            root: None,
        }
    }

    /// The number of stored intervals.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Is the tree empty?
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Removes every interval, keeping the allocation around for reuse.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Inserts an interval.
    ///
    /// Intervals with equal starts are kept, in insertion order.
    pub fn insert(&mut self, interval: Interval<T>) {
        let (start, end) = (interval.start, interval.end);
        let idx = self.nodes.push(Node {
            interval,
            color: Color::Red,
            parent: None,
            left: None,
            right: None,
            min: start,
            max: end,
        });

        let Some(mut cur) = self.root else {
            self.root = Some(idx);
            self.nodes[idx].color = Color::Black;
            return;
        };

        loop {
            let go_left = start < self.nodes[cur].interval.start;
            let child = if go_left {
                self.nodes[cur].left
            } else {
                self.nodes[cur].right
            };
            match child {
                Some(c) => cur = c,
                None => {
                    if go_left {
                        self.nodes[cur].left = Some(idx);
                    } else {
                        self.nodes[cur].right = Some(idx);
                    }
                    self.nodes[idx].parent = Some(cur);
                    break;
                }
            }
        }

        // The new leaf widens the aggregates of all of its ancestors.
        let mut up = self.nodes[idx].parent;
        while let Some(p) = up {
            let node = &mut self.nodes[p];
            node.min = node.min.min(start);
            node.max = node.max.max(end);
            up = node.parent;
        }

        self.insert_fixup(idx);

        #[cfg(feature = "slow-asserts")]
        self.check_invariants();
    }

    /// Returns every stored interval that overlaps `query`.
    pub fn find_overlaps<U>(&self, query: &Interval<U>) -> Vec<&Interval<T>> {
        let mut ret = Vec::new();
        self.for_each_overlap(query.start, query.end, |interval| ret.push(interval));
        ret
    }

    /// Calls `f` on every stored interval that overlaps `[start, end]`.
    ///
    /// The order of the calls is unspecified.
    pub fn for_each_overlap<'a, F>(&'a self, start: f64, end: f64, mut f: F)
    where
        F: FnMut(&'a Interval<T>),
    {
        if let Some(root) = self.root {
            self.visit_overlaps(root, start, end, &mut f);
        }
    }

    fn visit_overlaps<'a, F>(&'a self, idx: NodeIdx, start: f64, end: f64, f: &mut F)
    where
        F: FnMut(&'a Interval<T>),
    {
        let node = &self.nodes[idx];
        if node.interval.overlaps_range(start, end) {
            f(&node.interval);
        }
        if let Some(left) = node.left {
            if self.nodes[left].max >= start {
                self.visit_overlaps(left, start, end, f);
            }
        }
        if let Some(right) = node.right {
            if self.nodes[right].min <= end {
                self.visit_overlaps(right, start, end, f);
            }
        }
    }

    /// Iterates over the stored intervals, ordered by start.
    pub fn iter(&self) -> Iter<'_, T> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
        };
        iter.push_left_spine(self.root);
        iter
    }

    fn parent(&self, idx: NodeIdx) -> Option<NodeIdx> {
        self.nodes[idx].parent
    }

    fn is_red(&self, idx: Option<NodeIdx>) -> bool {
        idx.is_some_and(|i| self.nodes[i].color == Color::Red)
    }

    fn insert_fixup(&mut self, mut node: NodeIdx) {
        while let Some(mut parent) = self.parent(node) {
            if self.nodes[parent].color == Color::Black {
                break;
            }
            // A red node is never the root, so there is a grandparent.
            let Some(grand) = self.parent(parent) else {
                break;
            };
            let parent_is_left = self.nodes[grand].left == Some(parent);
            let uncle = if parent_is_left {
                self.nodes[grand].right
            } else {
                self.nodes[grand].left
            };

            if let Some(uncle) = uncle.filter(|&u| self.nodes[u].color == Color::Red) {
                self.nodes[parent].color = Color::Black;
                self.nodes[uncle].color = Color::Black;
                self.nodes[grand].color = Color::Red;
                node = grand;
                continue;
            }

            if parent_is_left {
                if self.nodes[parent].right == Some(node) {
                    self.rotate_left(parent);
                    std::mem::swap(&mut node, &mut parent);
                }
                self.nodes[parent].color = Color::Black;
                self.nodes[grand].color = Color::Red;
                self.rotate_right(grand);
            } else {
                if self.nodes[parent].left == Some(node) {
                    self.rotate_right(parent);
                    std::mem::swap(&mut node, &mut parent);
                }
                self.nodes[parent].color = Color::Black;
                self.nodes[grand].color = Color::Red;
                self.rotate_left(grand);
            }
        }

        if let Some(root) = self.root {
            self.nodes[root].color = Color::Black;
        }
    }

    //     x              y
    //    / \            / \
    //   a   y    ->    x   c
    //      / \        / \
    //     b   c      a   b
    fn rotate_left(&mut self, x: NodeIdx) {
        let Some(y) = self.nodes[x].right else {
            debug_assert!(false, "rotate_left without a right child");
            return;
        };
        let b = self.nodes[y].left;
        self.nodes[x].right = b;
        if let Some(b) = b {
            self.nodes[b].parent = Some(x);
        }
        let x_parent = self.nodes[x].parent;
        self.nodes[y].parent = x_parent;
        self.replace_child(x_parent, x, y);
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);

        self.update_aggregates(x);
        self.update_aggregates(y);
    }

    fn rotate_right(&mut self, y: NodeIdx) {
        let Some(x) = self.nodes[y].left else {
            debug_assert!(false, "rotate_right without a left child");
            return;
        };
        let b = self.nodes[x].right;
        self.nodes[y].left = b;
        if let Some(b) = b {
            self.nodes[b].parent = Some(y);
        }
        let y_parent = self.nodes[y].parent;
        self.nodes[x].parent = y_parent;
        self.replace_child(y_parent, y, x);
        self.nodes[x].right = Some(y);
        self.nodes[y].parent = Some(x);

        self.update_aggregates(y);
        self.update_aggregates(x);
    }

    fn replace_child(&mut self, parent: Option<NodeIdx>, old: NodeIdx, new: NodeIdx) {
        match parent {
            None => self.root = Some(new),
            Some(p) => {
                let node = &mut self.nodes[p];
                if node.left == Some(old) {
                    node.left = Some(new);
                } else {
                    node.right = Some(new);
                }
            }
        }
    }

    fn update_aggregates(&mut self, idx: NodeIdx) {
        let node = &self.nodes[idx];
        let mut min = node.interval.start;
        let mut max = node.interval.end;
        for child in [node.left, node.right].into_iter().flatten() {
            min = min.min(self.nodes[child].min);
            max = max.max(self.nodes[child].max);
        }
        let node = &mut self.nodes[idx];
        node.min = min;
        node.max = max;
    }

    /// Panics if the tree's structure is broken.
    ///
    /// Checks the search order, the parent links, the cached aggregates and
    /// the red-black coloring rules.
    #[doc(hidden)]
    pub fn check_invariants(&self) {
        let Some(root) = self.root else {
            assert!(self.nodes.is_empty());
            return;
        };
        assert_eq!(self.nodes[root].color, Color::Black);
        assert!(self.nodes[root].parent.is_none());
        let (count, _) = self.check_subtree(root);
        assert_eq!(count, self.nodes.len());
    }

    // Returns the number of nodes and the black height of the subtree.
    fn check_subtree(&self, idx: NodeIdx) -> (usize, usize) {
        let node = &self.nodes[idx];
        if node.color == Color::Red {
            assert!(!self.is_red(node.left), "red node {idx:?} has a red child");
            assert!(!self.is_red(node.right), "red node {idx:?} has a red child");
        }

        let mut min = node.interval.start;
        let mut max = node.interval.end;
        let mut count = 1;
        let mut heights = [0; 2];
        for (i, child) in [node.left, node.right].into_iter().enumerate() {
            if let Some(child) = child {
                let c = &self.nodes[child];
                assert_eq!(c.parent, Some(idx));
                if i == 0 {
                    assert!(c.interval.start <= node.interval.start);
                } else {
                    assert!(c.interval.start >= node.interval.start);
                }
                let (child_count, child_height) = self.check_subtree(child);
                count += child_count;
                heights[i] = child_height;
                min = min.min(c.min);
                max = max.max(c.max);
            }
        }
        assert_eq!(heights[0], heights[1], "unequal black heights below {idx:?}");
        assert_eq!(node.min, min);
        assert_eq!(node.max, max);

        let own = usize::from(node.color == Color::Black);
        (count, heights[0] + own)
    }
}

/// An in-order iterator over the intervals of an [`IntervalTree`].
pub struct Iter<'a, T> {
    tree: &'a IntervalTree<T>,
    stack: Vec<NodeIdx>,
}

impl<T> Iter<'_, T> {
    fn push_left_spine(&mut self, mut idx: Option<NodeIdx>) {
        while let Some(i) = idx {
            self.stack.push(i);
            idx = self.tree.nodes[i].left;
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a Interval<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.stack.pop()?;
        let node = &self.tree.nodes[idx];
        self.push_left_spine(node.right);
        Some(&node.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::{Interval, IntervalTree};
    use proptest::prelude::*;

    fn tree_of(intervals: &[(f64, f64)]) -> IntervalTree<usize> {
        let mut tree = IntervalTree::new();
        for (i, &(start, end)) in intervals.iter().enumerate() {
            tree.insert(Interval::new(start, end, i));
        }
        tree
    }

    fn found(tree: &IntervalTree<usize>, start: f64, end: f64) -> Vec<usize> {
        let mut ret: Vec<_> = tree
            .find_overlaps(&Interval::span(start, end))
            .into_iter()
            .map(|i| i.data)
            .collect();
        ret.sort();
        ret
    }

    #[test]
    fn basic() {
        let tree = tree_of(&[(0.0, 10.0), (1.0, 9.0), (0.0, 2.0), (12.0, 13.0)]);
        tree.check_invariants();
        assert_eq!(tree.len(), 4);
        assert_eq!(found(&tree, 9.5, 11.0), vec![0]);
        assert_eq!(found(&tree, 2.0, 2.0), vec![0, 1, 2]);
        assert_eq!(found(&tree, 10.0, 12.0), vec![0, 3]);
        assert_eq!(found(&tree, 13.5, 20.0), Vec::<usize>::new());
    }

    #[test]
    fn closed_endpoints() {
        let tree = tree_of(&[(0.0, 1.0)]);
        assert_eq!(found(&tree, 1.0, 2.0), vec![0]);
        assert_eq!(found(&tree, -1.0, 0.0), vec![0]);
        assert_eq!(found(&tree, 1.0 + f64::EPSILON, 2.0), Vec::<usize>::new());
    }

    #[test]
    fn empty() {
        let tree = IntervalTree::<usize>::new();
        tree.check_invariants();
        assert!(tree.is_empty());
        assert!(found(&tree, -1e9, 1e9).is_empty());
        assert_eq!(tree.iter().count(), 0);
    }

    #[test]
    fn sorted_insertions_stay_balanced() {
        let intervals: Vec<_> = (0..1000).map(|i| (i as f64, i as f64 + 0.5)).collect();
        let tree = tree_of(&intervals);
        tree.check_invariants();
        assert_eq!(found(&tree, 499.75, 500.25), vec![500]);

        let reversed: Vec<_> = intervals.iter().rev().copied().collect();
        let tree = tree_of(&reversed);
        tree.check_invariants();
    }

    #[test]
    fn equal_starts() {
        let tree = tree_of(&[(1.0, 2.0), (1.0, 5.0), (1.0, 3.0), (1.0, 1.0)]);
        tree.check_invariants();
        assert_eq!(found(&tree, 4.0, 4.0), vec![1]);
        let order: Vec<_> = tree.iter().map(|i| i.data).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn clear_and_reuse() {
        let mut tree = tree_of(&[(0.0, 1.0), (2.0, 3.0)]);
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        tree.insert(Interval::new(5.0, 6.0, 7));
        tree.check_invariants();
        assert_eq!(found(&tree, 0.0, 10.0), vec![7]);
    }

    fn interval() -> impl Strategy<Value = (f64, f64)> {
        (-100.0..100.0f64, 0.0..30.0f64).prop_map(|(start, len)| (start, start + len))
    }

    proptest! {
        #[test]
        fn matches_brute_force(
            intervals in prop::collection::vec(interval(), 0..200),
            queries in prop::collection::vec(interval(), 0..20),
        ) {
            let tree = tree_of(&intervals);
            tree.check_invariants();

            for (qs, qe) in queries {
                let expected: Vec<_> = intervals
                    .iter()
                    .enumerate()
                    .filter(|&(_, &(s, e))| s <= qe && e >= qs)
                    .map(|(i, _)| i)
                    .collect();
                prop_assert_eq!(found(&tree, qs, qe), expected);
            }
        }

        #[test]
        fn iterates_in_start_order(intervals in prop::collection::vec(interval(), 0..100)) {
            let tree = tree_of(&intervals);
            let starts: Vec<_> = tree.iter().map(|i| i.start).collect();
            prop_assert_eq!(starts.len(), intervals.len());
            prop_assert!(starts.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
