use crate::{
    cursor::Cursor,
    errors::{Result, SequenceError},
    node::Node,
};
use core::fmt;
use core::iter::FusedIterator;
use tracing::trace;

/// A doubly-linked sequence with index-based access and a fail-fast [`Cursor`].
///
/// Nodes live in an arena; `prev`/`next` links are slot indices and vacated slots
/// are threaded onto a free-list for reuse. Every insertion and removal bumps the
/// revision counter, which cursors compare against to detect stale use.
pub struct Sequence<T> {
    nodes: Vec<Node<T>>,
    free: Option<usize>,
    first: Option<usize>,
    last: Option<usize>,
    len: usize,
    revision: u64,
}

/// Iterator over values in order.
pub struct Iter<'a, T> {
    list: &'a Sequence<T>,
    next: Option<usize>,
    remaining: usize,
}

/// Owning iterator, draining the sequence front to back.
pub struct IntoIter<T> {
    list: Sequence<T>,
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Sequence<T> {
    /// Create a new empty sequence.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty sequence whose arena has room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: None,
            first: None,
            last: None,
            len: 0,
            revision: 0,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the sequence empty?
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Structural revision: incremented by every insertion and every removal.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Append a value at the end.
    pub fn push_back(&mut self, value: T) {
        self.link_before(value, None);
        trace!(
            index = self.len - 1,
            len = self.len,
            revision = self.revision,
            "appended element"
        );
    }

    /// Insert a value before the element currently at `index`.
    ///
    /// `index == len()` appends. Fails with [`SequenceError::IndexOutOfRange`] when
    /// `index > len()`, leaving the sequence untouched.
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        if index > self.len {
            return Err(SequenceError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        let succ = if index == self.len {
            None
        } else {
            Some(self.node_at(index)?)
        };
        self.link_before(value, succ);
        trace!(
            index,
            len = self.len,
            revision = self.revision,
            "inserted element"
        );
        Ok(())
    }

    /// Get a reference to the element at `index`.
    pub fn get(&self, index: usize) -> Result<&T> {
        let id = self.node_at(index)?;
        Ok(self.nodes[id]
            .value
            .as_ref()
            .expect("live node has value"))
    }

    /// Get a mutable reference to the element at `index`. Not a structural change.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        let id = self.node_at(index)?;
        Ok(self.nodes[id]
            .value
            .as_mut()
            .expect("live node has value"))
    }

    /// Replace the element at `index`, returning the old one.
    ///
    /// Nodes are not relinked and the revision is left alone, so open cursors stay valid.
    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        let slot = self.get_mut(index)?;
        Ok(core::mem::replace(slot, value))
    }

    /// First element, if any.
    pub fn first(&self) -> Option<&T> {
        self.first.and_then(|id| self.nodes[id].value.as_ref())
    }

    /// Last element, if any.
    pub fn last(&self) -> Option<&T> {
        self.last.and_then(|id| self.nodes[id].value.as_ref())
    }

    /// Iterate values in order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            next: self.first,
            remaining: self.len,
        }
    }

    /// Create a removing cursor bound to the current revision.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.first, self.revision)
    }

    /// Value and successor link of a live slot, `None` for vacant or unknown slots.
    pub(crate) fn entry(&self, id: usize) -> Option<(&T, Option<usize>)> {
        let node = self.nodes.get(id)?;
        node.value.as_ref().map(|v| (v, node.next))
    }

    /// Locate the slot of the element at `index`, scanning from the nearer end.
    fn node_at(&self, index: usize) -> Result<usize> {
        if index >= self.len {
            return Err(SequenceError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        let mut id;
        if index < (self.len >> 1) {
            id = self.first.expect("non-empty sequence has a first node");
            for _ in 0..index {
                id = self.nodes[id].next.expect("chain shorter than len");
            }
        } else {
            id = self.last.expect("non-empty sequence has a last node");
            for _ in index + 1..self.len {
                id = self.nodes[id].prev.expect("chain shorter than len");
            }
        }
        Ok(id)
    }

    fn alloc(&mut self, node: Node<T>) -> usize {
        match self.free {
            Some(id) => {
                debug_assert!(!self.nodes[id].is_live());
                self.free = self.nodes[id].next;
                self.nodes[id] = node;
                trace!(slot = id, "reusing vacant slot");
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Link `value` before `succ`, or at the tail when `succ` is `None`.
    fn link_before(&mut self, value: T, succ: Option<usize>) {
        let prev = match succ {
            Some(s) => self.nodes[s].prev,
            None => self.last,
        };
        let id = self.alloc(Node::new(prev, value, succ));
        match prev {
            Some(p) => self.nodes[p].next = Some(id),
            None => self.first = Some(id),
        }
        match succ {
            Some(s) => self.nodes[s].prev = Some(id),
            None => self.last = Some(id),
        }
        self.len += 1;
        self.revision += 1;
    }

    /// Splice a live node out of the chain and return its value. The slot goes on the free-list.
    pub(crate) fn unlink(&mut self, id: usize) -> T {
        let (prev, next) = {
            let node = &self.nodes[id];
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.first = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.last = prev,
        }

        let node = &mut self.nodes[id];
        let value = node.value.take().expect("unlinked node is live");
        node.prev = None;
        node.next = self.free;
        self.free = Some(id);

        self.len -= 1;
        self.revision += 1;
        trace!(
            slot = id,
            len = self.len,
            revision = self.revision,
            "unlinked element"
        );
        value
    }
}

impl<T: Clone> Clone for Sequence<T> {
    fn clone(&self) -> Self {
        let mut list = Self::with_capacity(self.len);
        list.extend(self.iter().cloned());
        list
    }
}

impl<T: fmt::Debug> fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for Sequence<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for Sequence<T> {}

impl<T> Extend<T> for Sequence<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T> FromIterator<T> for Sequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<'a, T> IntoIterator for &'a Sequence<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for Sequence<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { list: self }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = &self.list.nodes[id];
        self.next = node.next;
        self.remaining -= 1;
        node.value.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.list.first?;
        Some(self.list.unlink(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len, Some(self.list.len))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

#[cfg(test)]
impl<T> Sequence<T> {
    /// Walk the chain both ways and the free-list, panicking on any broken link.
    pub(crate) fn assert_invariants(&self) {
        assert_eq!(self.len == 0, self.first.is_none());
        assert_eq!(self.len == 0, self.last.is_none());
        if let Some(f) = self.first {
            assert_eq!(self.nodes[f].prev, None, "first node has a predecessor");
        }
        if let Some(l) = self.last {
            assert_eq!(self.nodes[l].next, None, "last node has a successor");
        }

        let mut steps = 0;
        let mut prev = None;
        let mut cur = self.first;
        while let Some(id) = cur {
            let node = &self.nodes[id];
            assert!(node.is_live(), "vacant slot {id} reachable from first");
            assert_eq!(node.prev, prev, "broken back link at slot {id}");
            prev = Some(id);
            cur = node.next;
            steps += 1;
            assert!(steps <= self.len, "chain longer than len");
        }
        assert_eq!(steps, self.len);
        assert_eq!(prev, self.last);

        let mut vacant = 0;
        let mut cur = self.free;
        while let Some(id) = cur {
            assert!(!self.nodes[id].is_live(), "live slot {id} on free-list");
            cur = self.nodes[id].next;
            vacant += 1;
        }
        assert_eq!(vacant + self.len, self.nodes.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Sequence<&'static str> {
        let mut list = Sequence::new();
        list.push_back("A");
        list.push_back("B");
        list.push_back("C");
        list
    }

    fn contents<T: Clone>(list: &Sequence<T>) -> Vec<T> {
        list.iter().cloned().collect()
    }

    #[test]
    fn empty_sequence() {
        let list: Sequence<i32> = Sequence::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.revision(), 0);
        assert_eq!(list.first(), None);
        assert_eq!(list.last(), None);
        assert_eq!(list.iter().next(), None);
        list.assert_invariants();
    }

    #[test]
    fn push_back_keeps_order() {
        let list = abc();
        assert_eq!(contents(&list), vec!["A", "B", "C"]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.revision(), 3);
        assert_eq!(list.first(), Some(&"A"));
        assert_eq!(list.last(), Some(&"C"));
        list.assert_invariants();
    }

    #[test]
    fn insert_at_head_middle_and_tail() {
        let mut list = abc();
        list.insert(0, "head").unwrap();
        list.assert_invariants();
        list.insert(2, "mid").unwrap();
        list.assert_invariants();
        list.insert(list.len(), "tail").unwrap();
        list.assert_invariants();

        assert_eq!(
            contents(&list),
            vec!["head", "A", "mid", "B", "C", "tail"]
        );
        assert_eq!(list.revision(), 6);
    }

    #[test]
    fn insert_into_empty() {
        let mut list = Sequence::new();
        list.insert(0, 7).unwrap();
        assert_eq!(contents(&list), vec![7]);
        list.assert_invariants();
    }

    #[test]
    fn insert_out_of_range_leaves_sequence_untouched() {
        let mut list = abc();
        let err = list.insert(4, "X").unwrap_err();
        assert_eq!(err, SequenceError::IndexOutOfRange { index: 4, len: 3 });
        assert_eq!(contents(&list), vec!["A", "B", "C"]);
        assert_eq!(list.revision(), 3);
    }

    #[test]
    fn get_scans_from_either_end() {
        let list: Sequence<usize> = (0..101).collect();
        for i in 0..101 {
            assert_eq!(list.get(i), Ok(&i));
        }
        assert_eq!(
            list.get(101),
            Err(SequenceError::IndexOutOfRange {
                index: 101,
                len: 101
            })
        );
    }

    #[test]
    fn get_on_empty_fails() {
        let list: Sequence<u8> = Sequence::new();
        assert_eq!(
            list.get(0),
            Err(SequenceError::IndexOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn set_is_not_structural() {
        let mut list = abc();
        assert_eq!(list.set(0, "D"), Ok("A"));
        assert_eq!(list.set(1, "E"), Ok("B"));
        assert_eq!(list.set(2, "F"), Ok("C"));
        assert_eq!(contents(&list), vec!["D", "E", "F"]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.revision(), 3);
        list.assert_invariants();
    }

    #[test]
    fn set_at_len_fails() {
        let mut list = abc();
        assert_eq!(
            list.set(3, "X"),
            Err(SequenceError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(contents(&list), vec!["A", "B", "C"]);
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut list: Sequence<i32> = (1..=3).collect();
        *list.get_mut(1).unwrap() *= 10;
        assert_eq!(contents(&list), vec![1, 20, 3]);
        assert_eq!(list.revision(), 3);
    }

    #[test]
    fn unlink_endpoints_and_middle() {
        let mut list: Sequence<i32> = (0..5).collect();
        let first = list.first.unwrap();
        assert_eq!(list.unlink(first), 0);
        list.assert_invariants();
        let last = list.last.unwrap();
        assert_eq!(list.unlink(last), 4);
        list.assert_invariants();
        let mid = list.node_at(1).unwrap();
        assert_eq!(list.unlink(mid), 2);
        list.assert_invariants();

        assert_eq!(contents(&list), vec![1, 3]);
        assert_eq!(list.revision(), 8);
    }

    #[test]
    fn vacant_slots_are_reused() {
        let mut list: Sequence<i32> = (0..4).collect();
        let id = list.node_at(2).unwrap();
        list.unlink(id);
        list.push_back(9);
        list.assert_invariants();
        assert_eq!(list.nodes.len(), 4);
        assert_eq!(contents(&list), vec![0, 1, 3, 9]);
    }

    #[test]
    fn into_iter_drains_in_order() {
        let list: Sequence<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        let mut it = list.into_iter();
        assert_eq!(it.len(), 3);
        assert_eq!(it.next().as_deref(), Some("x"));
        assert_eq!(it.collect::<Vec<_>>(), vec!["y", "z"]);
    }

    #[test]
    fn iter_is_exact_size() {
        let list = abc();
        let mut it = list.iter();
        assert_eq!(it.len(), 3);
        it.next();
        assert_eq!(it.len(), 2);
    }

    #[test]
    fn clone_eq_and_debug() {
        let mut list = abc();
        let mut cur = list.cursor();
        cur.next(&list).unwrap();
        cur.remove(&mut list).unwrap();

        let copy = list.clone();
        assert_eq!(copy, list);
        copy.assert_invariants();
        assert_eq!(format!("{list:?}"), r#"["B", "C"]"#);
        assert_ne!(copy, abc());
    }
}

// proptest doesn't run under miri with default config
#[cfg(all(not(miri), test))]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Push(u8),
        Insert(usize, u8),
        Set(usize, u8),
        RemoveAt(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            2 => any::<u8>().prop_map(Op::Push),
            2 => (0..24usize, any::<u8>()).prop_map(|(i, v)| Op::Insert(i, v)),
            1 => (0..24usize, any::<u8>()).prop_map(|(i, v)| Op::Set(i, v)),
            1 => (0..24usize).prop_map(Op::RemoveAt),
        ]
    }

    proptest! {
        #[test]
        fn behaves_like_vec(ops in proptest::collection::vec(op(), 0..64)) {
            let mut list = Sequence::new();
            let mut model: Vec<u8> = Vec::new();
            let mut revision = 0u64;

            for op in ops {
                match op {
                    Op::Push(v) => {
                        list.push_back(v);
                        model.push(v);
                        revision += 1;
                    }
                    Op::Insert(i, v) => {
                        let res = list.insert(i, v);
                        if i <= model.len() {
                            prop_assert!(res.is_ok());
                            model.insert(i, v);
                            revision += 1;
                        } else {
                            prop_assert_eq!(
                                res,
                                Err(SequenceError::IndexOutOfRange { index: i, len: model.len() })
                            );
                        }
                    }
                    Op::Set(i, v) => {
                        let res = list.set(i, v);
                        match model.get_mut(i) {
                            Some(slot) => {
                                prop_assert_eq!(res, Ok(*slot));
                                *slot = v;
                            }
                            None => prop_assert!(res.is_err()),
                        }
                    }
                    Op::RemoveAt(i) => {
                        if i < model.len() {
                            let mut cur = list.cursor();
                            for _ in 0..=i {
                                cur.next(&list).unwrap();
                            }
                            prop_assert_eq!(cur.remove(&mut list), Ok(model.remove(i)));
                            revision += 1;
                        }
                    }
                }
                list.assert_invariants();
                prop_assert_eq!(list.revision(), revision);
            }

            prop_assert_eq!(list.len(), model.len());
            prop_assert_eq!(list.iter().copied().collect::<Vec<_>>(), model);
        }
    }
}
