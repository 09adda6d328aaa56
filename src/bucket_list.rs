//! BucketList: doubly linked list backing one separate-chaining bucket.
//!
//! Nodes live in a `SlotMap` arena and link to each other by generational
//! key, so a `NodeRef` handed out by `push_back` removes its node in O(1).
//! Every list carries a process-unique id that its refs record; a ref that
//! is stale or was issued by another list never resolves to a node.

use core::sync::atomic::{AtomicU64, Ordering};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    struct NodeKey;
}

static NEXT_LIST_ID: AtomicU64 = AtomicU64::new(0);

/// Stable reference to one node of a [`BucketList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    key: NodeKey,
    list: u64,
}

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<NodeKey>,
    next: Option<NodeKey>,
}

pub struct BucketList<T> {
    id: u64,
    nodes: SlotMap<NodeKey, Node<T>>,
    head: Option<NodeKey>,
    tail: Option<NodeKey>,
}

impl<T> BucketList<T> {
    pub fn new() -> Self {
        Self {
            id: NEXT_LIST_ID.fetch_add(1, Ordering::Relaxed),
            nodes: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    /// Arena key behind `r`, if `r` was issued by this list.
    #[inline]
    fn own(&self, r: NodeRef) -> Option<NodeKey> {
        (r.list == self.id).then_some(r.key)
    }

    #[inline]
    fn node_ref(&self, key: NodeKey) -> NodeRef {
        NodeRef { key, list: self.id }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends `value` at the back and returns a reference to its node.
    pub fn push_back(&mut self, value: T) -> NodeRef {
        let prev = self.tail;
        let key = self.nodes.insert(Node {
            value,
            prev,
            next: None,
        });
        match prev {
            Some(p) => self.nodes[p].next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        self.node_ref(key)
    }

    /// Unlinks the node behind `r`. Stale references and references from
    /// another list return `None`.
    pub fn remove(&mut self, r: NodeRef) -> Option<T> {
        let key = self.own(r)?;
        self.unlink(key)
    }

    fn unlink(&mut self, key: NodeKey) -> Option<T> {
        let node = self.nodes.remove(key)?;
        match node.prev {
            Some(p) => self.nodes[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.nodes[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        Some(node.value)
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.head?;
        self.unlink(head)
    }

    pub fn front(&self) -> Option<&T> {
        self.head.map(|h| &self.nodes[h].value)
    }

    pub fn get(&self, r: NodeRef) -> Option<&T> {
        self.nodes.get(self.own(r)?).map(|n| &n.value)
    }

    pub fn get_mut(&mut self, r: NodeRef) -> Option<&mut T> {
        let key = self.own(r)?;
        self.nodes.get_mut(key).map(|n| &mut n.value)
    }

    /// Front-to-back iteration.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self.id,
            nodes: &self.nodes,
            cursor: self.head,
        }
    }

    /// Mutable access to every stored value, in arena order rather than
    /// list order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.nodes.values_mut().map(|n| &mut n.value)
    }
}

impl<T> Default for BucketList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for BucketList<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter().map(|(_, v)| v)).finish()
    }
}

/// Borrowing iterator yielding `(NodeRef, &T)` in list order.
pub struct Iter<'a, T> {
    list: u64,
    nodes: &'a SlotMap<NodeKey, Node<T>>,
    cursor: Option<NodeKey>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeRef, &'a T);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let key = self.cursor?;
        let node = &self.nodes[key];
        self.cursor = node.next;
        Some((NodeRef { key, list: self.list }, &node.value))
    }
}

/// Owning iterator in list order.
pub struct IntoIter<T> {
    list: BucketList<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;
    #[inline]
    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len(), Some(self.list.len()))
    }
}

impl<T> IntoIterator for BucketList<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;
    fn into_iter(self) -> IntoIter<T> {
        IntoIter { list: self }
    }
}
