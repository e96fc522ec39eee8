//! EntryList: the backing sequence.
//!
//! A doubly-linked list whose nodes live in a `SlotMap` arena. Nodes are
//! addressed by generational [`EntryKey`]s, which stay valid until the node
//! is unlinked and never alias a node created later. Nodes are never moved
//! by the probe table; it only stores their keys.

use slotmap::{new_key_type, SecondaryMap, SlotMap};

new_key_type! {
    /// Generational key of a node in the entry arena.
    pub(crate) struct EntryKey;
}

#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    prev: Option<EntryKey>,
    next: Option<EntryKey>,
}

#[derive(Debug)]
pub(crate) struct EntryList<K, V> {
    nodes: SlotMap<EntryKey, Node<K, V>>,
    head: Option<EntryKey>,
    tail: Option<EntryKey>,
}

impl<K, V> Default for EntryList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> EntryList<K, V> {
    pub(crate) fn new() -> Self {
        Self::with_capacity(0)
    }

    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(n),
            head: None,
            tail: None,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub(crate) fn head(&self) -> Option<EntryKey> {
        self.head
    }

    #[inline]
    pub(crate) fn tail(&self) -> Option<EntryKey> {
        self.tail
    }

    #[inline]
    pub(crate) fn get(&self, k: EntryKey) -> Option<&Node<K, V>> {
        self.nodes.get(k)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, k: EntryKey) -> Option<&mut Node<K, V>> {
        self.nodes.get_mut(k)
    }

    pub(crate) fn next_of(&self, k: EntryKey) -> Option<EntryKey> {
        self.nodes.get(k).and_then(|n| n.next)
    }

    pub(crate) fn prev_of(&self, k: EntryKey) -> Option<EntryKey> {
        self.nodes.get(k).and_then(|n| n.prev)
    }

    /// Append a node at the tail.
    pub(crate) fn push_back(&mut self, key: K, value: V, hash: u64) -> EntryKey {
        let prev = self.tail;
        let k = self.nodes.insert(Node {
            key,
            value,
            hash,
            prev,
            next: None,
        });
        match prev {
            Some(p) => self.nodes[p].next = Some(k),
            None => self.head = Some(k),
        }
        self.tail = Some(k);
        k
    }

    /// Unlink and return a node. Stale keys yield `None`.
    pub(crate) fn unlink(&mut self, k: EntryKey) -> Option<Node<K, V>> {
        let node = self.nodes.remove(k)?;
        match node.prev {
            Some(p) => self.nodes[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.nodes[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        Some(node)
    }

    /// Drop every node; keeps the arena allocation.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    /// Keys in sequence order.
    pub(crate) fn keys(&self) -> Links<'_, K, V> {
        Links {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.len(),
        }
    }

    pub(crate) fn nodes(&self) -> Nodes<'_, K, V> {
        Nodes { links: self.keys() }
    }

    /// Mutable access to every node in sequence order.
    ///
    /// The arena only lends disjoint `&mut` borrows in slot order, so this
    /// costs O(n) scratch: a position per node, then one pass that drops
    /// each borrow into its sequence position.
    pub(crate) fn nodes_mut(&mut self) -> NodesMut<'_, K, V> {
        let mut position: SecondaryMap<EntryKey, usize> = SecondaryMap::new();
        for (i, k) in self.keys().enumerate() {
            position.insert(k, i);
        }
        let mut ordered: Vec<Option<(&K, &mut V)>> = Vec::with_capacity(self.nodes.len());
        ordered.resize_with(self.nodes.len(), || None);
        for (k, n) in self.nodes.iter_mut() {
            if let Some(&i) = position.get(k) {
                ordered[i] = Some((&n.key, &mut n.value));
            }
        }
        NodesMut {
            it: ordered.into_iter(),
        }
    }

    pub(crate) fn pop_front(&mut self) -> Option<Node<K, V>> {
        self.head.and_then(|k| self.unlink(k))
    }

    pub(crate) fn pop_back(&mut self) -> Option<Node<K, V>> {
        self.tail.and_then(|k| self.unlink(k))
    }
}

/// Walks node keys front to back (or back to front).
pub(crate) struct Links<'a, K, V> {
    list: &'a EntryList<K, V>,
    front: Option<EntryKey>,
    back: Option<EntryKey>,
    remaining: usize,
}

impl<'a, K, V> Clone for Links<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            list: self.list,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Links<'a, K, V> {
    type Item = EntryKey;

    fn next(&mut self) -> Option<EntryKey> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.front?;
        self.front = self.list.next_of(k);
        self.remaining -= 1;
        Some(k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for Links<'a, K, V> {
    fn next_back(&mut self) -> Option<EntryKey> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.back?;
        self.back = self.list.prev_of(k);
        self.remaining -= 1;
        Some(k)
    }
}

pub(crate) struct Nodes<'a, K, V> {
    links: Links<'a, K, V>,
}

impl<'a, K, V> Clone for Nodes<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            links: self.links.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Nodes<'a, K, V> {
    type Item = (EntryKey, &'a Node<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        let list = self.links.list;
        self.links.next().map(|k| (k, &list.nodes[k]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.links.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Nodes<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let list = self.links.list;
        self.links.next_back().map(|k| (k, &list.nodes[k]))
    }
}

// Every position is filled: the list links exactly the arena's nodes.
pub(crate) struct NodesMut<'a, K, V> {
    it: std::vec::IntoIter<Option<(&'a K, &'a mut V)>>,
}

impl<'a, K, V> Iterator for NodesMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().flatten()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for NodesMut<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().flatten()
    }
}
