//! RobinHashMap: Robin-Hood probe table over an ordered entry arena.

use crate::capacity;
use crate::entry_list::{EntryKey, EntryList};
use crate::iter::{Drain, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use crate::probe_table::ProbeTable;
#[cfg(any(test, feature = "bench_internal"))]
use crate::probe_table::ProbeStats;
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use core::ops::Index;
use std::collections::hash_map::RandomState;

/// Returned by [`RobinHashMap::at`] when the key is absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("key not found")]
pub struct KeyNotFound;

/// Stable reference to an entry.
///
/// A handle stays valid across inserts, removals of other entries, and
/// table growth. Once its entry is removed the handle resolves to `None`,
/// and it never aliases an entry inserted later.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(EntryKey);

impl Handle {
    pub fn key<'a, K, V, S>(&self, map: &'a RobinHashMap<K, V, S>) -> Option<&'a K> {
        map.core.entries.get(self.0).map(|n| &n.key)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a RobinHashMap<K, V, S>) -> Option<&'a V> {
        map.core.entries.get(self.0).map(|n| &n.value)
    }

    pub fn value_mut<'a, K, V, S>(
        &self,
        map: &'a mut RobinHashMap<K, V, S>,
    ) -> Option<&'a mut V> {
        map.core.entries.get_mut(self.0).map(|n| &mut n.value)
    }
}

/// Probe table and entry list, kept consistent with each other.
///
/// Nothing here hashes keys: every entry carries its hash from the moment
/// it was inserted, and growth re-places entries by that cached hash.
struct Core<K, V> {
    table: ProbeTable,
    entries: EntryList<K, V>,
}

impl<K, V> Core<K, V> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            table: ProbeTable::with_capacity(capacity),
            entries: EntryList::new(),
        }
    }

    fn lookup<Q>(&self, hash: u64, q: &Q) -> Option<EntryKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let entries = &self.entries;
        let pos = self
            .table
            .find(hash, |k| {
                entries
                    .get(k)
                    .map(|n| n.hash == hash && n.key.borrow() == q)
                    .unwrap_or(false)
            })
            .ok()?;
        self.table.entry_at(pos)
    }

    /// Append a fresh entry. The caller has checked the key is absent.
    fn push(&mut self, key: K, value: V, hash: u64) -> EntryKey {
        let k = self.entries.push_back(key, value, hash);
        self.table.place(hash, k);
        if capacity::over_loaded(self.entries.len(), self.table.capacity()) {
            self.rebuild(capacity::grown(self.table.capacity()));
        }
        k
    }

    /// Unlink one entry from both structures.
    fn remove(&mut self, k: EntryKey) -> Option<(K, V)> {
        let hash = self.entries.get(k)?.hash;
        let pos = self
            .table
            .find(hash, |e| e == k)
            .expect("live entry missing from probe table");
        self.table.remove_at(pos);
        let node = self
            .entries
            .unlink(k)
            .expect("probe table referenced a dead entry");
        Some((node.key, node.value))
    }

    /// Swap in a fresh table of `capacity` slots and re-place every entry
    /// in sequence order. Entry nodes, and therefore handles, are untouched.
    fn rebuild(&mut self, capacity: usize) {
        log::debug!(
            "rebuilding probe table: capacity {} -> {}, {} entries",
            self.table.capacity(),
            capacity,
            self.entries.len()
        );
        let mut table = ProbeTable::with_capacity(capacity);
        for (k, node) in self.entries.nodes() {
            table.place(node.hash, k);
        }
        self.table = table;
    }

    fn clear(&mut self) {
        self.table.clear();
        self.entries.clear();
    }
}

/// Insertion-ordered hash map with a Robin-Hood open-addressing index.
///
/// Lookups, inserts, and removals are expected O(1). Iteration yields live
/// entries in the order they were appended; removing an entry never
/// reorders the others, and re-inserting a removed key appends it again.
pub struct RobinHashMap<K, V, S = RandomState> {
    hasher: S,
    core: Core<K, V>,
    reentrancy: DebugReentrancy,
}

impl<K, V> RobinHashMap<K, V, RandomState> {
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    /// Map that holds `n` entries before its first rebuild.
    pub fn with_capacity(n: usize) -> Self {
        Self::with_capacity_and_hasher(n, RandomState::new())
    }
}

impl<K, V, S: Default> Default for RobinHashMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> RobinHashMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            core: Core::with_capacity(capacity::MIN_CAPACITY),
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn with_capacity_and_hasher(n: usize, hasher: S) -> Self {
        let cap = capacity::for_len(n);
        log::trace!("sizing probe table for {} entries: capacity {}", n, cap);
        Self {
            hasher,
            core: Core {
                table: ProbeTable::with_capacity(cap),
                entries: EntryList::with_capacity(n),
            },
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.core.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.entries.is_empty()
    }

    /// Number of probe-table slots. Always an odd prime, at least twice `len()`.
    pub fn capacity(&self) -> usize {
        self.core.table.capacity()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Make room for `additional` more entries without a rebuild.
    pub fn reserve(&mut self, additional: usize) {
        let want = self.len().saturating_add(additional);
        if capacity::over_loaded(want, self.capacity()) {
            self.core.rebuild(capacity::for_len(want));
        }
    }

    /// Remove every entry. The probe table keeps its capacity.
    pub fn clear(&mut self) {
        self.core.clear();
    }

    /// Remove every entry, yielding them in sequence order.
    ///
    /// Nodes are popped out of the existing arena rather than swapping in a
    /// new one, so handles taken before the drain never resolve again.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        self.core.table.clear();
        let mut items = Vec::with_capacity(self.len());
        while let Some(n) = self.core.entries.pop_front() {
            items.push((n.key, n.value));
        }
        Drain {
            items: items.into_iter(),
            _pd: PhantomData,
        }
    }

    /// Keep only the entries for which `f` returns true. Survivors keep
    /// their order.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut cursor = self.core.entries.head();
        while let Some(k) = cursor {
            cursor = self.core.entries.next_of(k);
            let keep = match self.core.entries.get_mut(k) {
                Some(n) => f(&n.key, &mut n.value),
                None => true,
            };
            if !keep {
                self.core.remove(k);
            }
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: self.core.entries.nodes(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            nodes: self.core.entries.nodes_mut(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        let n = self.core.entries.get(self.core.entries.head()?)?;
        Some((&n.key, &n.value))
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        let n = self.core.entries.get(self.core.entries.tail()?)?;
        Some((&n.key, &n.value))
    }

    pub fn pop_front(&mut self) -> Option<(K, V)> {
        let k = self.core.entries.head()?;
        self.core.remove(k)
    }

    pub fn pop_back(&mut self) -> Option<(K, V)> {
        let k = self.core.entries.tail()?;
        self.core.remove(k)
    }

    pub fn first_handle(&self) -> Option<Handle> {
        self.core.entries.head().map(Handle)
    }

    pub fn last_handle(&self) -> Option<Handle> {
        self.core.entries.tail().map(Handle)
    }

    /// Handle of the entry after `h`, or `None` at the end or if `h` is stale.
    pub fn next_handle(&self, h: Handle) -> Option<Handle> {
        self.core.entries.next_of(h.0).map(Handle)
    }

    /// Handle of the entry before `h`, or `None` at the start or if `h` is stale.
    pub fn prev_handle(&self, h: Handle) -> Option<Handle> {
        self.core.entries.prev_of(h.0).map(Handle)
    }

    /// Remove the entry behind `h`. Stale handles are a no-op.
    pub fn remove_handle(&mut self, h: Handle) -> Option<(K, V)> {
        self.core.remove(h.0)
    }

    #[cfg(any(test, feature = "bench_internal"))]
    pub fn probe_stats(&self) -> ProbeStats {
        self.core.table.stats()
    }
}

impl<K, V, S> RobinHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn locate<Q>(&self, q: &Q) -> Option<EntryKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.core.lookup(hash, q)
    }

    /// Handle of the entry for `q`, or `None` (the end of the sequence).
    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("find");
        self.locate(q).map(Handle)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("contains_key");
        self.locate(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get");
        let k = self.locate(q)?;
        self.core.entries.get(k).map(|n| &n.value)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get_key_value");
        let k = self.locate(q)?;
        self.core.entries.get(k).map(|n| (&n.key, &n.value))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get_mut");
        let k = self.locate(q)?;
        self.core.entries.get_mut(k).map(|n| &mut n.value)
    }

    /// Value for `q`, or [`KeyNotFound`]. Never modifies the map.
    pub fn at<Q>(&self, q: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("at");
        let k = self.locate(q).ok_or(KeyNotFound)?;
        self.core
            .entries
            .get(k)
            .map(|n| &n.value)
            .ok_or(KeyNotFound)
    }

    pub fn at_mut<Q>(&mut self, q: &Q) -> Result<&mut V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("at_mut");
        let k = self.locate(q).ok_or(KeyNotFound)?;
        self.core
            .entries
            .get_mut(k)
            .map(|n| &mut n.value)
            .ok_or(KeyNotFound)
    }

    /// Insert or update.
    ///
    /// A new key is appended at the end of the sequence and `None` is
    /// returned. An existing key keeps its position; its value is replaced
    /// and the old value returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let _g = self.reentrancy.enter("insert");
        let hash = self.make_hash(&key);
        match self.core.lookup(hash, &key) {
            Some(k) => {
                let n = self
                    .core
                    .entries
                    .get_mut(k)
                    .expect("probe table referenced a dead entry");
                Some(core::mem::replace(&mut n.value, value))
            }
            None => {
                self.core.push(key, value, hash);
                None
            }
        }
    }

    /// Value for `key`, inserting `default()` first if the key is absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter("get_or_insert_with");
        let hash = self.make_hash(&key);
        let k = match self.core.lookup(hash, &key) {
            Some(k) => k,
            None => self.core.push(key, default(), hash),
        };
        &mut self
            .core
            .entries
            .get_mut(k)
            .expect("entry was just located or inserted")
            .value
    }

    /// Value for `key`, inserting `V::default()` first if the key is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Remove `q` and return its value. Absent keys are a no-op.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = {
            let _g = self.reentrancy.enter("remove");
            self.locate(q)?
        };
        self.core.remove(k)
    }

    /// Check every structural invariant; panics on the first violation.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        use std::collections::HashSet;

        let len = self.len();
        let cap = self.capacity();
        assert!(cap >= capacity::MIN_CAPACITY && cap % 2 == 1);
        assert!(capacity::is_prime(cap), "capacity {cap} is not prime");
        assert!(!capacity::over_loaded(len, cap), "load factor exceeded");

        // Slots and sequence nodes are in bijection.
        assert_eq!(self.core.table.occupied(), len);
        let mut referenced = HashSet::new();
        for (_, slot) in self.core.table.residents() {
            assert!(self.core.entries.get(slot.entry).is_some());
            assert!(referenced.insert(slot.entry), "entry referenced twice");
        }
        let forward: Vec<EntryKey> = self.core.entries.keys().collect();
        let backward: Vec<EntryKey> = self.core.entries.keys().rev().collect();
        assert_eq!(forward.len(), len);
        assert!(forward.iter().eq(backward.iter().rev()));
        for k in &forward {
            assert!(referenced.contains(k));
        }

        self.core
            .table
            .assert_consistent(|k| self.core.entries.get(k).map(|n| n.hash).unwrap_or(0));

        for (k, node) in self.core.entries.nodes() {
            assert_eq!(self.make_hash(&node.key), node.hash, "stale cached hash");
            assert_eq!(self.core.lookup(node.hash, &node.key), Some(k));
        }
    }
}

impl<K, V, S> Clone for RobinHashMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    /// Deep copy into a table sized for three times the source length.
    /// The hasher is cloned, so cached hashes carry over unchanged.
    fn clone(&self) -> Self {
        let cap = capacity::for_copy(self.len());
        log::trace!("copying {} entries into capacity {}", self.len(), cap);
        let mut out = Self {
            hasher: self.hasher.clone(),
            core: Core {
                table: ProbeTable::with_capacity(cap),
                entries: EntryList::with_capacity(self.len()),
            },
            reentrancy: DebugReentrancy::new(),
        };
        for (_, n) in self.core.entries.nodes() {
            out.core.push(n.key.clone(), n.value.clone(), n.hash);
        }
        out
    }

    fn clone_from(&mut self, source: &Self) {
        let cap = capacity::for_copy(source.len());
        log::trace!("assigning {} entries into capacity {}", source.len(), cap);
        self.core.clear();
        self.hasher = source.hasher.clone();
        self.core.table = ProbeTable::with_capacity(cap);
        for (_, n) in source.core.entries.nodes() {
            self.core.push(n.key.clone(), n.value.clone(), n.hash);
        }
    }
}

impl<K, V, S> fmt::Debug for RobinHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Equal when both maps hold the same key/value pairs, in any order.
impl<K, V, S> PartialEq for RobinHashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |ov| v == ov))
    }
}

impl<K, V, S> Eq for RobinHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, Q, V, S> Index<&Q> for RobinHashMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    /// Panics if the key is absent; use [`RobinHashMap::at`] to get an error
    /// instead.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V, S> Extend<(K, V)> for RobinHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Nothing is reserved from the size hint; repeated keys would leave a
    /// table that never shrinks. Growth follows the load-factor rule.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, S> Extend<(&'a K, &'a V)> for RobinHashMap<K, V, S>
where
    K: Eq + Hash + Copy,
    V: Copy,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: I) {
        self.extend(iter.into_iter().map(|(&k, &v)| (k, v)));
    }
}

impl<K, V, S> FromIterator<(K, V)> for RobinHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::with_hasher(S::default());
        m.extend(iter);
        m
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for RobinHashMap<K, V, RandomState>
where
    K: Eq + Hash,
{
    fn from(arr: [(K, V); N]) -> Self {
        let mut m = Self::new();
        m.extend(arr);
        m
    }
}

impl<K, V, S> IntoIterator for RobinHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            list: self.core.entries,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a RobinHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut RobinHashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}
