//! ProbeTable: open-addressed index over the entry arena.
//!
//! Each slot is empty or holds a [`Slot`]: the arena key of an entry and
//! its displacement, stored off by one so that a resident sitting in its
//! ideal slot has displacement 1. Placement follows Robin-Hood order (the
//! entry that has travelled further keeps the slot) and removal uses
//! backward shift, so the table never carries tombstones.
//!
//! The table knows nothing about keys. Callers pass the cached 64-bit hash
//! and, for lookups, a predicate that decides whether a resident matches.

use crate::entry_list::EntryKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Slot {
    /// Probe steps past the ideal slot, plus one. Never zero.
    pub(crate) displacement: usize,
    pub(crate) entry: EntryKey,
}

/// Probe-length statistics for a table snapshot.
#[cfg(any(test, feature = "bench_internal"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProbeStats {
    pub capacity: usize,
    pub occupied: usize,
    /// Largest displacement of any resident (1 = in its ideal slot).
    pub max_displacement: usize,
    pub total_displacement: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct ProbeTable {
    slots: Vec<Option<Slot>>,
    occupied: usize,
}

impl ProbeTable {
    /// `capacity` must be non-zero; callers size it through `capacity`.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            slots: vec![None; capacity],
            occupied: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[cfg(test)]
    pub(crate) fn occupied(&self) -> usize {
        self.occupied
    }

    #[inline]
    fn ideal(&self, hash: u64) -> usize {
        (hash % self.slots.len() as u64) as usize
    }

    #[inline]
    fn next(&self, pos: usize) -> usize {
        let n = pos + 1;
        if n == self.slots.len() {
            0
        } else {
            n
        }
    }

    #[inline]
    pub(crate) fn entry_at(&self, pos: usize) -> Option<EntryKey> {
        self.slots[pos].map(|s| s.entry)
    }

    /// Probe from the ideal slot of `hash`. Returns `Ok(pos)` for the first
    /// resident accepted by `is_match`, or `Err(pos)` for the empty slot
    /// that ends the run.
    pub(crate) fn find(
        &self,
        hash: u64,
        mut is_match: impl FnMut(EntryKey) -> bool,
    ) -> Result<usize, usize> {
        let mut pos = self.ideal(hash);
        loop {
            match self.slots[pos] {
                None => return Err(pos),
                Some(s) if is_match(s.entry) => return Ok(pos),
                Some(_) => pos = self.next(pos),
            }
        }
    }

    /// Robin-Hood placement of a new resident. Returns the slot it lands in.
    ///
    /// The carried resident swaps into any slot whose displacement is
    /// smaller than its own; the evicted resident then continues probing
    /// with its old displacement. The walk ends at the first empty slot.
    /// Requires at least one empty slot.
    pub(crate) fn place(&mut self, hash: u64, entry: EntryKey) -> usize {
        debug_assert!(self.occupied < self.slots.len(), "probe table is full");
        let mut pos = self.ideal(hash);
        let mut carry = Slot {
            displacement: 1,
            entry,
        };
        let mut landed = None;
        loop {
            match self.slots[pos] {
                None => {
                    self.slots[pos] = Some(carry);
                    self.occupied += 1;
                    return landed.unwrap_or(pos);
                }
                Some(ref mut resident) if resident.displacement < carry.displacement => {
                    core::mem::swap(resident, &mut carry);
                    landed.get_or_insert(pos);
                }
                Some(_) => {}
            }
            carry.displacement += 1;
            pos = self.next(pos);
        }
    }

    /// Empty slot `pos` and pull the following run back by one.
    ///
    /// Residents are shifted while their displacement is above 1; a
    /// resident already in its ideal slot ends the shift.
    pub(crate) fn remove_at(&mut self, pos: usize) -> Option<EntryKey> {
        let removed = self.slots[pos].take()?;
        self.occupied -= 1;
        let mut hole = pos;
        loop {
            let next = self.next(hole);
            match self.slots[next] {
                Some(s) if s.displacement > 1 => {
                    self.slots[hole] = Some(Slot {
                        displacement: s.displacement - 1,
                        entry: s.entry,
                    });
                    self.slots[next] = None;
                    hole = next;
                }
                _ => break,
            }
        }
        Some(removed.entry)
    }

    /// Empty every slot; capacity is kept.
    pub(crate) fn clear(&mut self) {
        self.slots.fill(None);
        self.occupied = 0;
    }

    #[cfg(any(test, feature = "bench_internal"))]
    pub(crate) fn residents(&self) -> impl Iterator<Item = (usize, Slot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (i, s)))
    }

    /// Check slot bookkeeping against the cached hash of each resident:
    /// every resident sits `displacement - 1` steps past its ideal slot,
    /// and no resident is more than one step "poorer" than its
    /// predecessor in the run (Robin-Hood ordering).
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self, hash_of: impl Fn(EntryKey) -> u64) {
        let cap = self.capacity();
        assert_eq!(self.residents().count(), self.occupied);
        for (pos, s) in self.residents() {
            assert!(s.displacement >= 1);
            let ideal = self.ideal(hash_of(s.entry));
            assert_eq!(
                (ideal + s.displacement - 1) % cap,
                pos,
                "resident displacement disagrees with its ideal slot"
            );
            let prev = if pos == 0 { cap - 1 } else { pos - 1 };
            match self.slots[prev] {
                Some(p) => assert!(s.displacement <= p.displacement + 1),
                None => assert_eq!(s.displacement, 1),
            }
        }
    }

    #[cfg(any(test, feature = "bench_internal"))]
    pub(crate) fn stats(&self) -> ProbeStats {
        let mut st = ProbeStats {
            capacity: self.capacity(),
            occupied: self.occupied,
            ..ProbeStats::default()
        };
        for (_, s) in self.residents() {
            st.max_displacement = st.max_displacement.max(s.displacement);
            st.total_displacement += s.displacement;
        }
        st
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;
    use std::collections::HashMap;

    struct Fixture {
        keys: SlotMap<EntryKey, u64>,
        table: ProbeTable,
    }

    impl Fixture {
        fn new(cap: usize) -> Self {
            Self {
                keys: SlotMap::with_key(),
                table: ProbeTable::with_capacity(cap),
            }
        }

        fn add(&mut self, hash: u64) -> (EntryKey, usize) {
            let k = self.keys.insert(hash);
            let pos = self.table.place(hash, k);
            (k, pos)
        }

        fn find(&self, k: EntryKey) -> Result<usize, usize> {
            self.table.find(self.keys[k], |e| e == k)
        }

        fn remove(&mut self, k: EntryKey) {
            let pos = self.find(k).expect("resident present");
            assert_eq!(self.table.remove_at(pos), Some(k));
            self.keys.remove(k);
        }

        fn check(&self) {
            self.table.assert_consistent(|k| self.keys[k]);
        }
    }

    /// Invariant: a resident with no collisions lands in its ideal slot with
    /// displacement 1.
    #[test]
    fn place_in_ideal_slot() {
        let mut f = Fixture::new(11);
        let (k, pos) = f.add(25);
        assert_eq!(pos, 3);
        assert_eq!(f.table.slots[3], Some(Slot { displacement: 1, entry: k }));
        assert_eq!(f.find(k), Ok(3));
        f.check();
    }

    /// Invariant: a richer resident is displaced by a poorer newcomer, and
    /// the reported slot is where the newcomer actually lives.
    #[test]
    fn robin_hood_swaps_richer_resident() {
        let mut f = Fixture::new(11);
        // Two residents hashed to slot 2: occupy 2 and 3.
        let (a, _) = f.add(2);
        let (b, _) = f.add(2);
        // Resident ideal at 3 gets pushed to 4 behind b (displacement 2).
        let (c, pos_c) = f.add(3);
        assert_eq!(pos_c, 4);
        // Third resident for slot 2 travels further than c at slot 4 and
        // takes the slot; c moves on to 5.
        let (d, pos_d) = f.add(2);
        assert_eq!(pos_d, 4);
        assert_eq!(f.find(a), Ok(2));
        assert_eq!(f.find(b), Ok(3));
        assert_eq!(f.find(d), Ok(4));
        assert_eq!(f.find(c), Ok(5));
        assert_eq!(f.table.slots[5].map(|s| s.displacement), Some(3));
        f.check();
    }

    /// Invariant: probing wraps past the last slot.
    #[test]
    fn probe_wraps_around() {
        let mut f = Fixture::new(11);
        let (a, _) = f.add(10);
        let (b, pos_b) = f.add(10);
        assert_eq!(pos_b, 0);
        assert_eq!(f.find(a), Ok(10));
        assert_eq!(f.find(b), Ok(0));
        f.check();
        f.remove(a);
        assert_eq!(f.find(b), Ok(10));
        f.check();
    }

    /// Invariant: backward shift pulls displaced residents home and stops at a
    /// resident already in its ideal slot.
    #[test]
    fn backward_shift_stops_at_home_resident() {
        let mut f = Fixture::new(11);
        let (a, _) = f.add(1);
        let (b, _) = f.add(1); // slot 2, displacement 2
        let (c, _) = f.add(3); // slot 3, displacement 1
        f.remove(a);
        assert_eq!(f.find(b), Ok(1));
        assert_eq!(f.find(c), Ok(3));
        assert_eq!(f.table.entry_at(2), None);
        f.check();
    }

    /// Invariant: a lookup for an absent hash stops at the empty slot ending
    /// the run.
    #[test]
    fn miss_stops_at_empty_slot() {
        let mut f = Fixture::new(11);
        f.add(4);
        f.add(4);
        assert_eq!(f.table.find(4, |_| false), Err(6));
        assert_eq!(f.table.find(7, |_| false), Err(7));
    }

    /// Invariant: clear empties every slot but keeps the capacity.
    #[test]
    fn clear_keeps_capacity() {
        let mut f = Fixture::new(23);
        for h in 0..10 {
            f.add(h * 7);
        }
        f.table.clear();
        assert_eq!(f.table.capacity(), 23);
        assert_eq!(f.table.occupied(), 0);
        assert_eq!(f.table.residents().count(), 0);
    }

    /// Invariant: interleaved placements and removals with heavy collisions
    /// keep every remaining resident findable and the run ordering intact.
    #[test]
    fn churn_under_collisions() {
        let mut f = Fixture::new(47);
        let mut live: HashMap<EntryKey, u64> = HashMap::new();
        let mut s = 7u64;
        for round in 0..400 {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            if live.len() < 23 && (round % 3 != 2 || live.is_empty()) {
                // Few distinct ideal slots to force long runs.
                let (k, _) = f.add((s >> 33) % 5 * 9);
                live.insert(k, f.keys[k]);
            } else {
                let victim = *live.keys().next().expect("non-empty");
                f.remove(victim);
                live.remove(&victim);
            }
            f.check();
            for &k in live.keys() {
                assert!(f.find(k).is_ok());
            }
        }
    }

    #[test]
    fn stats_report_displacement() {
        let mut f = Fixture::new(11);
        f.add(0);
        f.add(0);
        f.add(0);
        let st = f.table.stats();
        assert_eq!(st.capacity, 11);
        assert_eq!(st.occupied, 3);
        assert_eq!(st.max_displacement, 3);
        assert_eq!(st.total_displacement, 6);
    }
}
