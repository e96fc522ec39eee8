//! robin-hashmap: an insertion-ordered hash map whose index is a
//! Robin-Hood open-addressing table over a linked entry arena.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: expected O(1) insert, lookup, and remove, plus iteration in a
//!   stable order that does not depend on how the probe table is laid out.
//! - Layers:
//!   - EntryList<K, V>: doubly-linked list of `(key, value, hash)` nodes in
//!     a `SlotMap` arena. Owns the data and defines iteration order.
//!   - ProbeTable: slots holding `(displacement, entry key)`. Robin-Hood
//!     placement, backward-shift removal, no tombstones.
//!   - capacity: odd prime table sizes starting at 11, grown to the next
//!     prime >= 2c + 1 once the load factor passes one half.
//!   - RobinHashMap<K, V, S>: public API; keeps the list and the table in
//!     bijection across every call.
//!
//! Constraints
//! - Every live entry is referenced by exactly one occupied slot, and
//!   every occupied slot references a live entry.
//! - `2 * len <= capacity` after every call; capacity is an odd prime >= 11.
//! - Entries never move in the arena. Growth rebuilds only the table, so
//!   `Handle`s survive it.
//! - One entry per key: inserting an existing key replaces its value in
//!   place and keeps its position.
//! - No unsafe code.
//!
//! Hasher and rehashing invariants
//! - Each entry stores its `u64` hash at insertion. Growth and clone re-place
//!   entries by the stored hash, so `K: Hash` and `S: BuildHasher` run only
//!   on the way in. A cloned `S` must hash like the original.
//!
//! Reentrancy policy
//! - Methods that call user code (`K: Hash`, `K: Eq`) enter a debug-only
//!   guard. User code always runs before the structure is touched, so a
//!   nested call would only observe a consistent map, but nesting is still
//!   reported in debug builds.
//!
//! Notes and non-goals
//! - Not thread-safe; share behind external locking.
//! - The table never shrinks; `clear` keeps its capacity.
//! - Keys are immutable post-insert; there is no `key_mut`.

mod capacity;
mod entry_list;
pub mod iter;
mod probe_table;
mod reentrancy;
mod robin_hash_map;
mod robin_hash_map_proptest;

// Public surface
pub use capacity::MIN_CAPACITY;
#[cfg(feature = "bench_internal")]
pub use probe_table::ProbeStats;
pub use robin_hash_map::{Handle, KeyNotFound, RobinHashMap};
