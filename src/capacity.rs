//! Capacity controller: table sizing and growth policy.
//!
//! Probe-table capacities are always odd primes no smaller than
//! [`MIN_CAPACITY`]. Prime sizes keep `hash % capacity` from collapsing
//! onto a few residues when the low bits of the hash are poorly mixed.
//! The maximum load factor is one half: a table of capacity `c` holds at
//! most `c / 2` entries.

/// Smallest capacity a probe table is ever allocated with.
pub const MIN_CAPACITY: usize = 11;

/// Trial division up to `sqrt(n)`.
pub(crate) fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut i = 3usize;
    while i.saturating_mul(i) <= n {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// Smallest odd prime `>= n`, never below [`MIN_CAPACITY`].
///
/// Panics with "capacity overflow" if no such prime fits in `usize`.
pub(crate) fn prime_at_least(n: usize) -> usize {
    let mut c = n.max(MIN_CAPACITY) | 1;
    while !is_prime(c) {
        c = c.checked_add(2).expect("capacity overflow");
    }
    c
}

/// Capacity the table grows to once `current` is exceeded.
pub(crate) fn grown(current: usize) -> usize {
    prime_at_least(current.saturating_mul(2).saturating_add(1))
}

/// True when `len` entries no longer fit under the load-factor ceiling.
#[inline]
pub(crate) fn over_loaded(len: usize, capacity: usize) -> bool {
    len.saturating_mul(2) > capacity
}

/// Capacity that holds `len` entries without a rebuild.
pub(crate) fn for_len(len: usize) -> usize {
    prime_at_least(len.saturating_mul(2))
}

/// Capacity used when copying a map of `len` entries.
pub(crate) fn for_copy(len: usize) -> usize {
    prime_at_least(len.saturating_mul(3))
}
