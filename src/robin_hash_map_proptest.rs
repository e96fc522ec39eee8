#![cfg(test)]

// Property tests for RobinHashMap kept inside the crate so they can call
// the crate-private invariant checker after every step.

use crate::robin_hash_map::{KeyNotFound, RobinHashMap};
use proptest::prelude::*;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, i32),
    Remove(u16),
    GetOrDefault(u16),
    At(u16),
    Mutate(u16, i32),
    PopFront,
    PopBack,
    RetainEven,
    Clear,
    CloneSwap,
}

fn arb_ops(key_space: u16) -> impl Strategy<Value = Vec<Op>> {
    let key = 0..key_space;
    let op = prop_oneof![
        6 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => key.clone().prop_map(Op::Remove),
        2 => key.clone().prop_map(Op::GetOrDefault),
        2 => key.clone().prop_map(Op::At),
        2 => (key, any::<i32>()).prop_map(|(k, d)| Op::Mutate(k, d)),
        1 => Just(Op::PopFront),
        1 => Just(Op::PopBack),
        1 => Just(Op::RetainEven),
        1 => Just(Op::Clear),
        1 => Just(Op::CloneSwap),
    ];
    proptest::collection::vec(op, 1..200)
}

/// Ordered model: a vector of pairs in sequence order.
#[derive(Default)]
struct Model(Vec<(u16, i32)>);

impl Model {
    fn pos(&self, k: u16) -> Option<usize> {
        self.0.iter().position(|&(mk, _)| mk == k)
    }

    fn get(&self, k: u16) -> Option<i32> {
        self.pos(k).map(|i| self.0[i].1)
    }
}

// Runs one scenario against the model and checks, after every op:
// - structural invariants (bijection, load factor, prime capacity,
//   Robin-Hood ordering, cached hashes);
// - iteration equals the model sequence exactly, in both directions;
// - len/is_empty parity.
fn run<S>(mut sut: RobinHashMap<u16, i32, S>, ops: Vec<Op>) -> Result<(), TestCaseError>
where
    S: BuildHasher + Clone,
{
    let mut model = Model::default();
    for op in ops {
        match op {
            Op::Insert(k, v) => {
                let prev = sut.insert(k, v);
                match model.pos(k) {
                    Some(i) => {
                        prop_assert_eq!(prev, Some(model.0[i].1));
                        model.0[i].1 = v;
                    }
                    None => {
                        prop_assert_eq!(prev, None);
                        model.0.push((k, v));
                    }
                }
            }
            Op::Remove(k) => {
                let got = sut.remove(&k);
                let want = model.pos(k).map(|i| model.0.remove(i).1);
                prop_assert_eq!(got, want);
                prop_assert!(sut.find(&k).is_none());
            }
            Op::GetOrDefault(k) => {
                let v = *sut.get_or_insert_default(k);
                match model.get(k) {
                    Some(mv) => prop_assert_eq!(v, mv),
                    None => {
                        prop_assert_eq!(v, 0);
                        model.0.push((k, 0));
                    }
                }
            }
            Op::At(k) => {
                let before = sut.len();
                match model.get(k) {
                    Some(mv) => prop_assert_eq!(sut.at(&k), Ok(&mv)),
                    None => prop_assert_eq!(sut.at(&k), Err(KeyNotFound)),
                }
                prop_assert_eq!(sut.len(), before);
            }
            Op::Mutate(k, d) => {
                if let Some(h) = sut.find(&k) {
                    let v = h.value_mut(&mut sut).expect("live handle resolves");
                    *v = v.wrapping_add(d);
                    let i = model.pos(k).expect("present in model");
                    model.0[i].1 = model.0[i].1.wrapping_add(d);
                } else {
                    prop_assert!(model.pos(k).is_none());
                }
            }
            Op::PopFront => {
                let want = if model.0.is_empty() {
                    None
                } else {
                    Some(model.0.remove(0))
                };
                prop_assert_eq!(sut.pop_front(), want);
            }
            Op::PopBack => {
                prop_assert_eq!(sut.pop_back(), model.0.pop());
            }
            Op::RetainEven => {
                sut.retain(|_, v| *v % 2 == 0);
                model.0.retain(|&(_, v)| v % 2 == 0);
            }
            Op::Clear => {
                let cap = sut.capacity();
                sut.clear();
                model.0.clear();
                prop_assert_eq!(sut.capacity(), cap);
            }
            Op::CloneSwap => {
                let copy = sut.clone();
                copy.assert_invariants();
                prop_assert!(copy.iter().eq(sut.iter()));
                sut = copy;
            }
        }

        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.0.len());
        prop_assert_eq!(sut.is_empty(), model.0.is_empty());
        prop_assert!(sut.iter().map(|(k, v)| (*k, *v)).eq(model.0.iter().copied()));
        prop_assert!(sut
            .iter()
            .rev()
            .map(|(k, v)| (*k, *v))
            .eq(model.0.iter().rev().copied()));
    }
    Ok(())
}

// Constant hasher: every key probes from slot 0, so every run is one long
// chain and each removal shifts the whole tail.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Few distinct hashes: several overlapping clusters that wrap around the
// end of small tables.
#[derive(Clone, Default)]
struct CoarseBuildHasher;
struct CoarseHasher(u64);
impl BuildHasher for CoarseBuildHasher {
    type Hasher = CoarseHasher;
    fn build_hasher(&self) -> Self::Hasher {
        CoarseHasher(0)
    }
}
impl Hasher for CoarseHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_mul(31).wrapping_add(b as u64);
        }
    }
    fn finish(&self) -> u64 {
        // Land near the end of an 11- or 23-slot table.
        10 + (self.0 % 4) * 11
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_matches_ordered_model(ops in arb_ops(64)) {
        run(RobinHashMap::<u16, i32, RandomState>::new(), ops)?;
    }

    #[test]
    fn prop_matches_ordered_model_with_collisions(ops in arb_ops(24)) {
        run(RobinHashMap::with_hasher(ConstBuildHasher), ops)?;
    }

    #[test]
    fn prop_matches_ordered_model_with_wrapping_clusters(ops in arb_ops(40)) {
        run(RobinHashMap::with_hasher(CoarseBuildHasher), ops)?;
    }

    // Growth from an empty map never loses an entry or a value.
    #[test]
    fn prop_growth_preserves_contents(keys in proptest::collection::hash_set(any::<u32>(), 0..600)) {
        let mut m = RobinHashMap::new();
        let keys: Vec<u32> = keys.into_iter().collect();
        for &k in &keys {
            m.insert(k, u64::from(k) * 2);
        }
        m.assert_invariants();
        prop_assert_eq!(m.len(), keys.len());
        for &k in &keys {
            prop_assert_eq!(m.at(&k), Ok(&(u64::from(k) * 2)));
        }
        prop_assert!(m.keys().copied().eq(keys.iter().copied()));
    }
}
