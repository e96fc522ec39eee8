// RobinHashMap property tests against the public API.
//
// Property 1: lookup and a linear scan of the sequence agree.
//  - Model: std HashMap for contents, Vec for order.
//  - Invariant: for every key in the pool, find(k) is Some iff the
//    sequence contains k, and the handle's value equals the scanned value.
//  - Invariant: 2 * len <= capacity after each op.
//
// Property 2: copies are independent.
//  - Operations applied to a clone never show up in the original, and
//    vice versa; clone_from restores equality.
use proptest::prelude::*;
use robin_hashmap::RobinHashMap;
use std::collections::HashMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u8, u32),
    Remove(u8),
    Touch(u8),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<u8>(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        any::<u8>().prop_map(Op::Remove),
        any::<u8>().prop_map(Op::Touch),
    ]
}

fn apply(m: &mut RobinHashMap<u8, u32>, op: &Op) {
    match *op {
        Op::Insert(k, v) => {
            m.insert(k, v);
        }
        Op::Remove(k) => {
            m.remove(&k);
        }
        Op::Touch(k) => {
            let v = m.get_or_insert_default(k);
            *v = v.wrapping_add(1);
        }
    }
}

// Property 1: find agrees with a linear scan of the sequence.
proptest! {
    #[test]
    fn prop_find_agrees_with_scan(ops in proptest::collection::vec(arb_op(), 1..300)) {
        let mut m: RobinHashMap<u8, u32> = RobinHashMap::new();
        let mut contents: HashMap<u8, u32> = HashMap::new();
        let mut order: Vec<u8> = Vec::new();

        for op in &ops {
            apply(&mut m, op);
            match *op {
                Op::Insert(k, v) => {
                    if contents.insert(k, v).is_none() {
                        order.push(k);
                    }
                }
                Op::Remove(k) => {
                    if contents.remove(&k).is_some() {
                        order.retain(|&o| o != k);
                    }
                }
                Op::Touch(k) => {
                    let e = contents.entry(k).or_insert_with(|| {
                        order.push(k);
                        0
                    });
                    *e = e.wrapping_add(1);
                }
            }
            prop_assert!(2 * m.len() <= m.capacity());
            prop_assert_eq!(m.len(), contents.len());
        }

        let scanned: Vec<(u8, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(scanned.iter().map(|(k, _)| *k).collect::<Vec<_>>(), order);
        for k in 0..=u8::MAX {
            let by_scan = scanned.iter().find(|(sk, _)| *sk == k).map(|(_, v)| *v);
            let by_find = m.find(&k).and_then(|h| h.value(&m).copied());
            prop_assert_eq!(by_find, by_scan);
            prop_assert_eq!(by_find, contents.get(&k).copied());
        }
    }
}

// Property 2: copies are independent; clone_from restores equality.
proptest! {
    #[test]
    fn prop_copies_are_independent(
        seed in proptest::collection::vec(arb_op(), 0..100),
        on_copy in proptest::collection::vec(arb_op(), 0..50),
        on_original in proptest::collection::vec(arb_op(), 0..50),
    ) {
        let mut original = RobinHashMap::new();
        for op in &seed {
            apply(&mut original, op);
        }
        let snapshot: Vec<(u8, u32)> = original.iter().map(|(k, v)| (*k, *v)).collect();

        let mut copy = original.clone();
        prop_assert_eq!(&copy, &original);
        for op in &on_copy {
            apply(&mut copy, op);
        }
        let after_original: Vec<(u8, u32)> = original.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(&after_original, &snapshot);

        let copy_state: Vec<(u8, u32)> = copy.iter().map(|(k, v)| (*k, *v)).collect();
        for op in &on_original {
            apply(&mut original, op);
        }
        let copy_after: Vec<(u8, u32)> = copy.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(copy_after, copy_state);

        copy.clone_from(&original);
        prop_assert!(copy.iter().eq(original.iter()));
        prop_assert!(2 * copy.len() <= copy.capacity());
    }
}
