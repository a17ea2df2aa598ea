use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::{HashMap, HashSet};

fn validate_map<V>(m: &LongMap<V>) {
    let capacity = m.capacity();
    assert!(
        (1..=MAXIMUM_CAPACITY).contains(&capacity),
        "invalid capacity: {capacity}"
    );
    assert_eq!(
        m.threshold,
        threshold_for(capacity, m.load_factor),
        "threshold must track capacity"
    );

    let mut seen: HashSet<i64> = HashSet::new();
    let mut reachable = 0usize;
    for (index, link) in m.buckets.iter().enumerate() {
        for entry in chain(link) {
            assert_eq!(
                bucket_index(entry.key, capacity),
                index,
                "key {} sits in a stale bucket",
                entry.key
            );
            assert!(seen.insert(entry.key), "duplicate key {}", entry.key);
            reachable += 1;
        }
    }

    assert_eq!(reachable, m.len(), "reachable entry count must match LongMap::len");
    assert_eq!(m.iter().count(), m.len());
}

fn key_strategy() -> impl Strategy<Value = i64> {
    // Mostly a small range so that operations collide with live keys and with
    // each other's buckets; the extremes exercise the index function.
    prop_oneof![
        8 => -64i64..64,
        1 => Just(i64::MIN),
        1 => Just(i64::MAX),
        1 => any::<i64>(),
    ]
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 30)]
    Put(#[proptest(strategy = "key_strategy()")] i64, Option<u8>),
    #[proptest(weight = 20)]
    Insert(#[proptest(strategy = "key_strategy()")] i64, Option<u8>),
    #[proptest(weight = 25)]
    Remove(#[proptest(strategy = "key_strategy()")] i64),
    #[proptest(weight = 20)]
    Get(#[proptest(strategy = "key_strategy()")] i64),
    #[proptest(weight = 4)]
    ContainsValue(Option<u8>),
    #[proptest(weight = 1)]
    Clear,
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(
        ops in prop::collection::vec(any::<Op>(), 0..=2000),
        capacity in 1usize..=32,
    ) {
        let mut m: LongMap<Option<u8>> = LongMap::with_capacity(capacity).unwrap();
        let mut model: HashMap<i64, Option<u8>> = HashMap::new();

        for op in ops {
            match op {
                Op::Put(key, value) => {
                    prop_assert_eq!(*m.put(key, value), value);
                    model.insert(key, value);
                }
                Op::Insert(key, value) => {
                    prop_assert_eq!(m.insert(key, value), model.insert(key, value));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(m.remove(key), model.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(m.get(key), model.get(&key));
                    prop_assert_eq!(m.contains_key(key), model.contains_key(&key));
                }
                Op::ContainsValue(value) => {
                    let expected = model.values().any(|v| *v == value);
                    prop_assert_eq!(m.contains_value(&value), expected);
                }
                Op::Clear => {
                    m.clear();
                    model.clear();
                    prop_assert!(m.is_empty());
                    prop_assert_eq!(m.capacity(), DEFAULT_INITIAL_CAPACITY);
                }
            }

            prop_assert_eq!(m.len(), model.len());
        }

        validate_map(&m);

        let keys = m.keys();
        prop_assert_eq!(keys.len(), m.len());
        let mut got: Vec<(i64, Option<u8>)> = keys.into_iter().zip(m.values()).collect();
        got.sort();
        let mut expected: Vec<(i64, Option<u8>)> = model.into_iter().collect();
        expected.sort();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_growth_keeps_entries(
        keys in prop::collection::hash_set(any::<i64>(), 0..500),
        load_factor in 0.25f32..4.0,
    ) {
        let mut m: LongMap<usize> =
            LongMap::with_capacity_and_load_factor(1, load_factor).unwrap();

        for (i, &key) in keys.iter().enumerate() {
            let before = m.capacity();
            let threshold = m.threshold;
            m.put(key, i);
            if m.len() > threshold {
                prop_assert_eq!(m.capacity(), before * 2);
            } else {
                prop_assert_eq!(m.capacity(), before);
            }
        }

        validate_map(&m);
        for (i, &key) in keys.iter().enumerate() {
            prop_assert_eq!(m.get(key), Some(&i));
        }
    }
}

/// Visits every ordering of `items` (Heap's algorithm, iterative).
fn for_each_permutation<T: Clone>(items: &[T], mut visit: impl FnMut(Vec<T>)) {
    let mut order = items.to_vec();
    let mut counters = vec![0usize; order.len()];
    visit(order.clone());

    let mut level = 1;
    while level < order.len() {
        if counters[level] < level {
            let swap_with = if level % 2 == 0 { 0 } else { counters[level] };
            order.swap(swap_with, level);
            visit(order.clone());
            counters[level] += 1;
            level = 1;
        } else {
            counters[level] = 0;
            level += 1;
        }
    }
}

// Keys that all land in one bucket of a single-bucket table, with mirrored
// magnitudes and both extremes.
const CHAIN_KEYS: [i64; 6] = [0, 1, -1, 16, -16, i64::MIN];

#[test]
fn exhaustive_insert_order_single_chain() {
    for_each_permutation(&CHAIN_KEYS, |perm| {
        let mut m: LongMap<usize> =
            LongMap::with_capacity_and_load_factor(1, f32::INFINITY).unwrap();

        for (i, k) in perm.iter().copied().enumerate() {
            assert_eq!(m.insert(k, i), None);
        }

        assert_eq!(m.capacity(), 1);
        validate_map(&m);
        // A single chain keeps insertion order.
        assert_eq!(m.keys(), perm);
        for (i, k) in perm.iter().copied().enumerate() {
            assert_eq!(m.get(k), Some(&i));
        }
    });
}

#[test]
fn exhaustive_remove_order_single_chain() {
    // Insert in a fixed order, then remove in all permutations.
    let mut base: LongMap<usize> =
        LongMap::with_capacity_and_load_factor(1, f32::INFINITY).unwrap();
    for (i, &k) in CHAIN_KEYS.iter().enumerate() {
        assert_eq!(base.insert(k, i), None);
    }

    for_each_permutation(&CHAIN_KEYS, |perm| {
        let mut m = base.clone();
        let mut live: Vec<i64> = CHAIN_KEYS.to_vec();

        for k in perm {
            let expected = CHAIN_KEYS.iter().position(|&c| c == k);
            assert_eq!(m.remove(k), expected);
            assert_eq!(m.remove(k), None);
            live.retain(|&c| c != k);
            assert_eq!(m.keys(), live);
            validate_map(&m);
        }
        assert!(m.is_empty());
        assert!(m.buckets.iter().all(Option::is_none));
    });
}

#[test]
fn clone_keeps_capacity_past_threshold() {
    // One key in a 1-bucket table at load factor 0.25 leaves len above the
    // threshold once the single allowed doubling has happened.
    let mut m: LongMap<i32> = LongMap::with_capacity_and_load_factor(1, 0.25).unwrap();
    m.put(1, 1);
    assert_eq!(m.capacity(), 2);
    assert!(m.len() > m.threshold);

    let copy = m.clone();
    assert_eq!(copy.capacity(), m.capacity());
    assert_eq!(copy.threshold, m.threshold);
    assert_eq!(copy, m);
    validate_map(&copy);

    for k in 2..50 {
        m.put(k, k as i32);
    }
    let copy = m.clone();
    assert_eq!(copy.capacity(), m.capacity());
    assert_eq!(copy.keys(), m.keys());
    validate_map(&copy);
}
