#![cfg(test)]

// Property tests for every table kept inside the crate so they can check
// internal counters (used slots, thresholds) alongside the public API.

use crate::config::TableConfig;
use crate::hashing::DefaultHashBuilder;
use crate::open_addressing::{DoubleHashingMap, LinearProbingMap, OpenAddressingMap};
use crate::probing::{gcd, is_prime, DoubleHashing, LinearProbing, Probing, LINEAR_CONSTANT};
use crate::separate_chaining::SeparateChainingMap;
use crate::table::Table;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations so shrinking moves toward earlier keys.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Get(usize),
    Remove(usize),
    Contains(String),
    Clear,
    Snapshot,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            3 => idx.clone().prop_map(Op::Get),
            4 => idx.clone().prop_map(Op::Remove),
            2 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(Op::Contains),
            1 => Just(Op::Snapshot),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

/// Drives `sut` and a `HashMap` model through the same operations,
/// calling `check` after each step.
fn run_model<T, F>(
    sut: &mut T,
    pool: &[String],
    ops: Vec<Op>,
    mut check: F,
) -> Result<(), TestCaseError>
where
    T: Table<Key, i32>,
    F: FnMut(&T) -> Result<(), TestCaseError>,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = Key(pool[i].clone());
                prop_assert_eq!(sut.insert(k.clone(), v), model.insert(k, v));
            }
            Op::Get(i) => {
                let k = Key(pool[i].clone());
                prop_assert_eq!(sut.get(&k).copied(), model.get(&k).copied());
            }
            Op::Remove(i) => {
                let k = Key(pool[i].clone());
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
                prop_assert!(!sut.contains_key(&k));
            }
            Op::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
            Op::Snapshot => {
                let s_keys: BTreeSet<Key> = sut.keys().into_iter().cloned().collect();
                let m_keys: BTreeSet<Key> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
                let mut s_vals: Vec<i32> = sut.values().into_iter().copied().collect();
                let mut m_vals: Vec<i32> = model.values().copied().collect();
                s_vals.sort_unstable();
                m_vals.sort_unstable();
                prop_assert_eq!(s_vals, m_vals);
            }
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        check(&*sut)?;
    }
    Ok(())
}

fn check_open<P: Probing, S>(
    m: &OpenAddressingMap<Key, i32, P, S>,
) -> Result<(), TestCaseError> {
    prop_assert!(m.used_slots() <= m.threshold(), "load factor exceeded");
    prop_assert!(m.threshold() < m.capacity(), "no empty slot left");
    prop_assert!(m.len() <= m.used_slots());
    Ok(())
}

fn check_linear<S>(m: &LinearProbingMap<Key, i32, S>) -> Result<(), TestCaseError> {
    check_open(m)?;
    prop_assert_eq!(gcd(LINEAR_CONSTANT, m.capacity()), 1);
    Ok(())
}

fn check_double<S: BuildHasher>(
    m: &DoubleHashingMap<Key, i32, S>,
) -> Result<(), TestCaseError> {
    check_open(m)?;
    prop_assert!(is_prime(m.capacity()), "capacity {} is not prime", m.capacity());
    Ok(())
}

fn check_chained<S>(m: &SeparateChainingMap<Key, i32, S>) -> Result<(), TestCaseError> {
    prop_assert_eq!(m.bucket_lengths().sum::<usize>(), m.len());
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - insert/get/remove/contains_key agree with the model, including the
//   previous value returned by insert and remove.
// - Snapshots hold exactly the live keys and values.
// - Open addressing: used slots never exceed the threshold, the threshold
//   stays below capacity, and the capacity keeps full-coverage probing.
// - Chaining: bucket lengths sum to len.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_linear_probing((pool, ops) in arb_scenario(), lf in 0.05f64..0.95) {
        let mut sut: LinearProbingMap<Key, i32> =
            LinearProbingMap::with_config(TableConfig::new(0, lf)).unwrap();
        run_model(&mut sut, &pool, ops, check_linear)?;
    }

    #[test]
    fn prop_double_hashing((pool, ops) in arb_scenario(), lf in 0.05f64..0.95) {
        let mut sut: DoubleHashingMap<Key, i32> =
            DoubleHashingMap::with_config(TableConfig::new(0, lf)).unwrap();
        run_model(&mut sut, &pool, ops, check_double)?;
    }

    #[test]
    fn prop_separate_chaining((pool, ops) in arb_scenario(), lf in 0.25f64..4.0) {
        let mut sut: SeparateChainingMap<Key, i32> =
            SeparateChainingMap::with_config(TableConfig::new(0, lf)).unwrap();
        run_model(&mut sut, &pool, ops, check_chained)?;
    }
}

// Collision variant using a constant hasher: every key shares one home slot
// and one bucket, and double hashing falls back to stride 1.
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

// Property: the same model equivalence under worst-case collisions, which
// stresses tombstone skipping, tombstone reuse and lazy relocation along a
// single shared probe path.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_linear_probing_with_collisions((pool, ops) in arb_scenario()) {
        let mut sut: LinearProbingMap<Key, i32, ConstBuildHasher> =
            OpenAddressingMap::with_config_and_hasher(
                TableConfig::new(0, 0.75),
                LinearProbing,
                ConstBuildHasher,
            )
            .unwrap();
        run_model(&mut sut, &pool, ops, check_linear)?;
    }

    #[test]
    fn prop_double_hashing_with_collisions((pool, ops) in arb_scenario()) {
        let mut sut: DoubleHashingMap<Key, i32, ConstBuildHasher> =
            OpenAddressingMap::with_config_and_hasher(
                TableConfig::new(0, 0.75),
                DoubleHashing,
                ConstBuildHasher,
            )
            .unwrap();
        run_model(&mut sut, &pool, ops, check_double)?;
    }

    #[test]
    fn prop_separate_chaining_with_collisions((pool, ops) in arb_scenario()) {
        let mut sut: SeparateChainingMap<Key, i32, ConstBuildHasher> =
            SeparateChainingMap::with_hasher(ConstBuildHasher);
        run_model(&mut sut, &pool, ops, check_chained)?;
    }
}

// Property: lazy relocation is invisible. A read-only `peek` before and a
// relocating `get` after agree for every key, and len/used_slots do not move.
proptest! {
    #[test]
    fn prop_relocation_is_unobservable(
        keys in proptest::collection::vec(0u16..64, 1..40),
        removed in proptest::collection::vec(0u16..64, 0..40),
    ) {
        let mut m: LinearProbingMap<u16, u16, DefaultHashBuilder> = LinearProbingMap::new();
        for &k in &keys {
            m.insert(k, k.wrapping_mul(3));
        }
        for k in &removed {
            m.remove(k);
        }
        let (len, used) = (m.len(), m.used_slots());
        for k in 0u16..64 {
            let before = m.peek(&k).copied();
            prop_assert_eq!(m.get(&k).copied(), before);
            prop_assert_eq!(m.peek(&k).copied(), before);
        }
        prop_assert_eq!(m.len(), len);
        prop_assert_eq!(m.used_slots(), used);
    }
}

#[test]
fn borrowed_key_hashes_like_str() {
    // Borrow<str> lookups rely on Key and str hashing identically.
    let s = DefaultHashBuilder::default();
    assert_eq!(s.hash_one(Key("ab".into())), s.hash_one("ab"));
}
