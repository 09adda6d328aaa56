//! OpenAddressingMap: flat slot array with pluggable probing, tombstones and
//! lazy relocation.
//!
//! Slot states
//! - `Empty`: never written since the last allocation or `clear`. Ends a
//!   probe walk.
//! - `Occupied(k, v)`: a live entry.
//! - `Tombstone`: a removed entry. Skipped by probe walks, reusable by
//!   inserts.
//!
//! Counters
//! - `len`: occupied slots.
//! - `used_slots`: occupied plus tombstoned slots. An insert grows the table
//!   first when `used_slots >= threshold`, where
//!   `threshold = floor(capacity * max_load_factor)`.
//!
//! Termination
//! - The load factor is below 1, so `threshold < capacity` and at least one
//!   slot is always `Empty`.
//! - The strategy keeps the capacity such that its probe sequence visits
//!   every slot before repeating. Together these make every walk end on the
//!   key or on an empty slot within `capacity` visits.
//!
//! Lazy relocation
//! - A walk remembers the first tombstone it passes. When the key is found
//!   further along, `get` and `insert` move the entry into that tombstone
//!   and bury the old slot, shortening the next walk for the same key.

use crate::config::{threshold, ConfigError, TableConfig};
use crate::hashing::{normalize, primary_hash, DefaultHashBuilder};
use crate::probing::{DoubleHashing, LinearProbing, Probing};
use crate::reentrancy::DebugReentrancy;
use crate::table::Table;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use tracing::{debug, trace};

/// Minimum capacity of an open-addressing table.
pub const DEFAULT_CAPACITY: usize = 7;
/// Load factor used by `new`, `with_hasher` and `Default`.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.65;

#[derive(Debug, Clone)]
enum Slot<K, V> {
    Empty,
    Occupied(K, V),
    Tombstone,
}

impl<K, V> Slot<K, V> {
    /// Turns an occupied slot into a tombstone and returns its entry.
    fn bury(&mut self) -> Option<(K, V)> {
        match mem::replace(self, Slot::Tombstone) {
            Slot::Occupied(k, v) => Some((k, v)),
            other => {
                *self = other;
                None
            }
        }
    }

    fn entry(&self) -> Option<(&K, &V)> {
        match self {
            Slot::Occupied(k, v) => Some((k, v)),
            _ => None,
        }
    }

    fn entry_mut(&mut self) -> Option<(&K, &mut V)> {
        match self {
            Slot::Occupied(k, v) => Some((k, v)),
            _ => None,
        }
    }
}

/// Outcome of a probe walk. `tombstone` is the first tombstone passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Found {
        index: usize,
        tombstone: Option<usize>,
    },
    Vacant {
        index: usize,
        tombstone: Option<usize>,
    },
}

pub struct OpenAddressingMap<K, V, P = LinearProbing, S = DefaultHashBuilder> {
    hasher: S,
    probing: P,
    slots: Vec<Slot<K, V>>,
    max_load_factor: f64,
    threshold: usize,
    used_slots: usize,
    len: usize,
    modifications: u64,
    reentrancy: DebugReentrancy,
}

/// Open addressing with a fixed stride of 17.
pub type LinearProbingMap<K, V, S = DefaultHashBuilder> =
    OpenAddressingMap<K, V, LinearProbing, S>;

/// Open addressing with a per-key stride from a secondary hash.
pub type DoubleHashingMap<K, V, S = DefaultHashBuilder> =
    OpenAddressingMap<K, V, DoubleHashing, S>;

fn empty_slots<K, V>(capacity: usize) -> Vec<Slot<K, V>> {
    (0..capacity).map(|_| Slot::Empty).collect()
}

impl<K, V, P> OpenAddressingMap<K, V, P>
where
    K: Eq + Hash,
    P: Probing + Default,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(config, P::default(), Default::default())
    }
}

impl<K, V, P, S> Default for OpenAddressingMap<K, V, P, S>
where
    K: Eq + Hash,
    P: Probing + Default,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, P, S> OpenAddressingMap<K, V, P, S> {
    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
    /// Occupied plus tombstoned slots.
    pub fn used_slots(&self) -> usize {
        self.used_slots
    }
    pub fn tombstones(&self) -> usize {
        self.used_slots - self.len
    }
    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }
    /// `used_slots` value at which the next insert grows the table.
    pub fn threshold(&self) -> usize {
        self.threshold
    }
    /// Count of structural changes: new keys, removals, overwrites that
    /// relocate their entry, resizes and clears. Plain overwrites and
    /// relocating reads do not count.
    pub fn modifications(&self) -> u64 {
        self.modifications
    }

    /// Entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.slots.iter().filter_map(Slot::entry)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.slots.iter_mut().filter_map(Slot::entry_mut)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.iter_mut().map(|(_, v)| v)
    }

    /// Resets every slot to empty. Capacity is kept.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.slots.iter_mut().for_each(|s| *s = Slot::Empty);
        self.len = 0;
        self.used_slots = 0;
        self.modifications += 1;
        trace!(capacity = self.slots.len(), "cleared open-addressing table");
    }
}

impl<K, V, P, S> OpenAddressingMap<K, V, P, S>
where
    K: Eq + Hash,
    P: Probing,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self
    where
        P: Default,
    {
        Self::from_parts(
            DEFAULT_CAPACITY,
            DEFAULT_MAX_LOAD_FACTOR,
            P::default(),
            hasher,
        )
    }

    /// Builds a table from an explicit configuration, strategy and hasher.
    ///
    /// Fails when the load factor is not a finite value in `(0, 1)`.
    pub fn with_config_and_hasher(
        config: TableConfig,
        probing: P,
        hasher: S,
    ) -> Result<Self, ConfigError> {
        config.validate_open()?;
        Ok(Self::from_parts(
            config.capacity,
            config.max_load_factor,
            probing,
            hasher,
        ))
    }

    fn from_parts(capacity: usize, max_load_factor: f64, probing: P, hasher: S) -> Self {
        let capacity = probing.adjust_capacity(capacity.max(DEFAULT_CAPACITY));
        Self {
            hasher,
            probing,
            slots: empty_slots(capacity),
            max_load_factor,
            threshold: threshold(capacity, max_load_factor),
            used_slots: 0,
            len: 0,
            modifications: 0,
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Walks the probe sequence of `key` until it finds the key or an empty
    /// slot.
    fn lookup<Q>(&self, key: &Q) -> Lookup
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let capacity = self.slots.len();
        let offset = normalize(primary_hash(&self.hasher, key), capacity);
        let probe = self.probing.setup_probing(&self.hasher, key, capacity);
        let mut tombstone = None;
        let mut x = 0;
        loop {
            debug_assert!(
                x < capacity,
                "probe sequence revisited a slot before reaching an empty one"
            );
            let index = (offset + self.probing.probe(probe, x, capacity)) % capacity;
            x += 1;
            match &self.slots[index] {
                Slot::Empty => return Lookup::Vacant { index, tombstone },
                Slot::Tombstone => {
                    if tombstone.is_none() {
                        tombstone = Some(index);
                    }
                }
                Slot::Occupied(k, _) => {
                    if k.borrow() == key {
                        return Lookup::Found { index, tombstone };
                    }
                }
            }
        }
    }

    /// Finds `key`, moving it into the first tombstone on its path if any.
    fn find_relocating<Q>(&mut self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        match self.lookup(key) {
            Lookup::Found {
                index,
                tombstone: Some(to),
            } => {
                self.slots.swap(index, to);
                trace!(from = index, to, "relocated entry into tombstone");
                Some(to)
            }
            Lookup::Found { index, .. } => Some(index),
            Lookup::Vacant { .. } => None,
        }
    }

    /// Returns the value for `key`, relocating the entry closer to its home
    /// slot when a tombstone precedes it.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.find_relocating(key)?;
        self.slots[index].entry().map(|(_, v)| v)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.find_relocating(key)?;
        self.slots[index].entry_mut().map(|(_, v)| v)
    }

    /// Read-only lookup; never relocates.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        match self.lookup(key) {
            Lookup::Found { index, .. } => self.slots[index].entry().map(|(_, v)| v),
            Lookup::Vacant { .. } => None,
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        matches!(self.lookup(key), Lookup::Found { .. })
    }

    /// Inserts `key -> value`, returning the previous value if the key was
    /// present. The stored key is kept on overwrite.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.used_slots >= self.threshold {
            self.resize();
        }

        let _g = self.reentrancy.enter();
        match self.lookup(&key) {
            Lookup::Found {
                index,
                tombstone: None,
            } => self.slots[index]
                .entry_mut()
                .map(|(_, v)| mem::replace(v, value)),
            Lookup::Found {
                index,
                tombstone: Some(to),
            } => {
                let (k, old) = self.slots[index].bury()?;
                self.slots[to] = Slot::Occupied(k, value);
                self.modifications += 1;
                trace!(from = index, to, "relocated entry into tombstone");
                Some(old)
            }
            Lookup::Vacant { index, tombstone } => {
                let target = match tombstone {
                    Some(to) => to,
                    None => {
                        self.used_slots += 1;
                        index
                    }
                };
                self.slots[target] = Slot::Occupied(key, value);
                self.len += 1;
                self.modifications += 1;
                None
            }
        }
    }

    /// Removes `key`, leaving a tombstone in its slot.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let Lookup::Found { index, .. } = self.lookup(key) else {
            return None;
        };
        let (_, value) = self.slots[index].bury()?;
        self.len -= 1;
        self.modifications += 1;
        Some(value)
    }

    /// Grows to `2n + 1` (strategy-adjusted) and reinserts live entries,
    /// dropping every tombstone.
    fn resize(&mut self) {
        let _g = self.reentrancy.enter();
        let old_capacity = self.slots.len();
        let mut capacity = old_capacity;
        loop {
            capacity = capacity
                .checked_mul(2)
                .and_then(|c| c.checked_add(1))
                .expect("capacity overflow");
            capacity = self.probing.adjust_capacity(capacity);
            self.threshold = threshold(capacity, self.max_load_factor);
            // Tiny load factors need several doublings before the pending
            // insert fits under the threshold.
            if self.threshold > self.len {
                break;
            }
        }

        let tombstones = self.used_slots - self.len;
        let old = mem::replace(&mut self.slots, empty_slots(capacity));
        for slot in old {
            if let Slot::Occupied(k, v) = slot {
                let (Lookup::Found { index, .. } | Lookup::Vacant { index, .. }) = self.lookup(&k);
                self.slots[index] = Slot::Occupied(k, v);
            }
        }
        self.used_slots = self.len;
        self.modifications += 1;
        debug!(
            old_capacity,
            capacity,
            keys = self.len,
            tombstones,
            "resized open-addressing table"
        );
    }
}

impl<K, V, P, S> fmt::Debug for OpenAddressingMap<K, V, P, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, P, S> Extend<(K, V)> for OpenAddressingMap<K, V, P, S>
where
    K: Eq + Hash,
    P: Probing,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, P, S> Table<K, V> for OpenAddressingMap<K, V, P, S>
where
    K: Eq + Hash,
    P: Probing,
    S: BuildHasher,
{
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        Self::insert(self, key, value)
    }

    fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        Self::get(self, key)
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        Self::remove(self, key)
    }

    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        Self::contains_key(self, key)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn clear(&mut self) {
        Self::clear(self)
    }

    fn keys<'a>(&'a self) -> Vec<&'a K>
    where
        K: 'a,
    {
        Self::keys(self).collect()
    }

    fn values<'a>(&'a self) -> Vec<&'a V>
    where
        V: 'a,
    {
        Self::values(self).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::Hasher;

    /// Hashes integer keys to themselves.
    #[derive(Clone, Default)]
    struct IdentityState;
    struct IdentityHasher(u64);
    impl BuildHasher for IdentityState {
        type Hasher = IdentityHasher;
        fn build_hasher(&self) -> IdentityHasher {
            IdentityHasher(0)
        }
    }
    impl Hasher for IdentityHasher {
        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 = (self.0 << 8) | u64::from(b);
            }
        }
        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
        fn finish(&self) -> u64 {
            self.0
        }
    }

    fn linear(capacity: usize, lf: f64) -> LinearProbingMap<u64, &'static str, IdentityState> {
        OpenAddressingMap::with_config_and_hasher(
            TableConfig::new(capacity, lf),
            LinearProbing,
            IdentityState,
        )
        .unwrap()
    }

    fn assert_within_load_factor<K, V, P, S>(m: &OpenAddressingMap<K, V, P, S>) {
        assert!(m.used_slots() <= m.threshold());
        assert!(m.threshold() < m.capacity());
    }

    /// Keys hashing to 0, 7 and 14 share home slot 0 and land on the stride
    /// 17 walk 0 -> 3 -> 6.
    #[test]
    fn colliding_keys_follow_linear_stride() {
        let mut m = linear(7, 0.75);
        assert_eq!(m.capacity(), 7);
        assert_eq!(m.insert(0, "a"), None);
        assert_eq!(m.insert(7, "b"), None);
        assert_eq!(m.insert(14, "c"), None);

        assert_eq!(m.len(), 3);
        assert_eq!(m.capacity(), 7);
        assert!(matches!(m.slots[0], Slot::Occupied(0, "a")));
        assert!(matches!(m.slots[3], Slot::Occupied(7, "b")));
        assert!(matches!(m.slots[6], Slot::Occupied(14, "c")));
        assert_eq!(m.get(&0), Some(&"a"));
        assert_eq!(m.get(&7), Some(&"b"));
        assert_eq!(m.get(&14), Some(&"c"));
    }

    #[test]
    fn overwrite_returns_previous_and_keeps_len() {
        let mut m = linear(7, 0.75);
        m.insert(1, "one");
        let mods = m.modifications();
        assert_eq!(m.insert(1, "uno"), Some("one"));
        assert_eq!(m.len(), 1);
        assert_eq!(m.used_slots(), 1);
        assert_eq!(m.modifications(), mods);
        assert_eq!(m.get(&1), Some(&"uno"));
    }

    #[test]
    fn remove_leaves_tombstone_and_key_absent() {
        let mut m = linear(7, 0.75);
        m.insert(3, "x");
        assert_eq!(m.remove(&3), Some("x"));
        assert_eq!(m.remove(&3), None);
        assert_eq!(m.get(&3), None);
        assert!(!m.contains_key(&3));
        assert!(m.is_empty());
        assert_eq!(m.used_slots(), 1);
        assert_eq!(m.tombstones(), 1);
        assert!(matches!(m.slots[3], Slot::Tombstone));
    }

    #[test]
    fn tombstone_does_not_cut_probe_walk() {
        let mut m = linear(7, 0.75);
        m.insert(0, "a");
        m.insert(7, "b");
        m.remove(&0);
        assert!(m.contains_key(&7));
        assert_eq!(m.peek(&7), Some(&"b"));
    }

    #[test]
    fn insert_reuses_first_tombstone() {
        let mut m = linear(7, 0.75);
        m.insert(0, "a");
        m.insert(7, "b");
        m.remove(&0);
        assert_eq!(m.used_slots(), 2);

        // 14 walks 0 (tombstone) -> 3 (7) -> 6 (empty) and settles in slot 0.
        assert_eq!(m.insert(14, "c"), None);
        assert!(matches!(m.slots[0], Slot::Occupied(14, "c")));
        assert!(matches!(m.slots[6], Slot::Empty));
        assert_eq!(m.used_slots(), 2);
        assert_eq!(m.tombstones(), 0);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn get_relocates_past_leading_tombstone() {
        let mut m = linear(7, 0.75);
        m.insert(0, "a");
        m.insert(7, "b");
        m.insert(14, "c");
        m.remove(&0);

        assert_eq!(m.get(&14), Some(&"c"));
        assert!(matches!(m.slots[0], Slot::Occupied(14, "c")));
        assert!(matches!(m.slots[6], Slot::Tombstone));
        assert_eq!(m.len(), 2);
        assert_eq!(m.used_slots(), 3);

        // Observable state is unchanged.
        assert_eq!(m.get(&14), Some(&"c"));
        assert_eq!(m.get(&7), Some(&"b"));
        assert_eq!(m.get(&0), None);
    }

    #[test]
    fn peek_does_not_relocate() {
        let mut m = linear(7, 0.75);
        m.insert(0, "a");
        m.insert(7, "b");
        m.remove(&0);
        assert_eq!(m.peek(&7), Some(&"b"));
        assert!(matches!(m.slots[3], Slot::Occupied(7, "b")));
        assert!(matches!(m.slots[0], Slot::Tombstone));
    }

    #[test]
    fn overwrite_relocates_into_tombstone() {
        let mut m = linear(7, 0.75);
        m.insert(0, "a");
        m.insert(7, "b");
        m.remove(&0);
        assert_eq!(m.insert(7, "B"), Some("b"));
        assert!(matches!(m.slots[0], Slot::Occupied(7, "B")));
        assert!(matches!(m.slots[3], Slot::Tombstone));
        assert_eq!(m.len(), 1);
        assert_eq!(m.used_slots(), 2);
        // Two inserts, one removal and the relocating overwrite.
        assert_eq!(m.modifications(), 4);
        // An in-place overwrite leaves the layout and the counter alone.
        m.insert(7, "C");
        assert_eq!(m.modifications(), 4);
    }

    #[test]
    fn get_mut_updates_value() {
        let mut m: LinearProbingMap<u64, i32, IdentityState> =
            LinearProbingMap::with_hasher(IdentityState);
        m.insert(5, 10);
        *m.get_mut(&5).unwrap() += 1;
        assert_eq!(m.peek(&5), Some(&11));
        assert!(m.get_mut(&6).is_none());
    }

    #[test]
    fn resize_grows_to_adjusted_double_plus_one_and_drops_tombstones() {
        let mut m = linear(7, 0.5);
        assert_eq!(m.threshold(), 3);
        m.insert(1, "a");
        m.insert(2, "b");
        m.insert(3, "c");
        m.remove(&2);
        assert_eq!(m.used_slots(), 3);

        m.insert(4, "d");
        assert_eq!(m.capacity(), 15);
        assert_eq!(m.threshold(), 7);
        assert_eq!(m.len(), 3);
        assert_eq!(m.used_slots(), 3);
        assert_eq!(m.tombstones(), 0);
        for (k, v) in [(1, "a"), (3, "c"), (4, "d")] {
            assert_eq!(m.get(&k), Some(&v));
        }
        assert_eq!(m.get(&2), None);
    }

    #[test]
    fn resize_skips_capacities_sharing_a_factor_with_17() {
        // 8 -> 17 is not coprime with the stride, so it becomes 18.
        let mut m = linear(8, 0.3);
        assert_eq!(m.capacity(), 8);
        for k in 0..3 {
            m.insert(k, "v");
        }
        assert_eq!(m.capacity(), 18);
    }

    #[test]
    fn tiny_load_factor_still_respects_bound() {
        let mut m = linear(7, 0.01);
        assert_eq!(m.threshold(), 0);
        m.insert(1, "a");
        assert_eq!(m.capacity(), 127);
        assert_within_load_factor(&m);
        assert_eq!(m.get(&1), Some(&"a"));
    }

    #[test]
    fn load_factor_bound_holds_after_every_insert() {
        let mut m = linear(0, 0.75);
        for k in 0..500 {
            m.insert(k * 7, "v");
            assert_within_load_factor(&m);
            if k % 3 == 0 {
                m.remove(&(k * 7));
            }
        }
    }

    #[test]
    fn clear_resets_slots_and_keeps_capacity() {
        let mut m = linear(7, 0.5);
        for k in 0..10 {
            m.insert(k, "v");
        }
        m.remove(&4);
        let capacity = m.capacity();
        m.clear();
        assert_eq!(m.len(), 0);
        assert!(m.is_empty());
        assert_eq!(m.used_slots(), 0);
        assert_eq!(m.capacity(), capacity);
        for k in 0..10 {
            assert_eq!(m.get(&k), None);
        }
        assert!(m.slots.iter().all(|s| matches!(s, Slot::Empty)));
    }

    #[test]
    fn keys_and_values_follow_slot_order() {
        let mut m = linear(7, 0.75);
        m.insert(14, "c");
        m.insert(0, "a");
        m.insert(7, "b");
        // 14 -> slot 0, 0 -> slot 3, 7 -> slot 6.
        assert_eq!(m.keys().copied().collect::<Vec<_>>(), vec![14, 0, 7]);
        assert_eq!(m.values().copied().collect::<Vec<_>>(), vec!["c", "a", "b"]);
        m.remove(&0);
        assert_eq!(Table::keys(&m), vec![&14, &7]);
        assert_eq!(Table::values(&m), vec![&"c", &"b"]);
    }

    #[test]
    fn values_mut_and_iter_mut() {
        let mut m: LinearProbingMap<u64, i32> = LinearProbingMap::new();
        m.extend((0..20).map(|k| (k, k as i32)));
        for v in m.values_mut() {
            *v *= 2;
        }
        for (k, v) in m.iter_mut() {
            *v += *k as i32;
        }
        for k in 0..20u64 {
            assert_eq!(m.get(&k), Some(&(3 * k as i32)));
        }
    }

    #[test]
    fn double_hashing_requested_capacity_becomes_next_prime() {
        let m: DoubleHashingMap<u64, u64> =
            DoubleHashingMap::with_config(TableConfig::new(10, 0.5)).unwrap();
        assert_eq!(m.capacity(), 11);
    }

    #[test]
    fn double_hashing_growth_stays_prime() {
        let mut m: DoubleHashingMap<u64, u64> = DoubleHashingMap::new();
        let mut seen = vec![m.capacity()];
        for k in 0..2_000 {
            m.insert(k, k);
            if seen.last() != Some(&m.capacity()) {
                seen.push(m.capacity());
            }
        }
        assert!(seen.iter().all(|&c| crate::probing::is_prime(c)), "{seen:?}");
        for k in 0..2_000 {
            assert_eq!(m.get(&k), Some(&k));
        }
    }

    /// The stride comes from the hasher the map was built with; no second
    /// builder is conjured through `Default`.
    #[test]
    fn double_hashing_uses_the_supplied_hasher() {
        use std::cell::Cell;

        thread_local! {
            static DEFAULTS: Cell<usize> = const { Cell::new(0) };
        }

        #[derive(Clone)]
        struct Seeded(u64);
        impl Default for Seeded {
            fn default() -> Self {
                DEFAULTS.with(|d| d.set(d.get() + 1));
                Seeded(0)
            }
        }
        struct SeededHasher(u64);
        impl BuildHasher for Seeded {
            type Hasher = SeededHasher;
            fn build_hasher(&self) -> SeededHasher {
                SeededHasher(self.0)
            }
        }
        impl Hasher for SeededHasher {
            fn write(&mut self, bytes: &[u8]) {
                for &b in bytes {
                    self.0 = self.0.rotate_left(8) ^ u64::from(b);
                }
            }
            fn finish(&self) -> u64 {
                self.0
            }
        }

        let mut m: DoubleHashingMap<u64, u64, Seeded> = DoubleHashingMap::with_hasher(Seeded(42));
        for k in 0..100 {
            m.insert(k, k * 2);
        }
        assert_eq!(DEFAULTS.with(Cell::get), 0);
        assert!(crate::probing::is_prime(m.capacity()));
        for k in 0..100 {
            assert_eq!(m.get(&k), Some(&(k * 2)));
        }

        // Builders without `Default` work too.
        #[derive(Clone)]
        struct NoDefault(Seeded);
        impl BuildHasher for NoDefault {
            type Hasher = SeededHasher;
            fn build_hasher(&self) -> SeededHasher {
                self.0.build_hasher()
            }
        }
        let mut m: DoubleHashingMap<u64, u64, NoDefault> =
            DoubleHashingMap::with_hasher(NoDefault(Seeded(7)));
        m.insert(3, 9);
        assert_eq!(m.peek(&3), Some(&9));
        assert_eq!(DEFAULTS.with(Cell::get), 0);
    }

    #[test]
    fn borrowed_lookup_with_str() {
        let mut m: DoubleHashingMap<String, i32> = DoubleHashingMap::new();
        m.insert("hello".to_string(), 1);
        assert!(m.contains_key("hello"));
        assert_eq!(m.get("hello"), Some(&1));
        assert_eq!(m.remove("hello"), Some(1));
        assert!(!m.contains_key("hello"));
    }

    #[test]
    fn construction_rejects_bad_load_factors() {
        assert_eq!(
            LinearProbingMap::<u64, u64>::with_config(TableConfig::new(7, 0.0)).err(),
            Some(ConfigError::IllegalLoadFactor(0.0))
        );
        assert_eq!(
            DoubleHashingMap::<u64, u64>::with_config(TableConfig::new(7, 1.5)).err(),
            Some(ConfigError::LoadFactorTooHigh(1.5))
        );
    }

    #[test]
    fn small_requests_use_default_capacity() {
        let m = linear(0, 0.5);
        assert_eq!(m.capacity(), DEFAULT_CAPACITY);
        let m: LinearProbingMap<u64, u64> = LinearProbingMap::default();
        assert_eq!(m.capacity(), DEFAULT_CAPACITY);
        assert_eq!(m.max_load_factor(), DEFAULT_MAX_LOAD_FACTOR);
    }

    #[test]
    fn modifications_count_structural_changes() {
        let mut m = linear(7, 0.5);
        m.insert(1, "a");
        m.insert(2, "b");
        assert_eq!(m.modifications(), 2);
        m.remove(&1);
        m.remove(&1);
        assert_eq!(m.modifications(), 3);
        m.insert(3, "c");
        m.insert(4, "d"); // resize + insert
        assert_eq!(m.modifications(), 6);
        m.clear();
        assert_eq!(m.modifications(), 7);
    }

    #[test]
    fn debug_formats_as_map() {
        let mut m = linear(7, 0.5);
        m.insert(1, "a");
        assert_eq!(format!("{:?}", m), r#"{1: "a"}"#);
    }

    /// Invariant (debug-only): re-entering the table from `K: Eq` during a
    /// probe walk panics.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_eq_during_lookup() {
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

        struct ReentryKey {
            id: &'static str,
            map: *const LinearProbingMap<ReentryKey, i32, ConstBuildHasher>,
            trigger: bool,
        }
        impl PartialEq for ReentryKey {
            fn eq(&self, other: &Self) -> bool {
                if self.id == other.id {
                    return true;
                }
                if other.trigger {
                    unsafe {
                        let m = &*other.map;
                        let _ = m.contains_key(self);
                    }
                }
                false
            }
        }
        impl Eq for ReentryKey {}
        impl Hash for ReentryKey {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }

        let mut m: LinearProbingMap<ReentryKey, i32, ConstBuildHasher> =
            LinearProbingMap::with_hasher(ConstBuildHasher);
        m.insert(
            ReentryKey {
                id: "a",
                map: core::ptr::null(),
                trigger: false,
            },
            1,
        );

        let query = ReentryKey {
            id: "b",
            map: &m as *const _,
            trigger: true,
        };
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = m.contains_key(&query);
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }
}
