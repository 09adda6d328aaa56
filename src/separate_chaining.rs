//! SeparateChainingMap: an array of bucket lists, one per hash index.
//!
//! Each entry caches its hash so that growing the table never calls back
//! into `K: Hash`. Removal unlinks the node from its bucket; no tombstones
//! are involved.

use crate::bucket_list::{BucketList, NodeRef};
use crate::config::{threshold, ConfigError, TableConfig};
use crate::hashing::{normalize, primary_hash, DefaultHashBuilder};
use crate::reentrancy::DebugReentrancy;
use crate::table::Table;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use tracing::{debug, trace};

/// Minimum number of buckets.
pub const DEFAULT_CAPACITY: usize = 3;
/// Load factor used by `new`, `with_hasher` and `Default`.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.75;

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
}

pub struct SeparateChainingMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    table: Vec<BucketList<Entry<K, V>>>,
    max_load_factor: f64,
    threshold: usize,
    len: usize,
    modifications: u64,
    reentrancy: DebugReentrancy,
}

fn empty_buckets<T>(capacity: usize) -> Vec<BucketList<T>> {
    (0..capacity).map(|_| BucketList::new()).collect()
}

impl<K, V> SeparateChainingMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<K, V, S> Default for SeparateChainingMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> SeparateChainingMap<K, V, S> {
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.table.len()
    }
    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }
    pub fn modifications(&self) -> u64 {
        self.modifications
    }

    /// Entries in the bucket at `index`; 0 for an out-of-range index.
    pub fn bucket_len(&self, index: usize) -> usize {
        self.table.get(index).map_or(0, BucketList::len)
    }

    pub fn bucket_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.table.iter().map(BucketList::len)
    }

    /// Entries bucket by bucket, each bucket in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.table
            .iter()
            .flat_map(|b| b.iter().map(|(_, e)| (&e.key, &e.value)))
    }

    /// Mutable access to every entry; order within a bucket is unspecified.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.table
            .iter_mut()
            .flat_map(|b| b.values_mut().map(|e| (&e.key, &mut e.value)))
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

    /// Drops every entry. The bucket count is kept.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.table.iter_mut().for_each(|b| *b = BucketList::new());
        self.len = 0;
        self.modifications += 1;
        trace!(capacity = self.table.len(), "cleared chained table");
    }

    /// Doubles the bucket count and redistributes entries by cached hash.
    fn resize(&mut self) {
        let _g = self.reentrancy.enter();
        let old_capacity = self.table.len();
        let capacity = old_capacity.checked_mul(2).expect("capacity overflow");
        self.threshold = threshold(capacity, self.max_load_factor);

        let old = mem::replace(&mut self.table, empty_buckets(capacity));
        for entry in old.into_iter().flatten() {
            let index = normalize(entry.hash, capacity);
            self.table[index].push_back(entry);
        }
        self.modifications += 1;
        debug!(
            old_capacity,
            capacity,
            keys = self.len,
            "resized chained table"
        );
    }
}

impl<K, V, S> SeparateChainingMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_parts(DEFAULT_CAPACITY, DEFAULT_MAX_LOAD_FACTOR, hasher)
    }

    /// Builds a table from an explicit configuration and hasher.
    ///
    /// Fails when the load factor is not a finite positive value.
    pub fn with_config_and_hasher(
        config: TableConfig,
        hasher: S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_parts(
            config.capacity,
            config.max_load_factor,
            hasher,
        ))
    }

    fn from_parts(capacity: usize, max_load_factor: f64, hasher: S) -> Self {
        let capacity = capacity.max(DEFAULT_CAPACITY);
        Self {
            hasher,
            table: empty_buckets(capacity),
            max_load_factor,
            threshold: threshold(capacity, max_load_factor),
            len: 0,
            modifications: 0,
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Bucket index and node of `key`, if present.
    fn seek<Q>(&self, key: &Q) -> (usize, Option<NodeRef>)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = normalize(primary_hash(&self.hasher, key), self.table.len());
        let node = self.table[index]
            .iter()
            .find(|(_, e)| e.key.borrow() == key)
            .map(|(r, _)| r);
        (index, node)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let (index, node) = self.seek(key);
        self.table[index].get(node?).map(|e| &e.value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let (index, node) = self.seek(key);
        self.table[index].get_mut(node?).map(|e| &mut e.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        self.seek(key).1.is_some()
    }

    /// Inserts `key -> value`, returning the previous value if the key was
    /// present. The stored key is kept on overwrite.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let grow = {
            let _g = self.reentrancy.enter();
            let hash = primary_hash(&self.hasher, &key);
            let index = normalize(hash, self.table.len());
            let bucket = &mut self.table[index];
            let existing = bucket
                .iter()
                .find(|(_, e)| e.key == key)
                .map(|(r, _)| r);
            if let Some(e) = existing.and_then(|r| bucket.get_mut(r)) {
                return Some(mem::replace(&mut e.value, value));
            }
            bucket.push_back(Entry { key, value, hash });
            self.len += 1;
            self.modifications += 1;
            self.len > self.threshold
        };
        if grow {
            self.resize();
        }
        None
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let (index, node) = self.seek(key);
        let entry = self.table[index].remove(node?)?;
        self.len -= 1;
        self.modifications += 1;
        Some(entry.value)
    }
}

impl<K, V, S> fmt::Debug for SeparateChainingMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for SeparateChainingMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> Table<K, V> for SeparateChainingMap<K, V, S>
where
    K: Eq + Hash,
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
        self.table.len()
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
