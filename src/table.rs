//! Operations common to every table in the crate.

use core::borrow::Borrow;
use core::hash::Hash;

/// Key → value table contract shared by the open-addressing and
/// separate-chaining maps.
///
/// `get` takes `&mut self` because open addressing may relocate the entry it
/// finds. `keys` and `values` return owned snapshots.
pub trait Table<K, V> {
    /// Inserts or overwrites; returns the previous value for `key`.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq;

    /// Removes `key`, returning its value if it was present.
    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq;

    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;

    fn clear(&mut self);

    fn keys<'a>(&'a self) -> Vec<&'a K>
    where
        K: 'a;

    fn values<'a>(&'a self) -> Vec<&'a V>
    where
        V: 'a;
}
