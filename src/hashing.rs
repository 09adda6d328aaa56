//! Hash codes for keys and their mapping onto table indices.
//!
//! Keys only need `Hash + Eq`. The table's `BuildHasher` supplies the
//! primary hash; the secondary hash used by double hashing comes from the
//! same builder with a salt written ahead of the key, which yields an
//! independent function without asking callers for a second hasher.

use core::hash::{BuildHasher, Hash, Hasher};

/// Default hasher builder for every table in this crate.
pub type DefaultHashBuilder = hashbrown::hash_map::DefaultHashBuilder;

const SECONDARY_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

#[inline]
pub(crate) fn primary_hash<Q, S>(hasher: &S, key: &Q) -> u64
where
    Q: ?Sized + Hash,
    S: BuildHasher,
{
    hasher.hash_one(key)
}

#[inline]
pub(crate) fn secondary_hash<Q, S>(hasher: &S, key: &Q) -> u64
where
    Q: ?Sized + Hash,
    S: BuildHasher,
{
    let mut h = hasher.build_hasher();
    h.write_u64(SECONDARY_SALT);
    key.hash(&mut h);
    h.finish()
}

/// Strips the sign bit of a 32-bit hash code and maps it into `[0, capacity)`.
#[inline]
pub(crate) fn normalize(hash: u64, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    ((hash & 0x7fff_ffff) as usize) % capacity
}
