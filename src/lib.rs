//! probing-hashmap: key → value maps built on open addressing (linear
//! probing, double hashing) and on separate chaining.
//!
//! Internal Design:
//!
//! Summary
//! - `OpenAddressingMap<K, V, P, S>` stores every entry in one flat array of
//!   tagged slots (`Empty` / `Occupied` / `Tombstone`) and resolves
//!   collisions by walking a probe sequence chosen by the strategy `P`.
//!   `LinearProbingMap` and `DoubleHashingMap` are the two instantiations.
//! - `SeparateChainingMap<K, V, S>` keeps an array of `BucketList`s and
//!   scans the one bucket a key hashes to.
//! - `Table<K, V>` is the contract both families share.
//!
//! Probing and capacity
//! - Every probe sequence must visit each slot before repeating. Rather
//!   than tracking visited slots, strategies constrain the capacity:
//!   linear probing with stride 17 keeps `gcd(17, capacity) == 1`; double
//!   hashing keeps the capacity prime so any stride in `1..capacity` works.
//! - Open-addressing load factors are restricted to `(0, 1)`, so at least
//!   one slot is always empty and every walk terminates.
//!
//! Deletion
//! - Open addressing buries removed entries as tombstones. Walks skip them;
//!   inserts reuse the first one they pass; lookups move a found entry into
//!   that first tombstone (lazy relocation). Growth drops all tombstones.
//! - Chaining unlinks the entry's node from its bucket in O(1) through a
//!   generational `NodeRef`.
//!
//! Hashing
//! - Keys need `Hash + Eq`; a `BuildHasher` (default
//!   `hashbrown::hash_map::DefaultHashBuilder`) supplies hash codes. Index
//!   mapping strips the sign bit of the low 32 bits and reduces modulo the
//!   capacity. Double hashing derives its stride from a salted second hash.
//!
//! Constraints
//! - Single-threaded and non-reentrant: a debug-only guard panics if a
//!   key's `Hash`/`Eq` calls back into the table it is being looked up in.
//! - Growth is the only resize policy: `2n + 1` (then strategy-adjusted) for
//!   open addressing, `2n` for chaining. Tables never shrink.
//!
//! Logging
//! - Resizes emit `tracing` debug events; lazy relocations and clears emit
//!   trace events.

pub mod bucket_list;
pub mod config;
pub mod hashing;
pub mod open_addressing;
pub mod probing;
mod reentrancy;
pub mod separate_chaining;
pub mod table;
mod table_proptest;

// Public surface
pub use bucket_list::{BucketList, NodeRef};
pub use config::{ConfigError, TableConfig};
pub use hashing::DefaultHashBuilder;
pub use open_addressing::{DoubleHashingMap, LinearProbingMap, OpenAddressingMap};
pub use probing::{DoubleHashing, LinearProbing, Probing};
pub use separate_chaining::SeparateChainingMap;
pub use table::Table;
