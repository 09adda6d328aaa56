//! Probe sequences for open addressing.
//!
//! A strategy decides which slots a key visits after its home slot and which
//! table sizes it can work with. Every capacity a strategy accepts through
//! [`Probing::adjust_capacity`] must make its probe sequence a permutation of
//! `[0, capacity)`; the engine relies on this to terminate without any
//! iteration bound.

use crate::hashing::{normalize, secondary_hash};
use core::hash::{BuildHasher, Hash};

/// Step size used by [`LinearProbing`].
pub const LINEAR_CONSTANT: usize = 17;

pub trait Probing {
    /// Per-key state prepared once per operation.
    type Probe: Copy;

    /// Computes the per-key state for `key` at the given capacity. `hasher`
    /// is the table's own builder.
    fn setup_probing<Q, S>(&self, hasher: &S, key: &Q, capacity: usize) -> Self::Probe
    where
        Q: ?Sized + Hash,
        S: BuildHasher;

    /// Distance from the home slot on the `x`-th visit, reduced modulo
    /// `capacity`. The first visit (`x == 0`) is the home slot itself.
    fn probe(&self, probe: Self::Probe, x: usize, capacity: usize) -> usize;

    /// Smallest capacity `>= capacity` that gives full-coverage probing.
    fn adjust_capacity(&self, capacity: usize) -> usize;
}

/// Fixed stride of [`LINEAR_CONSTANT`] slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearProbing;

impl Probing for LinearProbing {
    type Probe = ();

    #[inline]
    fn setup_probing<Q, S>(&self, _hasher: &S, _key: &Q, _capacity: usize)
    where
        Q: ?Sized + Hash,
        S: BuildHasher,
    {
    }

    #[inline]
    fn probe(&self, _probe: (), x: usize, capacity: usize) -> usize {
        mul_mod(LINEAR_CONSTANT, x, capacity)
    }

    fn adjust_capacity(&self, mut capacity: usize) -> usize {
        while gcd(LINEAR_CONSTANT, capacity) != 1 {
            capacity += 1;
        }
        capacity
    }
}

/// Stride taken from a salted second hash of the key, computed with the
/// table's own hasher builder.
///
/// Capacities are kept prime so that any non-zero stride below the capacity
/// is coprime with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleHashing;

impl Probing for DoubleHashing {
    type Probe = usize;

    #[inline]
    fn setup_probing<Q, S>(&self, hasher: &S, key: &Q, capacity: usize) -> usize
    where
        Q: ?Sized + Hash,
        S: BuildHasher,
    {
        match normalize(secondary_hash(hasher, key), capacity) {
            // A zero stride would pin the walk to the home slot.
            0 => 1,
            step => step,
        }
    }

    #[inline]
    fn probe(&self, step: usize, x: usize, capacity: usize) -> usize {
        mul_mod(x, step, capacity)
    }

    fn adjust_capacity(&self, mut capacity: usize) -> usize {
        while !is_prime(capacity) {
            capacity += 1;
        }
        capacity
    }
}

/// `a * b mod m` without intermediate overflow.
#[inline]
fn mul_mod(a: usize, b: usize, m: usize) -> usize {
    ((a as u128 * b as u128) % m as u128) as usize
}

pub(crate) fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

pub(crate) fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    let mut i = 2;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 1;
    }
    true
}
