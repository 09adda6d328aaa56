//! Debug-only guard against reentrant calls into a table.
//!
//! The tables call into user code (`Hash`, `Eq`) while a probe walk or a
//! bucket scan is in progress. A key that reaches back into the same table
//! at that point would observe it mid-operation. In debug builds entering
//! the guard twice panics; in release builds the guard is a zero-sized
//! no-op.

use core::cell::Cell;
use core::marker::PhantomData;

/// Embedded once per table; every public entry point holds
/// `let _g = self.reentrancy.enter();` for its duration.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    busy: Cell<bool>,
    // Tables are single-threaded: keep them !Send + !Sync.
    _single_threaded: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            busy: Cell::new(false),
            _single_threaded: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.busy.replace(true),
                "reentrancy detected: table accessed from inside its own operation"
            );
            ReentrancyGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            ReentrancyGuard { _owner: PhantomData }
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases the table when dropped.
pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a ()>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.busy.set(false);
    }
}
