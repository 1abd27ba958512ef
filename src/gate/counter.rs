//! # Lock-free slot counter.
//!
//! [`SlotCounter`] tracks how many callers are currently executing protected
//! work, bounded by an optional limit. Acquisition is a classic
//! load / compute / compare-and-swap retry loop; it never blocks and never
//! overshoots the limit.
//!
//! ## Rules
//! - The count stays within `[0, limit]` at every observable instant.
//! - `try_acquire` is the **only** way the count goes up.
//! - `release_one` is the **only** way the count goes down; a slot handed
//!   directly to a queued waiter is never decremented at all.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Tracks currently-executing callers against an optional fixed limit.
///
/// `limit = None` means unlimited: acquisition always succeeds and the
/// count is not maintained.
#[derive(Debug)]
pub(crate) struct SlotCounter {
    limit: Option<usize>,
    in_flight: AtomicUsize,
}

impl SlotCounter {
    /// Creates a counter with the given limit (`None` = unlimited).
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Returns `true` when no limit is enforced.
    #[inline]
    pub(crate) fn is_unlimited(&self) -> bool {
        self.limit.is_none()
    }

    /// Attempts to claim one slot without blocking.
    ///
    /// Unlimited counters always succeed. Otherwise the current count is
    /// read, checked against the limit, and advanced with a
    /// compare-and-swap; a concurrent modification just retries the loop.
    pub(crate) fn try_acquire(&self) -> bool {
        let Some(limit) = self.limit else {
            return true;
        };

        let mut seen = self.in_flight.load(Ordering::Acquire);
        loop {
            if seen >= limit {
                return false;
            }
            match self.in_flight.compare_exchange_weak(
                seen,
                seen + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => seen = actual,
            }
        }
    }

    /// Returns one slot to the counter.
    ///
    /// Must be paired with a successful [`try_acquire`](Self::try_acquire)
    /// whose slot was **not** handed off to a queued waiter. No-op for
    /// unlimited counters.
    pub(crate) fn release_one(&self) {
        if self.limit.is_none() {
            return;
        }
        let prev = self.in_flight.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "release_one without a matching acquire");
    }

    /// Current number of executing callers (0 for unlimited counters).
    #[inline]
    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }
}
