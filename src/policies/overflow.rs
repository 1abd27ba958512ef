//! # Overflow policies for the admission gate.
//!
//! [`OverflowPolicy`] determines what happens to a caller that arrives while
//! every execution slot is taken.
//!
//! - [`OverflowPolicy::Reject`] deny the caller immediately (default).
//! - [`OverflowPolicy::DropTail`] queue the caller; when the queue is full, deny the **newest** arrival.
//! - [`OverflowPolicy::DropHead`] queue the caller; when the queue is full, evict the **oldest** waiter.
//!
//! ## Choosing the right policy
//!
//! **Fast-fail services** (caller retries elsewhere):
//! ```text
//! OverflowPolicy::Reject        → Deterministic, zero queueing memory
//! ```
//!
//! **Fair absorption of short bursts**:
//! ```text
//! OverflowPolicy::DropTail      → Early arrivals keep their place in line
//! ```
//!
//! **Freshness over fairness** (stale work loses value while waiting):
//! ```text
//! OverflowPolicy::DropHead      → Newest arrivals displace the oldest waiters
//! ```

/// Policy controlling how arrivals are handled once the concurrency limit is reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Deny immediately, never queue.
    ///
    /// Use when:
    /// - Callers need deterministic fast-fail feedback
    /// - Queueing memory must be zero
    /// - Example: load balancer with other healthy backends
    Reject,

    /// Queue up to the configured length; a full queue denies the newest arrival.
    ///
    /// Use when:
    /// - Arrival order should be honored end to end
    /// - Short bursts should be absorbed, sustained overload shed
    /// - Example: payment submission endpoint
    DropTail,

    /// Queue up to the configured length; a full queue evicts the oldest waiter.
    ///
    /// Use when:
    /// - Fresh requests are worth more than stale ones
    /// - Waiters close to timing out anyway are the cheapest to shed
    /// - Example: live dashboard polling
    DropHead,
}

impl OverflowPolicy {
    /// Returns `true` for the policies that place excess callers in the wait queue.
    #[inline]
    pub fn queues(&self) -> bool {
        !matches!(self, OverflowPolicy::Reject)
    }
}

impl Default for OverflowPolicy {
    /// Returns [`OverflowPolicy::Reject`].
    fn default() -> Self {
        OverflowPolicy::Reject
    }
}
