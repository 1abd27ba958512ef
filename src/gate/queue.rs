//! # Bounded FIFO wait queue.
//!
//! [`WaitQueue`] holds the admission tickets of callers waiting for a slot.
//! Every structural mutation — append, grant, eviction, identity removal —
//! runs inside **one** critical section that covers both "is this ticket
//! still queued" and "resolve it", which makes exactly-once completion
//! structural rather than dependent on careful ordering.
//!
//! ## Rules
//! - Insertion order is arrival order; grants always take the head.
//! - Length never exceeds the configured maximum.
//! - A ticket is resolved by exactly one of: head grant, drop-head
//!   eviction, or identity removal by its own waiter (cancellation /
//!   timeout). A second resolver finds the ticket gone and does nothing.
//! - The lock is never held across an `.await`.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::policies::OverflowPolicy;

/// How a queued ticket was resolved by the queue side.
///
/// Timeout and cancellation do not appear here: in those cases the waiter
/// itself removes the ticket and no verdict is ever sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// A freed slot was handed to this ticket; the caller now owns it.
    Granted,
    /// A newer arrival displaced this ticket under drop-head.
    Evicted,
}

/// One waiting caller, owned by the queue until resolved.
struct Ticket {
    id: u64,
    tx: oneshot::Sender<Verdict>,
}

/// The caller-side handle returned by [`WaitQueue::enqueue`].
pub(crate) struct Enqueued {
    /// Ticket identity, for out-of-position removal.
    pub(crate) id: u64,
    /// Resolves exactly once with the ticket's verdict.
    pub(crate) rx: oneshot::Receiver<Verdict>,
    /// Queue length right after the append.
    pub(crate) depth: usize,
}

struct Inner {
    tickets: VecDeque<Ticket>,
    next_id: u64,
}

/// Bounded FIFO of pending admission tickets.
pub(crate) struct WaitQueue {
    max_len: usize,
    policy: OverflowPolicy,
    inner: Mutex<Inner>,
}

impl WaitQueue {
    /// Creates a queue for a queueing policy with a positive bound.
    pub(crate) fn new(max_len: usize, policy: OverflowPolicy) -> Self {
        debug_assert!(max_len > 0, "zero-length queues are handled by the gate");
        debug_assert!(policy.queues(), "reject policy never constructs a queue");
        Self {
            max_len,
            policy,
            inner: Mutex::new(Inner {
                tickets: VecDeque::new(),
                next_id: 0,
            }),
        }
    }

    /// The critical sections below never panic, so poisoning cannot leave
    /// the queue half-mutated; recover the guard instead of propagating.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a new ticket, applying the drop policy when the queue is full.
    ///
    /// - Below the bound: append at tail, return the caller-side handle.
    /// - Full under drop-tail: return `None`; no ticket is created.
    /// - Full under drop-head: resolve the head ticket [`Verdict::Evicted`],
    ///   remove it, then append the new arrival.
    pub(crate) fn enqueue(&self) -> Option<Enqueued> {
        let mut inner = self.lock();

        if inner.tickets.len() >= self.max_len {
            if self.policy != OverflowPolicy::DropHead {
                return None;
            }
            if let Some(head) = inner.tickets.pop_front() {
                // Send fails only if the waiter is already gone; the entry
                // is removed either way, which is all eviction needs.
                let _ = head.tx.send(Verdict::Evicted);
            }
        }

        let id = inner.next_id;
        inner.next_id += 1;
        let (tx, rx) = oneshot::channel();
        inner.tickets.push_back(Ticket { id, tx });
        let depth = inner.tickets.len();
        Some(Enqueued { id, rx, depth })
    }

    /// Hands a freed slot to the oldest live waiter.
    ///
    /// Pops head tickets until one accepts [`Verdict::Granted`]; tickets
    /// whose waiters have been dropped are skipped. Returns the queue depth
    /// after the grant, or `None` when no live waiter remains (the caller
    /// then decrements the slot counter instead).
    pub(crate) fn grant_next(&self) -> Option<usize> {
        let mut inner = self.lock();
        while let Some(head) = inner.tickets.pop_front() {
            if head.tx.send(Verdict::Granted).is_ok() {
                return Some(inner.tickets.len());
            }
        }
        None
    }

    /// Removes a ticket by identity, on behalf of its own waiter.
    ///
    /// Returns `true` if the ticket was still present (the waiter now owns
    /// the denial), or `false` if a racing grant or eviction already
    /// resolved it — a safe no-op.
    pub(crate) fn remove(&self, id: u64) -> bool {
        let mut inner = self.lock();
        match inner.tickets.iter().position(|ticket| ticket.id == id) {
            Some(position) => {
                inner.tickets.remove(position);
                true
            }
            None => false,
        }
    }

    /// Current queue length.
    pub(crate) fn depth(&self) -> usize {
        self.lock().tickets.len()
    }
}
