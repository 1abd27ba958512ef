//! # Events emitted by the admission gate.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Admission events**: how each arriving caller was handled
//!   (admitted, enqueued, denied in one of its forms)
//! - **Queue events**: tickets leaving the queue early (evicted, timed out,
//!   caller gone)
//! - **Release events**: slots returning to the gate (released, handed off)
//! - **Subscriber events**: delivery problems in the fan-out itself
//!   (overflow, panic)
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! in-flight counts, queue depth, and time spent waiting.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use reqgate::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TimedOut)
//!     .with_queue_depth(3)
//!     .with_waited(Duration::from_millis(250));
//!
//! assert_eq!(ev.kind, EventKind::TimedOut);
//! assert_eq!(ev.queue_depth, Some(3));
//! assert_eq!(ev.waited_ms, Some(250));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of gate events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Admission events ===
    /// A caller was admitted immediately (a free slot was available).
    ///
    /// Sets:
    /// - `in_flight`: executing count after admission
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Admitted,

    /// A caller was placed in the wait queue.
    ///
    /// Sets:
    /// - `queue_depth`: queue length after the append
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Enqueued,

    /// A caller was denied immediately under the reject policy.
    ///
    /// Sets:
    /// - `in_flight`: executing count at denial time
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Rejected,

    /// A caller was denied because the wait queue was full (drop-tail),
    /// or because queueing is configured with a zero-length queue.
    ///
    /// Sets:
    /// - `queue_depth`: queue length at denial time
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    QueueFull,

    // === Queue events ===
    /// The oldest waiter was evicted to make room for a newer arrival
    /// (drop-head).
    ///
    /// Sets:
    /// - `waited_ms`: time the evicted caller spent queued
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Evicted,

    /// A queued caller exceeded the maximum time in queue.
    ///
    /// Sets:
    /// - `waited_ms`: time the caller spent queued
    /// - `queue_depth`: queue length after removal
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TimedOut,

    /// A queued caller's own cancellation fired before a slot was granted.
    ///
    /// Sets:
    /// - `waited_ms`: time spent queued before the cancellation
    /// - `queue_depth`: queue length after removal
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    CallerGone,

    // === Release events ===
    /// A finishing caller handed its slot directly to the head of the queue.
    ///
    /// Sets:
    /// - `queue_depth`: queue length after the handoff
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    HandedOff,

    /// A finishing caller returned its slot to the gate (queue was empty).
    ///
    /// Sets:
    /// - `in_flight`: executing count after the decrement
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Released,

    // === Subscriber events ===
    /// A subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberOverflow,

    /// A subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: panic info/message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberPanicked,
}

/// Gate event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Callers executing protected work at the time of the event.
    pub in_flight: Option<usize>,
    /// Wait queue length at the time of the event.
    pub queue_depth: Option<usize>,
    /// Time spent waiting in the queue, in milliseconds (compact).
    pub waited_ms: Option<u64>,
    /// Name of the subscriber, for delivery-problem events.
    pub subscriber: Option<&'static str>,
    /// Human-readable reason (overflow details, panic message).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            in_flight: None,
            queue_depth: None,
            waited_ms: None,
            subscriber: None,
            reason: None,
        }
    }

    /// Attaches the executing-caller count.
    #[inline]
    pub fn with_in_flight(mut self, n: usize) -> Self {
        self.in_flight = Some(n);
        self
    }

    /// Attaches the wait queue depth.
    #[inline]
    pub fn with_queue_depth(mut self, n: usize) -> Self {
        self.queue_depth = Some(n);
        self
    }

    /// Attaches the time spent waiting (stored as milliseconds).
    #[inline]
    pub fn with_waited(mut self, d: Duration) -> Self {
        self.waited_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow).with_reason(reason);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::Admitted);
        let b = Event::new(EventKind::Released);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builders_set_fields() {
        let ev = Event::new(EventKind::HandedOff)
            .with_in_flight(4)
            .with_queue_depth(2)
            .with_waited(Duration::from_secs(1));
        assert_eq!(ev.in_flight, Some(4));
        assert_eq!(ev.queue_depth, Some(2));
        assert_eq!(ev.waited_ms, Some(1000));
    }
}
