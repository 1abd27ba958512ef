//! Denial outcomes produced by the admission gate.
//!
//! This module defines [`Denied`], the taxonomy of reasons a caller was not
//! admitted. Every variant is an **expected outcome** of overload handling,
//! not a fault: the gate never panics or aborts for ordinary overload, and
//! nothing inside the gate is retried on the caller's behalf.
//!
//! [`Denied`] provides [`as_label`](Denied::as_label) for logs/metrics and
//! [`is_overload`](Denied::is_overload) to decide whether an overload
//! response should be sent at all.

use thiserror::Error;

/// # Reasons a caller was denied admission.
///
/// Returned by [`AdmissionGate::admit`](crate::AdmissionGate::admit). The
/// transport layer typically maps every overload variant to a
/// service-unavailable response, and [`Denied::CallerGone`] to no response
/// at all (the connection is already gone).
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denied {
    /// All slots are taken and the policy rejects without queueing.
    #[error("concurrency limit reached")]
    Rejected,

    /// The wait queue is full under drop-tail; no ticket was created.
    #[error("wait queue full")]
    QueueFull,

    /// A newer arrival displaced this caller from the queue under drop-head.
    #[error("evicted from wait queue by a newer arrival")]
    Evicted,

    /// The caller spent longer than the configured maximum time in the queue.
    #[error("timed out waiting for a free slot")]
    TimedOut,

    /// The caller's own cancellation fired before a slot was granted.
    #[error("caller cancelled while waiting for admission")]
    CallerGone,
}

impl Denied {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use reqgate::Denied;
    ///
    /// assert_eq!(Denied::QueueFull.as_label(), "queue_full");
    /// assert_eq!(Denied::TimedOut.as_label(), "timed_out");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            Denied::Rejected => "rejected",
            Denied::QueueFull => "queue_full",
            Denied::Evicted => "evicted",
            Denied::TimedOut => "timed_out",
            Denied::CallerGone => "caller_gone",
        }
    }

    /// Indicates whether the denial should surface to the caller as an
    /// overload signal.
    ///
    /// Returns `false` only for [`Denied::CallerGone`]: the caller has
    /// already disconnected, so there is nobody left to answer.
    ///
    /// # Example
    /// ```
    /// use reqgate::Denied;
    ///
    /// assert!(Denied::Rejected.is_overload());
    /// assert!(!Denied::CallerGone.is_overload());
    /// ```
    pub fn is_overload(&self) -> bool {
        !matches!(self, Denied::CallerGone)
    }
}
