//! # Gate configuration.
//!
//! Provides [`GateConfig`], the recognized options of one admission gate.
//!
//! Config is consumed once, at gate construction:
//! `AdmissionGate::new(config)`.
//!
//! ## Sentinel values
//! - `limit = 0` → unlimited (no concurrency cap, admission always succeeds)
//! - `max_queue_length = 0` → no wait queue (queueing policies deny like a full queue)
//! - `max_time_in_queue = 0s` → queued callers wait indefinitely
//!
//! Invalid values are clamped here, at configuration time; the gate never
//! raises a configuration error at call time.

use std::time::Duration;

use crate::policies::OverflowPolicy;

/// Configuration for one [`AdmissionGate`](crate::AdmissionGate) instance.
///
/// Defines:
/// - **Capacity**: how many callers may execute protected work at once
/// - **Overflow behavior**: what happens to callers beyond the limit
/// - **Queue bounds**: maximum queued callers and maximum time in queue
/// - **Event system**: bus capacity for gate event delivery
///
/// ## Field semantics
/// - `limit`: concurrent execution cap (`0` = unlimited)
/// - `policy`: overflow policy applied when the cap is reached
/// - `max_queue_length`: wait queue bound (`0` = no queue)
/// - `max_time_in_queue`: per-caller queue wait cap (`0s` = unlimited)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to
/// avoid sprinkling sentinel checks (`0`) across call sites.
#[derive(Clone, Debug)]
pub struct GateConfig {
    /// Maximum number of callers executing protected work concurrently.
    ///
    /// - `0` = unlimited (every caller is admitted immediately)
    /// - `n > 0` = at most `n` callers execute simultaneously
    pub limit: usize,

    /// What happens to a caller that arrives while all slots are taken.
    ///
    /// See [`OverflowPolicy`] for the trade-offs between the variants.
    pub policy: OverflowPolicy,

    /// Maximum number of callers waiting in the queue.
    ///
    /// - `0` = no queue; queueing policies deny exactly like a full queue
    /// - `n > 0` = up to `n` callers wait for a freed slot
    ///
    /// Ignored when `policy` is [`OverflowPolicy::Reject`].
    pub max_queue_length: usize,

    /// Maximum time one caller may spend in the wait queue.
    ///
    /// - `Duration::ZERO` = unlimited (wait until a slot frees or the caller goes away)
    /// - `> 0` = the caller is denied once this much time passes in the queue
    pub max_time_in_queue: Duration,

    /// Capacity of the gate event broadcast ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events will
    /// receive `Lagged` and skip older items. Minimum value is 1 (clamped).
    pub bus_capacity: usize,
}

impl GateConfig {
    /// Returns the concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` concurrent callers
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.limit == 0 { None } else { Some(self.limit) }
    }

    /// Returns the maximum queue wait as an `Option`.
    ///
    /// - `None` → queued callers wait indefinitely
    /// - `Some(d)` → queued callers are denied after `d`
    #[inline]
    pub fn max_wait(&self) -> Option<Duration> {
        if self.max_time_in_queue == Duration::ZERO {
            None
        } else {
            Some(self.max_time_in_queue)
        }
    }

    /// Returns `true` when excess callers are actually queued.
    ///
    /// Requires both a queueing [`OverflowPolicy`] and a positive
    /// `max_queue_length`; either alone still means immediate denial.
    #[inline]
    pub fn queueing_enabled(&self) -> bool {
        self.policy.queues() && self.max_queue_length > 0
    }

    /// Returns the bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for GateConfig {
    /// Default configuration:
    ///
    /// - `limit = 0` (unlimited)
    /// - `policy = OverflowPolicy::Reject`
    /// - `max_queue_length = 0` (no queue)
    /// - `max_time_in_queue = 0s` (unlimited wait)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            limit: 0,
            policy: OverflowPolicy::default(),
            max_queue_length: 0,
            max_time_in_queue: Duration::ZERO,
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unlimited_reject() {
        let cfg = GateConfig::default();
        assert_eq!(cfg.concurrency_limit(), None);
        assert_eq!(cfg.policy, OverflowPolicy::Reject);
        assert_eq!(cfg.max_wait(), None);
        assert!(!cfg.queueing_enabled());
    }

    #[test]
    fn test_sentinel_accessors() {
        let cfg = GateConfig {
            limit: 8,
            max_time_in_queue: Duration::from_millis(250),
            ..GateConfig::default()
        };
        assert_eq!(cfg.concurrency_limit(), Some(8));
        assert_eq!(cfg.max_wait(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_queueing_requires_policy_and_length() {
        let mut cfg = GateConfig {
            policy: OverflowPolicy::DropTail,
            ..GateConfig::default()
        };
        assert!(!cfg.queueing_enabled(), "zero-length queue must not queue");

        cfg.max_queue_length = 4;
        assert!(cfg.queueing_enabled());

        cfg.policy = OverflowPolicy::Reject;
        assert!(!cfg.queueing_enabled(), "reject policy must not queue");
    }

    #[test]
    fn test_bus_capacity_clamped() {
        let cfg = GateConfig {
            bus_capacity: 0,
            ..GateConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
