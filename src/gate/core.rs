//! # AdmissionGate: the admit/release protocol.
//!
//! Composes the [`SlotCounter`] and the [`WaitQueue`] into the gate exposed
//! to the pipeline: decide, for each arriving caller, whether to admit
//! immediately, queue, or deny; release or hand off capacity when work
//! finishes.
//!
//! ## Admission flow
//! ```text
//! admit(caller)
//!   ├─► counter.try_acquire()  ── ok ──► AdmissionPermit          (Admitted)
//!   ├─► no queue configured    ───────► Denied::{Rejected,QueueFull}
//!   ├─► caller already gone    ───────► Denied::CallerGone
//!   └─► queue.enqueue()                                           (Enqueued)
//!         └─► select {
//!               ticket granted          ──► AdmissionPermit
//!               ticket evicted          ──► Denied::Evicted       (Evicted)
//!               caller cancelled        ──► Denied::CallerGone    (CallerGone)
//!               max time in queue hit   ──► Denied::TimedOut      (TimedOut)
//!             }
//! ```
//!
//! ## Release flow
//! Dropping an [`AdmissionPermit`] performs the release exactly once:
//! ```text
//! release()
//!   ├─► unlimited            ──► nothing to do
//!   ├─► queue.grant_next()   ──► slot handed to the oldest waiter (HandedOff)
//!   └─► counter.release_one()──► slot returned to the gate        (Released)
//! ```
//! The handoff never decrements the counter, so the executing count never
//! passes through a transient free state while a waiter is pending.
//!
//! ## Cancellation semantics
//! A queued caller is governed by two triggers merged in the select: its
//! own [`CancellationToken`] and the configured maximum time in queue.
//! Whichever fires first removes the ticket by identity inside the queue's
//! critical section. When the removal loses the race to a handoff, the
//! grant is honored and the caller proceeds with the permit.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::GateConfig;
use crate::error::Denied;
use crate::events::{Bus, Event, EventKind};
use crate::policies::OverflowPolicy;
use crate::subscribers::{Subscribe, SubscriberSet};

use super::counter::SlotCounter;
use super::queue::{Verdict, WaitQueue};

/// State shared by the gate, its permits, and its queued waiters.
struct Shared {
    counter: SlotCounter,
    queue: Option<WaitQueue>,
    policy: OverflowPolicy,
    max_wait: Option<Duration>,
    bus: Bus,
}

impl Shared {
    /// Returns one slot: hand it to the oldest live waiter, or give it back
    /// to the counter when nobody is waiting.
    fn release(&self) {
        if self.counter.is_unlimited() {
            return;
        }
        if let Some(queue) = &self.queue {
            if let Some(depth) = queue.grant_next() {
                self.bus
                    .publish(Event::new(EventKind::HandedOff).with_queue_depth(depth));
                return;
            }
        }
        self.counter.release_one();
        self.bus
            .publish(Event::new(EventKind::Released).with_in_flight(self.counter.in_flight()));
    }
}

/// Admission-control gate for one protected resource.
///
/// Limits the number of concurrently executing callers to the configured
/// capacity and applies an [`OverflowPolicy`] to excess demand. One gate
/// instance per protected resource; the gate is internally
/// reference-counted and can be freely cloned.
#[derive(Clone)]
pub struct AdmissionGate {
    shared: Arc<Shared>,
}

impl fmt::Debug for AdmissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionGate")
            .field("in_flight", &self.in_flight())
            .field("queue_depth", &self.queue_depth())
            .finish_non_exhaustive()
    }
}

impl AdmissionGate {
    /// Creates a gate from the given configuration.
    ///
    /// Invalid configuration values are clamped by [`GateConfig`]; this
    /// constructor never fails.
    pub fn new(config: GateConfig) -> Self {
        let queue = if config.queueing_enabled() {
            Some(WaitQueue::new(config.max_queue_length, config.policy))
        } else {
            None
        };
        Self {
            shared: Arc::new(Shared {
                counter: SlotCounter::new(config.concurrency_limit()),
                queue,
                policy: config.policy,
                max_wait: config.max_wait(),
                bus: Bus::new(config.bus_capacity_clamped()),
            }),
        }
    }

    /// Creates a gate and wires the given subscribers to its event bus.
    ///
    /// Spawns the fan-out listener, so this must be called from within a
    /// tokio runtime. The listener and all subscriber workers stop once the
    /// gate and every outstanding permit have been dropped.
    pub fn with_subscribers(config: GateConfig, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let gate = Self::new(config);
        let set = SubscriberSet::new(subscribers, gate.shared.bus.clone());
        let mut rx = gate.shared.bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        gate
    }

    /// Creates a receiver observing subsequent gate events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    /// Number of callers currently executing protected work.
    ///
    /// Always 0 for an unlimited gate (the count is not maintained).
    pub fn in_flight(&self) -> usize {
        self.shared.counter.in_flight()
    }

    /// Number of callers currently waiting in the queue.
    pub fn queue_depth(&self) -> usize {
        self.shared.queue.as_ref().map_or(0, WaitQueue::depth)
    }

    /// Requests admission for one caller.
    ///
    /// Returns `Ok` with a permit when a slot is available, either
    /// immediately or after waiting in the queue. Returns `Err` with the
    /// denial reason otherwise; see [`Denied`] for the taxonomy.
    ///
    /// While queued, the caller suspends cooperatively; it holds no worker
    /// thread. The wait ends on the first of: a freed slot handed over,
    /// eviction by a newer arrival (drop-head), the caller's own
    /// cancellation, or the configured maximum time in queue.
    pub async fn admit(&self, caller: &CancellationToken) -> Result<AdmissionPermit, Denied> {
        let shared = &self.shared;

        if shared.counter.try_acquire() {
            shared
                .bus
                .publish(Event::new(EventKind::Admitted).with_in_flight(shared.counter.in_flight()));
            return Ok(AdmissionPermit::new(Arc::clone(shared)));
        }

        let Some(queue) = &shared.queue else {
            return Err(self.deny_without_queueing());
        };

        if caller.is_cancelled() {
            shared
                .bus
                .publish(Event::new(EventKind::CallerGone).with_waited(Duration::ZERO));
            return Err(Denied::CallerGone);
        }

        let Some(enqueued) = queue.enqueue() else {
            shared
                .bus
                .publish(Event::new(EventKind::QueueFull).with_queue_depth(queue.depth()));
            return Err(Denied::QueueFull);
        };
        shared
            .bus
            .publish(Event::new(EventKind::Enqueued).with_queue_depth(enqueued.depth));

        let mut waiter = Waiter {
            id: enqueued.id,
            rx: enqueued.rx,
            queued_at: Instant::now(),
            shared: Arc::clone(shared),
        };

        let outcome = tokio::select! {
            verdict = &mut waiter.rx => WaitOutcome::Resolved(verdict.ok()),
            _ = caller.cancelled() => WaitOutcome::CallerGone,
            _ = max_wait_elapsed(shared.max_wait) => WaitOutcome::Expired,
        };

        match outcome {
            WaitOutcome::Resolved(Some(Verdict::Granted)) => {
                Ok(AdmissionPermit::new(Arc::clone(&waiter.shared)))
            }
            WaitOutcome::Resolved(_) => {
                shared
                    .bus
                    .publish(Event::new(EventKind::Evicted).with_waited(waiter.queued_at.elapsed()));
                Err(Denied::Evicted)
            }
            WaitOutcome::CallerGone => self.settle(waiter, Denied::CallerGone, EventKind::CallerGone),
            WaitOutcome::Expired => self.settle(waiter, Denied::TimedOut, EventKind::TimedOut),
        }
    }

    /// Denial for a gate with no wait queue configured.
    fn deny_without_queueing(&self) -> Denied {
        let shared = &self.shared;
        if shared.policy == OverflowPolicy::Reject {
            shared
                .bus
                .publish(Event::new(EventKind::Rejected).with_in_flight(shared.counter.in_flight()));
            Denied::Rejected
        } else {
            // Queueing policy with a zero-length queue behaves like a
            // permanently full queue.
            shared
                .bus
                .publish(Event::new(EventKind::QueueFull).with_queue_depth(0));
            Denied::QueueFull
        }
    }

    /// Resolves a waiter whose cancellation or timeout trigger fired.
    ///
    /// Closing the verdict channel first makes the race with a concurrent
    /// handoff decidable: either the grant already landed (honor it), or no
    /// grant can land anymore and the ticket is removed by identity.
    fn settle(
        &self,
        mut waiter: Waiter,
        denial: Denied,
        kind: EventKind,
    ) -> Result<AdmissionPermit, Denied> {
        let shared = &self.shared;
        waiter.rx.close();
        match waiter.rx.try_recv() {
            Ok(Verdict::Granted) => Ok(AdmissionPermit::new(Arc::clone(&waiter.shared))),
            Ok(Verdict::Evicted) => {
                shared
                    .bus
                    .publish(Event::new(EventKind::Evicted).with_waited(waiter.queued_at.elapsed()));
                Err(Denied::Evicted)
            }
            Err(_) => {
                if let Some(queue) = &shared.queue {
                    queue.remove(waiter.id);
                    shared.bus.publish(
                        Event::new(kind)
                            .with_waited(waiter.queued_at.elapsed())
                            .with_queue_depth(queue.depth()),
                    );
                }
                Err(denial)
            }
        }
    }
}

/// Completes when the maximum queue wait elapses; never when unlimited.
async fn max_wait_elapsed(max_wait: Option<Duration>) {
    match max_wait {
        Some(wait) => time::sleep(wait).await,
        None => std::future::pending::<()>().await,
    }
}

/// Outcome of the queued wait, computed inside the select arms so the
/// waiter itself stays free for the follow-up handling.
enum WaitOutcome {
    Resolved(Option<Verdict>),
    CallerGone,
    Expired,
}

/// Caller-side view of one queued ticket.
///
/// Dropping the waiter settles its ticket: a grant that nobody will consume
/// is released back to the gate, and an unresolved ticket is unlinked from
/// the queue. This covers admit futures that are dropped mid-wait.
struct Waiter {
    id: u64,
    rx: tokio::sync::oneshot::Receiver<Verdict>,
    queued_at: Instant,
    shared: Arc<Shared>,
}

impl Drop for Waiter {
    fn drop(&mut self) {
        self.rx.close();
        match self.rx.try_recv() {
            // A consumed receiver reports Closed here, so a permit that was
            // already claimed can never be released twice.
            Ok(Verdict::Granted) => self.shared.release(),
            Ok(Verdict::Evicted) => {}
            Err(_) => {
                if let Some(queue) = &self.shared.queue {
                    queue.remove(self.id);
                }
            }
        }
    }
}

/// An owned slot of the gate's execution capacity.
///
/// Held for the duration of the protected work; dropping it performs the
/// release exactly once — handing the slot to the oldest queued waiter, or
/// returning it to the counter when nobody waits.
#[must_use = "dropping the permit is what releases the slot"]
pub struct AdmissionPermit {
    shared: Arc<Shared>,
}

impl AdmissionPermit {
    fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Releases the slot explicitly. Equivalent to dropping the permit.
    pub fn release(self) {}
}

impl fmt::Debug for AdmissionPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionPermit").finish_non_exhaustive()
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.shared.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn build_gate(limit: usize, policy: OverflowPolicy, queue: usize, wait: Duration) -> AdmissionGate {
        AdmissionGate::new(GateConfig {
            limit,
            policy,
            max_queue_length: queue,
            max_time_in_queue: wait,
            ..GateConfig::default()
        })
    }

    async fn wait_for_depth(gate: &AdmissionGate, depth: usize) {
        while gate.queue_depth() < depth {
            time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test]
    async fn test_unlimited_admits_everyone() {
        let gate = AdmissionGate::new(GateConfig::default());
        let caller = CancellationToken::new();

        let mut permits = Vec::new();
        for _ in 0..100 {
            permits.push(gate.admit(&caller).await.expect("unlimited gate admits"));
        }
        assert_eq!(gate.in_flight(), 0, "unlimited gate keeps no count");
    }

    #[tokio::test]
    async fn test_reject_policy_denies_beyond_limit() {
        let gate = build_gate(10, OverflowPolicy::Reject, 0, Duration::ZERO);
        let caller = CancellationToken::new();

        let mut permits = Vec::new();
        for _ in 0..10 {
            permits.push(gate.admit(&caller).await.expect("below limit"));
        }
        assert_eq!(gate.in_flight(), 10);

        for _ in 0..20 {
            assert_eq!(gate.admit(&caller).await.unwrap_err(), Denied::Rejected);
        }
        assert_eq!(gate.in_flight(), 10, "denials never touch the count");

        permits.pop();
        assert!(gate.admit(&caller).await.is_ok(), "freed slot is reusable");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_drop_tail_sheds_exactly_the_overflow() {
        let gate = build_gate(10, OverflowPolicy::DropTail, 10, Duration::ZERO);
        let caller = CancellationToken::new();

        let mut held = Vec::new();
        for _ in 0..10 {
            held.push(gate.admit(&caller).await.unwrap());
        }

        let mut queued = Vec::new();
        for _ in 0..10 {
            let gate = gate.clone();
            let caller = caller.clone();
            queued.push(tokio::spawn(async move { gate.admit(&caller).await }));
        }
        wait_for_depth(&gate, 10).await;

        // The queue is full: the next ten arrivals are denied immediately,
        // not merely delayed.
        for _ in 0..10 {
            assert_eq!(gate.admit(&caller).await.unwrap_err(), Denied::QueueFull);
        }

        held.clear();
        let mut admitted_from_queue = 0;
        for handle in queued {
            let permit = handle.await.unwrap().expect("queued waiter is admitted");
            permit.release();
            admitted_from_queue += 1;
        }
        assert_eq!(admitted_from_queue, 10);
        assert_eq!(gate.in_flight(), 0);
        assert_eq!(gate.queue_depth(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_drop_head_denies_the_oldest_waiters() {
        let gate = build_gate(10, OverflowPolicy::DropHead, 10, Duration::ZERO);
        let caller = CancellationToken::new();

        let mut held = Vec::new();
        for _ in 0..10 {
            held.push(gate.admit(&caller).await.unwrap());
        }

        // Enqueue one by one so arrival order is unambiguous.
        let mut waiters = Vec::new();
        for index in 0..20 {
            let gate_clone = gate.clone();
            let caller = caller.clone();
            waiters.push(tokio::spawn(async move {
                (index, gate_clone.admit(&caller).await)
            }));
            wait_for_depth(&gate, (index + 1).min(10)).await;
        }

        held.clear();

        let mut evicted = Vec::new();
        let mut admitted = Vec::new();
        for handle in waiters {
            let (index, result) = handle.await.unwrap();
            match result {
                Ok(permit) => {
                    permit.release();
                    admitted.push(index);
                }
                Err(denied) => {
                    assert_eq!(denied, Denied::Evicted);
                    evicted.push(index);
                }
            }
        }
        evicted.sort_unstable();
        admitted.sort_unstable();
        assert_eq!(evicted, (0..10).collect::<Vec<_>>(), "oldest are shed");
        assert_eq!(admitted, (10..20).collect::<Vec<_>>(), "newest survive");
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_timeout_denies_even_though_a_slot_frees_later() {
        let gate = build_gate(2, OverflowPolicy::DropTail, 2, Duration::from_millis(50));
        let caller = CancellationToken::new();

        // Holders keep their slots longer than the maximum queue wait.
        let mut holders = Vec::new();
        for _ in 0..2 {
            let gate = gate.clone();
            let caller = caller.clone();
            holders.push(tokio::spawn(async move {
                let permit = gate.admit(&caller).await.unwrap();
                time::sleep(Duration::from_millis(200)).await;
                permit.release();
            }));
        }
        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(gate.in_flight(), 2);

        let started = time::Instant::now();
        let denied = gate.admit(&caller).await.unwrap_err();
        assert_eq!(denied, Denied::TimedOut);
        assert_eq!(started.elapsed(), Duration::from_millis(50));
        assert_eq!(gate.queue_depth(), 0, "timed-out ticket is unlinked");

        for holder in holders {
            holder.await.unwrap();
        }
        assert_eq!(gate.in_flight(), 0);
        assert!(gate.admit(&caller).await.is_ok());
    }

    #[tokio::test]
    async fn test_caller_cancellation_while_queued() {
        let gate = build_gate(1, OverflowPolicy::DropTail, 4, Duration::ZERO);
        let steady = CancellationToken::new();
        let held = gate.admit(&steady).await.unwrap();

        let flaky = CancellationToken::new();
        let admit = {
            let gate = gate.clone();
            let flaky = flaky.clone();
            tokio::spawn(async move { gate.admit(&flaky).await })
        };
        wait_for_depth(&gate, 1).await;

        flaky.cancel();
        assert_eq!(admit.await.unwrap().unwrap_err(), Denied::CallerGone);
        assert_eq!(gate.queue_depth(), 0, "cancelled ticket is unlinked");

        drop(held);
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_caller_already_gone_is_never_queued() {
        let gate = build_gate(1, OverflowPolicy::DropTail, 4, Duration::ZERO);
        let steady = CancellationToken::new();
        let _held = gate.admit(&steady).await.unwrap();

        let gone = CancellationToken::new();
        gone.cancel();
        assert_eq!(gate.admit(&gone).await.unwrap_err(), Denied::CallerGone);
        assert_eq!(gate.queue_depth(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_admit_future_unlinks_its_ticket() {
        let gate = build_gate(1, OverflowPolicy::DropTail, 4, Duration::ZERO);
        let caller = CancellationToken::new();
        let held = gate.admit(&caller).await.unwrap();

        let abandoned = time::timeout(Duration::from_millis(20), gate.admit(&caller)).await;
        assert!(abandoned.is_err(), "admit future dropped mid-wait");
        assert_eq!(gate.queue_depth(), 0, "dropped future leaves no ticket");

        drop(held);
        assert_eq!(gate.in_flight(), 0, "slot is not swallowed by a dead waiter");
    }

    #[tokio::test]
    async fn test_handoff_transfers_the_slot_directly() {
        let gate = build_gate(1, OverflowPolicy::DropTail, 4, Duration::ZERO);
        let caller = CancellationToken::new();
        let mut events = gate.subscribe();

        let first = gate.admit(&caller).await.unwrap();

        let second = {
            let gate = gate.clone();
            let caller = caller.clone();
            tokio::spawn(async move { gate.admit(&caller).await })
        };
        wait_for_depth(&gate, 1).await;

        first.release();
        let permit = second.await.unwrap().expect("handoff admits the waiter");
        assert_eq!(gate.in_flight(), 1, "the slot never passed through a free state");

        let mut kinds = Vec::new();
        while let Ok(ev) = events.try_recv() {
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::HandedOff));
        assert!(
            !kinds.contains(&EventKind::Released),
            "a handoff must not also count as a release: {kinds:?}"
        );

        permit.release();
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_exactly_once_resolution_under_racing_interleavings() {
        const LIMIT: usize = 4;
        const CALLERS: usize = 64;

        let gate = build_gate(LIMIT, OverflowPolicy::DropHead, 8, Duration::from_millis(20));
        let mut tasks = Vec::new();

        for _ in 0..CALLERS {
            let gate = gate.clone();
            tasks.push(tokio::spawn(async move {
                let (pre_delay, hold, cancel_after) = {
                    let mut rng = rand::thread_rng();
                    (
                        rng.gen_range(0..10),
                        rng.gen_range(1..5),
                        if rng.gen_bool(0.25) {
                            Some(rng.gen_range(0..15))
                        } else {
                            None
                        },
                    )
                };

                let caller = CancellationToken::new();
                if let Some(after) = cancel_after {
                    let caller = caller.clone();
                    tokio::spawn(async move {
                        time::sleep(Duration::from_millis(after)).await;
                        caller.cancel();
                    });
                }

                time::sleep(Duration::from_millis(pre_delay)).await;
                match gate.admit(&caller).await {
                    Ok(permit) => {
                        assert!(gate.in_flight() <= LIMIT, "limit breached");
                        time::sleep(Duration::from_millis(hold)).await;
                        permit.release();
                        true
                    }
                    Err(_) => false,
                }
            }));
        }

        let mut admitted = 0;
        for task in tasks {
            // Every admit resolves exactly once; a double resolution would
            // panic in the oneshot and a lost one would hang the test.
            if task.await.unwrap() {
                admitted += 1;
            }
        }
        assert!(admitted >= LIMIT, "at least the first wave is admitted");
        assert_eq!(gate.in_flight(), 0, "all slots returned");
        assert_eq!(gate.queue_depth(), 0, "no ticket left behind");
    }

    #[tokio::test]
    async fn test_queueing_policy_with_zero_length_queue_denies() {
        let gate = build_gate(1, OverflowPolicy::DropHead, 0, Duration::ZERO);
        let caller = CancellationToken::new();
        let _held = gate.admit(&caller).await.unwrap();

        assert_eq!(gate.admit(&caller).await.unwrap_err(), Denied::QueueFull);
    }

    #[tokio::test]
    async fn test_subscribers_observe_admissions() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Tally {
            admitted: Arc<AtomicUsize>,
        }

        #[async_trait::async_trait]
        impl Subscribe for Tally {
            async fn on_event(&self, event: &Event) {
                if event.kind == EventKind::Admitted {
                    self.admitted.fetch_add(1, Ordering::SeqCst);
                }
            }
            fn name(&self) -> &'static str {
                "tally"
            }
        }

        let admitted = Arc::new(AtomicUsize::new(0));
        let gate = AdmissionGate::with_subscribers(
            GateConfig {
                limit: 4,
                ..GateConfig::default()
            },
            vec![Arc::new(Tally {
                admitted: Arc::clone(&admitted),
            })],
        );

        let caller = CancellationToken::new();
        for _ in 0..3 {
            gate.admit(&caller).await.unwrap().release();
        }

        // Fan-out is asynchronous; give the listener a moment to drain.
        for _ in 0..50 {
            if admitted.load(Ordering::SeqCst) == 3 {
                break;
            }
            time::sleep(Duration::from_millis(2)).await;
        }
        assert_eq!(admitted.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_release_without_waiters_decrements() {
        let gate = build_gate(2, OverflowPolicy::DropTail, 2, Duration::ZERO);
        let caller = CancellationToken::new();
        let mut events = gate.subscribe();

        let permit = gate.admit(&caller).await.unwrap();
        assert_eq!(gate.in_flight(), 1);
        permit.release();
        assert_eq!(gate.in_flight(), 0);

        let mut kinds = Vec::new();
        while let Ok(ev) = events.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(kinds, vec![EventKind::Admitted, EventKind::Released]);
    }
}
