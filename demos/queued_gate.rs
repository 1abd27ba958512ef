//! # Example: queued_gate
//!
//! A gate with a bounded FIFO wait queue, drop-head eviction, a maximum
//! time in queue, and the built-in [`LogWriter`] subscriber printing every
//! gate event.
//!
//! Demonstrates how to:
//! - Enable queueing with [`OverflowPolicy::DropHead`].
//! - Bound the wait with `max_time_in_queue`.
//! - Wire subscribers via [`AdmissionGate::with_subscribers`].
//!
//! ## Flow
//! ```text
//! 12 callers ──► gate (limit=2, queue=4, max wait=300ms)
//!     ├─► 2 admitted immediately
//!     ├─► 4 queued (oldest evicted as newer callers arrive)
//!     └─► the rest denied, each outcome printed by LogWriter
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example queued_gate --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqgate::{AdmissionGate, GateConfig, LogWriter, OverflowPolicy, Subscribe};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // 1. Two slots, four queue places, drop-head eviction, bounded wait.
    let config = GateConfig {
        limit: 2,
        policy: OverflowPolicy::DropHead,
        max_queue_length: 4,
        max_time_in_queue: Duration::from_millis(300),
        ..GateConfig::default()
    };

    // 2. Attach the demo logger to the gate's event bus.
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let gate = AdmissionGate::with_subscribers(config, subscribers);

    // 3. Stagger twelve callers so arrivals overlap with releases.
    let mut workers = Vec::new();
    for id in 0..12 {
        let gate = gate.clone();
        workers.push(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10 * id)).await;
            let caller = CancellationToken::new();
            match gate.admit(&caller).await {
                Ok(permit) => {
                    tokio::time::sleep(Duration::from_millis(150)).await;
                    permit.release();
                    println!("[caller {id}] finished");
                }
                Err(denied) => {
                    println!("[caller {id}] denied: {denied}");
                }
            }
        }));
    }

    for worker in workers {
        worker.await.expect("worker panicked");
    }

    // Give the subscriber worker a moment to drain the last events.
    tokio::time::sleep(Duration::from_millis(50)).await;
}
