//! # Example: basic_gate
//!
//! Minimal example of a reject-policy gate: two slots, everything beyond
//! them is denied immediately.
//!
//! Demonstrates how to:
//! - Build an [`AdmissionGate`] from a [`GateConfig`].
//! - Admit callers and hold the returned [`AdmissionPermit`] during work.
//! - Map denials to an overload answer.
//!
//! ## Flow
//! ```text
//! caller ──► gate.admit(token)
//!     ├─► Ok(permit)        ──► do work ──► drop(permit)
//!     └─► Err(denied)       ──► report overload
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_gate
//! ```

use std::time::Duration;

use reqgate::{AdmissionGate, GateConfig};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // 1. Two slots, reject policy (the default): no queue, fast-fail.
    let gate = AdmissionGate::new(GateConfig {
        limit: 2,
        ..GateConfig::default()
    });

    // 2. Fire six callers at the gate at once.
    let mut workers = Vec::new();
    for id in 0..6 {
        let gate = gate.clone();
        workers.push(tokio::spawn(async move {
            let caller = CancellationToken::new();
            match gate.admit(&caller).await {
                Ok(permit) => {
                    println!("[caller {id}] admitted, working...");
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    permit.release();
                    println!("[caller {id}] done");
                }
                Err(denied) => {
                    println!("[caller {id}] denied: {denied} ({})", denied.as_label());
                }
            }
        }));
    }

    for worker in workers {
        worker.await.expect("worker panicked");
    }
}
