//! # reqgate
//!
//! **Reqgate** is a lightweight admission-control gate for async Rust services.
//!
//! It limits the number of concurrently executing units of work to a fixed
//! capacity and applies a configurable policy to excess demand: reject
//! immediately, or enqueue with bounded capacity and an optional maximum
//! wait time, under strict FIFO ordering. The crate is designed as a
//! building block for transport layers that must protect a bounded-capacity
//! downstream resource from overload.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   caller #1  │   │   caller #2  │   │   caller #3  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  AdmissionGate (one per protected resource)                       │
//! │  - SlotCounter (lock-free, compare-and-swap)                      │
//! │  - WaitQueue (bounded FIFO, one critical section)                 │
//! │  - Bus (broadcast gate events)                                    │
//! └──────┬──────────────────────┬─────────────────────────┬──────────┘
//!        ▼                      ▼                         ▼
//!   AdmissionPermit        Denied::{Rejected,        Event stream
//!   (RAII slot guard)       QueueFull, Evicted,      (subscribers)
//!                           TimedOut, CallerGone}
//! ```
//!
//! ### Lifecycle
//! ```text
//! admit(caller_token)
//!   │
//!   ├─► free slot?  ──────────────► AdmissionPermit (immediate)
//!   │
//!   ├─► policy = Reject ──────────► Denied::Rejected
//!   │
//!   └─► enqueue ticket (FIFO, bounded)
//!         ├─ queue full + DropTail ──► Denied::QueueFull
//!         ├─ queue full + DropHead ──► oldest waiter gets Denied::Evicted
//!         └─ wait, suspended, until one of:
//!              ├─ slot handed off        ──► AdmissionPermit
//!              ├─ evicted by a newcomer  ──► Denied::Evicted
//!              ├─ caller token cancelled ──► Denied::CallerGone
//!              └─ max time in queue hit  ──► Denied::TimedOut
//!
//! drop(permit)  (work finished — success, failure, or cancellation)
//!   ├─► oldest live waiter gets the slot directly (no transient free state)
//!   └─► otherwise the slot count is decremented
//! ```
//!
//! ## Features
//! | Area              | Description                                                             | Key types / traits                    |
//! |-------------------|-------------------------------------------------------------------------|---------------------------------------|
//! | **Admission**     | Capacity-limited admission with RAII release.                           | [`AdmissionGate`], [`AdmissionPermit`]|
//! | **Policies**      | What happens to callers beyond the limit.                               | [`OverflowPolicy`]                    |
//! | **Denials**       | Typed overload outcomes for the transport layer.                        | [`Denied`]                            |
//! | **Configuration** | Capacity, queue bounds, and wait caps with clamped sentinels.           | [`GateConfig`]                        |
//! | **Subscriber API**| Hook into gate events (logging, metrics, custom subscribers).           | [`Subscribe`], [`Event`]              |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use reqgate::{AdmissionGate, GateConfig, OverflowPolicy};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let gate = AdmissionGate::new(GateConfig {
//!         limit: 2,
//!         policy: OverflowPolicy::DropTail,
//!         max_queue_length: 8,
//!         max_time_in_queue: Duration::from_millis(500),
//!         ..GateConfig::default()
//!     });
//!
//!     let caller = CancellationToken::new();
//!     match gate.admit(&caller).await {
//!         Ok(permit) => {
//!             // ... protected work ...
//!             permit.release();
//!         }
//!         Err(denied) if denied.is_overload() => {
//!             // answer with an overload response (e.g. HTTP 503)
//!         }
//!         Err(_) => {
//!             // caller already gone: nobody left to answer
//!         }
//!     }
//! }
//! ```

mod config;
mod error;
mod events;
mod gate;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use config::GateConfig;
pub use error::Denied;
pub use events::{Bus, Event, EventKind};
pub use gate::{AdmissionGate, AdmissionPermit};
pub use policies::OverflowPolicy;
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
