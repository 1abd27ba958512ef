//! The admission gate: slot counter, wait queue, and the admit/release
//! protocol that composes them.
//!
//! ## Contents
//! - `counter` — lock-free tracking of executing callers against the limit
//! - `queue` — bounded FIFO of admission tickets, one critical section
//! - `core` — [`AdmissionGate`] / [`AdmissionPermit`], the public surface

mod core;
mod counter;
mod queue;

pub use core::{AdmissionGate, AdmissionPermit};
