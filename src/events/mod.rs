//! Gate events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to the events emitted by the admission gate.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publisher**: `AdmissionGate` (admission outcomes, releases, handoffs).
//! - **Consumers**: the fan-out listener spawned by
//!   `AdmissionGate::with_subscribers`, and any receiver obtained from
//!   `AdmissionGate::subscribe()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
