//! # Event subscribers for the admission gate.
//!
//! This module provides the [`Subscribe`] trait and the fan-out machinery
//! for handling gate events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   AdmissionGate ── publish(Event) ──► Bus ──► fan-out listener
//!                                                   │
//!                                                   ▼
//!                                             SubscriberSet
//!                                        ┌─────────┼─────────┐
//!                                        ▼         ▼         ▼
//!                                    LogWriter  Metrics   Custom ...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use reqgate::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct OverloadCounter;
//!
//! #[async_trait]
//! impl Subscribe for OverloadCounter {
//!     async fn on_event(&self, event: &Event) {
//!         match event.kind {
//!             EventKind::Rejected | EventKind::QueueFull => {
//!                 // increment shed-load counter
//!             }
//!             _ => {}
//!         }
//!     }
//!     fn name(&self) -> &'static str { "overload_counter" }
//! }
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
