//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints gate events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [admitted] in_flight=3
//! [enqueued] queue_depth=2
//! [rejected] in_flight=10
//! [queue-full] queue_depth=10
//! [evicted] waited_ms=120
//! [timed-out] waited_ms=300 queue_depth=1
//! [handed-off] queue_depth=0
//! [released] in_flight=9
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use - implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::Admitted => {
                println!("[admitted] in_flight={:?}", e.in_flight);
            }
            EventKind::Enqueued => {
                println!("[enqueued] queue_depth={:?}", e.queue_depth);
            }
            EventKind::Rejected => {
                println!("[rejected] in_flight={:?}", e.in_flight);
            }
            EventKind::QueueFull => {
                println!("[queue-full] queue_depth={:?}", e.queue_depth);
            }
            EventKind::Evicted => {
                println!("[evicted] waited_ms={:?}", e.waited_ms);
            }
            EventKind::TimedOut => {
                println!(
                    "[timed-out] waited_ms={:?} queue_depth={:?}",
                    e.waited_ms, e.queue_depth
                );
            }
            EventKind::CallerGone => {
                println!("[caller-gone] waited_ms={:?}", e.waited_ms);
            }
            EventKind::HandedOff => {
                println!("[handed-off] queue_depth={:?}", e.queue_depth);
            }
            EventKind::Released => {
                println!("[released] in_flight={:?}", e.in_flight);
            }
            EventKind::SubscriberOverflow => {
                println!(
                    "[subscriber-overflow] subscriber={:?} reason={:?}",
                    e.subscriber, e.reason
                );
            }
            EventKind::SubscriberPanicked => {
                println!(
                    "[subscriber-panicked] subscriber={:?} reason={:?}",
                    e.subscriber, e.reason
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
