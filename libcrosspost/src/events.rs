//! Poster event stream
//!
//! Each posting task reports its lifecycle through a broadcast bus so any
//! number of observers (queue owners, progress UIs, log sinks) can follow the
//! attempt without being consulted. Emission never blocks: with no
//! subscribers the event is dropped, and a lagging subscriber loses oldest
//! events first.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event receiver type alias
pub type EventReceiver = broadcast::Receiver<PosterEvent>;

/// Broadcast bus distributing poster events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PosterEvent>,
}

impl EventBus {
    /// Create a new event bus.
    ///
    /// `capacity` bounds how many events each subscriber can buffer before
    /// older ones are dropped.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers without blocking.
    pub fn emit(&self, event: PosterEvent) {
        // send() errors only when nobody is listening, which is fine
        let _ = self.sender.send(event);
    }

    /// Number of active subscribers. Debugging aid, not for control flow.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Lifecycle events of a single posting task.
///
/// A task emits at most one terminal event: `Done` or `Cancelled`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PosterEvent {
    /// The scheduling delay elapsed.
    Ready {
        submission_id: String,
        account_id: String,
        /// True when the task now idles until `begin_externally`.
        waits_for_external_start: bool,
    },

    /// A cancellation request took effect before dispatch.
    Cancelled {
        submission_id: String,
        account_id: String,
        cancelled: bool,
    },

    /// The attempt passed the point of no return and is dispatching.
    Posting {
        submission_id: String,
        account_id: String,
    },

    /// The attempt failed; always followed by `Done { success: false }`.
    Error {
        submission_id: String,
        account_id: String,
        message: String,
    },

    /// Terminal outcome of the attempt.
    Done {
        submission_id: String,
        account_id: String,
        success: bool,
        sources: Vec<String>,
        cancelled: bool,
    },
}
