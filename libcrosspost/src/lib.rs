//! Crosspost - scheduled submission posting to content-hosting destinations
//!
//! This library drives a submission through a timer-deferred, cancellable
//! posting task against any destination that implements the
//! [`destinations::Destination`] capability contract.

pub mod accounts;
pub mod config;
pub mod description;
pub mod destinations;
pub mod error;
pub mod events;
pub mod logging;
pub mod payload;
pub mod poster;
pub mod shortcuts;
pub mod types;

// Re-export commonly used types
pub use config::{Config, PostingConfig};
pub use error::{CrosspostError, DestinationError, Result};
pub use events::{EventBus, EventReceiver, PosterEvent};
pub use poster::Poster;
pub use shortcuts::ShortcutRegistry;
pub use types::{LoginStatus, Submission, SubmissionPart};
