//! Kringle event server.
//!
//! This crate is the caller side of the assignment engine:
//! - Event rosters, confirmation and exclusions
//! - At-most-once generation per event
//! - Assignment persistence with view tracking
//! - System time and OS randomness
//!
//! ## Architecture
//!
//! ```text
//! kringle-server
//!   ├─ SystemEnv        (production Environment impl)
//!   ├─ EventManager     (rosters, exclusions, generation, reveal)
//!   ├─ ActionExecutor   (persist + notify)
//!   ├─ Storage          (assignment persistence)
//!   └─ cli              (roster file + state file front end)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
mod error;
mod event_manager;
mod executor;
pub mod roster;
pub mod storage;
mod system_env;

pub use error::ServerError;
pub use event_manager::{
    AssignmentStatus, EventAction, EventError, EventId, EventManager, EventMetadata,
    ExclusionGroup, LogLevel, NotificationKind, Participant, ParticipantId, UserId,
};
pub use executor::{
    ActionExecutor, ExecutionReport, LogNotifier, Notifier, NotifyError, NotifyPolicy,
};
pub use roster::RosterFile;
pub use storage::{AssignmentRecord, MemoryStorage, Storage, StorageError};
pub use system_env::SystemEnv;
