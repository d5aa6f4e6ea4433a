//! Reference model for model-based testing.
//!
//! The model is a deliberately naive rendition of the event lifecycle: plain
//! sets and maps, and feasibility decided by enumerating every cycle. It is
//! the oracle the real implementation is checked against.
//!
//! # Design Principles
//!
//! - Simplicity: The model should be obviously correct
//! - Exhaustive: Feasibility is decided by enumeration, never by search
//! - Deterministic: Same inputs produce same outputs

pub mod operation;
mod oracle;
mod world;

pub use operation::{
    ModelGroupId, ModelParticipantId, Operation, OperationError, OperationResult,
};
pub use oracle::{count_valid_cycles, is_feasible, valid_cycles};
pub use world::{ModelEvent, ObservableState};
