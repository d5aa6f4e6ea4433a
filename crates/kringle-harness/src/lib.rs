//! Deterministic simulation harness for Kringle testing.
//!
//! Provides a seeded [`Environment`](kringle_core::Environment) so draws are
//! reproducible, plus a brute-force oracle and a reference event model.
//!
//! # Model-Based Testing
//!
//! The `model` module holds a reference implementation of the event
//! lifecycle. Operations are applied to both the model and the real
//! `EventManager`, and their results and observable state are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod sim_env;

pub use model::{
    ModelEvent, ModelGroupId, ModelParticipantId, ObservableState, Operation, OperationError,
    OperationResult, count_valid_cycles, is_feasible, valid_cycles,
};
pub use sim_env::SimEnv;
