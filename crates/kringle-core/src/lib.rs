//! Kringle core: Sans-IO Secret Santa assignment engine.
//!
//! Given a confirmed roster and a reciprocal exclusion relation, the
//! [`AssignmentGenerator`] draws a single circular chain in which every
//! participant gives exactly once, receives exactly once, never to themself
//! and never to someone they exclude.
//!
//! ## Architecture
//!
//! ```text
//! kringle-core
//!   ├─ Environment          (time + randomness, injected by the caller)
//!   ├─ Exclusions           (giver -> forbidden receivers)
//!   ├─ AssignmentGenerator  (resample or backtracking search)
//!   └─ AssignmentCycle      (ordered chain + verification)
//! ```
//!
//! The crate performs no I/O. Persistence, notifications and event
//! lifecycle belong to the caller (see `kringle-server`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cycle;
pub mod env;
pub mod error;
pub mod exclusion;
pub mod generator;

pub use cycle::{Assignment, AssignmentCycle, CycleViolation};
pub use env::{EnvRng, Environment};
pub use error::GenerateError;
pub use exclusion::Exclusions;
pub use generator::{
    AssignmentGenerator, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_STEPS, GeneratorConfig, Strategy,
};

/// Smallest roster that can form a meaningful anonymous cycle.
///
/// One participant would give to themself and two would simply swap gifts.
pub const MIN_PARTICIPANTS: usize = 3;
