//! Generator error types.

use thiserror::Error;

/// Errors from [`AssignmentGenerator::generate`](crate::AssignmentGenerator::generate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// Not enough confirmed participants to form a cycle.
    #[error("insufficient participants: found {found}, need at least {required}")]
    InsufficientParticipants {
        /// Participants supplied.
        found: usize,
        /// Minimum required.
        required: usize,
    },

    /// The same participant id was supplied more than once.
    #[error("duplicate participant at position {index}")]
    DuplicateParticipant {
        /// Position of the second occurrence in the input.
        index: usize,
    },

    /// No valid cycle was found within the budget.
    #[error("exclusions too restrictive: no valid cycle after {attempts} attempts")]
    ExclusionsTooRestrictive {
        /// Attempts (or search steps) consumed before giving up.
        attempts: u64,
    },
}

impl GenerateError {
    /// Returns true if a later call can succeed without changing the input.
    ///
    /// Only budget exhaustion qualifies, and only because each call draws
    /// fresh randomness. Callers usually prompt the organizer to relax
    /// exclusions instead.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ExclusionsTooRestrictive { .. } => true,
            Self::InsufficientParticipants { .. } | Self::DuplicateParticipant { .. } => false,
        }
    }
}
