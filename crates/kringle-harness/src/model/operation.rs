//! Operations for model-based testing.
//!
//! Operations represent every roster and assignment action an organizer or
//! participant can take on one event. They are generated randomly by
//! proptest (or `arbitrary` in fuzzing) and applied to both the model and the
//! real `EventManager`.

use arbitrary::Arbitrary;

/// Participant identifier (kept small so collisions are common).
pub type ModelParticipantId = u8;

/// Exclusion group identifier (mapped to a group name in the real system).
pub type ModelGroupId = u8;

/// Operations that can be applied to an event.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Register a participant.
    Register {
        /// Participant ID.
        id: ModelParticipantId,
        /// Email slot; equal slots mean equal emails.
        email_slot: u8,
        /// Register as already confirmed.
        confirmed: bool,
    },

    /// Confirm a participant.
    Confirm {
        /// Participant to confirm.
        id: ModelParticipantId,
    },

    /// Remove a participant.
    Remove {
        /// Participant to remove.
        id: ModelParticipantId,
    },

    /// Exclude a pair from drawing each other.
    Exclude {
        /// First participant.
        a: ModelParticipantId,
        /// Second participant.
        b: ModelParticipantId,
    },

    /// Create an exclusion group.
    CreateGroup {
        /// Group to create.
        group: ModelGroupId,
        /// Members (duplicates allowed).
        members: [ModelParticipantId; 3],
    },

    /// Delete an exclusion group.
    DeleteGroup {
        /// Group to delete.
        group: ModelGroupId,
    },

    /// Generate assignments for confirmed participants.
    Generate,

    /// A giver views their assignment.
    View {
        /// Giver.
        giver: ModelParticipantId,
    },

    /// Discard assignments.
    Reset,
}

impl Operation {
    /// Fold every participant and group ID into `0..participants` and
    /// `0..groups`.
    pub fn clamped(self, participants: u8, groups: u8) -> Self {
        let p = |id: ModelParticipantId| id % participants.max(1);
        let g = |id: ModelGroupId| id % groups.max(1);
        match self {
            Self::Register { id, email_slot, confirmed } => {
                Self::Register { id: p(id), email_slot: p(email_slot), confirmed }
            },
            Self::Confirm { id } => Self::Confirm { id: p(id) },
            Self::Remove { id } => Self::Remove { id: p(id) },
            Self::Exclude { a, b } => Self::Exclude { a: p(a), b: p(b) },
            Self::CreateGroup { group, members } => {
                Self::CreateGroup { group: g(group), members: members.map(p) }
            },
            Self::DeleteGroup { group } => Self::DeleteGroup { group: g(group) },
            Self::View { giver } => Self::View { giver: p(giver) },
            other @ (Self::Generate | Self::Reset) => other,
        }
    }
}

/// Result of applying an operation.
///
/// Used to compare model and real system behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation succeeded.
    Ok,

    /// Operation failed with expected error.
    Error(OperationError),
}

/// Expected errors that can occur during operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Roster is locked by existing assignments.
    Locked,

    /// Participant ID already registered.
    ParticipantExists,

    /// Email already registered.
    DuplicateEmail,

    /// Participant not registered.
    ParticipantNotFound,

    /// Participant excluded from themself.
    SelfExclusion,

    /// Group already exists.
    GroupExists,

    /// Group not found.
    GroupNotFound,

    /// Fewer than three confirmed participants.
    InsufficientParticipants,

    /// No valid cycle exists.
    ExclusionsTooRestrictive,

    /// Assignments already generated.
    AlreadyGenerated,

    /// Reset refused because someone viewed their assignment.
    AlreadyViewed,

    /// Giver has no assignment.
    AssignmentNotFound,
}

impl OperationResult {
    /// Check if operation succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, OperationResult::Ok)
    }

    /// Check if operation failed.
    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }
}

impl From<Result<(), OperationError>> for OperationResult {
    fn from(result: Result<(), OperationError>) -> Self {
        match result {
            Ok(()) => Self::Ok,
            Err(e) => Self::Error(e),
        }
    }
}
