//! Event Manager
//!
//! Owns event rosters and drives assignment generation for them.
//!
//! ## Responsibilities
//!
//! - Event Lifecycle: create events, lock the roster once assignments exist
//! - Roster: registration, confirmation, removal
//! - Exclusions: reciprocal pairs and named exclusion groups
//! - Generation: at-most-once per event, confirmed participants only
//! - Reveal: per-giver lookup with view tracking
//!
//! ## Design
//!
//! - Exclusions are always stored symmetrically, so the generator never has
//!   to repair them.
//! - Action-based: generation returns actions (persist, notify, log) for the
//!   executor. Reads and view marks go through `Storage` directly.

use std::{
    collections::{BTreeMap, HashMap},
    time::SystemTime,
};

use kringle_core::{AssignmentGenerator, Environment, Exclusions, GenerateError, MIN_PARTICIPANTS};
use serde::{Deserialize, Serialize};

use crate::storage::{AssignmentRecord, Storage, StorageError};

/// Event identifier.
pub type EventId = u128;

/// Participant identifier, unique across events.
pub type ParticipantId = u64;

/// Organizer account identifier.
pub type UserId = u64;

/// A registrant in an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant ID
    pub id: ParticipantId,
    /// Display name
    pub name: String,
    /// Contact email, unique per event (case-insensitive)
    pub email: String,
    /// Whether the participant opted in
    pub confirmed: bool,
}

/// Named set of participants who must not draw each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionGroup {
    /// Group name, unique per event
    pub name: String,
    /// Members
    pub members: Vec<ParticipantId>,
}

/// Metadata about an event.
#[derive(Debug, Clone)]
pub struct EventMetadata {
    /// Organizer who created the event
    pub organizer: UserId,
    /// Event name
    pub name: String,
    /// When the event was created
    pub created_at: SystemTime,
    /// When assignments were generated, if they were
    pub assignments_revealed_at: Option<SystemTime>,
}

#[derive(Debug, Clone)]
struct EventState {
    metadata: EventMetadata,
    participants: BTreeMap<ParticipantId, Participant>,
    exclusions: Exclusions<ParticipantId>,
    groups: BTreeMap<String, ExclusionGroup>,
}

impl EventState {
    fn participant(&self, id: ParticipantId) -> Result<&Participant, EventError> {
        self.participants.get(&id).ok_or(EventError::ParticipantNotFound(id))
    }

    fn ensure_unlocked(&self) -> Result<(), EventError> {
        if self.metadata.assignments_revealed_at.is_some() {
            return Err(EventError::AssignmentsLocked);
        }
        Ok(())
    }

    fn confirmed_ids(&self) -> Vec<ParticipantId> {
        self.participants.values().filter(|p| p.confirmed).map(|p| p.id).collect()
    }
}

/// Kinds of notification the event layer asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Assignments are ready to be viewed.
    AssignmentReveal,
}

/// Log level carried by [`EventAction::Log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug
    Debug,
    /// Info
    Info,
    /// Warn
    Warn,
}

/// Actions returned by EventManager for the executor to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum EventAction {
    /// Persist the full assignment set
    PersistAssignments {
        /// Event the assignments belong to
        event_id: EventId,
        /// One record per giver
        records: Vec<AssignmentRecord>,
    },

    /// Notify participants
    Notify {
        /// Event concerned
        event_id: EventId,
        /// What happened
        kind: NotificationKind,
        /// Who to tell
        recipients: Vec<ParticipantId>,
    },

    /// Emit a log line
    Log {
        /// Severity
        level: LogLevel,
        /// Message
        message: String,
    },
}

/// Errors from EventManager operations
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Event does not exist
    #[error("event not found: {0:032x}")]
    EventNotFound(EventId),

    /// Event already exists
    #[error("event already exists: {0:032x}")]
    EventAlreadyExists(EventId),

    /// Participant is not registered for the event
    #[error("participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    /// Participant ID already registered for the event
    #[error("participant already registered: {0}")]
    ParticipantAlreadyExists(ParticipantId),

    /// Email already registered for the event
    #[error("email already registered for this event: {0}")]
    DuplicateEmail(String),

    /// A participant cannot exclude themself
    #[error("participant {0} cannot exclude themself")]
    SelfExclusion(ParticipantId),

    /// Exclusion group name already used in the event
    #[error("exclusion group already exists: {0}")]
    DuplicateGroupName(String),

    /// Exclusion group does not exist
    #[error("exclusion group not found: {0}")]
    GroupNotFound(String),

    /// Roster changes are not allowed once assignments exist
    #[error("roster is locked: assignments have been generated")]
    AssignmentsLocked,

    /// Assignments were already generated for this event
    #[error("assignments have already been generated for this event")]
    AssignmentsAlreadyGenerated,

    /// At least one participant has seen their assignment
    #[error("{viewed} assignment(s) already viewed; regeneration is not allowed")]
    AssignmentsAlreadyViewed {
        /// Number of viewed assignments
        viewed: usize,
    },

    /// Generator could not produce a cycle
    #[error("generation failed: {0}")]
    Generation(#[from] GenerateError),

    /// A stored assignment names someone who is not on the roster
    #[error("stored assignment {giver} -> {receiver} names a participant missing from the roster")]
    UnknownAssignee {
        /// Giver of the stored record
        giver: ParticipantId,
        /// Receiver of the stored record
        receiver: ParticipantId,
    },

    /// Storage error occurred
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Viewed/total assignment counts for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssignmentStatus {
    /// Assignments generated
    pub total: usize,
    /// Assignments the giver has opened
    pub viewed: usize,
}

/// Orchestrates rosters, exclusions and generation per event
#[derive(Debug, Default)]
pub struct EventManager {
    events: HashMap<EventId, EventState>,
}

impl EventManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an event exists
    pub fn has_event(&self, event_id: EventId) -> bool {
        self.events.contains_key(&event_id)
    }

    /// Event metadata, if the event exists
    pub fn metadata(&self, event_id: EventId) -> Option<&EventMetadata> {
        self.events.get(&event_id).map(|e| &e.metadata)
    }

    fn event(&self, event_id: EventId) -> Result<&EventState, EventError> {
        self.events.get(&event_id).ok_or(EventError::EventNotFound(event_id))
    }

    fn event_mut(&mut self, event_id: EventId) -> Result<&mut EventState, EventError> {
        self.events.get_mut(&event_id).ok_or(EventError::EventNotFound(event_id))
    }

    /// Creates an event owned by `organizer`.
    ///
    /// # Errors
    ///
    /// Returns `EventError::EventAlreadyExists` if the ID is taken.
    pub fn create_event<E: Environment>(
        &mut self,
        event_id: EventId,
        organizer: UserId,
        name: impl Into<String>,
        env: &E,
    ) -> Result<(), EventError> {
        if self.has_event(event_id) {
            return Err(EventError::EventAlreadyExists(event_id));
        }

        let metadata = EventMetadata {
            organizer,
            name: name.into(),
            created_at: env.wall_clock(),
            assignments_revealed_at: None,
        };
        self.events.insert(
            event_id,
            EventState {
                metadata,
                participants: BTreeMap::new(),
                exclusions: Exclusions::new(),
                groups: BTreeMap::new(),
            },
        );

        tracing::debug!("created event {:032x}", event_id);
        Ok(())
    }

    /// Register a participant. New registrants start unconfirmed unless
    /// `participant.confirmed` says otherwise.
    ///
    /// # Errors
    ///
    /// - `EventError::AssignmentsLocked` once assignments exist
    /// - `EventError::ParticipantAlreadyExists` for a reused ID
    /// - `EventError::DuplicateEmail` for a reused email (case-insensitive)
    pub fn register_participant(
        &mut self,
        event_id: EventId,
        participant: Participant,
    ) -> Result<(), EventError> {
        let event = self.event_mut(event_id)?;
        event.ensure_unlocked()?;

        if event.participants.contains_key(&participant.id) {
            return Err(EventError::ParticipantAlreadyExists(participant.id));
        }
        let email = participant.email.trim().to_lowercase();
        if event.participants.values().any(|p| p.email.trim().to_lowercase() == email) {
            return Err(EventError::DuplicateEmail(participant.email));
        }

        event.participants.insert(participant.id, participant);
        Ok(())
    }

    /// Mark a participant as confirmed. Confirming twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `EventError::ParticipantNotFound` for an unknown participant.
    pub fn confirm_participant(
        &mut self,
        event_id: EventId,
        participant_id: ParticipantId,
    ) -> Result<(), EventError> {
        let event = self.event_mut(event_id)?;
        event.ensure_unlocked()?;
        let participant = event
            .participants
            .get_mut(&participant_id)
            .ok_or(EventError::ParticipantNotFound(participant_id))?;
        participant.confirmed = true;
        Ok(())
    }

    /// Remove a participant together with every exclusion and group
    /// membership that mentions them.
    ///
    /// # Errors
    ///
    /// - `EventError::AssignmentsLocked` once assignments exist
    /// - `EventError::ParticipantNotFound` for an unknown participant
    pub fn remove_participant(
        &mut self,
        event_id: EventId,
        participant_id: ParticipantId,
    ) -> Result<Participant, EventError> {
        let event = self.event_mut(event_id)?;
        event.ensure_unlocked()?;

        let removed = event
            .participants
            .remove(&participant_id)
            .ok_or(EventError::ParticipantNotFound(participant_id))?;
        event.exclusions.remove_participant(&participant_id);
        for group in event.groups.values_mut() {
            group.members.retain(|m| *m != participant_id);
        }
        Ok(removed)
    }

    /// Participants in ID order.
    pub fn participants(&self, event_id: EventId) -> Result<Vec<&Participant>, EventError> {
        Ok(self.event(event_id)?.participants.values().collect())
    }

    /// Look up one participant.
    pub fn participant(
        &self,
        event_id: EventId,
        participant_id: ParticipantId,
    ) -> Result<&Participant, EventError> {
        self.event(event_id)?.participant(participant_id)
    }

    /// Exclude `a` and `b` from drawing each other, in both directions.
    ///
    /// # Errors
    ///
    /// - `EventError::SelfExclusion` if `a == b`
    /// - `EventError::ParticipantNotFound` if either is unknown
    pub fn exclude_pair(
        &mut self,
        event_id: EventId,
        a: ParticipantId,
        b: ParticipantId,
    ) -> Result<(), EventError> {
        let event = self.event_mut(event_id)?;
        event.ensure_unlocked()?;
        if a == b {
            return Err(EventError::SelfExclusion(a));
        }
        event.participant(a)?;
        event.participant(b)?;

        event.exclusions.insert_pair(a, b);
        Ok(())
    }

    /// Drop the exclusion between `a` and `b`.
    pub fn remove_exclusion(
        &mut self,
        event_id: EventId,
        a: ParticipantId,
        b: ParticipantId,
    ) -> Result<(), EventError> {
        let event = self.event_mut(event_id)?;
        event.ensure_unlocked()?;
        event.exclusions.remove_pair(&a, &b);
        Ok(())
    }

    /// Current exclusion relation of an event.
    pub fn exclusions(&self, event_id: EventId) -> Result<&Exclusions<ParticipantId>, EventError> {
        Ok(&self.event(event_id)?.exclusions)
    }

    /// Create a named group whose members are pairwise excluded.
    ///
    /// # Errors
    ///
    /// - `EventError::DuplicateGroupName` if the name is taken
    /// - `EventError::ParticipantNotFound` if a member is unknown
    pub fn create_exclusion_group(
        &mut self,
        event_id: EventId,
        name: impl Into<String>,
        members: &[ParticipantId],
    ) -> Result<(), EventError> {
        let name = name.into();
        let event = self.event_mut(event_id)?;
        event.ensure_unlocked()?;

        if event.groups.contains_key(&name) {
            return Err(EventError::DuplicateGroupName(name));
        }
        for member in members {
            event.participant(*member)?;
        }

        let mut unique = members.to_vec();
        unique.sort_unstable();
        unique.dedup();

        event.exclusions.insert_group(&unique);
        tracing::debug!("exclusion group '{}' applied to {} members", name, unique.len());
        event.groups.insert(name.clone(), ExclusionGroup { name, members: unique });
        Ok(())
    }

    /// Delete a group and the exclusions it applied.
    ///
    /// # Errors
    ///
    /// Returns `EventError::GroupNotFound` for an unknown name.
    pub fn delete_exclusion_group(&mut self, event_id: EventId, name: &str) -> Result<(), EventError> {
        let event = self.event_mut(event_id)?;
        event.ensure_unlocked()?;
        let group =
            event.groups.remove(name).ok_or_else(|| EventError::GroupNotFound(name.to_string()))?;
        event.exclusions.remove_group(&group.members);
        Ok(())
    }

    /// Groups in name order.
    pub fn exclusion_groups(&self, event_id: EventId) -> Result<Vec<&ExclusionGroup>, EventError> {
        Ok(self.event(event_id)?.groups.values().collect())
    }

    /// Whether enough participants have confirmed to attempt a draw.
    pub fn can_generate(&self, event_id: EventId) -> Result<bool, EventError> {
        Ok(self.event(event_id)?.confirmed_ids().len() >= MIN_PARTICIPANTS)
    }

    /// Re-derive the locked state of an event from storage.
    ///
    /// Called after the executor persisted a draw, and when a manager is
    /// rebuilt from a roster after assignments were persisted by an earlier
    /// process. The roster is locked only if storage holds assignments.
    ///
    /// # Errors
    ///
    /// Returns `EventError::UnknownAssignee` if a stored record names a
    /// giver or receiver that is not registered; the event is left as it was.
    pub fn load_assignment_state(
        &mut self,
        event_id: EventId,
        storage: &impl Storage,
    ) -> Result<(), EventError> {
        let records = storage.load_assignments(event_id)?;
        let event = self.event_mut(event_id)?;

        if let Some(orphan) = records.iter().find(|r| {
            !event.participants.contains_key(&r.giver)
                || !event.participants.contains_key(&r.receiver)
        }) {
            return Err(EventError::UnknownAssignee {
                giver: orphan.giver,
                receiver: orphan.receiver,
            });
        }

        event.metadata.assignments_revealed_at = records.iter().map(|r| r.assigned_at).min();
        Ok(())
    }

    /// Generate assignments for the confirmed participants of an event.
    ///
    /// 1. Refuse if assignments already exist (at-most-once per event)
    /// 2. Collect confirmed participants and the exclusions among them
    /// 3. Run the generator
    /// 4. Return persist + notify actions
    ///
    /// Nothing is returned for persistence unless the whole cycle is valid.
    /// The roster stays unlocked until the records are in storage; callers
    /// execute the actions and then call [`EventManager::load_assignment_state`].
    ///
    /// # Errors
    ///
    /// - `EventError::AssignmentsAlreadyGenerated` if the event has assignments
    /// - `EventError::Generation` if the generator fails
    pub fn generate_assignments<E: Environment>(
        &self,
        event_id: EventId,
        generator: &AssignmentGenerator,
        env: &E,
        storage: &impl Storage,
    ) -> Result<Vec<EventAction>, EventError> {
        let event = self.event(event_id)?;
        if event.metadata.assignments_revealed_at.is_some() || storage.has_assignments(event_id)? {
            return Err(EventError::AssignmentsAlreadyGenerated);
        }

        let confirmed = event.confirmed_ids();
        let exclusions = event.exclusions.restricted_to(|id| {
            event.participants.get(id).is_some_and(|p| p.confirmed)
        });

        let cycle = generator.generate(&confirmed, &exclusions, env)?;

        let now = env.wall_clock();
        let records: Vec<AssignmentRecord> = cycle
            .pairs()
            .into_iter()
            .map(|a| AssignmentRecord {
                giver: a.giver,
                receiver: a.receiver,
                assigned_at: now,
                viewed_at: None,
            })
            .collect();

        Ok(vec![
            EventAction::PersistAssignments { event_id, records },
            EventAction::Notify {
                event_id,
                kind: NotificationKind::AssignmentReveal,
                recipients: confirmed.clone(),
            },
            EventAction::Log {
                level: LogLevel::Info,
                message: format!(
                    "generated {} assignments for event '{}'",
                    confirmed.len(),
                    event.metadata.name
                ),
            },
        ])
    }

    /// Return the giver's assignment and mark it viewed.
    ///
    /// # Errors
    ///
    /// - `EventError::ParticipantNotFound` for an unknown giver
    /// - `EventError::UnknownAssignee` if the receiver left the roster; the
    ///   view is not recorded
    /// - `EventError::Storage` if no assignment exists for the giver
    pub fn view_assignment<E: Environment>(
        &self,
        event_id: EventId,
        giver: ParticipantId,
        env: &E,
        storage: &impl Storage,
    ) -> Result<AssignmentRecord, EventError> {
        let event = self.event(event_id)?;
        event.participant(giver)?;

        let record = storage
            .load_assignments(event_id)?
            .into_iter()
            .find(|r| r.giver == giver)
            .ok_or(StorageError::NotFound { event_id, giver })?;
        if !event.participants.contains_key(&record.receiver) {
            return Err(EventError::UnknownAssignee { giver, receiver: record.receiver });
        }

        Ok(storage.mark_viewed(event_id, giver, env.wall_clock())?)
    }

    /// Viewed/total counts for an event.
    pub fn assignment_status(
        &self,
        event_id: EventId,
        storage: &impl Storage,
    ) -> Result<AssignmentStatus, EventError> {
        self.event(event_id)?;
        let records = storage.load_assignments(event_id)?;
        Ok(AssignmentStatus {
            total: records.len(),
            viewed: records.iter().filter(|r| r.is_viewed()).count(),
        })
    }

    /// Discard assignments so the event can be drawn again.
    ///
    /// # Errors
    ///
    /// Returns `EventError::AssignmentsAlreadyViewed` if anyone has looked at
    /// their assignment; revealed assignments are immutable.
    pub fn reset_assignments(
        &mut self,
        event_id: EventId,
        storage: &impl Storage,
    ) -> Result<usize, EventError> {
        let status = self.assignment_status(event_id, storage)?;
        if status.viewed > 0 {
            return Err(EventError::AssignmentsAlreadyViewed { viewed: status.viewed });
        }

        let removed = storage.clear_assignments(event_id)?;
        self.event_mut(event_id)?.metadata.assignments_revealed_at = None;
        tracing::info!("cleared {} assignments for event {:032x}", removed, event_id);
        Ok(removed)
    }
}
