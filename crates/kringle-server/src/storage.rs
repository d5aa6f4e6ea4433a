//! Assignment persistence.
//!
//! The storage layer re-checks the two invariants it can see on its own,
//! `giver != receiver` and one assignment per giver per event, independently
//! of the generator. Writes are all-or-nothing: a batch that fails any check
//! leaves storage untouched.

use std::{
    collections::{HashMap, HashSet},
    sync::{PoisonError, RwLock},
    time::SystemTime,
};

use serde::{Deserialize, Serialize};

use crate::event_manager::{EventId, ParticipantId};

/// A persisted giver -> receiver assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// Participant who gives.
    pub giver: ParticipantId,
    /// Participant who receives.
    pub receiver: ParticipantId,
    /// When the assignment was generated.
    pub assigned_at: SystemTime,
    /// When the giver first looked at it.
    pub viewed_at: Option<SystemTime>,
}

impl AssignmentRecord {
    /// True once the giver has seen their assignment.
    pub fn is_viewed(&self) -> bool {
        self.viewed_at.is_some()
    }
}

/// Errors from storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// A record pairs a participant with themself.
    #[error("self assignment for participant {0}")]
    SelfAssignment(ParticipantId),

    /// A giver appears twice in one event.
    #[error("participant {0} already gives in this event")]
    DuplicateGiver(ParticipantId),

    /// The event already has assignments.
    #[error("event {0:032x} already has assignments")]
    AlreadyAssigned(EventId),

    /// No assignment for this giver.
    #[error("no assignment for participant {giver} in event {event_id:032x}")]
    NotFound {
        /// Event searched.
        event_id: EventId,
        /// Giver searched.
        giver: ParticipantId,
    },

    /// Snapshot could not be encoded or decoded.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// Storage backend for assignments.
pub trait Storage: Send + Sync {
    /// Persist the full assignment set for an event.
    ///
    /// # Errors
    ///
    /// - `StorageError::AlreadyAssigned` if the event has assignments
    /// - `StorageError::SelfAssignment` / `StorageError::DuplicateGiver` if
    ///   the batch breaks an invariant
    fn store_assignments(
        &self,
        event_id: EventId,
        records: &[AssignmentRecord],
    ) -> Result<(), StorageError>;

    /// All assignments for an event (empty if none).
    fn load_assignments(&self, event_id: EventId) -> Result<Vec<AssignmentRecord>, StorageError>;

    /// Whether the event has any assignments.
    fn has_assignments(&self, event_id: EventId) -> Result<bool, StorageError> {
        Ok(!self.load_assignments(event_id)?.is_empty())
    }

    /// Record that `giver` viewed their assignment and return it.
    ///
    /// The first view timestamp is kept on repeated views.
    fn mark_viewed(
        &self,
        event_id: EventId,
        giver: ParticipantId,
        at: SystemTime,
    ) -> Result<AssignmentRecord, StorageError>;

    /// Remove all assignments for an event, returning how many were removed.
    fn clear_assignments(&self, event_id: EventId) -> Result<usize, StorageError>;
}

fn check_batch(records: &[AssignmentRecord]) -> Result<(), StorageError> {
    let mut givers = HashSet::with_capacity(records.len());
    for record in records {
        if record.giver == record.receiver {
            return Err(StorageError::SelfAssignment(record.giver));
        }
        if !givers.insert(record.giver) {
            return Err(StorageError::DuplicateGiver(record.giver));
        }
    }
    Ok(())
}

/// In-memory storage, snapshot-able to CBOR.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    events: RwLock<HashMap<EventId, Vec<AssignmentRecord>>>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode every stored assignment as CBOR.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Snapshot` if encoding fails.
    pub fn snapshot(&self) -> Result<Vec<u8>, StorageError> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        let mut buf = Vec::new();
        ciborium::ser::into_writer(&*events, &mut buf)
            .map_err(|e| StorageError::Snapshot(e.to_string()))?;
        Ok(buf)
    }

    /// Rebuild storage from [`MemoryStorage::snapshot`] output.
    ///
    /// Every event batch is re-validated.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Snapshot` on malformed input, or the batch
    /// invariant error if a restored event is inconsistent.
    pub fn restore(bytes: &[u8]) -> Result<Self, StorageError> {
        let events: HashMap<EventId, Vec<AssignmentRecord>> =
            ciborium::de::from_reader(bytes).map_err(|e| StorageError::Snapshot(e.to_string()))?;
        for records in events.values() {
            check_batch(records)?;
        }
        Ok(Self { events: RwLock::new(events) })
    }
}

impl Storage for MemoryStorage {
    fn store_assignments(
        &self,
        event_id: EventId,
        records: &[AssignmentRecord],
    ) -> Result<(), StorageError> {
        check_batch(records)?;

        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        if events.get(&event_id).is_some_and(|existing| !existing.is_empty()) {
            return Err(StorageError::AlreadyAssigned(event_id));
        }
        events.insert(event_id, records.to_vec());
        Ok(())
    }

    fn load_assignments(&self, event_id: EventId) -> Result<Vec<AssignmentRecord>, StorageError> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        Ok(events.get(&event_id).cloned().unwrap_or_default())
    }

    fn mark_viewed(
        &self,
        event_id: EventId,
        giver: ParticipantId,
        at: SystemTime,
    ) -> Result<AssignmentRecord, StorageError> {
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        let record = events
            .get_mut(&event_id)
            .and_then(|records| records.iter_mut().find(|r| r.giver == giver))
            .ok_or(StorageError::NotFound { event_id, giver })?;

        if record.viewed_at.is_none() {
            record.viewed_at = Some(at);
        }
        Ok(record.clone())
    }

    fn clear_assignments(&self, event_id: EventId) -> Result<usize, StorageError> {
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        Ok(events.remove(&event_id).map_or(0, |records| records.len()))
    }
}
