//! JSON roster files.
//!
//! A roster file describes one event the way the organizer sees it:
//!
//! ```json
//! {
//!   "event": { "id": 1, "name": "Office 2026", "organizer": 7 },
//!   "participants": [
//!     { "id": 1, "name": "Ann", "email": "ann@example.com", "confirmed": true, "exclusions": [2] },
//!     { "id": 2, "name": "Bob", "email": "bob@example.com", "confirmed": true }
//!   ],
//!   "exclusion_groups": [ { "name": "Smith family", "members": [3, 4] } ]
//! }
//! ```
//!
//! Per-participant `exclusions` are one-directional in the file, as an
//! organizer would tick them; loading always applies them reciprocally.

use std::path::Path;

use kringle_core::Environment;
use serde::{Deserialize, Serialize};

use crate::{
    error::ServerError,
    event_manager::{EventId, EventManager, Participant, ParticipantId, UserId},
};

/// Event header in a roster file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEntry {
    /// Event ID
    pub id: EventId,
    /// Event name
    pub name: String,
    /// Organizer ID
    #[serde(default)]
    pub organizer: UserId,
}

/// Participant line in a roster file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantEntry {
    /// Participant ID
    pub id: ParticipantId,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Whether the participant confirmed
    #[serde(default)]
    pub confirmed: bool,
    /// Participants this person must not draw
    #[serde(default)]
    pub exclusions: Vec<ParticipantId>,
}

/// Exclusion group in a roster file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    /// Group name
    pub name: String,
    /// Members
    pub members: Vec<ParticipantId>,
}

/// Parsed roster file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterFile {
    /// Event header
    pub event: EventEntry,
    /// Registrants
    #[serde(default)]
    pub participants: Vec<ParticipantEntry>,
    /// Named exclusion groups
    #[serde(default)]
    pub exclusion_groups: Vec<GroupEntry>,
}

impl RosterFile {
    /// Parse a roster from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ServerError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a roster file.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Create the event in `manager` and apply registrations,
    /// confirmations, exclusions and groups.
    ///
    /// # Errors
    ///
    /// Any [`EventError`](crate::EventError) raised while applying the file,
    /// e.g. duplicate emails or exclusions naming unknown participants.
    pub fn apply<E: Environment>(
        &self,
        manager: &mut EventManager,
        env: &E,
    ) -> Result<EventId, ServerError> {
        let event_id = self.event.id;
        manager.create_event(event_id, self.event.organizer, self.event.name.clone(), env)?;

        for entry in &self.participants {
            manager.register_participant(
                event_id,
                Participant {
                    id: entry.id,
                    name: entry.name.clone(),
                    email: entry.email.clone(),
                    confirmed: entry.confirmed,
                },
            )?;
        }

        for entry in &self.participants {
            for excluded in &entry.exclusions {
                manager.exclude_pair(event_id, entry.id, *excluded)?;
            }
        }

        for group in &self.exclusion_groups {
            manager.create_exclusion_group(event_id, group.name.clone(), &group.members)?;
        }

        tracing::debug!(
            "loaded roster for '{}': {} participants, {} groups",
            self.event.name,
            self.participants.len(),
            self.exclusion_groups.len()
        );
        Ok(event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = r#"{
        "event": { "id": 5, "name": "Family", "organizer": 1 },
        "participants": [
            { "id": 1, "name": "Ann", "email": "ann@example.com", "confirmed": true, "exclusions": [2] },
            { "id": 2, "name": "Bob", "email": "bob@example.com", "confirmed": true },
            { "id": 3, "name": "Cy", "email": "cy@example.com" },
            { "id": 4, "name": "Di", "email": "di@example.com", "confirmed": true }
        ],
        "exclusion_groups": [ { "name": "Kids", "members": [3, 4] } ]
    }"#;

    #[test]
    fn parses_defaults() {
        let roster = RosterFile::from_json(ROSTER).unwrap();

        assert_eq!(roster.event.id, 5);
        assert!(!roster.participants[2].confirmed);
        assert!(roster.participants[1].exclusions.is_empty());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = RosterFile::from_json("{ \"event\": ").unwrap_err();
        assert!(matches!(err, ServerError::Roster(_)));
    }
}
