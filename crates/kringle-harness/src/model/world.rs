//! Model event - the reference implementation of one event's lifecycle.

use std::collections::{BTreeMap, BTreeSet};

use kringle_core::{Exclusions, MIN_PARTICIPANTS};

use super::{
    operation::{ModelGroupId, ModelParticipantId, Operation, OperationError, OperationResult},
    oracle,
};

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObservableState {
    /// Registered participants with their confirmation flag.
    pub participants: Vec<(ModelParticipantId, bool)>,
    /// Excluded pairs with `a < b`.
    pub excluded_pairs: Vec<(ModelParticipantId, ModelParticipantId)>,
    /// Groups with their current members.
    pub groups: Vec<(ModelGroupId, Vec<ModelParticipantId>)>,
    /// Number of assignments, if generated.
    pub assignments: usize,
    /// Number of viewed assignments.
    pub viewed: usize,
}

#[derive(Debug, Clone, Copy)]
struct ModelParticipant {
    email_slot: u8,
    confirmed: bool,
}

/// Model event.
#[derive(Debug, Clone, Default)]
pub struct ModelEvent {
    participants: BTreeMap<ModelParticipantId, ModelParticipant>,
    /// Unordered pairs, stored as `(min, max)`.
    excluded: BTreeSet<(ModelParticipantId, ModelParticipantId)>,
    groups: BTreeMap<ModelGroupId, BTreeSet<ModelParticipantId>>,
    /// Giver -> viewed, present once generated.
    assignments: Option<BTreeMap<ModelParticipantId, bool>>,
}

fn pair(a: ModelParticipantId, b: ModelParticipantId) -> (ModelParticipantId, ModelParticipantId) {
    (a.min(b), a.max(b))
}

impl ModelEvent {
    /// Empty event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Confirmed participants in ID order.
    pub fn confirmed(&self) -> Vec<ModelParticipantId> {
        self.participants.iter().filter(|(_, p)| p.confirmed).map(|(id, _)| *id).collect()
    }

    /// Whether assignments currently exist.
    pub fn is_locked(&self) -> bool {
        self.assignments.is_some()
    }

    /// Whether `a` and `b` are excluded from each other.
    pub fn excludes(&self, a: ModelParticipantId, b: ModelParticipantId) -> bool {
        self.excluded.contains(&pair(a, b))
    }

    /// Apply an operation and return the result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        let result = match op {
            Operation::Register { id, email_slot, confirmed } => {
                self.register(*id, *email_slot, *confirmed)
            },
            Operation::Confirm { id } => self.confirm(*id),
            Operation::Remove { id } => self.remove(*id),
            Operation::Exclude { a, b } => self.exclude(*a, *b),
            Operation::CreateGroup { group, members } => self.create_group(*group, members),
            Operation::DeleteGroup { group } => self.delete_group(*group),
            Operation::Generate => self.generate(),
            Operation::View { giver } => self.view(*giver),
            Operation::Reset => self.reset(),
        };
        result.into()
    }

    /// Observable state.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            participants: self.participants.iter().map(|(id, p)| (*id, p.confirmed)).collect(),
            excluded_pairs: self.excluded.iter().copied().collect(),
            groups: self
                .groups
                .iter()
                .map(|(id, members)| (*id, members.iter().copied().collect()))
                .collect(),
            assignments: self.assignments.as_ref().map_or(0, BTreeMap::len),
            viewed: self.assignments.as_ref().map_or(0, |a| a.values().filter(|v| **v).count()),
        }
    }

    fn unlocked(&self) -> Result<(), OperationError> {
        if self.is_locked() { Err(OperationError::Locked) } else { Ok(()) }
    }

    fn known(&self, id: ModelParticipantId) -> Result<(), OperationError> {
        if self.participants.contains_key(&id) {
            Ok(())
        } else {
            Err(OperationError::ParticipantNotFound)
        }
    }

    fn register(
        &mut self,
        id: ModelParticipantId,
        email_slot: u8,
        confirmed: bool,
    ) -> Result<(), OperationError> {
        self.unlocked()?;
        if self.participants.contains_key(&id) {
            return Err(OperationError::ParticipantExists);
        }
        if self.participants.values().any(|p| p.email_slot == email_slot) {
            return Err(OperationError::DuplicateEmail);
        }
        self.participants.insert(id, ModelParticipant { email_slot, confirmed });
        Ok(())
    }

    fn confirm(&mut self, id: ModelParticipantId) -> Result<(), OperationError> {
        self.unlocked()?;
        let participant =
            self.participants.get_mut(&id).ok_or(OperationError::ParticipantNotFound)?;
        participant.confirmed = true;
        Ok(())
    }

    fn remove(&mut self, id: ModelParticipantId) -> Result<(), OperationError> {
        self.unlocked()?;
        self.participants.remove(&id).ok_or(OperationError::ParticipantNotFound)?;
        self.excluded.retain(|(a, b)| *a != id && *b != id);
        for members in self.groups.values_mut() {
            members.remove(&id);
        }
        Ok(())
    }

    fn exclude(&mut self, a: ModelParticipantId, b: ModelParticipantId) -> Result<(), OperationError> {
        self.unlocked()?;
        if a == b {
            return Err(OperationError::SelfExclusion);
        }
        self.known(a)?;
        self.known(b)?;
        self.excluded.insert(pair(a, b));
        Ok(())
    }

    fn create_group(
        &mut self,
        group: ModelGroupId,
        members: &[ModelParticipantId],
    ) -> Result<(), OperationError> {
        self.unlocked()?;
        if self.groups.contains_key(&group) {
            return Err(OperationError::GroupExists);
        }
        for member in members {
            self.known(*member)?;
        }

        let members: BTreeSet<_> = members.iter().copied().collect();
        for a in &members {
            for b in &members {
                if a < b {
                    self.excluded.insert((*a, *b));
                }
            }
        }
        self.groups.insert(group, members);
        Ok(())
    }

    fn delete_group(&mut self, group: ModelGroupId) -> Result<(), OperationError> {
        self.unlocked()?;
        let members = self.groups.remove(&group).ok_or(OperationError::GroupNotFound)?;
        for a in &members {
            for b in &members {
                if a < b {
                    self.excluded.remove(&(*a, *b));
                }
            }
        }
        Ok(())
    }

    fn generate(&mut self) -> Result<(), OperationError> {
        if self.is_locked() {
            return Err(OperationError::AlreadyGenerated);
        }

        let confirmed = self.confirmed();
        if confirmed.len() < MIN_PARTICIPANTS {
            return Err(OperationError::InsufficientParticipants);
        }

        let exclusions: Exclusions<ModelParticipantId> = self
            .excluded
            .iter()
            .filter(|(a, b)| confirmed.contains(a) && confirmed.contains(b))
            .copied()
            .collect();
        if !oracle::is_feasible(&confirmed, &exclusions) {
            return Err(OperationError::ExclusionsTooRestrictive);
        }

        self.assignments = Some(confirmed.into_iter().map(|id| (id, false)).collect());
        Ok(())
    }

    fn view(&mut self, giver: ModelParticipantId) -> Result<(), OperationError> {
        self.known(giver)?;
        let viewed = self
            .assignments
            .as_mut()
            .and_then(|a| a.get_mut(&giver))
            .ok_or(OperationError::AssignmentNotFound)?;
        *viewed = true;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), OperationError> {
        if self.observable_state().viewed > 0 {
            return Err(OperationError::AlreadyViewed);
        }
        self.assignments = None;
        Ok(())
    }
}
