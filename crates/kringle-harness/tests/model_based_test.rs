//! Model-based property tests.
//!
//! These tests generate random operation sequences and verify that the real
//! `EventManager` behaves identically to the reference model.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!      ModelEvent     RealEvent       Compare
//!      (reference)   (EventManager)   Results + State
//! ```

use kringle_core::{AssignmentGenerator, GenerateError, GeneratorConfig, generator};
use kringle_harness::{
    ModelEvent, ModelGroupId, ModelParticipantId, ObservableState, Operation, OperationError,
    OperationResult, SimEnv,
};
use kringle_server::{
    ActionExecutor, EventError, EventId, EventManager, LogNotifier, MemoryStorage, NotifyPolicy,
    Participant, ParticipantId, Storage, StorageError,
};
use proptest::prelude::*;

const EVENT: EventId = 1;
const PARTICIPANTS: u8 = 6;
const GROUPS: u8 = 3;

/// Real system wrapper that mirrors ModelEvent's interface.
struct RealEvent {
    manager: EventManager,
    storage: MemoryStorage,
    generator: AssignmentGenerator,
    env: SimEnv,
}

fn participant_id(id: ModelParticipantId) -> ParticipantId {
    ParticipantId::from(id) + 1
}

fn group_name(group: ModelGroupId) -> String {
    format!("group-{}", group)
}

impl RealEvent {
    fn new(seed: u64) -> Self {
        let env = SimEnv::with_seed(seed);
        let mut manager = EventManager::new();
        manager.create_event(EVENT, 1, "model", &env).unwrap();

        // Exhaustive search so feasibility matches the oracle exactly
        let generator = AssignmentGenerator::new(GeneratorConfig {
            strategy: generator::Strategy::Backtrack { max_steps: 1_000_000 },
            ..GeneratorConfig::default()
        });

        Self { manager, storage: MemoryStorage::new(), generator, env }
    }

    fn apply(&mut self, op: &Operation) -> OperationResult {
        let result = match op {
            Operation::Register { id, email_slot, confirmed } => self.manager.register_participant(
                EVENT,
                Participant {
                    id: participant_id(*id),
                    name: format!("P{}", id),
                    email: format!("slot{}@example.com", email_slot),
                    confirmed: *confirmed,
                },
            ),
            Operation::Confirm { id } => self.manager.confirm_participant(EVENT, participant_id(*id)),
            Operation::Remove { id } => {
                self.manager.remove_participant(EVENT, participant_id(*id)).map(|_| ())
            },
            Operation::Exclude { a, b } => {
                self.manager.exclude_pair(EVENT, participant_id(*a), participant_id(*b))
            },
            Operation::CreateGroup { group, members } => {
                let members: Vec<ParticipantId> = members.iter().map(|m| participant_id(*m)).collect();
                self.manager.create_exclusion_group(EVENT, group_name(*group), &members)
            },
            Operation::DeleteGroup { group } => {
                self.manager.delete_exclusion_group(EVENT, &group_name(*group))
            },
            Operation::Generate => self.generate(),
            Operation::View { giver } => self
                .manager
                .view_assignment(EVENT, participant_id(*giver), &self.env, &self.storage)
                .map(|_| ()),
            Operation::Reset => self.manager.reset_assignments(EVENT, &self.storage).map(|_| ()),
        };

        match result {
            Ok(()) => OperationResult::Ok,
            Err(e) => OperationResult::Error(classify(&e)),
        }
    }

    fn generate(&mut self) -> Result<(), EventError> {
        let actions =
            self.manager.generate_assignments(EVENT, &self.generator, &self.env, &self.storage)?;
        ActionExecutor::new(&self.storage, &LogNotifier, NotifyPolicy::BestEffort)
            .execute(actions)
            .unwrap();
        self.manager.load_assignment_state(EVENT, &self.storage)
    }

    fn observable_state(&self) -> ObservableState {
        let to_model = |id: ParticipantId| ModelParticipantId::try_from(id - 1).unwrap();

        let participants = self
            .manager
            .participants(EVENT)
            .unwrap()
            .into_iter()
            .map(|p| (to_model(p.id), p.confirmed))
            .collect();

        let mut excluded_pairs: Vec<_> = self
            .manager
            .exclusions(EVENT)
            .unwrap()
            .iter()
            .filter(|(a, b)| a < b)
            .map(|(a, b)| (to_model(*a), to_model(*b)))
            .collect();
        excluded_pairs.sort_unstable();

        let mut groups: Vec<_> = self
            .manager
            .exclusion_groups(EVENT)
            .unwrap()
            .into_iter()
            .map(|g| {
                let id = g.name.trim_start_matches("group-").parse::<ModelGroupId>().unwrap();
                (id, g.members.iter().map(|m| to_model(*m)).collect())
            })
            .collect();
        groups.sort_unstable();

        let status = self.manager.assignment_status(EVENT, &self.storage).unwrap();

        ObservableState {
            participants,
            excluded_pairs,
            groups,
            assignments: status.total,
            viewed: status.viewed,
        }
    }
}

fn classify(err: &EventError) -> OperationError {
    match err {
        EventError::AssignmentsLocked => OperationError::Locked,
        EventError::ParticipantAlreadyExists(_) => OperationError::ParticipantExists,
        EventError::DuplicateEmail(_) => OperationError::DuplicateEmail,
        EventError::ParticipantNotFound(_) => OperationError::ParticipantNotFound,
        EventError::SelfExclusion(_) => OperationError::SelfExclusion,
        EventError::DuplicateGroupName(_) => OperationError::GroupExists,
        EventError::GroupNotFound(_) => OperationError::GroupNotFound,
        EventError::Generation(GenerateError::InsufficientParticipants { .. }) => {
            OperationError::InsufficientParticipants
        },
        EventError::Generation(GenerateError::ExclusionsTooRestrictive { .. }) => {
            OperationError::ExclusionsTooRestrictive
        },
        EventError::AssignmentsAlreadyGenerated => OperationError::AlreadyGenerated,
        EventError::AssignmentsAlreadyViewed { .. } => OperationError::AlreadyViewed,
        EventError::Storage(StorageError::NotFound { .. }) => OperationError::AssignmentNotFound,
        other => panic!("unexpected error from event manager: {}", other),
    }
}

/// Strategy for generating operations over a small ID space.
fn operation_strategy() -> impl Strategy<Value = Operation> {
    let id = 0..PARTICIPANTS;
    let group = 0..GROUPS;

    prop_oneof![
        // Weight towards building a roster
        5 => (id.clone(), id.clone(), any::<bool>()).prop_map(|(id, email_slot, confirmed)| {
            Operation::Register { id, email_slot, confirmed }
        }),
        3 => id.clone().prop_map(|id| Operation::Confirm { id }),
        1 => id.clone().prop_map(|id| Operation::Remove { id }),
        3 => (id.clone(), id.clone()).prop_map(|(a, b)| Operation::Exclude { a, b }),
        1 => (group.clone(), prop::array::uniform3(id.clone()))
            .prop_map(|(group, members)| Operation::CreateGroup { group, members }),
        1 => group.prop_map(|group| Operation::DeleteGroup { group }),
        2 => Just(Operation::Generate),
        2 => id.prop_map(|giver| Operation::View { giver }),
        1 => Just(Operation::Reset),
    ]
}

proptest! {
    /// Operation results and observable state match after every step.
    #[test]
    fn prop_model_matches_real(
        seed in any::<u64>(),
        ops in prop::collection::vec(operation_strategy(), 0..60)
    ) {
        let mut model = ModelEvent::new();
        let mut real = RealEvent::new(seed);

        for (i, op) in ops.iter().enumerate() {
            let model_result = model.apply(op);
            let real_result = real.apply(op);

            prop_assert_eq!(
                &model_result,
                &real_result,
                "Divergence at operation {}: {:?}",
                i, op
            );
            prop_assert_eq!(
                model.observable_state(),
                real.observable_state(),
                "State divergence after operation {}: {:?}",
                i, op
            );
        }
    }

    /// Persisted assignments always form a cycle over the confirmed roster
    /// that respects the exclusions in force at generation time.
    #[test]
    fn prop_persisted_assignments_valid(
        seed in any::<u64>(),
        ops in prop::collection::vec(operation_strategy(), 0..60)
    ) {
        let mut real = RealEvent::new(seed);

        for op in &ops {
            let _ = real.apply(op);

            let records = real.storage.load_assignments(EVENT).unwrap();
            if records.is_empty() {
                continue;
            }

            let exclusions = real.manager.exclusions(EVENT).unwrap();
            let mut givers: Vec<_> = records.iter().map(|r| r.giver).collect();
            let mut receivers: Vec<_> = records.iter().map(|r| r.receiver).collect();
            givers.sort_unstable();
            receivers.sort_unstable();
            prop_assert_eq!(&givers, &receivers);
            givers.dedup();
            prop_assert_eq!(givers.len(), records.len());
            prop_assert!(records.len() >= 3);

            for record in &records {
                prop_assert_ne!(record.giver, record.receiver);
                prop_assert!(!exclusions.excludes(&record.giver, &record.receiver));
            }
        }
    }

    /// Once anyone has viewed, assignments never change.
    #[test]
    fn prop_viewed_assignments_immutable(
        seed in any::<u64>(),
        ops in prop::collection::vec(operation_strategy(), 0..60)
    ) {
        let mut real = RealEvent::new(seed);
        let mut frozen = None;

        for op in &ops {
            let _ = real.apply(op);

            let mut records = real.storage.load_assignments(EVENT).unwrap();
            records.sort_by_key(|r| r.giver);
            let pairs: Vec<_> = records.iter().map(|r| (r.giver, r.receiver)).collect();

            match &frozen {
                Some(expected) => prop_assert_eq!(expected, &pairs),
                None if records.iter().any(|r| r.is_viewed()) => frozen = Some(pairs),
                None => {},
            }
        }
    }
}

#[cfg(test)]
mod smoke_tests {
    use super::*;

    fn register(id: ModelParticipantId) -> Operation {
        Operation::Register { id, email_slot: id, confirmed: true }
    }

    /// Basic walk through the lifecycle on both sides.
    #[test]
    fn model_and_real_agree_on_lifecycle() {
        let mut model = ModelEvent::new();
        let mut real = RealEvent::new(7);

        let script = [
            register(0),
            register(1),
            Operation::Generate,
            register(2),
            Operation::Exclude { a: 0, b: 1 },
            Operation::Generate,
            register(3),
            Operation::CreateGroup { group: 0, members: [1, 2, 3] },
            Operation::Generate,
            Operation::DeleteGroup { group: 0 },
            Operation::Generate,
            Operation::Register { id: 4, email_slot: 4, confirmed: false },
            Operation::View { giver: 9 },
            Operation::View { giver: 1 },
            Operation::Reset,
        ];

        let mut results = Vec::new();
        for op in &script {
            let expected = model.apply(op);
            assert_eq!(expected, real.apply(op), "{:?}", op);
            results.push(expected);
        }

        use OperationError::*;
        use OperationResult::{Error, Ok};
        assert_eq!(
            results,
            vec![
                Ok,
                Ok,
                Error(InsufficientParticipants),
                Ok,
                Ok,
                Error(ExclusionsTooRestrictive),
                Ok,
                Ok,
                Error(ExclusionsTooRestrictive),
                Ok,
                Ok,
                Error(Locked),
                Error(ParticipantNotFound),
                Ok,
                Error(AlreadyViewed),
            ]
        );
        assert_eq!(model.observable_state(), real.observable_state());
    }
}
