//! Fuzz target for the event lifecycle
//!
//! Replays arbitrary operation sequences against the real `EventManager` and
//! the reference model.
//!
//! # Invariants
//!
//! - Every operation result matches the model
//! - NEVER panic on out-of-order operations (view before draw, reset after
//!   view, edits after draw)
//! - Persisted assignments are always a valid cycle over the confirmed
//!   roster

#![no_main]

use arbitrary::Arbitrary;
use kringle_core::{AssignmentGenerator, GeneratorConfig, Strategy};
use kringle_harness::{ModelEvent, Operation, OperationResult, SimEnv};
use kringle_server::{
    ActionExecutor, EventError, EventManager, LogNotifier, MemoryStorage, NotifyPolicy, Participant,
    ParticipantId, Storage,
};
use libfuzzer_sys::fuzz_target;

const EVENT: u128 = 1;

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    seed: u64,
    ops: Vec<Operation>,
}

fn id(model_id: u8) -> ParticipantId {
    ParticipantId::from(model_id) + 1
}

fn apply(
    manager: &mut EventManager,
    storage: &MemoryStorage,
    generator: &AssignmentGenerator,
    env: &SimEnv,
    op: &Operation,
) -> Result<(), EventError> {
    match op {
        Operation::Register { id: p, email_slot, confirmed } => manager.register_participant(
            EVENT,
            Participant {
                id: id(*p),
                name: format!("P{}", p),
                email: format!("slot{}@example.com", email_slot),
                confirmed: *confirmed,
            },
        ),
        Operation::Confirm { id: p } => manager.confirm_participant(EVENT, id(*p)),
        Operation::Remove { id: p } => manager.remove_participant(EVENT, id(*p)).map(|_| ()),
        Operation::Exclude { a, b } => manager.exclude_pair(EVENT, id(*a), id(*b)),
        Operation::CreateGroup { group, members } => {
            let members: Vec<ParticipantId> = members.iter().map(|m| id(*m)).collect();
            manager.create_exclusion_group(EVENT, format!("g{}", group), &members)
        },
        Operation::DeleteGroup { group } => {
            manager.delete_exclusion_group(EVENT, &format!("g{}", group))
        },
        Operation::Generate => {
            let actions = manager.generate_assignments(EVENT, generator, env, storage)?;
            ActionExecutor::new(storage, &LogNotifier, NotifyPolicy::Required)
                .execute(actions)
                .expect("executor failed on fresh assignments");
            manager.load_assignment_state(EVENT, storage)
        },
        Operation::View { giver } => {
            manager.view_assignment(EVENT, id(*giver), env, storage).map(|_| ())
        },
        Operation::Reset => manager.reset_assignments(EVENT, storage).map(|_| ()),
    }
}

fuzz_target!(|input: FuzzInput| {
    let env = SimEnv::with_seed(input.seed);
    let storage = MemoryStorage::new();
    let generator = AssignmentGenerator::new(GeneratorConfig {
        strategy: Strategy::Backtrack { max_steps: 1_000_000 },
        ..GeneratorConfig::default()
    });
    let mut manager = EventManager::new();
    manager.create_event(EVENT, 0, "fuzz", &env).expect("fresh manager");
    let mut model = ModelEvent::new();

    for op in input.ops.into_iter().take(64) {
        // Keep rosters small enough for the brute-force oracle
        let op = op.clamped(7, 4);

        let expected = model.apply(&op);
        let actual = apply(&mut manager, &storage, &generator, &env, &op);
        assert_eq!(
            expected.is_ok(),
            actual.is_ok(),
            "divergence on {:?}: model {:?}, real {:?}",
            op,
            expected,
            actual
        );
        if let OperationResult::Error(_) = expected {
            continue;
        }

        let records = storage.load_assignments(EVENT).expect("memory storage");
        let exclusions = manager.exclusions(EVENT).expect("event exists");
        for record in &records {
            assert_ne!(record.giver, record.receiver);
            assert!(!exclusions.excludes(&record.giver, &record.receiver));
        }
    }
});
