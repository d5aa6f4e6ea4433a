//! Fuzz target for [`AssignmentGenerator`]
//!
//! # Strategy
//!
//! - Rosters: 0 to 12 participants, possibly with duplicate IDs
//! - Exclusions: arbitrary directed and reciprocal pairs, including
//!   self-pairs and pairs naming people outside the roster
//! - Budgets: small attempt and step budgets, including zero
//!
//! # Invariants
//!
//! - NEVER panic, whatever the input
//! - Success MUST be a single cycle over the whole roster with no
//!   self-assignment and no excluded link
//! - Fewer than three participants MUST fail with `InsufficientParticipants`
//!   and draw no randomness
//! - A resample failure MUST report exactly `max_attempts`

#![no_main]

use arbitrary::Arbitrary;
use kringle_core::{AssignmentGenerator, Exclusions, GenerateError, GeneratorConfig, Strategy};
use kringle_harness::SimEnv;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum FuzzedExclusion {
    Pair(u8, u8),
    Directed(u8, u8),
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    seed: u64,
    roster: Vec<u8>,
    exclusions: Vec<FuzzedExclusion>,
    max_attempts: u8,
    backtrack: Option<u16>,
}

fuzz_target!(|input: FuzzInput| {
    let mut participants = input.roster;
    participants.truncate(12);

    let mut exclusions = Exclusions::new();
    for exclusion in &input.exclusions {
        match *exclusion {
            FuzzedExclusion::Pair(a, b) => exclusions.insert_pair(a, b),
            FuzzedExclusion::Directed(a, b) => exclusions.insert_directed(a, b),
        };
    }

    let strategy = match input.backtrack {
        Some(max_steps) => Strategy::Backtrack { max_steps: u64::from(max_steps) },
        None => Strategy::Resample,
    };
    let generator = AssignmentGenerator::new(GeneratorConfig {
        max_attempts: u32::from(input.max_attempts),
        strategy,
        ..GeneratorConfig::default()
    });

    let env = SimEnv::with_seed(input.seed);
    let result = generator.generate(&participants, &exclusions, &env);

    match result {
        Ok(cycle) => {
            assert!(
                cycle.verify(&participants, &exclusions).is_ok(),
                "invalid cycle {:?} for roster {:?}",
                cycle.order(),
                participants
            );
        },
        Err(GenerateError::InsufficientParticipants { found, required }) => {
            assert_eq!(found, participants.len());
            assert!(found < required);
            assert_eq!(env.bytes_drawn(), 0, "randomness drawn for a short roster");
        },
        Err(GenerateError::DuplicateParticipant { index }) => {
            assert!(participants[..index].contains(&participants[index]));
        },
        Err(GenerateError::ExclusionsTooRestrictive { attempts }) => {
            if input.backtrack.is_none() {
                assert_eq!(attempts, u64::from(input.max_attempts));
            }
        },
    }
});
