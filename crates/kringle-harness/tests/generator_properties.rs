//! Property-based tests for the assignment generator
//!
//! The brute-force oracle decides feasibility by enumerating every cycle, so
//! generator outcomes can be checked against ground truth on small rosters.

use std::collections::HashMap;

use kringle_core::{
    AssignmentCycle, AssignmentGenerator, Exclusions, GenerateError, GeneratorConfig, generator,
};
use kringle_harness::{SimEnv, count_valid_cycles, is_feasible};
use proptest::prelude::*;

fn roster(n: u8) -> Vec<u8> {
    (0..n).collect()
}

fn exclusions_from(pairs: &[(u8, u8)], n: u8) -> Exclusions<u8> {
    let mut exclusions = Exclusions::new();
    for (a, b) in pairs {
        exclusions.insert_pair(a % n, b % n);
    }
    exclusions
}

fn backtracking() -> AssignmentGenerator {
    AssignmentGenerator::new(GeneratorConfig {
        strategy: generator::Strategy::Backtrack { max_steps: 1_000_000 },
        ..GeneratorConfig::default()
    })
}

/// Rotate a cycle so participant 0 comes first.
fn canonical(cycle: &AssignmentCycle<u8>) -> Vec<u8> {
    let order = cycle.order();
    let start = order.iter().position(|p| *p == 0).unwrap_or(0);
    order[start..].iter().chain(&order[..start]).copied().collect()
}

proptest! {
    /// Every successful draw is a single cycle over the whole roster with no
    /// self-assignment and no excluded link.
    #[test]
    fn prop_success_is_valid_cycle(
        seed in any::<u64>(),
        n in 3u8..8,
        pairs in prop::collection::vec((any::<u8>(), any::<u8>()), 0..6),
    ) {
        let participants = roster(n);
        let exclusions = exclusions_from(&pairs, n);
        let env = SimEnv::with_seed(seed);

        if let Ok(cycle) = AssignmentGenerator::default().generate(&participants, &exclusions, &env) {
            prop_assert_eq!(cycle.len(), participants.len());
            prop_assert!(cycle.verify(&participants, &exclusions).is_ok());
            for assignment in cycle.pairs() {
                prop_assert_ne!(assignment.giver, assignment.receiver);
                prop_assert!(!exclusions.excludes(&assignment.giver, &assignment.receiver));
            }
        }
    }

    /// The backtracking search succeeds exactly when the oracle finds a cycle.
    #[test]
    fn prop_backtrack_matches_oracle(
        seed in any::<u64>(),
        n in 3u8..8,
        pairs in prop::collection::vec((any::<u8>(), any::<u8>()), 0..10),
    ) {
        let participants = roster(n);
        let exclusions = exclusions_from(&pairs, n);
        let env = SimEnv::with_seed(seed);

        let result = backtracking().generate(&participants, &exclusions, &env);

        prop_assert_eq!(
            result.is_ok(),
            is_feasible(&participants, &exclusions),
            "n={} exclusions={:?} result={:?}",
            n, pairs, result
        );
    }

    /// Resampling never invents a cycle the oracle says cannot exist, and an
    /// infeasible roster always spends the full budget.
    #[test]
    fn prop_resample_infeasible_spends_budget(
        seed in any::<u64>(),
        n in 3u8..6,
        pairs in prop::collection::vec((any::<u8>(), any::<u8>()), 0..8),
        max_attempts in 0u32..50,
    ) {
        let participants = roster(n);
        let exclusions = exclusions_from(&pairs, n);
        let env = SimEnv::with_seed(seed);
        let generator = AssignmentGenerator::new(GeneratorConfig {
            max_attempts,
            ..GeneratorConfig::default()
        });

        let result = generator.generate(&participants, &exclusions, &env);

        if !is_feasible(&participants, &exclusions) {
            prop_assert_eq!(
                result,
                Err(GenerateError::ExclusionsTooRestrictive { attempts: u64::from(max_attempts) })
            );
        } else if let Err(e) = result {
            prop_assert!(e.is_retryable());
        }
    }

    /// Rosters below three always fail before any randomness is drawn.
    #[test]
    fn prop_small_rosters_insufficient(seed in any::<u64>(), n in 0u8..3) {
        let env = SimEnv::with_seed(seed);

        let result = AssignmentGenerator::default().generate(&roster(n), &Exclusions::new(), &env);

        prop_assert_eq!(
            result,
            Err(GenerateError::InsufficientParticipants { found: usize::from(n), required: 3 })
        );
        prop_assert_eq!(env.bytes_drawn(), 0);
    }

    /// Same seed and inputs produce the same cycle.
    #[test]
    fn prop_draws_deterministic(
        seed in any::<u64>(),
        n in 3u8..10,
        backtrack in any::<bool>(),
    ) {
        let participants = roster(n);
        let exclusions = exclusions_from(&[(0, 1)], n);
        let generator = if backtrack { backtracking() } else { AssignmentGenerator::default() };

        let first = generator.generate(&participants, &exclusions, &SimEnv::with_seed(seed));
        let second = generator.generate(&participants, &exclusions, &SimEnv::with_seed(seed));

        prop_assert_eq!(first, second);
    }
}

#[test]
fn single_attempt_success_rate_matches_valid_fraction() {
    // Four people, 0 and 1 excluded: 2 of the 6 cycles are valid
    let participants = roster(4);
    let exclusions = exclusions_from(&[(0, 1)], 4);
    assert_eq!(count_valid_cycles(&participants, &exclusions), 2);

    let generator = AssignmentGenerator::new(GeneratorConfig {
        max_attempts: 1,
        ..GeneratorConfig::default()
    });

    let trials = 3000;
    let successes = (0..trials)
        .filter(|seed| {
            generator.generate(&participants, &exclusions, &SimEnv::with_seed(*seed)).is_ok()
        })
        .count();

    let rate = successes as f64 / trials as f64;
    assert!((rate - 1.0 / 3.0).abs() < 0.05, "success rate {} far from 1/3", rate);
}

#[test]
fn unconstrained_draws_cover_every_cycle_evenly() {
    let participants = roster(4);
    let exclusions = Exclusions::new();
    let generator = AssignmentGenerator::default();

    let trials = 6000u64;
    let mut seen: HashMap<Vec<u8>, u64> = HashMap::new();
    for seed in 0..trials {
        let cycle = generator.generate(&participants, &exclusions, &SimEnv::with_seed(seed)).unwrap();
        *seen.entry(canonical(&cycle)).or_default() += 1;
    }

    assert_eq!(seen.len(), 6, "every 4-cycle should appear: {:?}", seen);
    for (cycle, count) in &seen {
        assert!((850..=1150).contains(count), "cycle {:?} drawn {} times", cycle, count);
    }
}

#[test]
fn impossible_trio_terminates_with_default_budget() {
    let participants = roster(3);
    let exclusions = exclusions_from(&[(0, 1)], 3);

    for seed in 0..20 {
        let result =
            AssignmentGenerator::default().generate(&participants, &exclusions, &SimEnv::with_seed(seed));
        assert_eq!(result, Err(GenerateError::ExclusionsTooRestrictive { attempts: 1000 }));
    }
}
