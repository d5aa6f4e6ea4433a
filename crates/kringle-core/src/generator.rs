//! Assignment generator.
//!
//! Draws a circular chain over the confirmed roster that respects the
//! exclusion relation.
//!
//! ## Strategies
//!
//! - [`Strategy::Resample`]: shuffle, link position `i` to `i + 1 (mod n)`,
//!   reject the whole chain on any excluded link and reshuffle. Attempts are
//!   independent and uniformly distributed over all chains, so the success
//!   probability per attempt is the fraction of valid chains.
//! - [`Strategy::Backtrack`]: randomized depth-first search for a Hamiltonian
//!   cycle on the complement of the exclusion relation. Finds a cycle
//!   whenever one exists and the step budget allows, at the cost of a
//!   non-uniform distribution over valid cycles.
//!
//! Neither strategy ever returns a partial assignment.

use std::{collections::HashSet, fmt::Debug, hash::Hash};

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{
    MIN_PARTICIPANTS,
    cycle::AssignmentCycle,
    env::{EnvRng, Environment},
    error::GenerateError,
    exclusion::Exclusions,
};

/// Default retry budget for [`Strategy::Resample`].
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1000;

/// Default step budget for [`Strategy::Backtrack`].
pub const DEFAULT_MAX_STEPS: u64 = 100_000;

/// How the generator searches for a valid cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Independent reshuffles bounded by `max_attempts`.
    #[default]
    Resample,

    /// Randomized depth-first search bounded by a step count.
    Backtrack {
        /// Maximum number of path extensions before giving up.
        max_steps: u64,
    },
}

/// Generator configuration.
///
/// Passed explicitly by the caller; the generator reads no global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Reshuffle budget for [`Strategy::Resample`].
    pub max_attempts: u32,
    /// Minimum roster size. Values below three are raised to three.
    pub min_participants: usize,
    /// Search strategy.
    pub strategy: Strategy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_participants: MIN_PARTICIPANTS,
            strategy: Strategy::Resample,
        }
    }
}

impl GeneratorConfig {
    /// Effective minimum roster size.
    pub fn required_participants(&self) -> usize {
        self.min_participants.max(MIN_PARTICIPANTS)
    }
}

/// Produces assignment cycles.
///
/// Stateless apart from its configuration; every call draws fresh randomness
/// from the supplied environment.
#[derive(Debug, Clone, Default)]
pub struct AssignmentGenerator {
    config: GeneratorConfig,
}

impl AssignmentGenerator {
    /// Create a generator with the given configuration.
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate a cycle over `participants` honoring `exclusions`.
    ///
    /// `exclusions` is trusted to be symmetric. An asymmetric relation is
    /// used as given (only the giver -> receiver direction is checked) and
    /// logged.
    ///
    /// # Errors
    ///
    /// - `GenerateError::InsufficientParticipants` if the roster is below the
    ///   minimum. No randomness is drawn.
    /// - `GenerateError::DuplicateParticipant` if an id repeats.
    /// - `GenerateError::ExclusionsTooRestrictive` if the budget runs out.
    pub fn generate<T, E>(
        &self,
        participants: &[T],
        exclusions: &Exclusions<T>,
        env: &E,
    ) -> Result<AssignmentCycle<T>, GenerateError>
    where
        T: Clone + Eq + Hash + Debug,
        E: Environment,
    {
        let required = self.config.required_participants();
        if participants.len() < required {
            return Err(GenerateError::InsufficientParticipants {
                found: participants.len(),
                required,
            });
        }

        let mut seen = HashSet::with_capacity(participants.len());
        for (index, id) in participants.iter().enumerate() {
            if !seen.insert(id) {
                return Err(GenerateError::DuplicateParticipant { index });
            }
        }

        if !exclusions.is_symmetric() {
            tracing::warn!(
                "exclusion relation is not symmetric; checking giver -> receiver direction only"
            );
        }

        tracing::debug!(
            "generating assignments for {} participants with {} exclusions ({:?})",
            participants.len(),
            exclusions.len(),
            self.config.strategy
        );

        let started = env.now();
        let result = match self.config.strategy {
            Strategy::Resample => {
                resample(participants, exclusions, self.config.max_attempts, env)
            },
            Strategy::Backtrack { max_steps } => {
                backtrack(participants, exclusions, max_steps, env)
            },
        };

        match &result {
            Ok(_) => tracing::info!(
                "generated {} assignments in {:?}",
                participants.len(),
                env.now().saturating_duration_since(started)
            ),
            Err(e) => tracing::warn!("assignment generation failed: {}", e),
        }

        result
    }
}

fn chain_respects<T>(order: &[T], exclusions: &Exclusions<T>) -> bool
where
    T: Clone + Eq + Hash,
{
    order.iter().zip(order.iter().cycle().skip(1)).all(|(g, r)| !exclusions.excludes(g, r))
}

fn resample<T, E>(
    participants: &[T],
    exclusions: &Exclusions<T>,
    max_attempts: u32,
    env: &E,
) -> Result<AssignmentCycle<T>, GenerateError>
where
    T: Clone + Eq + Hash + Debug,
    E: Environment,
{
    let mut rng = EnvRng::new(env);
    let mut order = participants.to_vec();

    for attempt in 1..=max_attempts {
        order.shuffle(&mut rng);

        if chain_respects(&order, exclusions) {
            tracing::debug!("valid chain found on attempt {}", attempt);
            return Ok(AssignmentCycle::from_order(order));
        }
    }

    Err(GenerateError::ExclusionsTooRestrictive { attempts: u64::from(max_attempts) })
}

fn backtrack<T, E>(
    participants: &[T],
    exclusions: &Exclusions<T>,
    max_steps: u64,
    env: &E,
) -> Result<AssignmentCycle<T>, GenerateError>
where
    T: Clone + Eq + Hash + Debug,
    E: Environment,
{
    if max_steps == 0 {
        return Err(GenerateError::ExclusionsTooRestrictive { attempts: 0 });
    }

    let n = participants.len();
    let allowed = |g: usize, r: usize| {
        g != r && !exclusions.excludes(&participants[g], &participants[r])
    };

    let mut rng = EnvRng::new(env);
    let start = rng.gen_range(0..n);

    let mut used = vec![false; n];
    used[start] = true;
    let mut path = vec![start];

    // frontier[k] holds the untried successors of path[k]
    let mut frontier = vec![shuffled_successors(start, &used, &allowed, &mut rng)];
    let mut steps = 0u64;

    while let Some(untried) = frontier.last_mut() {
        if path.len() == n {
            if let Some(&last) = path.last() {
                if allowed(last, start) {
                    tracing::debug!("hamiltonian cycle found after {} steps", steps);
                    let order = path.iter().map(|&i| participants[i].clone()).collect();
                    return Ok(AssignmentCycle::from_order(order));
                }
            }
        }

        match untried.pop() {
            Some(next) => {
                steps += 1;
                if steps > max_steps {
                    return Err(GenerateError::ExclusionsTooRestrictive { attempts: max_steps });
                }
                used[next] = true;
                path.push(next);
                let successors = shuffled_successors(next, &used, &allowed, &mut rng);
                frontier.push(successors);
            },
            None => {
                frontier.pop();
                if let Some(last) = path.pop() {
                    used[last] = false;
                }
            },
        }
    }

    tracing::debug!("search space exhausted after {} steps", steps);
    Err(GenerateError::ExclusionsTooRestrictive { attempts: steps })
}

fn shuffled_successors<R: Rng + ?Sized>(
    from: usize,
    used: &[bool],
    allowed: &impl Fn(usize, usize) -> bool,
    rng: &mut R,
) -> Vec<usize> {
    let mut next: Vec<usize> =
        (0..used.len()).filter(|&j| !used[j] && allowed(from, j)).collect();
    next.shuffle(rng);
    next
}
