//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples the assignment engine from system
//! resources (time, randomness). This enables:
//!
//! - Deterministic Simulation: a seeded RNG and virtual clock reproduce any
//!   draw exactly, so a failing property test can be replayed from its seed.
//!
//! - Production Runtime: the system clock and OS entropy are used without any
//!   code changes to the engine.
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` must never go backwards
//! - Determinism: Given the same seed, `random_bytes()` produces the same
//!   sequence
//! - Isolation: Implementations must not share global state

use std::time::{Instant, SystemTime};

use rand::RngCore;

/// Abstract environment providing time and randomness.
///
/// The engine never reads the clock or an RNG directly; everything flows
/// through this trait so the same code runs in production and simulation.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current monotonic time.
    ///
    /// # Invariants
    ///
    /// - Monotonicity: Subsequent calls must return times >= previous calls.
    fn now(&self) -> Instant;

    /// Returns the current wall-clock time.
    ///
    /// Used for reveal and view timestamps that outlive the process.
    fn wall_clock(&self) -> SystemTime;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Determinism during simulations: Given the same RNG seed, this produces
    ///   the same sequence of bytes
    /// - Uniformity in production: draws must be statistically uniform. The
    ///   engine needs fairness, not unpredictability.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}

/// Adapts an [`Environment`] to [`rand::RngCore`].
///
/// Lets `rand` algorithms (shuffles, range sampling) consume the
/// environment's randomness instead of a thread-local RNG.
#[derive(Debug)]
pub struct EnvRng<'a, E> {
    env: &'a E,
}

impl<'a, E: Environment> EnvRng<'a, E> {
    /// Wrap an environment.
    pub fn new(env: &'a E) -> Self {
        Self { env }
    }
}

impl<E: Environment> RngCore for EnvRng<'_, E> {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.env.random_bytes(&mut bytes);
        u32::from_be_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        self.env.random_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.env.random_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.env.random_bytes(dest);
        Ok(())
    }
}
