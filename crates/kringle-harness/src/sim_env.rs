//! Seeded simulation environment.
//!
//! `SimEnv` replaces system time and OS entropy with a virtual clock and a
//! ChaCha8 stream, so a draw is fully determined by its seed. Clones share
//! the same clock and RNG stream.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant, SystemTime},
};

use kringle_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Wall-clock origin for simulations (2024-12-01T00:00:00Z).
const SIM_EPOCH_SECS: u64 = 1_733_011_200;

#[derive(Debug)]
struct SimState {
    rng: ChaCha8Rng,
    elapsed: Duration,
    bytes_drawn: u64,
}

/// Deterministic environment for tests and reproducible draws.
#[derive(Debug, Clone)]
pub struct SimEnv {
    seed: u64,
    origin: Instant,
    state: Arc<Mutex<SimState>>,
}

impl SimEnv {
    /// Create an environment whose randomness is fully determined by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            origin: Instant::now(),
            state: Arc::new(Mutex::new(SimState {
                rng: ChaCha8Rng::seed_from_u64(seed),
                elapsed: Duration::ZERO,
                bytes_drawn: 0,
            })),
        }
    }

    /// Seed this environment was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Advance the virtual clock.
    pub fn advance(&self, by: Duration) {
        self.lock().elapsed += by;
    }

    /// Total random bytes handed out so far.
    pub fn bytes_drawn(&self) -> u64 {
        self.lock().bytes_drawn
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        self.origin + self.lock().elapsed
    }

    fn wall_clock(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(SIM_EPOCH_SECS) + self.lock().elapsed
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let mut state = self.lock();
        state.rng.fill_bytes(buffer);
        state.bytes_drawn += buffer.len() as u64;
    }
}
