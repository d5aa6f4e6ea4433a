//! Production Environment implementation using system time and RNG.
//!
//! This module provides `SystemEnv`, the production implementation of the
//! `Environment` trait that uses real system time and OS randomness.

use std::time::{Instant, SystemTime};

use kringle_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Production environment using the system clock and OS randomness.
///
/// This implementation:
/// - Uses `std::time::Instant::now()` for monotonic time
/// - Uses `std::time::SystemTime::now()` for timestamps
/// - Uses `getrandom` for randomness
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_clock(&self) -> SystemTime {
        SystemTime::now()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        if let Err(e) = getrandom::fill(buffer) {
            // NOTE: not expected on supported platforms. Draws stay usable
            // but are no longer unpredictable.
            tracing::error!("getrandom failed, falling back to clock-seeded ChaCha8: {}", e);
            let seed = SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map_or(0, |d| d.as_nanos() as u64);
            fill_fallback(buffer, seed);
        }
    }
}

fn fill_fallback(buffer: &mut [u8], seed: u64) {
    ChaCha8Rng::seed_from_u64(seed).fill_bytes(buffer);
}
