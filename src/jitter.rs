use rand::{rngs::StdRng, Rng, SeedableRng};

/// Bounded uniform jitter source used to emulate sensor noise
///
/// Every draw is uniform over `[center, center + spread)` and degenerates to
/// exactly `center` when the spread is zero, so callers can treat a spread
/// edit as a live "noise knob" without special cases.
#[derive(Debug)]
pub struct Jitter {
    rng: StdRng,
}

impl Jitter {
    /// Create a jitter source seeded from the operating system
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create a deterministic jitter source for tests
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Integer draw from `[center, center + spread)`, floored
    ///
    /// Returns exactly `center` when `spread <= 0`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn value(&mut self, center: i32, spread: i32) -> i32 {
        if spread <= 0 {
            return center;
        }
        center + (self.rng.random::<f64>() * f64::from(spread)).floor() as i32
    }

    /// Float draw from `[center, center + spread)`
    ///
    /// Returns exactly `center` when `spread <= 0`.
    pub fn value_f64(&mut self, center: f64, spread: f64) -> f64 {
        if spread <= 0.0 {
            return center;
        }
        center + self.rng.random::<f64>() * spread
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::new()
    }
}
