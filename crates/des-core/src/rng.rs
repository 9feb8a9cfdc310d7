//! Deterministic simulation RNG.
//!
//! # Determinism strategy
//!
//! The engine owns exactly one `SimRng`, seeded from the run configuration.
//! All stochastic collaborators (inter-arrival sources, service-time
//! distributions, branch choices) draw from it through the contexts the
//! engine hands out.  Because event execution is single-threaded and
//! run-to-completion, the draw order — and therefore the whole run — is a
//! pure function of the seed.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

// ── SimRng ────────────────────────────────────────────────────────────────────

/// The simulation's random number generator.
///
/// Deliberately `!Sync` — there is exactly one, owned by the engine, and all
/// draws happen inside the single-threaded event loop.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive a child `SimRng` with a different seed offset — useful for
    /// running an auxiliary model stream without disturbing the main one.
    pub fn child(&mut self, offset: u64) -> SimRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(child_seed))
    }

    /// Expose the inner `SmallRng` for use with `rand` distribution types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Sample a uniformly distributed value of any `Standard`-distributed type.
    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Sample an exponentially distributed delay with the given mean, via
    /// inverse-transform sampling.  The standard inter-arrival distribution
    /// for Poisson arrival streams.
    #[inline]
    pub fn exp(&mut self, mean: f64) -> f64 {
        let u: f64 = self.0.gen_range(f64::EPSILON..1.0);
        -mean * u.ln()
    }
}
