//! `Generator` — the source process that feeds arrivals into the chain.

use des_core::{ActivityId, SimRng};

use crate::arrival::Order;
use crate::process::ProcessCore;

// ── DelaySource ───────────────────────────────────────────────────────────────

/// The distribution seam: one call yields an ordered batch of inter-arrival
/// delays.  A negative value is the stop sentinel — the generator goes
/// inactive and produces nothing further.
///
/// Implemented for any closure of the right shape, so tests and simple
/// models can write `|_rng| vec![2.0, 3.0]` directly.
pub trait DelaySource {
    fn sample(&mut self, rng: &mut SimRng) -> Vec<f64>;
}

impl<F> DelaySource for F
where
    F: FnMut(&mut SimRng) -> Vec<f64>,
{
    fn sample(&mut self, rng: &mut SimRng) -> Vec<f64> {
        self(rng)
    }
}

// ── Generator ─────────────────────────────────────────────────────────────────

/// Produces arrivals named `{generator}{n}` with a strictly increasing `n`,
/// entering the chain at `first_activity`.
pub struct Generator {
    pub core:           ProcessCore,
    /// Entry point of the chain for every produced arrival.
    pub first_activity: ActivityId,
    /// Arrival sequence counter; also the fallback event priority when the
    /// entry activity defines none.
    pub count:          u64,
    /// Policy copied onto every produced arrival.
    pub order:          Order,
    pub(crate) source:  Box<dyn DelaySource>,
}

impl Generator {
    pub fn new(
        core: ProcessCore,
        first_activity: ActivityId,
        order: Order,
        source: Box<dyn DelaySource>,
    ) -> Self {
        Self {
            core,
            first_activity,
            count: 0,
            order,
            source,
        }
    }
}
