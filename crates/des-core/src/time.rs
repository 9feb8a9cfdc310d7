//! Simulation time model.
//!
//! # Design
//!
//! Time is a continuous `f64` number of simulated seconds wrapped in
//! `SimTime`.  Delays sampled from inter-arrival and service distributions
//! are plain `f64` values; an event scheduled "after `d`" fires at
//! `now.offset(d)`.
//!
//! A continuous clock (rather than an integer tick) is the natural unit for a
//! process-oriented model: service times come straight from real-valued
//! distributions and are never quantised.  The cost is that `f64` has no
//! derived `Ord`; `SimTime` supplies a total order via `f64::total_cmp` so it
//! can key heaps and sorted maps.  `INFINITY` is a valid time — a blocked
//! process is parked at `SimTime::INFINITY` until something unschedules it.

use std::fmt;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute point in simulated time, in seconds from simulation start.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);
    /// The parking time for blocked processes: scheduled, never reached.
    pub const INFINITY: SimTime = SimTime(f64::INFINITY);

    /// The time `delay` simulated seconds after `self`.
    #[inline]
    pub fn offset(self, delay: f64) -> SimTime {
        SimTime(self.0 + delay)
    }

    /// Simulated seconds elapsed from `earlier` to `self`.
    #[inline]
    pub fn since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl Eq for SimTime {}

// Total order over the raw bits: -inf < finite < +inf, NaN sorts last and
// never arises from kernel arithmetic (delays are validated non-negative).
impl Ord for SimTime {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for SimTime {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialOrd<f64> for SimTime {
    #[inline]
    fn partial_cmp(&self, other: &f64) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}

impl PartialEq<f64> for SimTime {
    #[inline]
    fn eq(&self, other: &f64) -> bool {
        self.0 == *other
    }
}

impl From<f64> for SimTime {
    #[inline]
    fn from(t: f64) -> SimTime {
        SimTime(t)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.0)
    }
}
