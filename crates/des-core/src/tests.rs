//! Unit tests for des-core.

use crate::{ProcessId, SimRng, SimTime};

// ── SimTime ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod time {
    use super::*;

    #[test]
    fn offset_and_since() {
        let t = SimTime(10.0);
        assert_eq!(t.offset(2.5), SimTime(12.5));
        assert_eq!(t.offset(2.5).since(t), 2.5);
    }

    #[test]
    fn total_order_handles_infinity() {
        let mut times = vec![SimTime::INFINITY, SimTime(3.0), SimTime::ZERO, SimTime(1.5)];
        times.sort();
        assert_eq!(
            times,
            vec![SimTime::ZERO, SimTime(1.5), SimTime(3.0), SimTime::INFINITY]
        );
    }

    #[test]
    fn infinity_is_not_finite() {
        assert!(SimTime(42.0).is_finite());
        assert!(!SimTime::INFINITY.is_finite());
        assert!(SimTime::ZERO.offset(f64::INFINITY) > SimTime(1e300));
    }

    #[test]
    fn compares_against_raw_f64() {
        assert!(SimTime(5.0) > 4.9);
        assert!(SimTime(5.0) == 5.0);
    }

    #[test]
    fn display() {
        assert_eq!(SimTime(4.0).to_string(), "t=4");
    }
}

// ── IDs ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod ids {
    use super::*;

    #[test]
    fn default_is_invalid() {
        assert_eq!(ProcessId::default(), ProcessId::INVALID);
    }

    #[test]
    fn index_round_trip() {
        let id = ProcessId(7);
        assert_eq!(id.index(), 7);
        assert_eq!(usize::from(id), 7);
    }

    #[test]
    fn display() {
        assert_eq!(ProcessId(3).to_string(), "ProcessId(3)");
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod rng {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.random::<u64>(), b.random::<u64>());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SimRng::new(1);
        let mut b = SimRng::new(2);
        let va: Vec<u64> = (0..8).map(|_| a.random()).collect();
        let vb: Vec<u64> = (0..8).map(|_| b.random()).collect();
        assert_ne!(va, vb);
    }

    #[test]
    fn exp_is_positive_with_plausible_mean() {
        let mut rng = SimRng::new(7);
        let n = 10_000;
        let sum: f64 = (0..n).map(|_| rng.exp(2.0)).sum();
        let mean = sum / n as f64;
        assert!(mean > 1.8 && mean < 2.2, "sample mean {mean} far from 2.0");
    }

    #[test]
    fn child_streams_are_independent() {
        let mut root = SimRng::new(42);
        let mut c1 = root.child(1);
        let mut c2 = root.child(2);
        assert_ne!(c1.random::<u64>(), c2.random::<u64>());
    }
}
