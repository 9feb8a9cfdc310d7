//! The statistics sink trait.
//!
//! The kernel pushes three kinds of observations: an arrival's end of life, a
//! resource release, and an attribute write.  What happens to them — memory,
//! CSV, nothing — is the sink's business; `des-monitor` provides concrete
//! recorders.
//!
//! All methods have default no-op implementations so implementors only need
//! to override what they care about.

use des_core::SimTime;

/// Receives lifecycle statistics from the engine.
pub trait Monitor {
    /// An arrival reached the end of its life.
    ///
    /// `start` is `SimTime(-1.0)` if the arrival was destroyed before it ever
    /// ran.  `finished` distinguishes a normal chain completion from a forced
    /// or voluntary departure.
    fn record_end(&mut self, _now: SimTime, _name: &str, _start: SimTime, _activity: f64, _finished: bool) {}

    /// An arrival left a resource it had acquired at `start`.
    fn record_release(
        &mut self,
        _now: SimTime,
        _name: &str,
        _start: SimTime,
        _activity: f64,
        _resource: &str,
    ) {
    }

    /// An attribute write on a monitored arrival.
    fn record_attribute(&mut self, _now: SimTime, _name: &str, _key: &str, _value: f64) {}

    /// Flush any buffered output.  Idempotent.
    fn flush(&mut self) {}
}

/// A [`Monitor`] that discards everything.
pub struct NoopMonitor;

impl Monitor for NoopMonitor {}
