//! `Manager` — a process that walks a timetable of values for one external
//! parameter.
//!
//! Index 0 holds the initial value, applied on the manager's first run; the
//! wrap point for a repeating timetable is therefore index 1.  Parameter
//! storage is the model's business — the manager only calls the setter.

use crate::process::ProcessCore;

/// Applies `value[i]` to a named parameter every `duration[i]`, optionally
/// repeating.
pub struct Manager {
    pub core:  ProcessCore,
    /// Name of the parameter this manager drives, for the trace stream.
    pub param: String,
    pub(crate) value:    Vec<f64>,
    pub(crate) duration: Vec<f64>,
    /// Negative: stop after the last value.  Otherwise wrap to index 1.
    pub(crate) period:   f64,
    pub(crate) index:    usize,
    pub(crate) setter:   Box<dyn FnMut(f64)>,
}

impl Manager {
    pub fn new(
        core: ProcessCore,
        param: impl Into<String>,
        value: Vec<f64>,
        duration: Vec<f64>,
        period: f64,
        setter: Box<dyn FnMut(f64)>,
    ) -> Self {
        Self {
            core,
            param: param.into(),
            value,
            duration,
            period,
            index: 0,
            setter,
        }
    }

    /// The delay to the manager's first run.
    pub fn initial_delay(&self) -> f64 {
        self.duration.first().copied().unwrap_or(0.0)
    }
}
