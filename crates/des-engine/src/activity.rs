//! The activity seam: `Outcome`, the `Activity` trait, and `SimCtx`.
//!
//! Activities are the vocabulary of the model — service steps, resource
//! seizures and releases, branches, timeouts.  The kernel does not define
//! that vocabulary; it registers activities as trait objects, invokes
//! [`Activity::run`] on the arrival traversing them, and interprets the
//! returned [`Outcome`] in one explicit `match`.

use des_core::{ActivityId, DesError, DesResult, ProcessId, SimRng, SimTime};

use crate::arrival::Arrival;
use crate::event::EventQueue;
use crate::monitor::Monitor;
use crate::process::ProcessMap;
use crate::resource::ResourceMap;

// ── Outcome ───────────────────────────────────────────────────────────────────

/// The result of executing one activity against one arrival.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The step takes `delay ≥ 0` simulated seconds; continue the chain after.
    Delay(f64),
    /// The step was refused (e.g. a resource denied entry).  The arrival's
    /// activity pointer does not advance and no event is rescheduled.
    Reject,
    /// The arrival was queued somewhere; it advances past this activity but
    /// goes dormant until an external event reactivates it.
    Enqueue,
    /// The arrival is held indefinitely: it stays active with an event parked
    /// at `SimTime::INFINITY` until something unschedules or reschedules it.
    Block,
}

// ── SimCtx ────────────────────────────────────────────────────────────────────

/// The engine state handed to activity and resource implementations: the
/// whole simulation minus the entity currently being run and the activity
/// table itself.
pub struct SimCtx<'a> {
    pub now:     SimTime,
    pub queue:   &'a mut EventQueue,
    pub procs:   &'a mut ProcessMap,
    pub monitor: &'a mut dyn Monitor,
    pub rng:     &'a mut SimRng,
}

impl SimCtx<'_> {
    /// Schedule another process at `now + delay` and mark it active.
    ///
    /// The usual way a resource implementation wakes an enqueued arrival.
    pub fn activate(&mut self, process: ProcessId, delay: f64) -> DesResult<()> {
        let ent = self
            .procs
            .get_mut(&process)
            .ok_or(DesError::ProcessNotFound(process))?;
        ent.core_mut().active = true;
        let priority = ent.core().priority;
        self.queue.schedule(self.now, delay, process, priority);
        Ok(())
    }

    /// Cancel another process's outstanding event.  Returns `false` if it was
    /// already inactive.
    pub fn deactivate(&mut self, process: ProcessId) -> DesResult<bool> {
        let ent = self
            .procs
            .get_mut(&process)
            .ok_or(DesError::ProcessNotFound(process))?;
        if !ent.core().active {
            return Ok(false);
        }
        ent.core_mut().active = false;
        self.queue.unschedule(process);
        Ok(true)
    }
}

// ── Activity ──────────────────────────────────────────────────────────────────

/// One step in an activity chain.
///
/// Implementations are registered with [`Engine::add_activity`]
/// [crate::Engine::add_activity] and linked by `ActivityId`; `next`/`prev`
/// express the chain, `priority` feeds event ordering (0 means "none
/// defined").
pub trait Activity {
    /// Execute this step against `arrival`.
    ///
    /// `resources` is passed separately from the context so that an
    /// implementation can borrow one resource mutably and still hand the
    /// context on to [`Resource::erase`][crate::Resource::erase].
    fn run(
        &mut self,
        arrival: &mut Arrival,
        resources: &mut ResourceMap,
        ctx: &mut SimCtx<'_>,
    ) -> Outcome;

    /// The following activity in the chain, if any.
    fn next(&self) -> Option<ActivityId> {
        None
    }

    /// The preceding activity in the chain, if any.  Used to redo an
    /// interrupted step on resumption.
    fn prev(&self) -> Option<ActivityId> {
        None
    }

    /// Event priority for arrivals leaving this activity.  0 = undefined.
    fn priority(&self) -> i32 {
        0
    }

    /// Human-readable label for the trace stream.
    fn label(&self) -> &str {
        "activity"
    }
}
