//! `Task` — a one-shot process wrapping a stored callable.
//!
//! Runs exactly once and is removed from the registry afterwards; it never
//! reschedules itself.  Reneging timers are tasks whose job calls
//! [`Engine::renege`][crate::Engine::renege].

use crate::engine::Engine;
use crate::process::ProcessCore;

/// The job a task executes.  The task entity is already out of the registry
/// when the job runs, so the job may freely mutate the engine.
pub type TaskJob = Box<dyn FnOnce(&mut Engine)>;

/// A one-shot scheduled callable.
pub struct Task {
    pub core:       ProcessCore,
    pub(crate) job: TaskJob,
}

impl Task {
    pub fn new(core: ProcessCore, job: TaskJob) -> Self {
        Self { core, job }
    }
}
