//! `Batched` — a group of arrivals moving through the chain as one unit.
//!
//! The batch is itself a flow unit: its shell is a full [`Arrival`] with its
//! own activity pointer, timing, and resource membership.  Children keep a
//! back-reference to the batch through their `batch` field and are only ever
//! removed through the engine's erase path, which owns the collapse policy
//! (see [`Engine::renege`][crate::Engine::renege] and the batch erase
//! branches in `engine.rs`).

use des_core::ProcessId;

use crate::arrival::Arrival;

/// A grouped-arrival shell plus its members.
pub struct Batched {
    /// The shell: the batch's own lifecycle state as a flow unit.
    pub arrival:   Arrival,
    /// Member processes, in insertion order.  Mutated only by the engine's
    /// erase path and the terminate cascade.
    pub(crate) children: Vec<ProcessId>,
    /// A permanent batch rejects individual departures: members cannot
    /// renege out of it.
    pub permanent: bool,
}

impl Batched {
    pub fn new(arrival: Arrival, permanent: bool) -> Self {
        Self {
            arrival,
            children: Vec::new(),
            permanent,
        }
    }

    pub fn children(&self) -> &[ProcessId] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
