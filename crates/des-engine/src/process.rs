//! Process base state and the entity registry.
//!
//! Every runnable thing in the simulation — generator, manager, task,
//! arrival, batch — embeds a [`ProcessCore`] and lives in the engine's
//! registry as an [`Entity`] variant.  The enum is the kind discriminant:
//! code that needs to know "is this a batch?" matches on the variant instead
//! of downcasting.

use des_core::ProcessId;
use rustc_hash::FxHashMap;

use crate::arrival::Arrival;
use crate::batch::Batched;
use crate::generator::Generator;
use crate::manager::Manager;
use crate::task::Task;

// ── Monitoring ────────────────────────────────────────────────────────────────

/// How much an entity reports to the statistics sink.
///
/// Ordered: each level includes everything below it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Monitoring {
    /// Record nothing.
    #[default]
    Off,
    /// Record end-of-life statistics for leaf arrivals and resource releases.
    EndOfLife,
    /// Additionally record every attribute write.
    Attributes,
}

// ── ProcessCore ───────────────────────────────────────────────────────────────

/// State shared by every process kind.
#[derive(Debug)]
pub struct ProcessCore {
    pub id:         ProcessId,
    pub name:       String,
    pub priority:   i32,
    /// True exactly while an event is outstanding for this process.
    pub active:     bool,
    pub monitoring: Monitoring,
}

impl ProcessCore {
    pub fn new(id: ProcessId, name: impl Into<String>, priority: i32, monitoring: Monitoring) -> Self {
        Self {
            id,
            name: name.into(),
            priority,
            active: false,
            monitoring,
        }
    }
}

// ── Entity ────────────────────────────────────────────────────────────────────

/// A registered process, dispatched by kind.
pub enum Entity {
    Generator(Generator),
    Manager(Manager),
    Task(Task),
    Arrival(Arrival),
    Batch(Batched),
}

impl Entity {
    pub fn core(&self) -> &ProcessCore {
        match self {
            Entity::Generator(g) => &g.core,
            Entity::Manager(m) => &m.core,
            Entity::Task(t) => &t.core,
            Entity::Arrival(a) => &a.core,
            Entity::Batch(b) => &b.arrival.core,
        }
    }

    pub fn core_mut(&mut self) -> &mut ProcessCore {
        match self {
            Entity::Generator(g) => &mut g.core,
            Entity::Manager(m) => &mut m.core,
            Entity::Task(t) => &mut t.core,
            Entity::Arrival(a) => &mut a.core,
            Entity::Batch(b) => &mut b.arrival.core,
        }
    }

    /// View this entity as a flow unit — a plain arrival, or a batch's shell.
    pub fn as_arrival(&self) -> Option<&Arrival> {
        match self {
            Entity::Arrival(a) => Some(a),
            Entity::Batch(b) => Some(&b.arrival),
            _ => None,
        }
    }

    pub fn as_arrival_mut(&mut self) -> Option<&mut Arrival> {
        match self {
            Entity::Arrival(a) => Some(a),
            Entity::Batch(b) => Some(&mut b.arrival),
            _ => None,
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, Entity::Batch(_))
    }
}

/// The engine's process registry.  All cross-entity references are
/// `ProcessId` lookups into this map.
pub type ProcessMap = FxHashMap<ProcessId, Entity>;
