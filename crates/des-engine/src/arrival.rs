//! The `Arrival` flow unit and its bookkeeping.
//!
//! An arrival owns three kinds of state:
//!
//! - **lifetime timing** — when it first ran, how much service time it has
//!   accumulated, how long it is busy for, and any leftover time from an
//!   interrupted step;
//! - **resource membership** — which resources it currently holds, plus a
//!   per-resource timing map kept only under monitoring;
//! - **identity** — attributes, an optional parent batch, an optional
//!   reneging timer, and the sibling counter shared with clones.
//!
//! The methods here are the pure state transitions; everything that needs the
//! scheduler, the registry, or other entities lives on
//! [`Engine`][crate::Engine].

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::{Rc, Weak};

use des_core::{ActivityId, ProcessId, ResourceId, SimTime};
use rustc_hash::FxHashMap;

use crate::monitor::Monitor;
use crate::process::{Monitoring, ProcessCore};

// ── Order ─────────────────────────────────────────────────────────────────────

/// Per-arrival scheduling policy, configured on the generator and copied to
/// every arrival it produces.
#[derive(Copy, Clone, Debug, Default)]
pub struct Order {
    /// Base event priority for the arrival's own reschedules.
    pub priority: i32,
    /// Whether an interrupted service step is redone on resumption.
    pub restart:  bool,
}

// ── Lifetime ──────────────────────────────────────────────────────────────────

/// An arrival's life record.
#[derive(Clone, Debug)]
pub struct Lifetime {
    /// Time of the first `run`, or [`Lifetime::UNSET`] if it never ran.
    pub start:      SimTime,
    /// Accumulated service time.
    pub activity:   f64,
    /// The arrival is mid-service until this time (`ZERO` when not busy).
    pub busy_until: SimTime,
    /// Leftover service time from an interrupted step.
    pub remaining:  f64,
}

impl Lifetime {
    pub const UNSET: SimTime = SimTime(-1.0);
}

impl Default for Lifetime {
    fn default() -> Self {
        Self {
            start:      Lifetime::UNSET,
            activity:   0.0,
            busy_until: SimTime::ZERO,
            remaining:  0.0,
        }
    }
}

// ── ResTime ───────────────────────────────────────────────────────────────────

/// Per-resource acquisition timing, kept only while monitoring is enabled.
#[derive(Copy, Clone, Debug, Default)]
pub struct ResTime {
    pub start:    SimTime,
    pub activity: f64,
}

// ── SiblingCount ──────────────────────────────────────────────────────────────

/// Counter shared between an arrival and the clones split from it.
///
/// Each sibling decrements the counter exactly once when it is destroyed;
/// the allocation itself is freed by whichever sibling drops the last `Rc`
/// handle, regardless of destruction order.  Plain `Cell` suffices — the
/// engine is single-threaded.
#[derive(Debug)]
pub struct SiblingCount(Rc<Cell<u32>>);

impl SiblingCount {
    /// A fresh counter for an unshared arrival.
    pub fn new() -> Self {
        SiblingCount(Rc::new(Cell::new(1)))
    }

    /// Share the counter with one more sibling.
    pub fn split(&self) -> Self {
        self.0.set(self.0.get() + 1);
        SiblingCount(Rc::clone(&self.0))
    }

    /// Record this sibling's destruction.  Called exactly once per arrival.
    pub fn release(&self) {
        self.0.set(self.0.get().saturating_sub(1));
    }

    /// Siblings not yet destroyed.
    pub fn remaining(&self) -> u32 {
        self.0.get()
    }

    /// A weak observer handle, for asserting the allocation's fate.
    pub fn watch(&self) -> Weak<Cell<u32>> {
        Rc::downgrade(&self.0)
    }
}

impl Default for SiblingCount {
    fn default() -> Self {
        Self::new()
    }
}

// ── Arrival ───────────────────────────────────────────────────────────────────

/// One flow unit traversing an activity chain.
pub struct Arrival {
    pub core:     ProcessCore,
    /// The activity to execute on the next `run`; `None` means the chain is
    /// finished and the next `run` terminates the arrival.
    pub activity: Option<ActivityId>,
    pub lifetime: Lifetime,
    pub order:    Order,
    /// Resources currently held.  Ordered so release loops are deterministic.
    pub(crate) resources:  BTreeSet<ResourceId>,
    /// Resource name → acquisition timing.  Entries exist only under
    /// monitoring.  Ordered so batch reports are deterministic.
    pub(crate) restime:    BTreeMap<String, ResTime>,
    pub(crate) attributes: FxHashMap<String, f64>,
    /// Parent batch, if this arrival currently moves as part of one.
    pub batch:  Option<ProcessId>,
    /// Outstanding reneging timer, if any.
    pub(crate) timer:  Option<ProcessId>,
    pub(crate) clones: SiblingCount,
}

impl Arrival {
    pub fn new(core: ProcessCore, activity: Option<ActivityId>, order: Order) -> Self {
        Self {
            core,
            activity,
            lifetime: Lifetime::default(),
            order,
            resources: BTreeSet::new(),
            restime: BTreeMap::new(),
            attributes: FxHashMap::default(),
            batch: None,
            timer: None,
            clones: SiblingCount::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn monitoring(&self) -> Monitoring {
        self.core.monitoring
    }

    /// Resources currently held.
    pub fn held_resources(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.resources.iter().copied()
    }

    pub fn attribute(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).copied()
    }

    /// Siblings (this arrival included) not yet destroyed.
    pub fn siblings_remaining(&self) -> u32 {
        self.clones.remaining()
    }

    // ── Busy-time bookkeeping ─────────────────────────────────────────────

    pub(crate) fn set_busy(&mut self, until: SimTime) {
        self.lifetime.busy_until = until;
    }

    /// Unwind service time that was credited but not actually served: the
    /// span from `now` to `busy_until` is subtracted from the accumulated
    /// activity time (and from every monitored per-resource entry).
    pub(crate) fn unset_busy(&mut self, now: SimTime) {
        let unserved = self.lifetime.busy_until.since(now);
        self.lifetime.activity -= unserved;
        for rt in self.restime.values_mut() {
            rt.activity -= unserved;
        }
        self.lifetime.busy_until = SimTime::ZERO;
    }

    /// Credit `delay` of service time to the lifetime and to every monitored
    /// per-resource entry.
    pub(crate) fn update_activity(&mut self, delay: f64) {
        self.lifetime.activity += delay;
        for rt in self.restime.values_mut() {
            rt.activity += delay;
        }
    }

    pub(crate) fn set_remaining(&mut self, remaining: f64) {
        self.lifetime.remaining = remaining;
    }

    pub(crate) fn unset_remaining(&mut self) {
        self.lifetime.remaining = 0.0;
    }

    // ── Attributes ────────────────────────────────────────────────────────

    /// Last-write-wins attribute update; recorded when monitoring ≥
    /// `Attributes`.
    pub fn set_attribute(&mut self, key: &str, value: f64, now: SimTime, monitor: &mut dyn Monitor) {
        self.attributes.insert(key.to_string(), value);
        if self.monitoring() >= Monitoring::Attributes {
            monitor.record_attribute(now, &self.core.name, key, value);
        }
    }

    // ── Resource membership ───────────────────────────────────────────────

    /// Add `resource` to the membership set.  The acquisition start is
    /// recorded only under monitoring.
    pub fn register_entity(&mut self, resource: ResourceId, name: &str, now: SimTime) {
        if self.monitoring() >= Monitoring::EndOfLife {
            self.restime.entry(name.to_string()).or_default().start = now;
        }
        self.resources.insert(resource);
    }

    /// Record a release event (under monitoring) and remove `resource` from
    /// the membership set.
    pub fn unregister_entity(
        &mut self,
        resource: ResourceId,
        name: &str,
        now: SimTime,
        monitor: &mut dyn Monitor,
    ) {
        if self.monitoring() >= Monitoring::EndOfLife {
            self.leave(name, now, monitor);
        }
        self.resources.remove(&resource);
    }

    /// Report leaving `resource` using this arrival's own recorded timing.
    pub(crate) fn leave(&self, resource: &str, now: SimTime, monitor: &mut dyn Monitor) {
        let rt = self.restime.get(resource).copied().unwrap_or_default();
        monitor.record_release(now, &self.core.name, rt.start, rt.activity, resource);
    }

    /// Report leaving `resource` with externally supplied timing — used by a
    /// batch re-basing its shared timing onto a departing child.
    pub(crate) fn leave_at(
        &self,
        resource: &str,
        start: SimTime,
        activity: f64,
        now: SimTime,
        monitor: &mut dyn Monitor,
    ) {
        monitor.record_release(now, &self.core.name, start, activity, resource);
    }

    /// This arrival's own recorded acquisition start for `resource`, if any.
    pub(crate) fn own_start(&self, resource: &str) -> Option<SimTime> {
        self.restime.get(resource).map(|rt| rt.start)
    }
}
