//! `EventQueue` — the time-ordered priority queue driving the simulation.
//!
//! # Ordering
//!
//! Events are totally ordered by `(time, priority, insertion seq)`, all
//! ascending.  At equal simulated time, lower priority values fire first and
//! the insertion sequence breaks remaining ties, so a run is deterministic
//! for a fixed seed.
//!
//! # Cancellation
//!
//! `BinaryHeap` has no random-access removal, so cancellation is lazy: every
//! process has a current *epoch*, each pushed event carries the epoch it was
//! scheduled under, and `schedule`/`unschedule` bump the epoch.  A popped
//! event whose epoch is stale is silently discarded.  This also gives
//! re-activation its replace semantics — scheduling a process that already
//! has an outstanding event invalidates the old one.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use des_core::{ProcessId, SimTime};
use rustc_hash::FxHashMap;

// ── Event ─────────────────────────────────────────────────────────────────────

/// One scheduled activation of a process.
#[derive(Copy, Clone, Debug)]
pub struct Event {
    pub time:     SimTime,
    pub priority: i32,
    pub seq:      u64,
    pub process:  ProcessId,
    epoch:        u64,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for Event {}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then(self.priority.cmp(&other.priority))
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ── EventQueue ────────────────────────────────────────────────────────────────

/// Min-heap of pending events with epoch-based lazy cancellation.
#[derive(Default)]
pub struct EventQueue {
    heap:   BinaryHeap<Reverse<Event>>,
    seq:    u64,
    /// Current epoch per process.  An absent entry invalidates every
    /// outstanding event for that process.
    epochs: FxHashMap<ProcessId, u64>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `process` to run `delay` simulated seconds after `now`.
    ///
    /// Replaces any event already outstanding for `process`.
    pub fn schedule(&mut self, now: SimTime, delay: f64, process: ProcessId, priority: i32) {
        debug_assert!(delay >= 0.0, "negative delay for {process}");
        let epoch = self.bump(process);
        self.seq += 1;
        self.heap.push(Reverse(Event {
            time: now.offset(delay),
            priority,
            seq: self.seq,
            process,
            epoch,
        }));
    }

    /// Invalidate the outstanding event for `process`, if any.
    pub fn unschedule(&mut self, process: ProcessId) {
        self.bump(process);
    }

    /// Drop all epoch state for a destroyed process.  Any event still in the
    /// heap for it becomes stale.
    pub fn forget(&mut self, process: ProcessId) {
        self.epochs.remove(&process);
    }

    /// Remove and return the earliest valid event, or `None` if the queue
    /// holds only stale entries.
    ///
    /// The popped process's epoch entry stays put: epochs must only grow
    /// while older events for the process may still sit in the heap.
    /// Destruction paths call [`EventQueue::forget`] once no event can
    /// reference the process again.
    pub fn pop(&mut self) -> Option<Event> {
        while let Some(Reverse(ev)) = self.heap.pop() {
            if self.is_current(&ev) {
                return Some(ev);
            }
        }
        None
    }

    /// The time of the earliest valid event, without consuming it.
    ///
    /// Stale heap entries encountered on the way are discarded.
    pub fn peek_time(&mut self) -> Option<SimTime> {
        loop {
            let ev = self.heap.peek()?.0;
            if self.is_current(&ev) {
                return Some(ev.time);
            }
            self.heap.pop();
        }
    }

    pub fn is_empty(&mut self) -> bool {
        self.peek_time().is_none()
    }

    fn is_current(&self, ev: &Event) -> bool {
        self.epochs.get(&ev.process) == Some(&ev.epoch)
    }

    fn bump(&mut self, process: ProcessId) -> u64 {
        let e = self.epochs.entry(process).or_insert(0);
        *e += 1;
        *e
    }
}
