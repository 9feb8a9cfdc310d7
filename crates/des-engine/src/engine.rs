//! The simulation engine: registry, clock, event loop, and every lifecycle
//! operation that needs more than one entity at a time.
//!
//! # Dispatch
//!
//! `step` pops the earliest valid event, advances the clock, and dispatches
//! the target process by kind.  Dispatch removes the entity from the registry
//! first, runs it, and reinserts it afterwards (or destroys it), so handlers
//! can freely look up and mutate *other* entities through the registry while
//! holding the one being run.
//!
//! # Destruction
//!
//! All destruction funnels through `destroy_flow`: terminate-on-chain-end,
//! reneging, batch collapse, and external [`Engine::terminate`] calls.  It
//! force-releases leaked resources, emits the end-of-life record, cancels any
//! reneging timer, releases the sibling counter, and drops the entity.

use tracing::{debug, warn};

use des_core::{ActivityId, DesError, DesResult, ProcessId, ResourceId, SimRng, SimTime};

use crate::activity::{Activity, Outcome, SimCtx};
use crate::arrival::{Arrival, Order};
use crate::batch::Batched;
use crate::generator::{DelaySource, Generator};
use crate::manager::Manager;
use crate::monitor::{Monitor, NoopMonitor};
use crate::process::{Entity, Monitoring, ProcessCore, ProcessMap};
use crate::resource::{Resource, ResourceMap};
use crate::task::Task;
use crate::event::EventQueue;

// ── Engine ────────────────────────────────────────────────────────────────────

/// A single-threaded discrete-event simulation.
pub struct Engine {
    now:           SimTime,
    queue:         EventQueue,
    procs:         ProcessMap,
    next_process:  u32,
    activities:    Vec<Box<dyn Activity>>,
    resources:     ResourceMap,
    next_resource: u32,
    monitor:       Box<dyn Monitor>,
    rng:           SimRng,
}

impl Engine {
    pub fn new(seed: u64) -> Self {
        Self::with_monitor(seed, NoopMonitor)
    }

    pub fn with_monitor(seed: u64, monitor: impl Monitor + 'static) -> Self {
        Self {
            now: SimTime::ZERO,
            queue: EventQueue::new(),
            procs: ProcessMap::default(),
            next_process: 0,
            activities: Vec::new(),
            resources: ResourceMap::default(),
            next_resource: 0,
            monitor: Box::new(monitor),
            rng: SimRng::new(seed),
        }
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn monitor_mut(&mut self) -> &mut dyn Monitor {
        self.monitor.as_mut()
    }

    pub fn rng_mut(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    // ── Registration ──────────────────────────────────────────────────────

    pub fn add_activity(&mut self, activity: impl Activity + 'static) -> ActivityId {
        self.activities.push(Box::new(activity));
        ActivityId((self.activities.len() - 1) as u32)
    }

    pub fn activity(&self, id: ActivityId) -> Option<&dyn Activity> {
        self.activities.get(id.index()).map(|a| a.as_ref())
    }

    pub fn add_resource(&mut self, resource: impl Resource + 'static) -> ResourceId {
        let id = ResourceId(self.next_resource);
        self.next_resource += 1;
        self.resources.insert(id, Box::new(resource));
        id
    }

    pub fn resource(&self, id: ResourceId) -> Option<&dyn Resource> {
        self.resources.get(&id).map(|r| r.as_ref())
    }

    fn alloc_process(&mut self) -> ProcessId {
        let id = ProcessId(self.next_process);
        self.next_process += 1;
        id
    }

    /// Register a generator.  Inactive until [`Engine::activate`]d.
    pub fn add_generator(
        &mut self,
        name: impl Into<String>,
        priority: i32,
        monitoring: Monitoring,
        first_activity: ActivityId,
        order: Order,
        source: impl DelaySource + 'static,
    ) -> DesResult<ProcessId> {
        if first_activity.index() >= self.activities.len() {
            return Err(DesError::ActivityNotFound(first_activity));
        }
        let id = self.alloc_process();
        let core = ProcessCore::new(id, name, priority, monitoring);
        let g = Generator::new(core, first_activity, order, Box::new(source));
        self.procs.insert(id, Entity::Generator(g));
        Ok(id)
    }

    /// Register a timetable manager.  Inactive until activated, conventionally
    /// with [`Manager::initial_delay`] so that index 0 fires as the initial
    /// value.
    pub fn add_manager(
        &mut self,
        name: impl Into<String>,
        priority: i32,
        param: impl Into<String>,
        value: Vec<f64>,
        duration: Vec<f64>,
        period: f64,
        setter: impl FnMut(f64) + 'static,
    ) -> DesResult<ProcessId> {
        if value.is_empty() || value.len() != duration.len() {
            return Err(DesError::Config(format!(
                "manager timetable length mismatch: {} values, {} durations",
                value.len(),
                duration.len()
            )));
        }
        if period >= 0.0 && value.len() < 2 {
            return Err(DesError::Config(
                "a repeating manager timetable needs at least two entries".into(),
            ));
        }
        let id = self.alloc_process();
        let core = ProcessCore::new(id, name, priority, Monitoring::Off);
        let mgr = Manager::new(core, param, value, duration, period, Box::new(setter));
        self.procs.insert(id, Entity::Manager(mgr));
        Ok(id)
    }

    /// Register a one-shot task.  Inactive until activated; runs once, then
    /// disappears from the registry.
    pub fn add_task(
        &mut self,
        name: impl Into<String>,
        priority: i32,
        job: impl FnOnce(&mut Engine) + 'static,
    ) -> ProcessId {
        let id = self.alloc_process();
        let core = ProcessCore::new(id, name, priority, Monitoring::Off);
        self.procs.insert(id, Entity::Task(Task::new(core, Box::new(job))));
        id
    }

    /// Register an arrival outside any generator, e.g. a pre-seeded entity.
    /// Inactive until activated.
    pub fn add_arrival(
        &mut self,
        name: impl Into<String>,
        monitoring: Monitoring,
        activity: Option<ActivityId>,
        order: Order,
    ) -> ProcessId {
        let id = self.alloc_process();
        let core = ProcessCore::new(id, name, order.priority, monitoring);
        self.procs.insert(id, Entity::Arrival(Arrival::new(core, activity, order)));
        id
    }

    /// Register a clone of an existing arrival: same chain position, policy,
    /// monitoring, and attributes, sharing the source's sibling counter.
    pub fn add_sibling(&mut self, of: ProcessId, name: impl Into<String>) -> DesResult<ProcessId> {
        let src = self
            .procs
            .get(&of)
            .ok_or(DesError::ProcessNotFound(of))?
            .as_arrival()
            .ok_or(DesError::NotAnArrival(of))?;
        let activity = src.activity;
        let order = src.order;
        let monitoring = src.monitoring();
        let attributes = src.attributes.clone();
        let clones = src.clones.split();

        let id = self.alloc_process();
        let mut a = Arrival::new(ProcessCore::new(id, name, order.priority, monitoring), activity, order);
        a.attributes = attributes;
        a.clones = clones;
        self.procs.insert(id, Entity::Arrival(a));
        Ok(id)
    }

    /// Group `children` into a new batch with its own shell arrival.  Active
    /// children are deactivated — from here on the shell moves for them.
    pub fn form_batch(
        &mut self,
        name: impl Into<String>,
        monitoring: Monitoring,
        permanent: bool,
        activity: Option<ActivityId>,
        children: Vec<ProcessId>,
    ) -> DesResult<ProcessId> {
        for &cid in &children {
            let ent = self.procs.get(&cid).ok_or(DesError::ProcessNotFound(cid))?;
            if ent.as_arrival().is_none() {
                return Err(DesError::NotAnArrival(cid));
            }
        }
        let id = self.alloc_process();
        let shell = Arrival::new(ProcessCore::new(id, name, 0, monitoring), activity, Order::default());
        let mut batch = Batched::new(shell, permanent);
        for &cid in &children {
            let ent = self.procs.get_mut(&cid).expect("validated above");
            let a = ent.as_arrival_mut().expect("validated above");
            a.batch = Some(id);
            if a.core.active {
                a.core.active = false;
                self.queue.unschedule(cid);
            }
        }
        batch.children = children;
        self.procs.insert(id, Entity::Batch(batch));
        Ok(id)
    }

    // ── Registry access ───────────────────────────────────────────────────

    pub fn contains(&self, process: ProcessId) -> bool {
        self.procs.contains_key(&process)
    }

    pub fn entity(&self, process: ProcessId) -> Option<&Entity> {
        self.procs.get(&process)
    }

    /// The flow-unit view of a process: a plain arrival, or a batch's shell.
    pub fn arrival(&self, process: ProcessId) -> Option<&Arrival> {
        self.procs.get(&process).and_then(Entity::as_arrival)
    }

    pub fn process_count(&self) -> usize {
        self.procs.len()
    }

    // ── Activation ────────────────────────────────────────────────────────

    /// Schedule `process` at `now + delay` with its own priority and mark it
    /// active.  Replaces any outstanding event.
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

    /// Cancel `process`'s outstanding event.  Returns `false` if it was
    /// already inactive (the call is then a no-op).
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

    pub fn is_active(&self, process: ProcessId) -> DesResult<bool> {
        self.procs
            .get(&process)
            .map(|e| e.core().active)
            .ok_or(DesError::ProcessNotFound(process))
    }

    // ── Flow-unit state ───────────────────────────────────────────────────

    pub fn attribute(&self, process: ProcessId, key: &str) -> Option<f64> {
        self.arrival(process).and_then(|a| a.attribute(key))
    }

    /// Set an attribute on a flow unit.  On a batch this also propagates to
    /// every child, recursively.
    pub fn set_attribute(&mut self, process: ProcessId, key: &str, value: f64) -> DesResult<()> {
        let now = self.now;
        let children = {
            let ent = self
                .procs
                .get_mut(&process)
                .ok_or(DesError::ProcessNotFound(process))?;
            match ent {
                Entity::Arrival(a) => {
                    a.set_attribute(key, value, now, self.monitor.as_mut());
                    None
                }
                Entity::Batch(b) => {
                    // The shell's map is written silently; only children record.
                    b.arrival.attributes.insert(key.to_string(), value);
                    Some(b.children.clone())
                }
                _ => return Err(DesError::NotAnArrival(process)),
            }
        };
        if let Some(children) = children {
            for cid in children {
                self.set_attribute(cid, key, value)?;
            }
        }
        Ok(())
    }

    /// The earliest recorded acquisition start of `resource` across this flow
    /// unit and its enclosing batches.  `None` if nothing recorded a start.
    pub fn get_start(&self, process: ProcessId, resource: &str) -> DesResult<Option<SimTime>> {
        let a = self
            .procs
            .get(&process)
            .ok_or(DesError::ProcessNotFound(process))?
            .as_arrival()
            .ok_or(DesError::NotAnArrival(process))?;
        let own = a.own_start(resource);
        let inherited = match a.batch {
            Some(bid) => self.get_start(bid, resource).unwrap_or(None),
            None => None,
        };
        Ok(match (own, inherited) {
            (Some(o), Some(i)) => Some(o.min(i)),
            (o, i) => o.or(i),
        })
    }

    pub fn set_remaining(&mut self, process: ProcessId, remaining: f64) -> DesResult<()> {
        let a = self
            .procs
            .get_mut(&process)
            .ok_or(DesError::ProcessNotFound(process))?
            .as_arrival_mut()
            .ok_or(DesError::NotAnArrival(process))?;
        a.set_remaining(remaining);
        Ok(())
    }

    /// Add `process` to `resource`'s membership on the flow unit's side.
    pub fn register_entity(&mut self, process: ProcessId, resource: ResourceId) -> DesResult<()> {
        let name = self
            .resources
            .get(&resource)
            .ok_or(DesError::ResourceNotFound(resource))?
            .name()
            .to_string();
        let now = self.now;
        let a = self
            .procs
            .get_mut(&process)
            .ok_or(DesError::ProcessNotFound(process))?
            .as_arrival_mut()
            .ok_or(DesError::NotAnArrival(process))?;
        a.register_entity(resource, &name, now);
        Ok(())
    }

    /// Remove `process` from `resource`'s membership, recording the release.
    pub fn unregister_entity(&mut self, process: ProcessId, resource: ResourceId) -> DesResult<()> {
        let name = self
            .resources
            .get(&resource)
            .ok_or(DesError::ResourceNotFound(resource))?
            .name()
            .to_string();
        let now = self.now;
        let a = self
            .procs
            .get_mut(&process)
            .ok_or(DesError::ProcessNotFound(process))?
            .as_arrival_mut()
            .ok_or(DesError::NotAnArrival(process))?;
        a.unregister_entity(resource, &name, now, self.monitor.as_mut());
        Ok(())
    }

    // ── Interruption and resumption ───────────────────────────────────────

    /// Preempt a flow unit mid-service: cancel its event and unwind the
    /// service time it was credited but will not serve.  If it had leftover
    /// time and its policy restarts interrupted steps, the step is forgotten
    /// and the chain pointer rewinds to redo it.
    pub fn interrupt(&mut self, process: ProcessId) -> DesResult<()> {
        let now = self.now;
        let Engine { procs, queue, activities, .. } = self;
        let ent = procs
            .get_mut(&process)
            .ok_or(DesError::ProcessNotFound(process))?;
        let a = ent.as_arrival_mut().ok_or(DesError::NotAnArrival(process))?;
        if a.core.active {
            a.core.active = false;
            queue.unschedule(process);
        }
        if a.lifetime.busy_until < now {
            return Ok(());
        }
        a.unset_busy(now);
        if a.lifetime.remaining != 0.0 && a.order.restart {
            a.unset_remaining();
            a.activity = a
                .activity
                .and_then(|id| activities.get(id.index()))
                .and_then(|act| act.prev());
        }
        Ok(())
    }

    /// Resume a preempted flow unit: serve out its leftover time, then
    /// continue the chain.
    pub fn restart(&mut self, process: ProcessId) -> DesResult<()> {
        let now = self.now;
        let a = self
            .procs
            .get_mut(&process)
            .ok_or(DesError::ProcessNotFound(process))?
            .as_arrival_mut()
            .ok_or(DesError::NotAnArrival(process))?;
        let remaining = a.lifetime.remaining;
        a.set_busy(now.offset(remaining));
        a.core.active = true;
        let priority = a.core.priority;
        a.set_remaining(0.0);
        self.queue.schedule(now, remaining, process, priority);
        Ok(())
    }

    /// Arm (or re-arm) a reneging timer: after `delay`, the flow unit
    /// abandons its current position and either jumps to `next` or is
    /// destroyed unfinished.
    pub fn set_timeout(
        &mut self,
        process: ProcessId,
        delay: f64,
        next: Option<ActivityId>,
    ) -> DesResult<()> {
        let (old, name, priority) = {
            let a = self
                .procs
                .get_mut(&process)
                .ok_or(DesError::ProcessNotFound(process))?
                .as_arrival_mut()
                .ok_or(DesError::NotAnArrival(process))?;
            (a.timer.take(), a.core.name.clone(), a.core.priority)
        };
        if let Some(old) = old {
            self.queue.unschedule(old);
            self.queue.forget(old);
            self.procs.remove(&old);
        }
        let timer = self.add_task(format!("{name}_timeout"), priority, move |eng| {
            let _ = eng.renege(process, next);
        });
        self.activate(timer, delay)?;
        if let Some(a) = self.procs.get_mut(&process).and_then(Entity::as_arrival_mut) {
            a.timer = Some(timer);
        }
        Ok(())
    }

    /// Abandon the flow unit's current position: leave its batch if any,
    /// release everything it holds, then either continue at `next` with zero
    /// delay or be destroyed unfinished.
    ///
    /// A member of a *permanent* batch cannot renege; the call is a no-op.
    pub fn renege(&mut self, process: ProcessId, next: Option<ActivityId>) -> DesResult<()> {
        let mut ent = self
            .procs
            .remove(&process)
            .ok_or(DesError::ProcessNotFound(process))?;
        if ent.as_arrival().is_none() {
            self.procs.insert(process, ent);
            return Err(DesError::NotAnArrival(process));
        }

        // cancel the reneging timer; harmless when invoked from it
        let timer = ent.as_arrival_mut().expect("checked above").timer.take();
        if let Some(tid) = timer {
            self.queue.unschedule(tid);
            self.queue.forget(tid);
            self.procs.remove(&tid);
        }

        let mut deactivated = false;
        if let Some(bid) = ent.as_arrival().expect("checked above").batch {
            if self.batch_is_permanent(bid) {
                self.procs.insert(process, ent);
                return Ok(());
            }
            deactivated = true;
            self.erase_from_batch(bid, process, &mut ent);
        }

        let now = self.now;
        {
            let a = ent.as_arrival_mut().expect("checked above");
            if a.lifetime.busy_until > now {
                a.unset_busy(now);
            }
            a.unset_remaining();
        }
        deactivated |= self.release_all(ent.as_arrival_mut().expect("checked above"), false, false);

        let a = ent.as_arrival_mut().expect("checked above");
        if !deactivated && a.core.active {
            a.core.active = false;
            self.queue.unschedule(process);
        }
        match next {
            Some(next) => {
                debug!(now = %now, name = %a.core.name, "reneges to a new position");
                a.activity = Some(next);
                a.core.active = true;
                let priority = a.core.priority;
                self.queue.schedule(now, 0.0, process, priority);
                self.procs.insert(process, ent);
            }
            None => {
                debug!(now = %now, name = %a.core.name, "reneges and leaves");
                self.destroy_flow(process, ent, false);
            }
        }
        Ok(())
    }

    /// Forcefully destroy a flow unit from outside the event loop.
    pub fn terminate(&mut self, process: ProcessId, finished: bool) -> DesResult<()> {
        let ent = self
            .procs
            .remove(&process)
            .ok_or(DesError::ProcessNotFound(process))?;
        if ent.as_arrival().is_none() {
            self.procs.insert(process, ent);
            return Err(DesError::NotAnArrival(process));
        }
        self.destroy_flow(process, ent, finished);
        Ok(())
    }

    // ── The event loop ────────────────────────────────────────────────────

    /// The time of the next valid finite event, if any.
    pub fn peek(&mut self) -> Option<SimTime> {
        self.queue.peek_time().filter(|t| t.is_finite())
    }

    /// Run the earliest event, advancing the clock.  Returns `false` when no
    /// runnable event remains — the queue is empty or holds only parked
    /// (infinite-time) events.
    pub fn step(&mut self) -> bool {
        match self.queue.peek_time() {
            Some(t) if t.is_finite() => {}
            _ => return false,
        }
        let ev = self.queue.pop().expect("peeked above");
        self.now = ev.time;
        self.dispatch(ev.process);
        true
    }

    /// Run until no runnable event remains.
    pub fn run(&mut self) {
        while self.step() {}
    }

    /// Run events with time ≤ `until`, then advance the clock to `until`.
    pub fn run_until(&mut self, until: SimTime) {
        while let Some(t) = self.peek() {
            if t > until {
                break;
            }
            self.step();
        }
        if until > self.now && until.is_finite() {
            self.now = until;
        }
    }

    pub fn flush_monitor(&mut self) {
        self.monitor.flush();
    }

    fn dispatch(&mut self, process: ProcessId) {
        // event consumed: the process is no longer active regardless of kind
        let Some(mut ent) = self.procs.remove(&process) else {
            return;
        };
        ent.core_mut().active = false;
        match ent {
            Entity::Generator(g) => self.run_generator(process, g),
            Entity::Manager(m) => self.run_manager(process, m),
            Entity::Task(t) => self.run_task(t),
            Entity::Arrival(_) | Entity::Batch(_) => self.run_flow(process, ent),
        }
    }

    // ── Kind-specific run handlers ────────────────────────────────────────

    fn run_generator(&mut self, process: ProcessId, mut g: Generator) {
        let delays = g.source.sample(&mut self.rng);
        let mut offset = 0.0;
        let mut stopped = false;
        for d in delays {
            if d < 0.0 {
                stopped = true;
                break;
            }
            offset += d;
            let name = format!("{}{}", g.core.name, g.count);
            g.count += 1;
            let entry_priority = self
                .activities
                .get(g.first_activity.index())
                .map(|a| a.priority())
                .unwrap_or(0);
            let priority = if entry_priority != 0 {
                entry_priority
            } else {
                g.count as i32
            };
            let id = self.alloc_process();
            let mut arrival = Arrival::new(
                ProcessCore::new(id, name, g.order.priority, g.core.monitoring),
                Some(g.first_activity),
                g.order,
            );
            arrival.core.active = true;
            debug!(
                now = %self.now,
                generator = %g.core.name,
                arrival = %arrival.core.name,
                at = self.now.0 + offset,
                "new arrival"
            );
            self.queue.schedule(self.now, offset, id, priority);
            self.procs.insert(id, Entity::Arrival(arrival));
        }
        if !stopped {
            g.core.active = true;
            self.queue.schedule(self.now, offset, process, g.core.priority);
        }
        self.procs.insert(process, Entity::Generator(g));
    }

    fn run_manager(&mut self, process: ProcessId, mut m: Manager) {
        let value = m.value[m.index];
        debug!(now = %self.now, manager = %m.core.name, param = %m.param, value, "set parameter");
        (m.setter)(value);
        m.index += 1;
        let mut stopped = false;
        if m.index == m.duration.len() {
            if m.period < 0.0 {
                stopped = true;
            } else {
                // index 0 was the initial value; the cycle restarts at 1
                m.index = 1;
            }
        }
        if !stopped {
            let delay = m.duration[m.index];
            m.core.active = true;
            self.queue.schedule(self.now, delay, process, m.core.priority);
        }
        self.procs.insert(process, Entity::Manager(m));
    }

    fn run_task(&mut self, task: Task) {
        debug!(now = %self.now, task = %task.core.name, "run task");
        self.queue.forget(task.core.id);
        let Task { job, .. } = task;
        job(self);
    }

    fn run_flow(&mut self, process: ProcessId, mut ent: Entity) {
        let Some(current) = ent.as_arrival().expect("flow entity").activity else {
            // end of chain: the flow unit finished
            self.destroy_flow(process, ent, true);
            return;
        };

        let now = self.now;
        let a = ent.as_arrival_mut().expect("flow entity");
        if a.lifetime.start < 0.0 {
            a.lifetime.start = now;
        }

        let Engine { activities, queue, procs, resources, monitor, rng, .. } = self;
        let (outcome, next) = {
            let Some(act) = activities.get_mut(current.index()) else {
                warn!(arrival = %a.core.name, activity = %current, "dangling activity");
                procs.insert(process, ent);
                return;
            };
            let mut ctx = SimCtx {
                now,
                queue,
                procs,
                monitor: monitor.as_mut(),
                rng,
            };
            let outcome = act.run(a, resources, &mut ctx);
            debug!(now = %now, arrival = %a.core.name, activity = act.label(), ?outcome, "ran activity");
            (outcome, act.next())
        };

        match outcome {
            Outcome::Reject => {
                // the step refused the arrival; its position is untouched
                procs.insert(process, ent);
            }
            Outcome::Enqueue => {
                a.activity = next;
                procs.insert(process, ent);
            }
            Outcome::Delay(_) | Outcome::Block => {
                a.activity = next;
                a.core.active = true;
                let delay = match outcome {
                    Outcome::Delay(d) => {
                        a.set_busy(now.offset(d));
                        a.update_activity(d);
                        d
                    }
                    _ => f64::INFINITY,
                };
                let priority = next
                    .and_then(|id| activities.get(id.index()))
                    .map(|act| act.priority())
                    .unwrap_or(a.core.priority);
                queue.schedule(now, delay, process, priority);
                procs.insert(process, ent);
            }
        }
    }

    // ── Destruction ───────────────────────────────────────────────────────

    /// Destroy a flow unit already removed from the registry.  Batches
    /// cascade to their children first.
    fn destroy_flow(&mut self, process: ProcessId, mut ent: Entity, finished: bool) {
        if let Entity::Batch(b) = &mut ent {
            let children = std::mem::take(&mut b.children);
            for cid in children {
                if let Some(child) = self.procs.remove(&cid) {
                    self.destroy_flow(cid, child, finished);
                }
            }
        }
        let is_batch = ent.is_batch();
        let a = ent.as_arrival_mut().expect("flow entity");

        self.release_all(a, true, true);
        a.unset_remaining();

        if !is_batch && a.monitoring() >= Monitoring::EndOfLife {
            self.monitor
                .record_end(self.now, &a.core.name, a.lifetime.start, a.lifetime.activity, finished);
        }
        if let Some(tid) = a.timer.take() {
            self.queue.unschedule(tid);
            self.queue.forget(tid);
            self.procs.remove(&tid);
        }
        a.clones.release();
        self.queue.forget(process);
    }

    /// Release every resource the flow unit still holds.  Returns `true` if
    /// any release reported that the unit should stay deactivated.
    fn release_all(&mut self, a: &mut Arrival, force: bool, warn_leak: bool) -> bool {
        let now = self.now;
        let Engine { queue, procs, resources, monitor, rng, .. } = self;
        let mut deactivated = false;
        while let Some(&rid) = a.resources.iter().next() {
            match resources.get_mut(&rid) {
                Some(res) => {
                    if warn_leak {
                        warn!(arrival = %a.core.name, resource = res.name(), "leaving without releasing");
                    }
                    let mut ctx = SimCtx {
                        now,
                        queue,
                        procs,
                        monitor: monitor.as_mut(),
                        rng,
                    };
                    deactivated |= res.erase(a, &mut ctx, force);
                    let name = res.name().to_string();
                    a.unregister_entity(rid, &name, now, monitor.as_mut());
                }
                None => {
                    a.resources.remove(&rid);
                }
            }
        }
        deactivated
    }

    // ── Batch collapse ────────────────────────────────────────────────────

    fn batch_is_permanent(&self, batch: ProcessId) -> bool {
        matches!(self.procs.get(&batch), Some(Entity::Batch(b)) if b.permanent)
    }

    /// Remove `child` (already out of the registry, held by the caller) from
    /// its parent batch, collapsing the batch when the child was the last
    /// member.
    fn erase_from_batch(&mut self, batch: ProcessId, child_id: ProcessId, child: &mut Entity) {
        let Some(mut bent) = self.procs.remove(&batch) else {
            if let Some(a) = child.as_arrival_mut() {
                a.batch = None;
            }
            return;
        };
        if !bent.is_batch() {
            self.procs.insert(batch, bent);
            if let Some(a) = child.as_arrival_mut() {
                a.batch = None;
            }
            return;
        }

        enum Collapse {
            /// Other members (or a permanent enclosing batch) keep the batch
            /// alive; only report the shared timing onto the departing child.
            Stays,
            /// Last member, batch not itself batched: wind the shell down.
            Last,
            /// Last member of a nested batch: recurse upward first.
            LastNested(ProcessId),
        }

        let (collapse, destroy_shell) = {
            let Entity::Batch(b) = &bent else { unreachable!() };
            let parent_permanent = b
                .arrival
                .batch
                .map(|p| self.batch_is_permanent(p))
                .unwrap_or(false);
            let destroy_shell = b.arrival.activity.is_some();
            if b.children.len() > 1 || parent_permanent {
                (Collapse::Stays, false)
            } else {
                match b.arrival.batch {
                    Some(parent) => (Collapse::LastNested(parent), destroy_shell),
                    None => (Collapse::Last, destroy_shell),
                }
            }
        };

        let now = self.now;
        match collapse {
            Collapse::Stays => {
                let monitored = child
                    .as_arrival()
                    .map(|a| a.monitoring() >= Monitoring::EndOfLife)
                    .unwrap_or(false);
                if monitored {
                    // report the shared per-resource timing up the chain
                    let child_a = child.as_arrival().expect("flow entity");
                    let Engine { procs, monitor, .. } = self;
                    let Entity::Batch(b) = &bent else { unreachable!() };
                    report_shared(b, child_a, now, monitor.as_mut());
                    let mut up = b.arrival.batch;
                    while let Some(pid) = up {
                        match procs.get(&pid) {
                            Some(Entity::Batch(p)) => {
                                report_shared(p, child_a, now, monitor.as_mut());
                                up = p.arrival.batch;
                            }
                            _ => break,
                        }
                    }
                }
            }
            Collapse::Last => {
                let Entity::Batch(b) = &mut bent else { unreachable!() };
                let inert = b.arrival.activity.is_none();
                if b.arrival.lifetime.busy_until > now {
                    b.arrival.unset_busy(now);
                }
                b.arrival.unset_remaining();
                let deactivated = {
                    let Entity::Batch(b) = &mut bent else { unreachable!() };
                    self.release_all(&mut b.arrival, false, false)
                };
                let Entity::Batch(b) = &mut bent else { unreachable!() };
                if !inert && !deactivated && b.arrival.core.active {
                    b.arrival.core.active = false;
                    self.queue.unschedule(batch);
                }
            }
            Collapse::LastNested(parent) => {
                self.erase_from_batch(parent, batch, &mut bent);
                let Entity::Batch(b) = &mut bent else { unreachable!() };
                if b.arrival.lifetime.busy_until > now {
                    b.arrival.unset_busy(now);
                }
                b.arrival.unset_remaining();
                let Entity::Batch(b) = &mut bent else { unreachable!() };
                self.release_all(&mut b.arrival, false, false);
            }
        }

        let Entity::Batch(b) = &mut bent else { unreachable!() };
        b.children.retain(|&c| c != child_id);
        if let Some(a) = child.as_arrival_mut() {
            a.batch = None;
        }
        if destroy_shell {
            self.destroy_flow(batch, bent, false);
        } else {
            self.procs.insert(batch, bent);
        }
    }
}

/// Report a batch's shared per-resource timing as releases attributed to the
/// departing child, re-based so the activity span ends at `now`.
fn report_shared(batch: &Batched, child: &Arrival, now: SimTime, monitor: &mut dyn Monitor) {
    for (resource, rt) in &batch.arrival.restime {
        let activity = rt.activity - batch.arrival.lifetime.busy_until.0 + now.0;
        child.leave_at(resource, rt.start, activity, now, monitor);
    }
}
