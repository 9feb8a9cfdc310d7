//! In-memory recorder.

use std::cell::RefCell;
use std::rc::Rc;

use des_core::SimTime;
use des_engine::Monitor;

use crate::row::{AttributeRow, EndRow, ReleaseRow};

#[derive(Default)]
struct Tables {
    ends:       Vec<EndRow>,
    releases:   Vec<ReleaseRow>,
    attributes: Vec<AttributeRow>,
}

/// A [`Monitor`] that keeps every record in memory.
///
/// The handle is cheaply cloneable and all clones share the same tables, so a
/// caller can hand one clone to the engine and keep another to read the
/// results afterwards.  Single-threaded, like the engine itself.
#[derive(Clone, Default)]
pub struct MemoryMonitor {
    tables: Rc<RefCell<Tables>>,
}

impl MemoryMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ends(&self) -> Vec<EndRow> {
        self.tables.borrow().ends.clone()
    }

    pub fn releases(&self) -> Vec<ReleaseRow> {
        self.tables.borrow().releases.clone()
    }

    pub fn attributes(&self) -> Vec<AttributeRow> {
        self.tables.borrow().attributes.clone()
    }

    pub fn is_empty(&self) -> bool {
        let t = self.tables.borrow();
        t.ends.is_empty() && t.releases.is_empty() && t.attributes.is_empty()
    }

    pub fn clear(&self) {
        let mut t = self.tables.borrow_mut();
        t.ends.clear();
        t.releases.clear();
        t.attributes.clear();
    }
}

impl Monitor for MemoryMonitor {
    fn record_end(&mut self, now: SimTime, name: &str, start: SimTime, activity: f64, finished: bool) {
        self.tables.borrow_mut().ends.push(EndRow {
            name:          name.to_string(),
            start_time:    start.0,
            end_time:      now.0,
            activity_time: activity,
            finished,
        });
    }

    fn record_release(&mut self, now: SimTime, name: &str, start: SimTime, activity: f64, resource: &str) {
        self.tables.borrow_mut().releases.push(ReleaseRow {
            name:          name.to_string(),
            start_time:    start.0,
            end_time:      now.0,
            activity_time: activity,
            resource:      resource.to_string(),
        });
    }

    fn record_attribute(&mut self, now: SimTime, name: &str, key: &str, value: f64) {
        self.tables.borrow_mut().attributes.push(AttributeRow {
            time:  now.0,
            name:  name.to_string(),
            key:   key.to_string(),
            value,
        });
    }
}
