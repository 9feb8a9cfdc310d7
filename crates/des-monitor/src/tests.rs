//! Unit tests for des-monitor.

use des_core::{SimRng, SimTime};
use des_engine::{Activity, Arrival, Engine, Monitor, Monitoring, Order, Outcome, ResourceMap, SimCtx};

use crate::{CsvMonitor, MemoryMonitor};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// A terminal service step of fixed duration.
struct Service(f64);

impl Activity for Service {
    fn run(&mut self, _arrival: &mut Arrival, _resources: &mut ResourceMap, _ctx: &mut SimCtx<'_>) -> Outcome {
        Outcome::Delay(self.0)
    }

    fn label(&self) -> &str {
        "service"
    }
}

fn csv_writer(buf: Vec<u8>) -> csv::Writer<Vec<u8>> {
    csv::Writer::from_writer(buf)
}

// ── MemoryMonitor ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod memory {
    use super::*;

    #[test]
    fn records_a_full_run_through_shared_handles() {
        let stats = MemoryMonitor::new();
        let mut eng = Engine::with_monitor(7, stats.clone());
        let act = eng.add_activity(Service(1.5));
        let g = eng
            .add_generator("cust", 0, Monitoring::EndOfLife, act, Order::default(), |_: &mut SimRng| {
                vec![2.0, 2.0, -1.0]
            })
            .unwrap();
        eng.activate(g, 0.0).unwrap();
        eng.run();

        let ends = stats.ends();
        assert_eq!(ends.len(), 2);
        assert_eq!(ends[0].name, "cust0");
        assert_eq!(ends[0].start_time, 2.0);
        assert_eq!(ends[0].end_time, 3.5);
        assert_eq!(ends[0].activity_time, 1.5);
        assert!(ends[0].finished);
        assert_eq!(ends[1].name, "cust1");
        assert_eq!(ends[1].end_time, 5.5);
    }

    #[test]
    fn attribute_writes_are_recorded_at_the_right_level() {
        let stats = MemoryMonitor::new();
        let mut eng = Engine::with_monitor(7, stats.clone());
        let p = eng.add_arrival("p", Monitoring::Attributes, None, Order::default());
        let q = eng.add_arrival("q", Monitoring::EndOfLife, None, Order::default());
        eng.set_attribute(p, "weight", 3.0).unwrap();
        eng.set_attribute(q, "weight", 4.0).unwrap();

        let attrs = stats.attributes();
        assert_eq!(attrs.len(), 1); // q's level is below Attributes
        assert_eq!(attrs[0].name, "p");
        assert_eq!(attrs[0].key, "weight");
        assert_eq!(attrs[0].value, 3.0);
    }

    #[test]
    fn clear_empties_all_tables() {
        let stats = MemoryMonitor::new();
        let mut handle = stats.clone();
        handle.record_end(SimTime(1.0), "a", SimTime::ZERO, 1.0, true);
        handle.record_release(SimTime(1.0), "a", SimTime::ZERO, 1.0, "res");
        assert!(!stats.is_empty());
        stats.clear();
        assert!(stats.is_empty());
    }
}

// ── CsvMonitor ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_out {
    use super::*;

    fn make() -> CsvMonitor<Vec<u8>> {
        CsvMonitor::from_writers(
            csv_writer(Vec::new()),
            csv_writer(Vec::new()),
            csv_writer(Vec::new()),
        )
        .unwrap()
    }

    #[test]
    fn writes_headers_up_front() {
        let m = make();
        let (arrivals, releases, attributes) = m.into_writers().unwrap();
        assert_eq!(
            String::from_utf8(arrivals).unwrap(),
            "name,start_time,end_time,activity_time,finished\n"
        );
        assert_eq!(
            String::from_utf8(releases).unwrap(),
            "name,start_time,end_time,activity_time,resource\n"
        );
        assert_eq!(
            String::from_utf8(attributes).unwrap(),
            "time,name,key,value\n"
        );
    }

    #[test]
    fn records_land_in_their_tables() {
        let mut m = make();
        m.record_end(SimTime(3.5), "cust0", SimTime(2.0), 1.5, true);
        m.record_release(SimTime(3.5), "cust0", SimTime(2.0), 1.5, "teller");
        m.record_attribute(SimTime(2.0), "cust0", "vip", 1.0);
        let (arrivals, releases, attributes) = m.into_writers().unwrap();

        assert_eq!(
            String::from_utf8(arrivals).unwrap(),
            "name,start_time,end_time,activity_time,finished\ncust0,2,3.5,1.5,1\n"
        );
        assert_eq!(
            String::from_utf8(releases).unwrap(),
            "name,start_time,end_time,activity_time,resource\ncust0,2,3.5,1.5,teller\n"
        );
        assert_eq!(
            String::from_utf8(attributes).unwrap(),
            "time,name,key,value\n2,cust0,vip,1\n"
        );
    }

    #[test]
    fn drives_a_simulation_end_to_end() {
        let mut eng = Engine::with_monitor(7, make());
        let act = eng.add_activity(Service(1.0));
        let g = eng
            .add_generator("job", 0, Monitoring::EndOfLife, act, Order::default(), |_: &mut SimRng| {
                vec![1.0, -1.0]
            })
            .unwrap();
        eng.activate(g, 0.0).unwrap();
        eng.run();
        eng.flush_monitor();
        // The engine owns the recorder; this test only asserts the run
        // completes and flushes without error.
        assert_eq!(eng.now(), SimTime(2.0));
    }

    #[test]
    fn take_error_starts_empty() {
        let mut m = make();
        assert!(m.take_error().is_none());
    }
}
