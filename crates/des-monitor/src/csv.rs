//! CSV recorder.
//!
//! Creates three files in the configured output directory:
//! - `arrivals.csv`
//! - `releases.csv`
//! - `attributes.csv`

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;
use des_core::SimTime;
use des_engine::Monitor;

use crate::{MonitorError, MonitorResult};

/// Writes statistics records to three CSV files as they arrive.
///
/// The [`Monitor`] callbacks are infallible from the engine's perspective —
/// the first write error is stored internally and retrieved with
/// [`CsvMonitor::take_error`]; later records are dropped.
pub struct CsvMonitor<W: Write> {
    arrivals:   Writer<W>,
    releases:   Writer<W>,
    attributes: Writer<W>,
    error:      Option<MonitorError>,
}

impl CsvMonitor<File> {
    /// Open (or create) the three CSV files in `dir` and write the header
    /// rows.
    pub fn create(dir: &Path) -> MonitorResult<Self> {
        let arrivals = Writer::from_path(dir.join("arrivals.csv"))?;
        let releases = Writer::from_path(dir.join("releases.csv"))?;
        let attributes = Writer::from_path(dir.join("attributes.csv"))?;
        Self::from_writers(arrivals, releases, attributes)
    }
}

impl<W: Write> CsvMonitor<W> {
    /// Build a recorder over arbitrary writers (used by tests with in-memory
    /// buffers).  Writes the header rows.
    pub fn from_writers(
        mut arrivals: Writer<W>,
        mut releases: Writer<W>,
        mut attributes: Writer<W>,
    ) -> MonitorResult<Self> {
        arrivals.write_record(["name", "start_time", "end_time", "activity_time", "finished"])?;
        releases.write_record(["name", "start_time", "end_time", "activity_time", "resource"])?;
        attributes.write_record(["time", "name", "key", "value"])?;
        Ok(Self {
            arrivals,
            releases,
            attributes,
            error: None,
        })
    }

    /// The first write error encountered, if any.
    pub fn take_error(&mut self) -> Option<MonitorError> {
        self.error.take()
    }

    /// Flush all three writers.  Idempotent.
    pub fn finish(&mut self) -> MonitorResult<()> {
        self.arrivals.flush()?;
        self.releases.flush()?;
        self.attributes.flush()?;
        Ok(())
    }

    /// Consume the recorder and return the three underlying writers, flushed.
    pub fn into_writers(mut self) -> MonitorResult<(W, W, W)> {
        self.finish()?;
        let arrivals = self.arrivals.into_inner().map_err(|e| e.into_error())?;
        let releases = self.releases.into_inner().map_err(|e| e.into_error())?;
        let attributes = self.attributes.into_inner().map_err(|e| e.into_error())?;
        Ok((arrivals, releases, attributes))
    }

    fn record(&mut self, result: Result<(), csv::Error>) {
        if self.error.is_none() {
            if let Err(e) = result {
                self.error = Some(e.into());
            }
        }
    }
}

impl<W: Write> Monitor for CsvMonitor<W> {
    fn record_end(&mut self, now: SimTime, name: &str, start: SimTime, activity: f64, finished: bool) {
        if self.error.is_some() {
            return;
        }
        let r = self.arrivals.write_record(&[
            name.to_string(),
            start.0.to_string(),
            now.0.to_string(),
            activity.to_string(),
            (finished as u8).to_string(),
        ]);
        self.record(r);
    }

    fn record_release(&mut self, now: SimTime, name: &str, start: SimTime, activity: f64, resource: &str) {
        if self.error.is_some() {
            return;
        }
        let r = self.releases.write_record(&[
            name.to_string(),
            start.0.to_string(),
            now.0.to_string(),
            activity.to_string(),
            resource.to_string(),
        ]);
        self.record(r);
    }

    fn record_attribute(&mut self, now: SimTime, name: &str, key: &str, value: f64) {
        if self.error.is_some() {
            return;
        }
        let r = self.attributes.write_record(&[
            now.0.to_string(),
            name.to_string(),
            key.to_string(),
            value.to_string(),
        ]);
        self.record(r);
    }

    fn flush(&mut self) {
        let r = self.finish();
        if let (None, Err(e)) = (&self.error, r) {
            self.error = Some(e);
        }
    }
}
