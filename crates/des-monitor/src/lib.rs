//! `des-monitor` — statistics recorders for the `rust_des` simulation kernel.
//!
//! The engine pushes observations through the `des_engine::Monitor` trait;
//! this crate provides the concrete sinks:
//!
//! | Recorder          | Destination                                          |
//! |-------------------|------------------------------------------------------|
//! | [`MemoryMonitor`] | In-memory tables, shared between cloned handles      |
//! | [`CsvMonitor`]    | `arrivals.csv`, `releases.csv`, `attributes.csv`     |
//!
//! # Usage
//!
//! ```rust,ignore
//! use des_engine::Engine;
//! use des_monitor::MemoryMonitor;
//!
//! let stats = MemoryMonitor::new();
//! let mut eng = Engine::with_monitor(42, stats.clone());
//! // ... build the model, run ...
//! eng.run();
//! for row in stats.ends() {
//!     println!("{} finished={}", row.name, row.finished);
//! }
//! ```

pub mod csv;
pub mod error;
pub mod memory;
pub mod row;

#[cfg(test)]
mod tests;

pub use csv::CsvMonitor;
pub use error::{MonitorError, MonitorResult};
pub use memory::MemoryMonitor;
pub use row::{AttributeRow, EndRow, ReleaseRow};
