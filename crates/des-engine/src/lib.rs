//! `des-engine` — the process kernel of the `rust_des` simulation framework.
//!
//! A discrete-event simulation here is a registry of processes driven by a
//! time-ordered event queue.  Generators feed arrivals into chains of
//! activities; managers walk parameter timetables; tasks run one-shot jobs;
//! batches move groups of arrivals as a single flow unit.  The engine owns
//! the clock, the queue, and every lifecycle transition.
//!
//! # What lives here
//!
//! | Module        | Contents                                            |
//! |---------------|-----------------------------------------------------|
//! | [`engine`]    | `Engine` — registry, clock, event loop, lifecycle   |
//! | [`event`]     | `EventQueue`, `Event` — ordering and cancellation   |
//! | [`process`]   | `ProcessCore`, `Entity`, `Monitoring`               |
//! | [`activity`]  | `Activity` trait, `Outcome`, `SimCtx`               |
//! | [`resource`]  | `Resource` trait                                    |
//! | [`arrival`]   | `Arrival` and its timing/membership bookkeeping     |
//! | [`batch`]     | `Batched` — grouped arrivals                        |
//! | [`generator`] | `Generator`, `DelaySource`                          |
//! | [`manager`]   | `Manager` — parameter timetables                    |
//! | [`task`]      | `Task` — one-shot jobs                              |
//! | [`monitor`]   | `Monitor` trait — the statistics sink seam          |
//!
//! # Determinism
//!
//! The engine is single-threaded and all randomness flows through the seeded
//! [`SimRng`][des_core::SimRng], so a run is reproducible for a fixed seed.

pub mod activity;
pub mod arrival;
pub mod batch;
pub mod engine;
pub mod event;
pub mod generator;
pub mod manager;
pub mod monitor;
pub mod process;
pub mod resource;
pub mod task;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use activity::{Activity, Outcome, SimCtx};
pub use arrival::{Arrival, Lifetime, Order, ResTime, SiblingCount};
pub use batch::Batched;
pub use engine::Engine;
pub use event::{Event, EventQueue};
pub use generator::{DelaySource, Generator};
pub use manager::Manager;
pub use monitor::{Monitor, NoopMonitor};
pub use process::{Entity, Monitoring, ProcessCore, ProcessMap};
pub use resource::{Resource, ResourceMap};
pub use task::{Task, TaskJob};
