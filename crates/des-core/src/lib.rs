//! `des-core` — foundational types for the `rust_des` simulation kernel.
//!
//! This crate is a dependency of every other `des-*` crate.  It intentionally
//! has no `des-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                      |
//! |-------------|-----------------------------------------------|
//! | [`ids`]     | `ProcessId`, `ResourceId`, `ActivityId`       |
//! | [`time`]    | `SimTime` (continuous simulation time)        |
//! | [`rng`]     | `SimRng` (deterministic seeded RNG)           |
//! | [`error`]   | `DesError`, `DesResult`                       |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|-----------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types. |

pub mod error;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{DesError, DesResult};
pub use ids::{ActivityId, ProcessId, ResourceId};
pub use rng::SimRng;
pub use time::SimTime;
