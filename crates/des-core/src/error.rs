//! Framework error type.
//!
//! Sub-crates may define their own error enums and convert them into
//! `DesError` via `From` impls, or keep them separate and wrap `DesError` as
//! one variant.  Both patterns are acceptable; prefer whichever keeps error
//! sites clean.

use thiserror::Error;

use crate::{ActivityId, ProcessId, ResourceId};

/// The top-level error type for `des-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum DesError {
    #[error("process {0} not found")]
    ProcessNotFound(ProcessId),

    #[error("process {0} is not an arrival")]
    NotAnArrival(ProcessId),

    #[error("resource {0} not found")]
    ResourceNotFound(ResourceId),

    #[error("activity {0} not found")]
    ActivityNotFound(ActivityId),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for all `des-*` crates.
pub type DesResult<T> = Result<T, DesError>;
