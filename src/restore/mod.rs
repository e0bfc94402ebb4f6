//! Dependency-ordered idempotent restore
//!
//! Failure blast-radius is bounded to individual records: a missing
//! reference defers the record to one retry pass, anything else becomes a
//! single entry in the error log, and only a structurally invalid snapshot
//! or an exhausted time budget stops the run.

mod deferral;
mod orchestrator;

pub use deferral::{DeferralQueue, DeferredRecord, DrainOutcome};
pub use orchestrator::{
    ProgressCallback, RecordFailure, RestoreOptions, RestoreOrchestrator, RestoreReport,
};
