//! Durable, cross-process-visible restore progress tracking
//!
//! The process performing a restore and the process polling its status may
//! differ; the ledger bridges them through shared durable storage with an
//! in-memory cache in front. See `store` for the rehydration rules.

mod clock;
mod storage;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use storage::{FileProgressStorage, ProgressStorage};
pub use store::{ProgressEntry, ProgressStore, ProgressUpdate, TableProgress};
