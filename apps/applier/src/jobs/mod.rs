pub mod applied_log;
pub mod runner;

pub use applied_log::{AppliedLog, ApplicationAttempt};
pub use runner::{JobRunner, RunSummary, SearchParams};
