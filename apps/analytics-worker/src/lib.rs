//! C5's scheduled half: the pre-aggregator. Five jobs on independent
//! cadences (spec.md §4.5) read raw logs and error groups — never
//! mutating them — and write rolled-up views to the metrics cache (or,
//! for `aggregated_metrics`, to the persistent store).

pub mod config;
pub mod jobs;
pub mod project_directory;
pub mod scan;
pub mod scheduler;
pub mod stats;

pub use config::Settings;
pub use jobs::JobDeps;
