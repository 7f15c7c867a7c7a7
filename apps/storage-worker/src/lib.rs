//! C4: the storage worker. Drains each project's queue, bulk-inserts log
//! rows into their monthly partition, upserts error groups for
//! fingerprinted rows, and keeps the partition table set ahead of need.

pub mod config;
pub mod drain;
pub mod latency;
pub mod partition_lifecycle;
pub mod supervisor;

pub use config::Settings;
pub use drain::DrainDeps;
