#![forbid(unsafe_code)]
//! partscan-exec: turning table and partition descriptors into rows.
//!
//! `TableReader` is the entry point. For each unit it plans splits
//! (`planner`), and each split becomes a `ScanTask` that, when opened on a
//! worker, resolves fields (`resolve`) and materializes records
//! (`materialize`) into a row template carrying the partition's key values
//! (`partition_keys`). The tasks of all units form one lazy `RowStream`,
//! which can also be drained in parallel (`scheduler`).

pub mod materialize;
pub mod partition_keys;
pub mod planner;
pub mod reader;
pub mod registry;
pub mod resolve;
pub mod scheduler;
pub mod stream;
pub mod task;

pub use reader::{ScanOptions, TableReader};
pub use registry::InputFormatRegistry;
pub use stream::RowStream;
pub use task::{ScanTask, TaskSummary};
