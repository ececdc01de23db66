#![forbid(unsafe_code)]
//! partscan-io: everything between a storage path and a stream of raw records.
//!
//! - `fs`: the `FileSystem` seam with local and in-memory implementations.
//! - `filter`: path filters applied when listing a storage location.
//! - `input`: input formats (split computation) and record readers.
//! - `writers`: row sinks used by the CLI.

pub mod buf;
pub mod error;
pub mod filter;
pub mod fs;
pub mod input;
pub mod writers;

pub use error::{Error, Result};
pub use filter::{GlobFilter, PathFilter};
pub use fs::{FileStatus, FileSystem, LocalFileSystem, MemoryFileSystem};
pub use input::{InputFormat, InputSplit, RecordReader};
