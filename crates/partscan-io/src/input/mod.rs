//! Input formats: split computation over a delimited path list, and record
//! readers that turn one split into (key, value) records.

pub mod text;

pub use text::{LineRecordReader, TextInputFormat};

use serde::{Deserialize, Serialize};

use partscan_core::config::JobSettings;
use partscan_core::types::RawRecord;

use crate::error::Result;
use crate::fs::FileSystem;

/// Separator of the path list consumed by `InputFormat::get_splits`.
pub const PATH_LIST_SEPARATOR: char = ',';

/// A byte range of one file, processed by exactly one worker invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSplit {
    pub path: String,
    pub start: u64,
    pub length: u64,
}

impl InputSplit {
    pub fn new(path: impl Into<String>, start: u64, length: u64) -> Self {
        Self {
            path: path.into(),
            start,
            length,
        }
    }

    pub fn end(&self) -> u64 {
        self.start + self.length
    }
}

impl std::fmt::Display for InputSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}+{}", self.path, self.start, self.length)
    }
}

/// Pull-based reader over the records of one split.
///
/// Key and value buffers are owned by the caller and refilled in place.
pub trait RecordReader: Send {
    /// Read the next record into `key`/`value`; `false` at end of split.
    fn next_into(&mut self, key: &mut u64, value: &mut RawRecord) -> Result<bool>;
}

pub trait InputFormat: Send + Sync {
    fn name(&self) -> &'static str;

    /// Compute splits for a comma-separated path list.
    fn get_splits(
        &self,
        fs: &dyn FileSystem,
        paths: &str,
        settings: &JobSettings,
        min_splits: usize,
    ) -> Result<Vec<InputSplit>>;

    fn open(
        &self,
        fs: &dyn FileSystem,
        split: &InputSplit,
        settings: &JobSettings,
    ) -> Result<Box<dyn RecordReader>>;
}

/// Split a delimited path list into its non-empty members.
pub fn split_path_list(paths: &str) -> impl Iterator<Item = &str> {
    paths
        .split(PATH_LIST_SEPARATOR)
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

/// Record reader over records already in memory; keys are record indexes.
pub struct MemoryRecordReader {
    records: std::vec::IntoIter<RawRecord>,
    next_key: u64,
}

impl MemoryRecordReader {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            records: records.into_iter(),
            next_key: 0,
        }
    }

    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(lines.into_iter().map(RawRecord::from).collect())
    }
}

impl RecordReader for MemoryRecordReader {
    fn next_into(&mut self, key: &mut u64, value: &mut RawRecord) -> Result<bool> {
        match self.records.next() {
            Some(rec) => {
                *key = self.next_key;
                self.next_key += 1;
                *value = rec;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
