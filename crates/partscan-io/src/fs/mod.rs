//! The filesystem seam used for listing storage locations and opening files.
//!
//! - `local`: the host filesystem (accepts bare paths and `file://` URIs).
//! - `memory`: a thread-safe in-memory tree for tests.

mod local;
mod memory;

pub use local::LocalFileSystem;
pub use memory::MemoryFileSystem;

use std::io::{Read, Seek};

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatus {
    pub path: String,
    pub len: u64,
    pub is_dir: bool,
}

impl FileStatus {
    pub fn file(path: impl Into<String>, len: u64) -> Self {
        Self {
            path: path.into(),
            len,
            is_dir: false,
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            len: 0,
            is_dir: true,
        }
    }

    pub fn name(&self) -> &str {
        file_name(&self.path)
    }
}

/// Readable, seekable file handle.
pub trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}

pub trait FileSystem: Send + Sync {
    /// Immediate entries under `path`, sorted by path.
    fn list_dir(&self, path: &str) -> Result<Vec<FileStatus>>;

    fn status(&self, path: &str) -> Result<FileStatus>;

    fn exists(&self, path: &str) -> bool;

    fn open(&self, path: &str) -> Result<Box<dyn ReadSeek>>;

    /// All visible files under `path`, recursively. A file path yields itself.
    fn list_files(&self, path: &str) -> Result<Vec<FileStatus>> {
        let root = self.status(path)?;
        if !root.is_dir {
            return Ok(vec![root]);
        }
        let mut out = Vec::new();
        let mut stack = vec![root.path];
        while let Some(dir) = stack.pop() {
            for entry in self.list_dir(&dir)? {
                if is_hidden(entry.name()) {
                    continue;
                }
                if entry.is_dir {
                    stack.push(entry.path);
                } else {
                    out.push(entry);
                }
            }
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }
}

/// Bookkeeping entries (`_SUCCESS`, `.crc`, ...) are not data files.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

pub fn join(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{name}")
    } else {
        format!("{base}/{name}")
    }
}
