//! In-memory filesystem for tests.
//!
//! Files are stored in a path-keyed map; directories exist implicitly as
//! prefixes of stored paths.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::fs::{FileStatus, FileSystem, ReadSeek};

/// Thread-safe in-memory file tree.
#[derive(Clone, Default)]
pub struct MemoryFileSystem {
    data: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

fn normalize(path: &str) -> &str {
    let p = path.strip_prefix("memory://").unwrap_or(path);
    if p.len() > 1 {
        p.trim_end_matches('/')
    } else {
        p
    }
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create or replace a file.
    pub fn insert(&self, path: &str, bytes: impl Into<Vec<u8>>) {
        self.lock().insert(normalize(path).to_string(), bytes.into());
    }

    pub fn remove(&self, path: &str) {
        self.lock().remove(normalize(path));
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn dir_prefix(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

impl FileSystem for MemoryFileSystem {
    fn list_dir(&self, path: &str) -> Result<Vec<FileStatus>> {
        let path = normalize(path);
        let prefix = dir_prefix(path);
        let data = self.lock();
        let mut out: Vec<FileStatus> = Vec::new();
        let mut found = false;
        for (key, bytes) in data.range(prefix.clone()..) {
            let Some(rest) = key.strip_prefix(&prefix) else {
                break;
            };
            found = true;
            match rest.split_once('/') {
                Some((child, _)) => {
                    let child_path = format!("{prefix}{child}");
                    if out.last().map(|s| s.path != child_path).unwrap_or(true) {
                        out.push(FileStatus::dir(child_path));
                    }
                }
                None => out.push(FileStatus::file(key.clone(), bytes.len() as u64)),
            }
        }
        if !found {
            return match data.get(path) {
                Some(bytes) => Ok(vec![FileStatus::file(path, bytes.len() as u64)]),
                None => Err(Error::NotFound(path.to_string())),
            };
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        out.dedup_by(|a, b| a.path == b.path);
        Ok(out)
    }

    fn status(&self, path: &str) -> Result<FileStatus> {
        let path = normalize(path);
        let data = self.lock();
        if let Some(bytes) = data.get(path) {
            return Ok(FileStatus::file(path, bytes.len() as u64));
        }
        let prefix = dir_prefix(path);
        let is_dir = data
            .range(prefix.clone()..)
            .next()
            .map(|(k, _)| k.starts_with(&prefix))
            .unwrap_or(false);
        if is_dir {
            Ok(FileStatus::dir(path))
        } else {
            Err(Error::NotFound(path.to_string()))
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.status(path).is_ok()
    }

    fn open(&self, path: &str) -> Result<Box<dyn ReadSeek>> {
        let path = normalize(path);
        let bytes = self
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}
