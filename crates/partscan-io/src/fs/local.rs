use std::fs::{self, File};
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{Error, Result};
use crate::fs::{FileStatus, FileSystem, ReadSeek};

/// Local filesystem (rooted at the host filesystem).
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

/// Accept bare paths as well as `file://` URIs.
fn to_local(path: &str) -> Result<PathBuf> {
    if path.starts_with("file:") {
        let url = Url::parse(path).map_err(|e| Error::Config(format!("bad uri '{path}': {e}")))?;
        return url
            .to_file_path()
            .map_err(|_| Error::Config(format!("not a local file uri: '{path}'")));
    }
    Ok(PathBuf::from(path))
}

fn status_of(p: &Path, meta: &fs::Metadata) -> FileStatus {
    let path = p.to_string_lossy().to_string();
    if meta.is_dir() {
        FileStatus::dir(path)
    } else {
        FileStatus::file(path, meta.len())
    }
}

impl FileSystem for LocalFileSystem {
    fn list_dir(&self, path: &str) -> Result<Vec<FileStatus>> {
        let dir = to_local(path)?;
        if !dir.exists() {
            return Err(Error::NotFound(path.to_string()));
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| Error::io(path, e))? {
            let entry = entry.map_err(|e| Error::io(path, e))?;
            let p = entry.path();
            let meta = entry.metadata().map_err(|e| Error::io(path, e))?;
            out.push(status_of(&p, &meta));
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    fn status(&self, path: &str) -> Result<FileStatus> {
        let p = to_local(path)?;
        match fs::metadata(&p) {
            Ok(meta) => Ok(status_of(&p, &meta)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(path.to_string()))
            }
            Err(e) => Err(Error::io(path, e)),
        }
    }

    fn exists(&self, path: &str) -> bool {
        to_local(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn open(&self, path: &str) -> Result<Box<dyn ReadSeek>> {
        let p = to_local(path)?;
        let f = File::open(&p).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.to_string()),
            _ => Error::io(path, e),
        })?;
        Ok(Box::new(f))
    }
}
