//! Line-oriented text input: one record per line, keyed by byte offset.

use std::io::{BufRead, Seek, SeekFrom};

use tracing::debug;

use partscan_core::config::{
    JobSettings, BLOCK_SIZE, DEFAULT_BLOCK_SIZE, DEFAULT_IO_BUFFER_SIZE, IO_BUFFER_SIZE,
};
use partscan_core::types::RawRecord;

use crate::buf::BoundedBufReader;
use crate::error::{Error, Result};
use crate::fs::{FileStatus, FileSystem, ReadSeek};
use crate::input::{split_path_list, InputFormat, InputSplit, RecordReader};

/// A file tail up to this factor of the split size stays in the last split.
const SPLIT_SLOP: f64 = 1.1;

#[derive(Debug, Clone, Copy, Default)]
pub struct TextInputFormat;

impl TextInputFormat {
    pub fn new() -> Self {
        Self
    }

    fn list_inputs(&self, fs: &dyn FileSystem, paths: &str) -> Result<Vec<FileStatus>> {
        let mut files = Vec::new();
        for p in split_path_list(paths) {
            let status = fs.status(p)?;
            if status.is_dir {
                files.extend(fs.list_files(p)?);
            } else {
                files.push(status);
            }
        }
        Ok(files)
    }
}

fn setting<T: std::str::FromStr>(settings: &JobSettings, key: &str, default: T) -> Result<T> {
    settings
        .parse(key)
        .map(|v| v.unwrap_or(default))
        .map_err(|e| Error::Config(e.to_string()))
}

impl InputFormat for TextInputFormat {
    fn name(&self) -> &'static str {
        "text"
    }

    fn get_splits(
        &self,
        fs: &dyn FileSystem,
        paths: &str,
        settings: &JobSettings,
        min_splits: usize,
    ) -> Result<Vec<InputSplit>> {
        let files = self.list_inputs(fs, paths)?;
        let block_size = setting(settings, BLOCK_SIZE, DEFAULT_BLOCK_SIZE)?.max(1);
        let total: u64 = files.iter().map(|f| f.len).sum();
        let goal = total / min_splits.max(1) as u64;
        let split_size = goal.min(block_size).max(1);

        let mut splits = Vec::new();
        for file in &files {
            let len = file.len;
            if len == 0 {
                continue;
            }
            let mut remaining = len;
            while remaining as f64 / split_size as f64 > SPLIT_SLOP {
                splits.push(InputSplit::new(&file.path, len - remaining, split_size));
                remaining -= split_size;
            }
            if remaining > 0 {
                splits.push(InputSplit::new(&file.path, len - remaining, remaining));
            }
        }
        debug!(
            files = files.len(),
            total_bytes = total,
            split_size,
            splits = splits.len(),
            "computed text splits"
        );
        Ok(splits)
    }

    fn open(
        &self,
        fs: &dyn FileSystem,
        split: &InputSplit,
        settings: &JobSettings,
    ) -> Result<Box<dyn RecordReader>> {
        let capacity = setting(settings, IO_BUFFER_SIZE, DEFAULT_IO_BUFFER_SIZE)?;
        let file = fs.open(&split.path)?;
        let reader = LineRecordReader::new(file, split, capacity)?;
        Ok(Box::new(reader))
    }
}

/// Reads the lines of one split.
///
/// A split that does not start at offset 0 discards everything up to and
/// including its first newline; every split reads lines that start at or
/// before its end offset. Together these give each line to exactly one split.
pub struct LineRecordReader {
    reader: BoundedBufReader<Box<dyn ReadSeek>>,
    path: String,
    pos: u64,
    end: u64,
}

impl LineRecordReader {
    pub fn new(file: Box<dyn ReadSeek>, split: &InputSplit, capacity: usize) -> Result<Self> {
        let mut reader = BoundedBufReader::with_capacity(capacity, file);
        let mut pos = split.start;
        if split.start != 0 {
            reader
                .seek(SeekFrom::Start(split.start))
                .map_err(|e| Error::io(&split.path, e))?;
            let mut skipped = Vec::new();
            let n = reader
                .read_until(b'\n', &mut skipped)
                .map_err(|e| Error::io(&split.path, e))?;
            pos += n as u64;
        }
        Ok(Self {
            reader,
            path: split.path.clone(),
            pos,
            end: split.end(),
        })
    }
}

impl RecordReader for LineRecordReader {
    fn next_into(&mut self, key: &mut u64, value: &mut RawRecord) -> Result<bool> {
        if self.pos > self.end {
            return Ok(false);
        }
        let buf = value.buffer_mut();
        buf.clear();
        let n = self
            .reader
            .read_until(b'\n', buf)
            .map_err(|e| Error::io(&self.path, e))?;
        if n == 0 {
            return Ok(false);
        }
        *key = self.pos;
        self.pos += n as u64;
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    fn read_all(fs: &dyn FileSystem, splits: &[InputSplit]) -> Vec<(u64, String)> {
        let fmt = TextInputFormat::new();
        let settings = JobSettings::new();
        let mut out = Vec::new();
        for split in splits {
            let mut reader = fmt.open(fs, split, &settings).unwrap();
            let (mut k, mut v) = (0u64, RawRecord::new());
            while reader.next_into(&mut k, &mut v).unwrap() {
                out.push((k, v.as_str().unwrap().to_string()));
            }
        }
        out
    }

    #[test]
    fn single_split_reads_every_line() {
        let fs = MemoryFileSystem::new();
        fs.insert("/t/f", "a\r\nbb\nccc");
        let splits = TextInputFormat::new()
            .get_splits(&fs, "/t", &JobSettings::new(), 1)
            .unwrap();
        assert_eq!(splits, vec![InputSplit::new("/t/f", 0, 9)]);
        assert_eq!(
            read_all(&fs, &splits),
            vec![(0, "a".into()), (3, "bb".into()), (6, "ccc".into())]
        );
    }

    #[test]
    fn lines_are_read_exactly_once_across_splits() {
        let fs = MemoryFileSystem::new();
        let body: String = (0..50).map(|i| format!("line-{i}\n")).collect();
        fs.insert("/t/f", body.as_str());
        let expected: Vec<String> = (0..50).map(|i| format!("line-{i}")).collect();

        for min_splits in [1, 2, 3, 7, 16, 64] {
            let splits = TextInputFormat::new()
                .get_splits(&fs, "/t/f", &JobSettings::new(), min_splits)
                .unwrap();
            let covered: u64 = splits.iter().map(|s| s.length).sum();
            assert_eq!(covered, body.len() as u64);
            let lines: Vec<String> = read_all(&fs, &splits).into_iter().map(|(_, l)| l).collect();
            assert_eq!(lines, expected, "min_splits={min_splits}");
        }
    }

    #[test]
    fn block_size_caps_split_length() {
        let fs = MemoryFileSystem::new();
        fs.insert("/t/f", vec![b'x'; 63]);
        let settings = JobSettings::new().with(BLOCK_SIZE, "30");
        let splits = TextInputFormat::new()
            .get_splits(&fs, "/t/f", &settings, 1)
            .unwrap();
        let lens: Vec<u64> = splits.iter().map(|s| s.length).collect();
        assert_eq!(lens, vec![30, 33]);
    }

    #[test]
    fn multiple_paths_and_empty_files() {
        let fs = MemoryFileSystem::new();
        fs.insert("/a/1", "x\n");
        fs.insert("/b/2", "");
        fs.insert("/b/_SUCCESS", "");
        fs.insert("/c", "y\n");
        let splits = TextInputFormat::new()
            .get_splits(&fs, "/a,/b,/c", &JobSettings::new(), 1)
            .unwrap();
        let paths: Vec<_> = splits.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, vec!["/a/1", "/c"]);
    }

    #[test]
    fn missing_input_path_fails() {
        let fs = MemoryFileSystem::new();
        let err = TextInputFormat::new()
            .get_splits(&fs, "/missing", &JobSettings::new(), 1)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
