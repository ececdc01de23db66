//! `RowStream`: the lazy, single-pass row sequence returned by every scan.
//!
//! A stream is the union of the per-split tasks of one or more units. Tasks
//! are opened one at a time as the stream is consumed; nothing is read
//! before the first `advance()`.
//!
//! Two ways to consume it:
//! - `advance()` / `row()`: lending access to the materializer's reused row
//!   buffer, no copies.
//! - `Iterator<Item = Result<Row>>`: each row is cloned out of the buffer.
//!
//! Either way, an error ends the stream.

use std::collections::VecDeque;

use tracing::debug;

use partscan_core::error::Result;
use partscan_core::types::Row;

use crate::materialize::RowMaterializer;
use crate::scheduler::TaskScheduler;
use crate::task::ScanTask;

#[derive(Default)]
pub struct RowStream {
    pending: VecDeque<ScanTask>,
    current: Option<RowMaterializer>,
    max_parallel: usize,
    failed: bool,
}

impl RowStream {
    /// A stream that yields nothing. Zero matching partitions is a valid,
    /// empty result.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_tasks(tasks: Vec<ScanTask>, max_parallel: usize) -> Self {
        Self {
            pending: tasks.into(),
            current: None,
            max_parallel,
            failed: false,
        }
    }

    /// Union of several streams. No ordering is promised across the inputs.
    pub fn union(streams: impl IntoIterator<Item = RowStream>) -> Self {
        let mut out = Self::empty();
        for s in streams {
            out.max_parallel = out.max_parallel.max(s.max_parallel);
            out.pending.extend(s.pending);
        }
        out
    }

    /// Tasks not yet opened.
    pub fn pending_tasks(&self) -> usize {
        self.pending.len()
    }

    /// Move to the next row. `Ok(false)` once every task is drained.
    pub fn advance(&mut self) -> Result<bool> {
        if self.failed {
            return Ok(false);
        }
        match self.advance_inner() {
            Ok(more) => Ok(more),
            Err(e) => {
                self.failed = true;
                self.current = None;
                self.pending.clear();
                Err(e)
            }
        }
    }

    fn advance_inner(&mut self) -> Result<bool> {
        loop {
            if let Some(m) = self.current.as_mut() {
                if m.advance().map_err(|e| e.in_unit(m.unit().to_string()))? {
                    return Ok(true);
                }
                debug!(unit = m.unit(), rows = m.rows_read(), "split drained");
                self.current = None;
            }
            match self.pending.pop_front() {
                Some(task) => self.current = Some(task.open()?),
                None => return Ok(false),
            }
        }
    }

    /// The row produced by the last successful `advance()`.
    ///
    /// Borrowed from the reused buffer: valid until the next `advance()`.
    pub fn row(&self) -> Option<&Row> {
        self.current.as_ref().map(RowMaterializer::row)
    }

    /// `advance()` followed by `row()`.
    pub fn next_row(&mut self) -> Result<Option<&Row>> {
        if self.advance()? {
            Ok(self.row())
        } else {
            Ok(None)
        }
    }

    /// Drain the remaining tasks on up to `scan.max.parallel.tasks` threads.
    ///
    /// A split already in progress is finished on the calling thread first.
    /// Row order across splits is unspecified; the first error aborts the
    /// scan.
    pub fn collect_parallel(mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        if self.failed {
            return Ok(rows);
        }
        if let Some(mut m) = self.current.take() {
            while m.advance().map_err(|e| e.in_unit(m.unit().to_string()))? {
                rows.push(m.row().clone());
            }
        }
        let tasks: Vec<ScanTask> = self.pending.drain(..).collect();
        let scheduler = TaskScheduler::new(self.max_parallel);
        debug!(
            tasks = tasks.len(),
            workers = scheduler.max_parallel(),
            "collecting in parallel"
        );
        let per_task = scheduler.run(&tasks, |task| {
            let mut m = task.open()?;
            let mut out = Vec::new();
            while m.advance().map_err(|e| e.in_unit(task.unit().to_string()))? {
                out.push(m.row().clone());
            }
            Ok(out)
        })?;
        rows.extend(per_task.into_iter().flatten());
        Ok(rows)
    }
}

impl Iterator for RowStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row.clone())),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl std::fmt::Debug for RowStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowStream")
            .field("pending", &self.pending.len())
            .field("open", &self.current.is_some())
            .field("failed", &self.failed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stream_yields_nothing() {
        let mut s = RowStream::empty();
        assert!(!s.advance().unwrap());
        assert!(s.row().is_none());
        assert_eq!(RowStream::empty().count(), 0);
        assert!(RowStream::empty().collect_parallel().unwrap().is_empty());
    }

    #[test]
    fn union_of_empties_is_empty() {
        let s = RowStream::union([RowStream::empty(), RowStream::empty()]);
        assert_eq!(s.pending_tasks(), 0);
    }
}
