//! Bounded parallel execution of independent scan tasks.
//!
//! Tasks share nothing mutable; workers pull the next task index from an
//! atomic counter until the queue drains or a task fails. The first error
//! stops further tasks from starting and is returned once in-flight tasks
//! finish.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use tracing::debug;

use partscan_core::error::{Error, Result};

pub struct TaskScheduler {
    max_parallel: usize,
}

impl TaskScheduler {
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
        }
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Run `f` over every item on up to `max_parallel` threads.
    ///
    /// Results come back in item order.
    pub fn run<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R> + Sync,
    {
        let workers = self.max_parallel.min(items.len());
        if workers <= 1 {
            return items.iter().map(&f).collect();
        }

        let next = AtomicUsize::new(0);
        let aborted = AtomicBool::new(false);
        let first_error: Mutex<Option<Error>> = Mutex::new(None);
        let results: Mutex<Vec<Option<R>>> =
            Mutex::new(std::iter::repeat_with(|| None).take(items.len()).collect());

        thread::scope(|scope| {
            for worker in 0..workers {
                let (next, aborted, first_error, results, f) =
                    (&next, &aborted, &first_error, &results, &f);
                scope.spawn(move || {
                    let mut done = 0usize;
                    while !aborted.load(Ordering::Acquire) {
                        let idx = next.fetch_add(1, Ordering::AcqRel);
                        let Some(item) = items.get(idx) else {
                            break;
                        };
                        match f(item) {
                            Ok(r) => {
                                let mut slots = results.lock().unwrap_or_else(|e| e.into_inner());
                                slots[idx] = Some(r);
                                done += 1;
                            }
                            Err(e) => {
                                aborted.store(true, Ordering::Release);
                                let mut slot =
                                    first_error.lock().unwrap_or_else(|e| e.into_inner());
                                if slot.is_none() {
                                    *slot = Some(e);
                                }
                                break;
                            }
                        }
                    }
                    debug!(worker, tasks = done, "scan worker finished");
                });
            }
        });

        if let Some(e) = first_error.into_inner().unwrap_or_else(|e| e.into_inner()) {
            return Err(e);
        }
        Ok(results
            .into_inner()
            .unwrap_or_else(|e| e.into_inner())
            .into_iter()
            .flatten()
            .collect())
    }
}
