//! Path filters applied to the immediate entries of a storage location.

use crate::fs::file_name;

pub trait PathFilter: Send + Sync {
    fn accept(&self, path: &str) -> bool;
}

impl<F> PathFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn accept(&self, path: &str) -> bool {
        self(path)
    }
}

/// Matches the final path component against a glob (`*` and `?`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobFilter {
    pattern: String,
}

impl GlobFilter {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl PathFilter for GlobFilter {
    fn accept(&self, path: &str) -> bool {
        glob_match(self.pattern.as_bytes(), file_name(path).as_bytes())
    }
}

/// Iterative glob matcher with single-star backtracking.
fn glob_match(pat: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut mark = 0;
    while t < text.len() {
        if p < pat.len() && (pat[p] == b'?' || pat[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pat.len() && pat[p] == b'*' {
            star = Some(p);
            mark = t;
            p += 1;
        } else if let Some(s) = star {
            p = s + 1;
            mark += 1;
            t = mark;
        } else {
            return false;
        }
    }
    while p < pat.len() && pat[p] == b'*' {
        p += 1;
    }
    p == pat.len()
}
