//! Bounded buffered readers with a fixed cap.
//!
//! Record readers wrap their file handle in a `BoundedBufReader` whose
//! capacity comes from the `io.buffer.size` setting.

use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};

/// A thin wrapper over `BufReader` with a fixed capacity to bound in-flight bytes.
pub struct BoundedBufReader<R: Read> {
    inner: BufReader<R>,
}

impl<R: Read> BoundedBufReader<R> {
    /// Create a new bounded reader with a maximum internal buffer size.
    pub fn with_capacity(capacity: usize, reader: R) -> Self {
        Self {
            inner: BufReader::with_capacity(capacity.max(1), reader),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Access the underlying buffer length (bytes currently buffered).
    pub fn buffer_len(&self) -> usize {
        self.inner.buffer().len()
    }
}

impl<R: Read> Read for BoundedBufReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> BufRead for BoundedBufReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }
    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

impl<R: Read + Seek> Seek for BoundedBufReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}
