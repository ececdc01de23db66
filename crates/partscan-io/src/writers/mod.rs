//! Streaming row writers.

pub mod jsonl;

pub use jsonl::JsonlRowWriter;
