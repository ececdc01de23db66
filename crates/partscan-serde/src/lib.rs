#![forbid(unsafe_code)]
//! partscan-serde: turning raw records into structured native records.
//!
//! A `Deserializer` is selected by the identifier carried in a table or
//! partition descriptor, initialized with the merged job settings and the
//! descriptor's serialization properties, and then asked for its
//! `RecordShape`. Field handles resolved against that shape are used to pull
//! values out of every decoded record.
//!
//! Deserializers may keep per-instance state and are never shared across
//! scan units; the registry hands out a fresh instance per request.

pub mod csv;
pub mod delimited;
pub mod deserializer;
pub mod json;
pub mod registry;
pub mod shape;

pub use deserializer::{Deserializer, FieldHandle, RecordShape};
pub use registry::{DeserializerFactory, DeserializerRegistry};
pub use shape::StructShape;
