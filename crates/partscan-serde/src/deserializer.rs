//! The deserializer capability and the record-shape introspector it exposes.

use std::fmt;
use std::sync::Arc;

use partscan_core::config::JobSettings;
use partscan_core::descriptor::SerdeProperties;
use partscan_core::error::Result;
use partscan_core::schema::DataType;
use partscan_core::types::{NativeRecord, RawRecord, Value};

/// Opaque accessor for one field of a record shape.
///
/// Only meaningful for the shape that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldHandle {
    index: usize,
}

impl FieldHandle {
    /// For `RecordShape` implementations.
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    pub fn index(self) -> usize {
        self.index
    }
}

/// Describes the fields of a deserializer's native records.
pub trait RecordShape: Send + Sync + fmt::Debug {
    /// Fails with `Error::UnknownField` when the shape has no such field.
    fn resolve_field(&self, name: &str) -> Result<FieldHandle>;

    fn extract<'r>(&self, record: &'r NativeRecord, field: FieldHandle) -> &'r Value;

    fn field_type(&self, field: FieldHandle) -> DataType;

    fn field_names(&self) -> Vec<&str>;
}

/// Converts raw records of one serialization format into native records.
///
/// Implementations may hold per-instance state and need not be `Sync`.
pub trait Deserializer: Send {
    fn name(&self) -> &'static str;

    fn initialize(&mut self, settings: &JobSettings, properties: &SerdeProperties) -> Result<()>;

    /// Decode `raw` into `record`, reusing the record's value slots.
    ///
    /// Fails with `Error::Decode` when the bytes cannot be decoded.
    fn deserialize_into(&mut self, raw: &RawRecord, record: &mut NativeRecord) -> Result<()>;

    /// The shape of decoded records. Only valid after `initialize`.
    fn shape(&self) -> Result<Arc<dyn RecordShape>>;
}
