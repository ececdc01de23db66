//! Runtime values and the record/row containers that flow through a scan.
//!
//! `RawRecord` is what the storage layer hands out, `NativeRecord` is what a
//! deserializer decodes it into, and `Row` is the fixed-width output buffer.

use serde::{Deserialize, Serialize};

use crate::schema::DataType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
    /// Days since 1970-01-01.
    Date(i32),
}

impl Value {
    /// The logical type of this value; `None` for `Null`.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(DataType::Boolean),
            Value::I32(_) => Some(DataType::Int32),
            Value::I64(_) => Some(DataType::Int64),
            Value::F32(_) => Some(DataType::Float32),
            Value::F64(_) => Some(DataType::Float64),
            Value::Str(_) => Some(DataType::Utf8),
            Value::Bin(_) => Some(DataType::Binary),
            Value::Date(_) => Some(DataType::Date32),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Overwrite `self` with `src`, reusing existing heap capacity for
    /// string and binary values.
    pub fn assign(&mut self, src: &Value) {
        match (&mut *self, src) {
            (Value::Str(dst), Value::Str(s)) => {
                dst.clear();
                dst.push_str(s);
            }
            (Value::Bin(dst), Value::Bin(b)) => {
                dst.clear();
                dst.extend_from_slice(b);
            }
            (dst, s) => *dst = s.clone(),
        }
    }
}

/// Opaque serialized record as produced by a record reader.
///
/// Readers refill the same instance for every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    bytes: Vec<u8>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable access for readers that fill the record in place.
    pub fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.bytes)
    }
}

impl From<&str> for RawRecord {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

/// A decoded record: one value per field of the deserializer's record shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeRecord {
    values: Vec<Value>,
}

impl NativeRecord {
    pub fn with_width(width: usize) -> Self {
        Self {
            values: vec![Value::Null; width],
        }
    }

    /// Resize to `width` fields. Existing values are kept for reuse.
    pub fn reset(&mut self, width: usize) {
        self.values.resize(width, Value::Null);
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    pub fn slot_mut(&mut self, idx: usize) -> Option<&mut Value> {
        self.values.get_mut(idx)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn width(&self) -> usize {
        self.values.len()
    }
}

/// Fixed-width output row, indexed by output-schema position.
///
/// A single `Row` is reused as the write buffer for every record of one scan
/// unit: partition key slots are written once, physical slots are overwritten
/// per record. Anything that must outlive the current iteration step has to
/// be cloned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn with_width(width: usize) -> Self {
        Self {
            values: vec![Value::Null; width],
        }
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn width(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, slot: usize) -> Option<&Value> {
        self.values.get(slot)
    }

    /// Write `value` into `slot`. Out-of-range slots are ignored in release
    /// builds; callers validate slots against the schema width up front.
    pub fn set(&mut self, slot: usize, value: Value) {
        debug_assert!(slot < self.values.len(), "slot {slot} out of range");
        if let Some(v) = self.values.get_mut(slot) {
            *v = value;
        }
    }

    /// Copy `value` into `slot`, reusing the slot's heap allocation.
    pub fn assign(&mut self, slot: usize, value: &Value) {
        debug_assert!(slot < self.values.len(), "slot {slot} out of range");
        if let Some(v) = self.values.get_mut(slot) {
            v.assign(value);
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
