//! Record materialization: raw records to rows through one reused buffer.
//!
//! The hot loop performs no per-record allocation once the buffers have
//! grown to fit: the record reader refills one `RawRecord`, the deserializer
//! decodes into one `NativeRecord`, and field values are copied into one
//! `Row` whose partition key slots were filled before the first record.

use std::sync::Arc;

use partscan_core::error::{Error, Result};
use partscan_core::types::{NativeRecord, RawRecord, Row};
use partscan_io::RecordReader;
use partscan_serde::{Deserializer, RecordShape};

use crate::resolve::ResolvedField;

/// Lending iterator over the rows of one split.
///
/// `row()` borrows the shared buffer; it is overwritten by the next
/// `advance()`. Clone the row to keep it.
pub struct RowMaterializer {
    unit: Arc<str>,
    reader: Box<dyn RecordReader>,
    deserializer: Box<dyn Deserializer>,
    shape: Arc<dyn RecordShape>,
    fields: Vec<ResolvedField>,
    key: u64,
    raw: RawRecord,
    native: NativeRecord,
    row: Row,
    rows: u64,
    done: bool,
}

impl RowMaterializer {
    /// `row` is the write buffer, with any partition key slots already set.
    pub fn new(
        unit: Arc<str>,
        reader: Box<dyn RecordReader>,
        deserializer: Box<dyn Deserializer>,
        shape: Arc<dyn RecordShape>,
        fields: Vec<ResolvedField>,
        row: Row,
    ) -> Self {
        Self {
            unit,
            reader,
            deserializer,
            shape,
            fields,
            key: 0,
            raw: RawRecord::new(),
            native: NativeRecord::default(),
            row,
            rows: 0,
            done: false,
        }
    }

    /// Materialize the next record into the row buffer.
    ///
    /// Returns `false` at the end of the split. A record that fails to decode
    /// ends the split with `Error::Deserialization`.
    pub fn advance(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }
        // The reader's key is only used to locate decode failures.
        let more = self.reader.next_into(&mut self.key, &mut self.raw);
        match more {
            Ok(true) => {}
            Ok(false) => {
                self.done = true;
                return Ok(false);
            }
            Err(e) => {
                self.done = true;
                return Err(e.into());
            }
        }

        if let Err(e) = self.deserializer.deserialize_into(&self.raw, &mut self.native) {
            self.done = true;
            return Err(Error::Deserialization {
                unit: self.unit.to_string(),
                position: self.key,
                reason: match e {
                    Error::Decode(reason) => reason,
                    other => other.to_string(),
                },
            });
        }
        for f in &self.fields {
            self.row
                .assign(f.slot, self.shape.extract(&self.native, f.handle));
        }
        self.rows += 1;
        Ok(true)
    }

    pub fn row(&self) -> &Row {
        &self.row
    }

    pub fn rows_read(&self) -> u64 {
        self.rows
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }
}
