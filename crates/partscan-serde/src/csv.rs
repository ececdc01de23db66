//! Quoted CSV records, one record per raw value.
//!
//! Properties: `separatorChar` (`,`), `quoteChar` (`"`), `escapeChar` (`\`).
//! Tokens are cast to the declared column types with the same rules as the
//! delimited deserializer.
//!
//! One `csv_core::Reader` and its field buffers live for the whole split; a
//! record only grows them when it is longer than any before it.

use std::fmt;
use std::sync::Arc;

use csv_core::ReadRecordResult;
use tracing::debug;

use partscan_core::config::JobSettings;
use partscan_core::descriptor::SerdeProperties;
use partscan_core::error::{Error, Result};
use partscan_core::types::{NativeRecord, RawRecord, Value};

use crate::delimited::{parse_separator, write_token};
use crate::deserializer::{Deserializer, RecordShape};
use crate::shape::StructShape;

pub const SEPARATOR_CHAR: &str = "separatorChar";
pub const QUOTE_CHAR: &str = "quoteChar";
pub const ESCAPE_CHAR: &str = "escapeChar";

pub struct CsvDeserializer {
    shape: Option<Arc<StructShape>>,
    reader: csv_core::Reader,
    // unescaped field bytes, back to back
    output: Vec<u8>,
    // exclusive end offset of each field in `output`
    ends: Vec<usize>,
}

impl Default for CsvDeserializer {
    fn default() -> Self {
        Self {
            shape: None,
            reader: Self::reader(b',', b'"', b'\\'),
            output: vec![0; 256],
            ends: vec![0; 16],
        }
    }
}

impl fmt::Debug for CsvDeserializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvDeserializer")
            .field("shape", &self.shape)
            .field("output_capacity", &self.output.len())
            .finish()
    }
}

impl CsvDeserializer {
    pub fn new() -> Self {
        Self::default()
    }

    fn reader(separator: u8, quote: u8, escape: u8) -> csv_core::Reader {
        csv_core::ReaderBuilder::new()
            .delimiter(separator)
            .quote(quote)
            .escape(Some(escape))
            .build()
    }
}

fn byte_property(properties: &SerdeProperties, key: &str, default: u8) -> Result<u8> {
    properties
        .get(key)
        .map(|v| parse_separator(key, v))
        .unwrap_or(Ok(default))
}

/// Parse one record into `output`/`ends`, growing them as needed.
///
/// Returns the number of fields; an empty input has none.
fn read_fields(
    reader: &mut csv_core::Reader,
    mut input: &[u8],
    output: &mut Vec<u8>,
    ends: &mut Vec<usize>,
) -> Result<usize> {
    reader.reset();
    let (mut out_len, mut ends_len) = (0, 0);
    loop {
        let (res, nin, nout, nend) =
            reader.read_record(input, &mut output[out_len..], &mut ends[ends_len..]);
        input = &input[nin..];
        out_len += nout;
        ends_len += nend;
        match res {
            // an empty slice on the next call marks end of input
            ReadRecordResult::InputEmpty => {}
            ReadRecordResult::OutputFull => {
                let len = output.len().max(64) * 2;
                output.resize(len, 0);
            }
            ReadRecordResult::OutputEndsFull => {
                let len = ends.len().max(8) * 2;
                ends.resize(len, 0);
            }
            ReadRecordResult::Record => return Ok(ends_len),
            ReadRecordResult::End => return Ok(0),
        }
    }
}

impl Deserializer for CsvDeserializer {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn initialize(&mut self, _settings: &JobSettings, properties: &SerdeProperties) -> Result<()> {
        let shape = StructShape::from_properties(properties)?;
        let separator = byte_property(properties, SEPARATOR_CHAR, b',')?;
        let quote = byte_property(properties, QUOTE_CHAR, b'"')?;
        let escape = byte_property(properties, ESCAPE_CHAR, b'\\')?;
        self.reader = Self::reader(separator, quote, escape);
        debug!(columns = shape.width(), separator, "initialized csv deserializer");
        self.shape = Some(Arc::new(shape));
        Ok(())
    }

    fn deserialize_into(&mut self, raw: &RawRecord, record: &mut NativeRecord) -> Result<()> {
        let shape = self
            .shape
            .as_ref()
            .ok_or_else(|| Error::Decode("deserializer not initialized".into()))?;
        let width = shape.width();
        record.reset(width);

        let found = read_fields(
            &mut self.reader,
            raw.as_bytes(),
            &mut self.output,
            &mut self.ends,
        )?;

        let mut start = 0;
        for idx in 0..width {
            let Some(slot) = record.slot_mut(idx) else {
                break;
            };
            if idx >= found {
                *slot = Value::Null;
                continue;
            }
            let end = self.ends[idx];
            let tok = std::str::from_utf8(&self.output[start..end]).map_err(|e| {
                Error::Decode(format!("field '{}' is not valid utf-8: {e}", shape.name(idx)))
            })?;
            write_token(slot, tok, shape.types()[idx], shape.name(idx))?;
            start = end;
        }
        Ok(())
    }

    fn shape(&self) -> Result<Arc<dyn RecordShape>> {
        match &self.shape {
            Some(s) => Ok(s.clone() as Arc<dyn RecordShape>),
            None => Err(Error::Config("csv deserializer used before initialize".into())),
        }
    }
}
