//! Streaming NDJSON row writer.

use std::io::{BufWriter, Write};

use serde_json::{Map, Value as Json};

use partscan_core::cast::format_date;
use partscan_core::types::{Row, Value};

use crate::error::{Error, Result};

pub struct JsonlRowWriter<W: Write> {
    writer: BufWriter<W>,
    // output-schema order; one key per row slot
    columns: Vec<String>,
    rows: u64,
}

impl<W: Write> JsonlRowWriter<W> {
    pub fn to_writer(writer: W, columns: Vec<String>) -> Self {
        Self {
            writer: BufWriter::new(writer),
            columns,
            rows: 0,
        }
    }

    /// Write one row as a JSON object keyed by column name.
    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        let mut obj = Map::with_capacity(self.columns.len());
        for (name, val) in self.columns.iter().zip(row.values()) {
            obj.insert(name.clone(), value_to_json(val));
        }
        serde_json::to_writer(&mut self.writer, &obj)?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| Error::io("<output>", e))?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Flush buffered output and return the inner writer.
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::io("<output>", e.into_error()))
    }
}

pub fn value_to_json(v: &Value) -> Json {
    match v {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::I32(i) => Json::from(*i),
        Value::I64(i) => Json::from(*i),
        Value::F32(f) => Json::from(*f as f64),
        Value::F64(f) => Json::from(*f),
        Value::Str(s) => Json::String(s.clone()),
        Value::Bin(b) => Json::String(String::from_utf8_lossy(b).into_owned()),
        Value::Date(d) => Json::String(format_date(*d)),
    }
}
