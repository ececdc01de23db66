//! Delimited text records (`a\x01b\x01c`), the catalog's default row format.
//!
//! Properties:
//! - `field.delim`: field separator; falls back to `serialization.format`,
//!   then `\x01`. A numeric value is read as an ASCII code (`"9"` is tab).
//! - `serialization.null.format`: the token that decodes to NULL (`\N`).
//!
//! Missing trailing fields decode to NULL and surplus fields are ignored.
//! An empty token decodes to NULL for every non-string column.

use std::sync::Arc;

use tracing::debug;

use partscan_core::cast::parse_strict;
use partscan_core::config::JobSettings;
use partscan_core::descriptor::SerdeProperties;
use partscan_core::error::{Error, Result};
use partscan_core::schema::DataType;
use partscan_core::types::{NativeRecord, RawRecord, Value};

use crate::deserializer::{Deserializer, RecordShape};
use crate::shape::StructShape;

pub const FIELD_DELIM: &str = "field.delim";
pub const SERIALIZATION_FORMAT: &str = "serialization.format";
pub const NULL_FORMAT: &str = "serialization.null.format";

pub const DEFAULT_FIELD_DELIM: u8 = 0x01;
pub const DEFAULT_NULL_FORMAT: &str = "\\N";

#[derive(Debug)]
pub struct DelimitedTextDeserializer {
    shape: Option<Arc<StructShape>>,
    delim: u8,
    null_token: Vec<u8>,
}

impl Default for DelimitedTextDeserializer {
    fn default() -> Self {
        Self {
            shape: None,
            delim: DEFAULT_FIELD_DELIM,
            null_token: DEFAULT_NULL_FORMAT.as_bytes().to_vec(),
        }
    }
}

impl DelimitedTextDeserializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delimiter(&self) -> u8 {
        self.delim
    }
}

/// Parse a single-byte separator property.
pub(crate) fn parse_separator(key: &str, value: &str) -> Result<u8> {
    let bytes = value.as_bytes();
    if bytes.len() == 1 && !bytes[0].is_ascii_digit() {
        return Ok(bytes[0]);
    }
    if let Ok(code) = value.parse::<u8>() {
        return Ok(code);
    }
    match value {
        "\\t" => Ok(b'\t'),
        "\\001" | "\\u0001" => Ok(0x01),
        _ => Err(Error::Config(format!(
            "'{key}' must be a single byte separator, got '{value}'"
        ))),
    }
}

/// Decode one text token into `slot`, reusing string capacity.
pub(crate) fn write_token(
    slot: &mut Value,
    token: &str,
    data_type: DataType,
    field: &str,
) -> Result<()> {
    match data_type {
        DataType::Utf8 => {
            if let Value::Str(s) = slot {
                s.clear();
                s.push_str(token);
            } else {
                *slot = Value::Str(token.to_string());
            }
        }
        _ if token.is_empty() => *slot = Value::Null,
        _ => {
            *slot = parse_strict(token, data_type)
                .map_err(|e| Error::Decode(format!("field '{field}': {}", e)))?;
        }
    }
    Ok(())
}

impl Deserializer for DelimitedTextDeserializer {
    fn name(&self) -> &'static str {
        "delimited"
    }

    fn initialize(&mut self, _settings: &JobSettings, properties: &SerdeProperties) -> Result<()> {
        let shape = StructShape::from_properties(properties)?;
        self.delim = match properties
            .get(FIELD_DELIM)
            .or_else(|| properties.get(SERIALIZATION_FORMAT))
        {
            Some(v) => parse_separator(FIELD_DELIM, v)?,
            None => DEFAULT_FIELD_DELIM,
        };
        self.null_token = properties
            .get(NULL_FORMAT)
            .map(String::as_str)
            .unwrap_or(DEFAULT_NULL_FORMAT)
            .as_bytes()
            .to_vec();
        debug!(
            columns = shape.width(),
            delim = self.delim,
            "initialized delimited deserializer"
        );
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

        let mut tokens = raw.as_bytes().split(|b| *b == self.delim);
        for idx in 0..width {
            let Some(slot) = record.slot_mut(idx) else {
                break;
            };
            match tokens.next() {
                None => *slot = Value::Null,
                Some(tok) if tok == self.null_token.as_slice() => *slot = Value::Null,
                Some(tok) => {
                    let text = std::str::from_utf8(tok).map_err(|e| {
                        Error::Decode(format!("field '{}': {}", shape.name(idx), e))
                    })?;
                    write_token(slot, text, shape.types()[idx], shape.name(idx))?;
                }
            }
        }
        Ok(())
    }

    fn shape(&self) -> Result<Arc<dyn RecordShape>> {
        match &self.shape {
            Some(s) => Ok(s.clone() as Arc<dyn RecordShape>),
            None => Err(Error::Config(
                "delimited deserializer used before initialize".into(),
            )),
        }
    }
}
