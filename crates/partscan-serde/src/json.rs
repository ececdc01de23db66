//! One JSON object per raw record.
//!
//! Keys are matched to columns case-insensitively; absent keys and JSON
//! `null` decode to NULL. Values whose JSON type cannot represent the column
//! type are decode errors. Strings are accepted for every column type and
//! parsed the way text formats parse them.

use std::sync::Arc;

use serde_json::Value as Json;
use tracing::debug;

use partscan_core::cast::parse_strict;
use partscan_core::config::JobSettings;
use partscan_core::descriptor::SerdeProperties;
use partscan_core::error::{Error, Result};
use partscan_core::schema::DataType;
use partscan_core::types::{NativeRecord, RawRecord, Value};

use crate::deserializer::{Deserializer, RecordShape};
use crate::shape::StructShape;

#[derive(Debug, Default)]
pub struct JsonDeserializer {
    shape: Option<Arc<StructShape>>,
}

impl JsonDeserializer {
    pub fn new() -> Self {
        Self::default()
    }
}

fn mismatch(field: &str, json: &Json, target: DataType) -> Error {
    Error::Decode(format!("field '{field}': cannot read {json} as {target}"))
}

fn convert(json: &Json, target: DataType, field: &str) -> Result<Value> {
    let value = match (json, target) {
        (Json::Null, _) => Value::Null,
        (Json::String(s), DataType::Utf8) => Value::Str(s.clone()),
        (Json::String(s), _) => parse_strict(s, target)
            .map_err(|e| Error::Decode(format!("field '{field}': {e}")))?,
        (Json::Bool(b), DataType::Boolean) => Value::Bool(*b),
        (Json::Number(n), DataType::Int32) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::I32)
            .ok_or_else(|| mismatch(field, json, target))?,
        (Json::Number(n), DataType::Int64) => n
            .as_i64()
            .map(Value::I64)
            .ok_or_else(|| mismatch(field, json, target))?,
        (Json::Number(n), DataType::Float32) => n
            .as_f64()
            .map(|v| Value::F32(v as f32))
            .ok_or_else(|| mismatch(field, json, target))?,
        (Json::Number(n), DataType::Float64) => n
            .as_f64()
            .map(Value::F64)
            .ok_or_else(|| mismatch(field, json, target))?,
        (Json::Number(_) | Json::Bool(_), DataType::Utf8) => Value::Str(json.to_string()),
        (Json::Array(_) | Json::Object(_), DataType::Utf8) => Value::Str(json.to_string()),
        _ => return Err(mismatch(field, json, target)),
    };
    Ok(value)
}

impl Deserializer for JsonDeserializer {
    fn name(&self) -> &'static str {
        "json"
    }

    fn initialize(&mut self, _settings: &JobSettings, properties: &SerdeProperties) -> Result<()> {
        let shape = StructShape::from_properties(properties)?;
        debug!(columns = shape.width(), "initialized json deserializer");
        self.shape = Some(Arc::new(shape));
        Ok(())
    }

    fn deserialize_into(&mut self, raw: &RawRecord, record: &mut NativeRecord) -> Result<()> {
        let shape = self
            .shape
            .as_ref()
            .ok_or_else(|| Error::Decode("deserializer not initialized".into()))?;
        let object: serde_json::Map<String, Json> = serde_json::from_slice(raw.as_bytes())
            .map_err(|e| Error::Decode(format!("malformed json record: {e}")))?;

        record.reset(shape.width());
        for idx in 0..shape.width() {
            if let Some(slot) = record.slot_mut(idx) {
                *slot = Value::Null;
            }
        }
        for (key, json) in &object {
            let Some(idx) = shape.position(key) else {
                continue;
            };
            let value = convert(json, shape.types()[idx], shape.name(idx))?;
            if let Some(slot) = record.slot_mut(idx) {
                *slot = value;
            }
        }
        Ok(())
    }

    fn shape(&self) -> Result<Arc<dyn RecordShape>> {
        match &self.shape {
            Some(s) => Ok(s.clone() as Arc<dyn RecordShape>),
            None => Err(Error::Config("json deserializer used before initialize".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{COLUMNS, COLUMN_TYPES};

    fn init(columns: &str, types: &str) -> JsonDeserializer {
        let props: SerdeProperties = [
            (COLUMNS.to_string(), columns.to_string()),
            (COLUMN_TYPES.to_string(), types.to_string()),
        ]
        .into_iter()
        .collect();
        let mut d = JsonDeserializer::new();
        d.initialize(&JobSettings::new(), &props).unwrap();
        d
    }

    #[test]
    fn decodes_object() {
        let mut d = init("name,value,ok,day", "string:bigint:boolean:date");
        let mut rec = NativeRecord::default();
        d.deserialize_into(
            &RawRecord::from(r#"{"Name":"a","value":10,"ok":true,"day":"2000-03-01","x":1}"#),
            &mut rec,
        )
        .unwrap();
        assert_eq!(
            rec.values(),
            &[
                Value::Str("a".into()),
                Value::I64(10),
                Value::Bool(true),
                Value::Date(11_017)
            ]
        );

        // absent keys reset to null on reuse
        d.deserialize_into(&RawRecord::from(r#"{"value":null}"#), &mut rec)
            .unwrap();
        assert!(rec.values().iter().all(Value::is_null));
    }

    #[test]
    fn numbers_in_string_columns_are_rendered() {
        let mut d = init("v", "string");
        let mut rec = NativeRecord::default();
        d.deserialize_into(&RawRecord::from(r#"{"v":1.5}"#), &mut rec)
            .unwrap();
        assert_eq!(rec.values(), &[Value::Str("1.5".into())]);
    }

    #[test]
    fn mismatches_are_decode_errors() {
        let mut d = init("n", "int");
        let mut rec = NativeRecord::default();
        for raw in [r#"{"n":true}"#, r#"{"n":3000000000}"#, "not json", "[1]"] {
            let err = d.deserialize_into(&RawRecord::from(raw), &mut rec).unwrap_err();
            assert!(matches!(err, Error::Decode(_)), "{raw}");
        }
    }
}
