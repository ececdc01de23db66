//! `StructShape`: a flat, named, typed record shape.
//!
//! Built from the `columns` / `columns.types` serialization properties that
//! every bundled deserializer understands.

use partscan_core::descriptor::SerdeProperties;
use partscan_core::error::{Error, Result};
use partscan_core::schema::DataType;
use partscan_core::types::{NativeRecord, Value};

use crate::deserializer::{FieldHandle, RecordShape};

pub const COLUMNS: &str = "columns";
pub const COLUMN_TYPES: &str = "columns.types";

static NULL: Value = Value::Null;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructShape {
    names: Vec<String>,
    types: Vec<DataType>,
}

impl StructShape {
    pub fn new(fields: Vec<(String, DataType)>) -> Self {
        let (names, types) = fields.into_iter().unzip();
        Self { names, types }
    }

    /// `columns` is comma separated; `columns.types` is colon separated and
    /// defaults every column to `string` when absent.
    pub fn from_properties(properties: &SerdeProperties) -> Result<Self> {
        let columns = properties
            .get(COLUMNS)
            .ok_or_else(|| Error::Config(format!("missing '{COLUMNS}' serialization property")))?;
        let names: Vec<String> = columns
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        let types = match properties.get(COLUMN_TYPES) {
            None => vec![DataType::Utf8; names.len()],
            Some(spec) => spec
                .split(':')
                .map(str::parse::<DataType>)
                .collect::<Result<Vec<_>>>()?,
        };
        if types.len() != names.len() {
            return Err(Error::Schema(format!(
                "{} columns but {} column types",
                names.len(),
                types.len()
            )));
        }
        Ok(Self { names, types })
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    pub fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    pub fn types(&self) -> &[DataType] {
        &self.types
    }

    /// Case-insensitive field position.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n.eq_ignore_ascii_case(name))
    }
}

impl RecordShape for StructShape {
    fn resolve_field(&self, name: &str) -> Result<FieldHandle> {
        self.position(name)
            .map(FieldHandle::new)
            .ok_or_else(|| Error::UnknownField {
                field: name.to_string(),
                available: self.names.join(", "),
            })
    }

    fn extract<'r>(&self, record: &'r NativeRecord, field: FieldHandle) -> &'r Value {
        record.get(field.index()).unwrap_or(&NULL)
    }

    fn field_type(&self, field: FieldHandle) -> DataType {
        self.types
            .get(field.index())
            .copied()
            .unwrap_or(DataType::Utf8)
    }

    fn field_names(&self) -> Vec<&str> {
        self.names.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> SerdeProperties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn builds_from_properties() {
        let shape = StructShape::from_properties(&props(&[
            (COLUMNS, "name,value"),
            (COLUMN_TYPES, "string:int"),
        ]))
        .unwrap();
        assert_eq!(shape.types(), &[DataType::Utf8, DataType::Int32]);

        let h = shape.resolve_field("VALUE").unwrap();
        assert_eq!(shape.field_type(h), DataType::Int32);
        // resolving twice yields the same handle
        assert_eq!(shape.resolve_field("value").unwrap(), h);
    }

    #[test]
    fn unknown_field() {
        let shape = StructShape::new(vec![("a".into(), DataType::Utf8)]);
        match shape.resolve_field("b") {
            Err(Error::UnknownField { field, available }) => {
                assert_eq!(field, "b");
                assert_eq!(available, "a");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn mismatched_type_count() {
        let err = StructShape::from_properties(&props(&[
            (COLUMNS, "a,b"),
            (COLUMN_TYPES, "int"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
        assert!(StructShape::from_properties(&props(&[])).is_err());
    }
}
