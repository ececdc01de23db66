//! Field resolution: output attributes to record-shape handles, once per unit.

use partscan_core::error::Result;
use partscan_core::schema::Attribute;
use partscan_serde::{FieldHandle, RecordShape};

/// A physical column: where to read it from and which row slot it fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedField {
    pub handle: FieldHandle,
    pub slot: usize,
}

/// Resolve every (attribute, slot) pair against `shape`, preserving order.
///
/// An attribute the shape does not know fails the whole unit with
/// `Error::UnknownField`.
pub fn resolve_fields(
    shape: &dyn RecordShape,
    columns: &[(Attribute, usize)],
) -> Result<Vec<ResolvedField>> {
    columns
        .iter()
        .map(|(attr, slot)| {
            Ok(ResolvedField {
                handle: shape.resolve_field(&attr.name)?,
                slot: *slot,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use partscan_core::schema::DataType;
    use partscan_core::types::{NativeRecord, Value};
    use partscan_core::Error;
    use partscan_serde::StructShape;

    fn shape() -> StructShape {
        StructShape::new(vec![
            ("name".into(), DataType::Utf8),
            ("value".into(), DataType::Int32),
        ])
    }

    #[test]
    fn resolves_in_order() {
        let cols = vec![
            (Attribute::new("value", DataType::Int32), 0),
            (Attribute::new("name", DataType::Utf8), 3),
        ];
        let fields = resolve_fields(&shape(), &cols).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].slot, 0);
        assert_eq!(fields[1].slot, 3);
    }

    #[test]
    fn resolution_is_idempotent() {
        let shape = shape();
        let cols = vec![(Attribute::new("name", DataType::Utf8), 0)];
        let a = resolve_fields(&shape, &cols).unwrap();
        let b = resolve_fields(&shape, &cols).unwrap();
        let mut rec = NativeRecord::with_width(2);
        if let Some(slot) = rec.slot_mut(0) {
            *slot = Value::Str("x".into());
        }
        assert_eq!(
            shape.extract(&rec, a[0].handle),
            shape.extract(&rec, b[0].handle)
        );
    }

    #[test]
    fn unknown_attribute_fails() {
        let cols = vec![(Attribute::new("missing", DataType::Utf8), 0)];
        let err = resolve_fields(&shape(), &cols).unwrap_err();
        assert!(matches!(err, Error::UnknownField { ref field, .. } if field == "missing"));
    }
}
