//! Partition key injection: typed key values written into fixed row slots.
//!
//! Key values are constant for every record of a partition, so they are cast
//! and written once per partition. Record materialization then overwrites
//! only the physical-column slots.

use partscan_core::cast::Caster;
use partscan_core::error::{Error, Result};
use partscan_core::schema::Attribute;
use partscan_core::types::Row;

/// Write each key attribute's value into `row`.
///
/// `values` holds the raw key strings in `declared` order. Each key
/// attribute is located in `declared` by name and its string cast to the
/// attribute's type.
pub fn inject_partition_keys(
    values: &[String],
    keys: &[(Attribute, usize)],
    declared: &[&str],
    caster: &dyn Caster,
    row: &mut Row,
) -> Result<()> {
    for (attr, slot) in keys {
        let pos = declared
            .iter()
            .position(|c| c.eq_ignore_ascii_case(&attr.name))
            .ok_or_else(|| {
                Error::Schema(format!(
                    "'{}' is not a declared partition column (declared: {})",
                    attr.name,
                    declared.join(", ")
                ))
            })?;
        let raw = values.get(pos).map(String::as_str).unwrap_or("");
        row.set(*slot, caster.cast_string_literal(raw, attr.data_type)?);
    }
    Ok(())
}
